//! Report rendering

use teamsync_reconcile::SyncReport;

use crate::cli::OutputFormat;
use crate::error::CliResult;

/// Render a report for stdout.
pub fn render(report: &SyncReport, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(report.render_text()),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(report)?;
            json.push('\n');
            Ok(json)
        }
    }
}
