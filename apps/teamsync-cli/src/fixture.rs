//! JSON snapshot files standing in for both stores.

use std::path::Path;

use teamsync_reconcile::memory::FixtureState;

use crate::error::{CliError, CliResult};

/// Read a fixture file.
pub fn load(path: &Path) -> CliResult<FixtureState> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CliError::Fixture(format!("cannot read {}: {e}", path.display())))?;
    FixtureState::from_json(&raw)
        .map_err(|e| CliError::Fixture(format!("cannot parse {}: {e}", path.display())))
}

/// Write a fixture file, replacing its previous contents.
pub fn save(path: &Path, state: &FixtureState) -> CliResult<()> {
    let mut json = state.to_json()?;
    json.push('\n');
    std::fs::write(path, json)
        .map_err(|e| CliError::Fixture(format!("cannot write {}: {e}", path.display())))
}
