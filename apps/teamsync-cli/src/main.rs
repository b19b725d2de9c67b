//! teamsync CLI - reconcile one member's directory teams and platform roles
//!
//! Logs go to stderr; the report goes to stdout. The process exit code
//! tells success, partial failure and the kind of fatal error apart.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod error;
mod fixture;
mod output;

use cli::{Cli, Commands};
use error::CliResult;

const DEFAULT_FILTER: &str = "warn,teamsync_cli=info,teamsync_reconcile=info";
const VERBOSE_FILTER: &str =
    "info,teamsync_cli=debug,teamsync_reconcile=debug,teamsync_connector_rest=debug";

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors share the invalid-input exit code; --help and --version exit 0.
            let code = if e.use_stderr() { 5 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // Load .env if present
    let _ = dotenvy::dotenv();

    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Sync(args) => commands::sync::execute(args, false).await,
        Commands::Plan(args) => commands::sync::execute(args, true).await,
    }
}
