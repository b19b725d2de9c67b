//! Command-line arguments

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use teamsync_core::{DirectoryMemberId, MemberRef, PlatformUserId};
use teamsync_reconcile::{MergePolicy, SyncDirection};

use crate::error::{CliError, CliResult};

/// teamsync - keep directory teams and chat platform roles in agreement
#[derive(Parser, Debug)]
#[command(name = "teamsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log engine activity at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile one member's memberships
    Sync(SyncArgs),

    /// Show what a sync would change, without changing anything
    Plan(SyncArgs),
}

/// Output format for the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// The full report as JSON
    Json,
}

/// Exactly one way of naming the member.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct MemberArgs {
    /// Directory member ID (UUID)
    #[arg(long, value_name = "UUID")]
    pub directory_id: Option<DirectoryMemberId>,

    /// Chat platform user ID
    #[arg(long, value_name = "ID")]
    pub platform_id: Option<PlatformUserId>,

    /// Either kind of ID; a UUID is taken as a directory ID
    #[arg(long, value_name = "ID")]
    pub member: Option<String>,
}

impl MemberArgs {
    /// The member reference named on the command line.
    pub fn to_member_ref(&self) -> CliResult<MemberRef> {
        match (&self.directory_id, &self.platform_id, &self.member) {
            (Some(id), None, None) => Ok(MemberRef::Directory(*id)),
            (None, Some(id), None) => Ok(MemberRef::Platform(id.clone())),
            (None, None, Some(raw)) => {
                MemberRef::parse_auto(raw).map_err(|e| CliError::InvalidInput(e.to_string()))
            }
            _ => Err(CliError::InvalidInput(
                "give exactly one of --directory-id, --platform-id or --member".into(),
            )),
        }
    }
}

/// Arguments shared by `sync` and `plan`
#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub member: MemberArgs,

    /// platform-to-directory, directory-to-platform or both
    #[arg(long)]
    pub direction: SyncDirection,

    /// union or overwrite (default from TEAMSYNC_MERGE_POLICY)
    #[arg(long)]
    pub policy: Option<MergePolicy>,

    /// Plan and report without changing either store
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Run against a JSON snapshot of both stores instead of the REST APIs
    #[arg(long, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Platform operations in flight at once (default from TEAMSYNC_MAX_CONCURRENCY)
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,
}
