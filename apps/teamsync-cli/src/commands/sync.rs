//! Sync command - reconcile one member, or plan it with `--dry-run`

use std::path::Path;
use std::sync::Arc;

use teamsync_connector_rest::{RestDirectoryStore, RestPlatformStore};
use teamsync_core::{CallContext, MemberRef};
use teamsync_reconcile::memory::FixtureState;
use teamsync_reconcile::{SyncConfig, SyncDirection, SyncOrchestrator, SyncReport};
use tracing::{debug, info};

use crate::cli::SyncArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::{fixture, output};

/// Execute the sync command. `plan` runs it with `force_dry_run`.
pub async fn execute(args: SyncArgs, force_dry_run: bool) -> CliResult<()> {
    let config = CliConfig::from_env()?;
    let report = run(&args, &config, force_dry_run || args.dry_run).await?;

    print!("{}", output::render(&report, args.format)?);

    if report.has_failures() {
        return Err(CliError::PartialFailure {
            failed: report.summary.failed,
        });
    }
    Ok(())
}

/// Build the stores, run one sync and return its report.
pub async fn run(args: &SyncArgs, config: &CliConfig, dry_run: bool) -> CliResult<SyncReport> {
    let member = args.member.to_member_ref()?;
    let sync_config = SyncConfig::default()
        .with_merge_policy(args.policy.unwrap_or(config.merge_policy))
        .with_dry_run(dry_run)
        .with_max_concurrent_operations(args.max_concurrency.unwrap_or(config.max_concurrency));
    let ctx = config.call_context();

    info!(
        member = %member,
        direction = %args.direction,
        policy = %sync_config.merge_policy,
        dry_run,
        "Starting sync"
    );

    match &args.fixture {
        Some(path) => run_fixture(path, &ctx, &member, args.direction, sync_config).await,
        None => {
            let directory = RestDirectoryStore::new(&config.directory_store()?)
                .map_err(CliError::InvalidInput)?;
            let platform =
                RestPlatformStore::new(&config.platform_store()?).map_err(CliError::InvalidInput)?;

            let orchestrator =
                SyncOrchestrator::new(Arc::new(directory), Arc::new(platform), sync_config)?;
            Ok(orchestrator.sync(&ctx, &member, args.direction).await?)
        }
    }
}

async fn run_fixture(
    path: &Path,
    ctx: &CallContext,
    member: &MemberRef,
    direction: SyncDirection,
    sync_config: SyncConfig,
) -> CliResult<SyncReport> {
    let dry_run = sync_config.dry_run;
    let (directory, platform) = fixture::load(path)?.into_stores();
    let directory = Arc::new(directory);
    let platform = Arc::new(platform);

    let orchestrator = SyncOrchestrator::new(directory.clone(), platform.clone(), sync_config)?;
    let report = orchestrator.sync(ctx, member, direction).await?;

    if !dry_run {
        fixture::save(path, &FixtureState::capture(&directory, &platform).await)?;
        debug!(path = %path.display(), "Fixture updated");
    }
    Ok(report)
}
