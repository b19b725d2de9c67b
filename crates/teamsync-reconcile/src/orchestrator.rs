//! Sync orchestration.
//!
//! Drives one run for one member: resolve identity, fetch both sides once,
//! plan each requested direction from that single snapshot, filter by
//! authority, apply, and report. Only resolution and fetching can fail the
//! run; everything after that is recorded in the [`SyncReport`].

use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use teamsync_core::{CallContext, DirectoryStore, MemberRef, PlatformStore};

use crate::applier::ChangeApplier;
use crate::authority::AuthorityFilter;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::fetcher::MembershipFetcher;
use crate::planner;
use crate::report::SyncReport;
use crate::resolver::IdentityResolver;
use crate::types::{SyncDirection, SyncState};

/// Tracks the state of one run and rejects illegal moves.
#[derive(Debug)]
pub(crate) struct RunState {
    run_id: Uuid,
    state: SyncState,
}

impl RunState {
    pub(crate) fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            state: SyncState::ResolvingIdentity,
        }
    }

    pub(crate) fn current(&self) -> SyncState {
        self.state
    }

    pub(crate) fn transition(&mut self, next: SyncState) -> SyncResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(SyncError::invalid_state_transition(
                self.state.as_str(),
                next.as_str(),
            ));
        }
        debug!(run_id = %self.run_id, from = %self.state, to = %next, "Sync state transition");
        self.state = next;
        Ok(())
    }

    /// Move to `Failed` and hand back the error that caused it.
    fn fail(&mut self, cause: SyncError) -> SyncError {
        match self.transition(SyncState::Failed) {
            Ok(()) => {
                error!(run_id = %self.run_id, error = %cause, "Sync run failed");
                cause
            }
            Err(transition_error) => transition_error,
        }
    }
}

/// Entry point for reconciling one member.
#[derive(Clone)]
pub struct SyncOrchestrator {
    resolver: IdentityResolver,
    fetcher: MembershipFetcher,
    applier: ChangeApplier,
    config: SyncConfig,
}

impl SyncOrchestrator {
    /// Create an orchestrator. Fails if `config` does not validate.
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        platform: Arc<dyn PlatformStore>,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        config.validate()?;

        Ok(Self {
            resolver: IdentityResolver::new(Arc::clone(&directory)),
            fetcher: MembershipFetcher::new(Arc::clone(&directory), Arc::clone(&platform)),
            applier: ChangeApplier::new(
                directory,
                platform,
                config.max_concurrent_operations,
                config.dry_run,
            ),
            config,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Reconcile one member in the given direction.
    ///
    /// Returns `Err` only for fatal failures (identity not found, a store
    /// unreachable while reading). Rejected mutations and authority
    /// exclusions come back inside an `Ok` report.
    #[instrument(
        skip(self, ctx, member, direction),
        fields(request_id = %ctx.request_id(), member = %member, direction = %direction)
    )]
    pub async fn sync(
        &self,
        ctx: &CallContext,
        member: &MemberRef,
        direction: SyncDirection,
    ) -> SyncResult<SyncReport> {
        let run_id = Uuid::new_v4();
        let mut run = RunState::new(run_id);
        let policy = self.config.merge_policy;

        info!(
            run_id = %run_id,
            policy = %policy,
            dry_run = self.config.dry_run,
            "Starting sync run"
        );

        let identity = match self.resolver.resolve(ctx, member).await {
            Ok(identity) => identity,
            Err(e) => return Err(run.fail(e)),
        };

        run.transition(SyncState::FetchingMembership)?;
        let snapshot = match self
            .fetcher
            .fetch(ctx, Some(&identity), direction.writes_platform())
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(run.fail(e)),
        };

        let mut report = SyncReport::new(run_id, identity, direction, policy, self.config.dry_run);
        report.warnings = snapshot.warnings;

        run.transition(SyncState::Planning)?;
        let mut plans = Vec::with_capacity(direction.legs().len());
        for leg in direction.legs() {
            let plan = planner::plan(&snapshot.directory, &snapshot.platform, *leg, policy);
            let plan = match (&snapshot.authority, leg.writes_platform()) {
                (Some(authority), true) => {
                    let (filtered, skipped) = AuthorityFilter::apply_to_plan(plan, authority);
                    report.outcomes.extend(skipped);
                    filtered
                }
                _ => plan,
            };
            debug!(
                leg = %leg,
                operations = plan.operation_count(),
                "Planned"
            );
            plans.push(plan);
        }

        run.transition(SyncState::Applying)?;
        for plan in &plans {
            let outcomes = self.applier.apply(ctx, &report.member, plan).await;
            report.outcomes.extend(outcomes);
        }
        report.plans = plans;

        run.transition(SyncState::Done)?;
        report.finish(run.current());

        info!(
            run_id = %run_id,
            applied = report.summary.applied,
            skipped = report.summary.skipped,
            failed = report.summary.failed,
            planned = report.summary.planned,
            warnings = report.summary.warnings,
            "Sync run completed"
        );

        Ok(report)
    }
}
