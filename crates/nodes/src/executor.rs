//! The run executor: sequences every step under one failure boundary.

use std::sync::Arc;

use thiserror::Error;

use pipeline::{
    total_findings, DiffProvider, DocsGrouper, DocsPublisher, EntryPointResult, ReportPublisher,
    RunConfig, RunId, StrategyRegistry, TbdocsError, Timestamp,
};

use crate::{aggregate, process_entry_points, publish, resolve_diff_scope};

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Where a run is (or was when it failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Configuration is being validated.
    Init,
    /// The diff scope is being computed.
    ResolvingScope,
    /// Reporters and generators are running.
    ProcessingEntryPoints,
    /// Docs are being grouped and the report rendered.
    Aggregating,
    /// The report and generated docs are being published.
    Publishing,
    /// Every step completed.
    Done,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunState::Init => "init",
            RunState::ResolvingScope => "resolving-scope",
            RunState::ProcessingEntryPoints => "processing-entry-points",
            RunState::Aggregating => "aggregating",
            RunState::Publishing => "publishing",
            RunState::Done => "done",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Per-entry-point results, in configuration order.
    pub results: Vec<EntryPointResult>,
    /// The aggregated markdown report.
    pub markdown: String,
    /// Errors across all reports.
    pub errors: usize,
    /// Warnings across all reports.
    pub warnings: usize,
    /// Whether generated docs were pushed to a target repository.
    pub docs_pushed: bool,
}

/// A failed run: the step it failed in and the originating error message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RunFailure {
    /// State the run was in when the error occurred.
    pub state: RunState,
    /// The originating error's message; surfaced as the action failure reason.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Infrastructure the executor talks to, besides the strategy registry.
#[derive(Clone)]
pub struct RunPorts {
    /// Computes changed files when changed-scope reporting is on.
    pub diff_provider: Arc<dyn DiffProvider>,
    /// Groups generated docs when grouping is on.
    pub grouper: Arc<dyn DocsGrouper>,
    /// Publishes the markdown report and applies the failure policy.
    pub report_publisher: Arc<dyn ReportPublisher>,
    /// Pushes generated docs when a docs target is configured.
    pub docs_publisher: Arc<dyn DocsPublisher>,
}

/// Drives one run from configuration to published report.
pub struct RunExecutor {
    registry: StrategyRegistry,
    ports: RunPorts,
}

impl RunExecutor {
    /// Creates an executor over `registry` and `ports`.
    pub fn new(registry: StrategyRegistry, ports: RunPorts) -> Self {
        Self { registry, ports }
    }

    /// Runs every step in order.
    ///
    /// Any error ends the run: it is logged once, with the state it occurred
    /// in, and returned as a [`RunFailure`]. Nothing after the failing step
    /// runs and no partial result is returned.
    #[tracing::instrument(name = "tbdocs_run", skip_all, fields(run_id = %run_id))]
    pub async fn run(&self, config: &RunConfig, run_id: RunId) -> Result<RunSummary, RunFailure> {
        let mut state = RunState::Init;
        match self.run_steps(config, &mut state).await {
            Ok(summary) => {
                tracing::info!(
                    errors = summary.errors,
                    warnings = summary.warnings,
                    docs_pushed = summary.docs_pushed,
                    "Run completed"
                );
                Ok(summary)
            }
            Err(err) => {
                tracing::error!(state = %state, error = ?err, "Run failed: {err}");
                Err(RunFailure {
                    state,
                    message: err.to_string(),
                })
            }
        }
    }

    async fn run_steps(
        &self,
        config: &RunConfig,
        state: &mut RunState,
    ) -> Result<RunSummary, TbdocsError> {
        config.validate()?;
        tracing::info!(
            entry_points = config.entry_points.len(),
            files = ?config.entry_points.iter().map(|ep| ep.file.as_str()).collect::<Vec<_>>(),
            "Processing entry points"
        );

        *state = RunState::ResolvingScope;
        let scope = resolve_diff_scope(
            config.report_changed_scope_only,
            self.ports.diff_provider.as_ref(),
        )
        .await?;

        *state = RunState::ProcessingEntryPoints;
        let results = process_entry_points(&config.entry_points, &scope, &self.registry).await?;

        *state = RunState::Aggregating;
        let (results, markdown) = aggregate(
            results,
            config.group_docs,
            self.ports.grouper.as_ref(),
            Timestamp::now(),
        )
        .await?;

        *state = RunState::Publishing;
        let docs_pushed = publish(
            &results,
            &markdown,
            config.failure_policy,
            config.docs_target.as_ref(),
            self.ports.report_publisher.as_ref(),
            self.ports.docs_publisher.as_ref(),
        )
        .await?;

        *state = RunState::Done;
        let (errors, warnings) = total_findings(&results);
        Ok(RunSummary {
            results,
            markdown,
            errors,
            warnings,
            docs_pushed,
        })
    }
}
