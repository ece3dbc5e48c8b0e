//! tbdocs CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse inputs**: action inputs from `INPUT_*` variables or flags
//!    ([`config::Cli`]), turned into a [`pipeline::RunConfig`].
//! 2. **Wire observability**: `tracing-subscriber` to stderr, plus an
//!    OpenTelemetry OTLP exporter when configured ([`telemetry`]).
//! 3. **Construct infrastructure**: the process runner, docs strategies,
//!    grouper, and GitHub adapters, injected into [`nodes::RunExecutor`].
//! 4. **Report the outcome**: a failed run prints `::error::<message>` and
//!    exits with status 1.

mod config;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use github::{
    GitDocsPublisher, GithubClient, GithubContext, GithubDiffProvider, GithubReportPublisher,
};
use nodes::{RunExecutor, RunPorts, RunSummary};
use pipeline::RunId;
use toolchain::{default_registry, CommandRunner, FsDocsGrouper, ProcessRunner};

use crate::config::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = match telemetry::init(cli.log_json) {
        Ok(t) => t,
        Err(e) => {
            set_failed(&format!("{e:#}"));
            return ExitCode::FAILURE;
        }
    };

    let code = match run(cli).await {
        Ok(summary) => {
            tracing::info!(
                entry_points = summary.results.len(),
                errors = summary.errors,
                warnings = summary.warnings,
                docs_pushed = summary.docs_pushed,
                "tbdocs finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            set_failed(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}

async fn run(cli: Cli) -> anyhow::Result<RunSummary> {
    let config = cli.run_config()?;
    let project_root = cli.project_path.clone();
    let token = cli.github_token();

    let context = GithubContext::from_env().context("reading GitHub Actions context")?;
    let client = GithubClient::new(&context.api_url, token.as_deref())?;
    let project_prefix = context.project_prefix(&project_root)?;
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);

    let ports = RunPorts {
        diff_provider: Arc::new(
            GithubDiffProvider::new(context.clone(), client.clone())
                .with_project_prefix(project_prefix.clone()),
        ),
        grouper: Arc::new(FsDocsGrouper::new(&project_root)),
        report_publisher: Arc::new(GithubReportPublisher::new(
            context.clone(),
            client.clone(),
            cli.report_file_path(),
        )
        .with_project_prefix(project_prefix)),
        docs_publisher: Arc::new(GitDocsPublisher::new(
            context,
            client,
            runner.clone(),
            &project_root,
            token,
        )),
    };
    let executor = RunExecutor::new(default_registry(&project_root, runner), ports);

    let run_id = RunId::new_random();
    tracing::info!(%run_id, project = %project_root.display(), "Starting tbdocs");
    Ok(executor.run(&config, run_id).await?)
}

/// Marks the step failed the way `core.setFailed` does.
fn set_failed(message: &str) {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    println!("::error::{escaped}");
}
