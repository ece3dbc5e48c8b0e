//! Action inputs.
//!
//! GitHub Actions exposes each `with:` input as an `INPUT_<NAME>` environment
//! variable (upper-cased, hyphens kept). Every input is also accepted as a
//! command-line flag for local runs.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

use pipeline::{
    ArtifactPath, BranchName, DocsTarget, EntryPoint, FailurePolicy, RepositoryId, RunConfig,
    DEFAULT_DOCS_TARGET_BRANCH, DEFAULT_DOCS_TARGET_PATH,
};

/// Lints TypeScript API docs, generates markdown docs, and publishes both.
#[derive(Debug, Clone, Parser)]
#[command(name = "tbdocs", version, about)]
pub struct Cli {
    /// Entry points as a YAML or JSON list of `{file, docsReporter, docsReporterIgnore, docsGenerator}`.
    #[arg(long, env = "INPUT_ENTRY-POINTS")]
    pub entry_points: String,

    /// Root of the project to document; tools run here.
    #[arg(long, env = "INPUT_PROJECT-PATH", default_value = ".")]
    pub project_path: PathBuf,

    /// Only report findings in files changed by the triggering PR or push.
    #[arg(
        long,
        env = "INPUT_REPORT-CHANGED-SCOPE-ONLY",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub report_changed_scope_only: bool,

    /// Fail the run when any report has errors.
    #[arg(
        long,
        env = "INPUT_FAIL-ON-ERROR",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub fail_on_error: bool,

    /// Fail the run when any report has warnings.
    #[arg(
        long,
        env = "INPUT_FAIL-ON-WARNINGS",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub fail_on_warnings: bool,

    /// Group the generated docs of all entry points under one directory.
    #[arg(
        long,
        env = "INPUT_GROUP-DOCS",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub group_docs: bool,

    /// Repository (`owner/repo`) receiving the generated docs; empty disables the push.
    #[arg(long, env = "INPUT_DOCS-TARGET-OWNER-REPO", default_value = "")]
    pub docs_target_owner_repo: String,

    /// Branch the docs commit lands on.
    #[arg(long, env = "INPUT_DOCS-TARGET-BRANCH", default_value = DEFAULT_DOCS_TARGET_BRANCH)]
    pub docs_target_branch: String,

    /// Base branch of the docs pull request; empty opens no pull request.
    #[arg(long, env = "INPUT_DOCS-TARGET-PR-BASE-BRANCH", default_value = "")]
    pub docs_target_pr_base_branch: String,

    /// Directory in the target repository that receives the docs.
    #[arg(long, env = "INPUT_DOCS-TARGET-PATH", default_value = DEFAULT_DOCS_TARGET_PATH)]
    pub docs_target_path: String,

    /// Where the markdown report is written, relative to the project path; empty skips it.
    #[arg(long, env = "INPUT_REPORT-FILE", default_value = ".tbdocs/docs-report.md")]
    pub report_file: String,

    /// GitHub token; falls back to `GITHUB_TOKEN`.
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "TBDOCS_LOG_JSON")]
    pub log_json: bool,
}

impl Cli {
    /// Builds the run configuration from the inputs.
    ///
    /// Cross-field rules are left to [`RunConfig::validate`], which the
    /// executor applies before doing any work.
    pub fn run_config(&self) -> anyhow::Result<RunConfig> {
        Ok(RunConfig {
            report_changed_scope_only: self.report_changed_scope_only,
            docs_target: self.docs_target()?,
            failure_policy: FailurePolicy {
                fail_on_error: self.fail_on_error,
                fail_on_warnings: self.fail_on_warnings,
            },
            group_docs: self.group_docs,
            entry_points: parse_entry_points(&self.entry_points)?,
        })
    }

    fn docs_target(&self) -> anyhow::Result<Option<DocsTarget>> {
        let owner_repo = self.docs_target_owner_repo.trim();
        if owner_repo.is_empty() {
            return Ok(None);
        }
        let repository =
            RepositoryId::new(owner_repo).context("docs-target-owner-repo must not be empty")?;
        let branch = BranchName::new(self.docs_target_branch.trim())
            .context("docs-target-branch must not be empty")?;
        let path = ArtifactPath::normalized(self.docs_target_path.trim())
            .context("docs-target-path must not be empty")?;
        Ok(Some(DocsTarget {
            repository,
            branch,
            pr_base_branch: BranchName::new(self.docs_target_pr_base_branch.trim()),
            path,
        }))
    }

    /// Absolute-or-relative report file location, `None` when disabled.
    pub fn report_file_path(&self) -> Option<PathBuf> {
        let file = self.report_file.trim();
        if file.is_empty() {
            return None;
        }
        let file = Path::new(file);
        Some(if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.project_path.join(file)
        })
    }

    /// The explicit token input, or `GITHUB_TOKEN`.
    pub fn github_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }
}

/// Parses the `entry-points` input. JSON is accepted as a YAML subset.
pub fn parse_entry_points(raw: &str) -> anyhow::Result<Vec<EntryPoint>> {
    if raw.trim().is_empty() {
        bail!("entry-points input is empty");
    }
    serde_yaml::from_str(raw).context("invalid entry-points input")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{GeneratorKind, ReporterKind};

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["tbdocs", "--entry-points=- file: src/index.ts"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_the_action_inputs() {
        let cli = parse(&[]);
        let config = cli.run_config().unwrap();

        assert!(config.report_changed_scope_only);
        assert!(config.failure_policy.fail_on_error);
        assert!(!config.failure_policy.fail_on_warnings);
        assert!(!config.group_docs);
        assert!(config.docs_target.is_none());
        assert_eq!(
            cli.report_file_path(),
            Some(PathBuf::from("./.tbdocs/docs-report.md"))
        );
    }

    #[test]
    fn booleans_accept_action_spellings() {
        let cli = parse(&[
            "--fail-on-error",
            "no",
            "--fail-on-warnings",
            "yes",
            "--group-docs",
            "1",
            "--report-changed-scope-only",
            "false",
        ]);
        assert!(!cli.fail_on_error);
        assert!(cli.fail_on_warnings);
        assert!(cli.group_docs);
        assert!(!cli.report_changed_scope_only);
    }

    #[test]
    fn entry_points_parse_from_yaml_and_json() {
        let yaml = "
- file: packages/api/src/index.ts
  docsReporter: api-extractor
  docsReporterIgnore: [ae-missing-release-tag]
  docsGenerator: typedoc-markdown
- file: packages/crypto/src/index.ts
";
        let eps = parse_entry_points(yaml).unwrap();
        assert_eq!(eps.len(), 2);
        assert_eq!(eps[0].docs_reporter, Some(ReporterKind::ApiExtractor));
        assert_eq!(eps[0].docs_reporter_ignore, vec!["ae-missing-release-tag"]);
        assert_eq!(eps[0].docs_generator, Some(GeneratorKind::TypedocMarkdown));
        assert!(eps[1].is_passive());

        let json = r#"[{"file":"src/index.ts","docsGenerator":"typedoc-markdown"}]"#;
        assert_eq!(parse_entry_points(json).unwrap().len(), 1);
    }

    #[test]
    fn unknown_strategies_and_fields_are_rejected() {
        assert!(parse_entry_points("- file: a.ts\n  docsReporter: eslint").is_err());
        assert!(parse_entry_points("- file: a.ts\n  reporter: api-extractor").is_err());
        assert!(parse_entry_points("  ").is_err());
    }

    #[test]
    fn docs_target_is_built_from_its_inputs() {
        let cli = parse(&[
            "--docs-target-owner-repo",
            "acme/developer-site",
            "--docs-target-pr-base-branch",
            "main",
            "--docs-target-path",
            "./site/docs",
        ]);
        let target = cli.run_config().unwrap().docs_target.unwrap();
        assert_eq!(target.repository.as_str(), "acme/developer-site");
        assert_eq!(target.branch.as_str(), DEFAULT_DOCS_TARGET_BRANCH);
        assert_eq!(target.pr_base_branch.unwrap().as_str(), "main");
        assert_eq!(target.path.as_str(), "site/docs");
    }

    #[test]
    fn empty_report_file_disables_it() {
        let cli = parse(&["--report-file", "", "--project-path", "/work"]);
        assert_eq!(cli.report_file_path(), None);

        let cli = parse(&["--report-file", "out/report.md", "--project-path", "/work"]);
        assert_eq!(cli.report_file_path(), Some(PathBuf::from("/work/out/report.md")));
    }
}
