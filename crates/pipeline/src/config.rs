//! Run configuration.
//!
//! [`RunConfig`] is built once at start-up (by the `cli` crate, from action
//! inputs) and passed by reference into the executor. Nothing in the workspace
//! reads configuration from ambient state after that point.

use serde::{Deserialize, Serialize};

use crate::{ArtifactPath, BranchName, EntryPoint, EntryPointResult, RepositoryId, TbdocsError};

/// Default branch generated docs are pushed to in the target repository.
pub const DEFAULT_DOCS_TARGET_BRANCH: &str = "tbdocs-bot/docs";

/// Default directory generated docs are placed under in the target repository.
pub const DEFAULT_DOCS_TARGET_PATH: &str = "docs";

// ---------------------------------------------------------------------------
// Failure policy
// ---------------------------------------------------------------------------

/// Whether report findings fail the run.
///
/// Evaluated by the report publisher only, after every entry point has been
/// processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FailurePolicy {
    /// Fail when any report has errors.
    pub fail_on_error: bool,
    /// Fail when any report has warnings.
    pub fail_on_warnings: bool,
}

/// Outcome of applying a [`FailurePolicy`] to a set of reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyVerdict {
    /// The run may succeed.
    Pass,
    /// The run must fail because of the counted findings.
    Fail {
        /// Total errors across all reports.
        errors: usize,
        /// Total warnings across all reports.
        warnings: usize,
    },
}

impl FailurePolicy {
    /// Applies the policy to every report in `results`.
    pub fn evaluate(self, results: &[EntryPointResult]) -> PolicyVerdict {
        let (errors, warnings) = total_findings(results);
        let failed =
            (self.fail_on_error && errors > 0) || (self.fail_on_warnings && warnings > 0);
        if failed {
            PolicyVerdict::Fail { errors, warnings }
        } else {
            PolicyVerdict::Pass
        }
    }
}

/// Sums `(errors, warnings)` across every report in `results`.
pub fn total_findings(results: &[EntryPointResult]) -> (usize, usize) {
    results
        .iter()
        .filter_map(EntryPointResult::report)
        .fold((0, 0), |(e, w), r| {
            (e + r.errors_count(), w + r.warnings_count())
        })
}

// ---------------------------------------------------------------------------
// Docs target
// ---------------------------------------------------------------------------

/// Where generated docs are pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocsTarget {
    /// Target repository in `owner/repo` form.
    pub repository: RepositoryId,
    /// Branch the docs commit lands on.
    pub branch: BranchName,
    /// When set, a pull request from `branch` into this branch is opened.
    pub pr_base_branch: Option<BranchName>,
    /// Directory inside the target repository that receives the docs.
    pub path: ArtifactPath,
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Process-wide configuration for one run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Restrict reports to files changed in the current change-set.
    pub report_changed_scope_only: bool,
    /// Generated docs destination; `None` disables the push.
    pub docs_target: Option<DocsTarget>,
    /// Whether findings fail the run.
    pub failure_policy: FailurePolicy,
    /// Group generated docs of all entry points before rendering the report.
    pub group_docs: bool,
    /// Entry points, processed in this order.
    pub entry_points: Vec<EntryPoint>,
}

impl RunConfig {
    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`TbdocsError::ConfigurationError`] when an entry point file
    /// appears twice, when ignore patterns are given without a reporter, or
    /// when the docs target is not in `owner/repo` form. An empty entry point
    /// list is valid and yields a report without sections.
    pub fn validate(&self) -> Result<(), TbdocsError> {
        let mut seen = std::collections::HashSet::new();
        for ep in &self.entry_points {
            if !seen.insert(&ep.file) {
                return Err(TbdocsError::ConfigurationError {
                    message: format!("entry point '{}' is configured more than once", ep.file),
                });
            }
            if ep.docs_reporter.is_none() && !ep.docs_reporter_ignore.is_empty() {
                return Err(TbdocsError::ConfigurationError {
                    message: format!(
                        "entry point '{}' sets docsReporterIgnore without a docsReporter",
                        ep.file
                    ),
                });
            }
        }

        if let Some(target) = &self.docs_target {
            if target.repository.owner_and_name().is_none() {
                return Err(TbdocsError::ConfigurationError {
                    message: format!(
                        "docs target '{}' must be in owner/repo form",
                        target.repository
                    ),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocsReport, MessageId, MessageLevel, ReportMessage, ReporterKind};

    fn path(p: &str) -> ArtifactPath {
        ArtifactPath::new(p).unwrap()
    }

    fn result_with(levels: &[MessageLevel]) -> EntryPointResult {
        let messages = levels
            .iter()
            .map(|&level| ReportMessage {
                level,
                message_id: MessageId::new("ae-x").unwrap(),
                text: String::new(),
                location: None,
            })
            .collect();
        EntryPointResult::new(EntryPoint::new(path("a.ts"))).with_report(DocsReport::new(
            ReporterKind::ApiExtractor,
            path("a.ts"),
            messages,
        ))
    }

    fn config(entry_points: Vec<EntryPoint>) -> RunConfig {
        RunConfig {
            report_changed_scope_only: false,
            docs_target: None,
            failure_policy: FailurePolicy::default(),
            group_docs: false,
            entry_points,
        }
    }

    #[test]
    fn policy_passes_when_flags_are_off() {
        let results = vec![result_with(&[MessageLevel::Error, MessageLevel::Warning])];
        assert_eq!(FailurePolicy::default().evaluate(&results), PolicyVerdict::Pass);
    }

    #[test]
    fn policy_fails_on_errors_only_when_asked() {
        let results = vec![result_with(&[MessageLevel::Warning])];
        let policy = FailurePolicy {
            fail_on_error: true,
            fail_on_warnings: false,
        };
        assert_eq!(policy.evaluate(&results), PolicyVerdict::Pass);

        let results = vec![result_with(&[MessageLevel::Error]), result_with(&[MessageLevel::Warning])];
        assert_eq!(
            policy.evaluate(&results),
            PolicyVerdict::Fail {
                errors: 1,
                warnings: 1
            }
        );
    }

    #[test]
    fn policy_fails_on_warnings_when_asked() {
        let results = vec![result_with(&[MessageLevel::Warning, MessageLevel::Warning])];
        let policy = FailurePolicy {
            fail_on_error: false,
            fail_on_warnings: true,
        };
        assert_eq!(
            policy.evaluate(&results),
            PolicyVerdict::Fail {
                errors: 0,
                warnings: 2
            }
        );
    }

    #[test]
    fn empty_entry_point_list_is_valid() {
        assert!(config(vec![]).validate().is_ok());
    }

    #[test]
    fn duplicate_entry_points_are_invalid() {
        let ep = EntryPoint::new(path("a.ts"));
        assert!(config(vec![ep.clone(), ep]).validate().is_err());
    }

    #[test]
    fn ignore_patterns_need_a_reporter() {
        let mut ep = EntryPoint::new(path("a.ts"));
        ep.docs_reporter_ignore = vec!["ae-*".to_string()];
        assert!(config(vec![ep.clone()]).validate().is_err());

        ep.docs_reporter = Some(ReporterKind::ApiExtractor);
        assert!(config(vec![ep]).validate().is_ok());
    }
}
