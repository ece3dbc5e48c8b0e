//! GitHub Actions run context.
//!
//! Everything the adapter needs to know about the workflow run it executes in,
//! read from the `GITHUB_*` environment variables and the event payload file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use pipeline::{ArtifactPath, CommitSha, PullRequestNumber, RepositoryId};

use crate::GithubError;

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_SERVER_URL: &str = "https://github.com";

/// The event that triggered the workflow, reduced to what tbdocs uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GithubEvent {
    /// `pull_request` / `pull_request_target`.
    PullRequest {
        /// PR number.
        number: PullRequestNumber,
        /// Base commit of the PR.
        base_sha: CommitSha,
        /// Head commit of the PR.
        head_sha: CommitSha,
    },
    /// `push`.
    Push {
        /// Commit before the push; `None` when the push created the branch.
        before: Option<CommitSha>,
        /// Commit after the push.
        after: CommitSha,
    },
    /// Any other event (`workflow_dispatch`, `schedule`, ...).
    Other,
}

/// The workflow run context.
#[derive(Debug, Clone)]
pub struct GithubContext {
    /// Repository the workflow runs in.
    pub repository: RepositoryId,
    /// REST API base URL (GHES aware).
    pub api_url: String,
    /// Web/Git base URL (GHES aware).
    pub server_url: String,
    /// Raw `GITHUB_EVENT_NAME`.
    pub event_name: String,
    /// Parsed triggering event.
    pub event: GithubEvent,
    /// Commit the workflow runs on.
    pub sha: Option<CommitSha>,
    /// Job summary file, when the runner provides one.
    pub step_summary: Option<PathBuf>,
    /// Repository checkout (`GITHUB_WORKSPACE`); the working directory when unset.
    pub workspace: Option<PathBuf>,
}

impl GithubContext {
    /// Reads the context from the process environment.
    ///
    /// # Errors
    ///
    /// See [`GithubContext::from_lookup`].
    pub fn from_env() -> Result<Self, GithubError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the context through `lookup` (an environment accessor).
    ///
    /// # Errors
    ///
    /// [`GithubError::MissingEnv`] without `GITHUB_REPOSITORY`,
    /// [`GithubError::InvalidEnv`] if it is not `owner/repo`, and
    /// [`GithubError::Event`] if the event payload cannot be read or parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GithubError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let raw_repo = non_empty("GITHUB_REPOSITORY").ok_or(GithubError::MissingEnv {
            name: "GITHUB_REPOSITORY",
        })?;
        let repository = RepositoryId::new(raw_repo.trim())
            .filter(|r| r.owner_and_name().is_some())
            .ok_or_else(|| GithubError::InvalidEnv {
                name: "GITHUB_REPOSITORY",
                message: format!("expected owner/repo, got '{raw_repo}'"),
            })?;

        let event_name = non_empty("GITHUB_EVENT_NAME").unwrap_or_default();
        let event = match non_empty("GITHUB_EVENT_PATH") {
            Some(path) => {
                let payload = std::fs::read_to_string(&path).map_err(|e| GithubError::Event {
                    message: format!("reading {path}: {e}"),
                })?;
                parse_event(&event_name, &payload)?
            }
            None => GithubEvent::Other,
        };

        Ok(Self {
            repository,
            api_url: non_empty("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            server_url: non_empty("GITHUB_SERVER_URL")
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            event_name,
            event,
            sha: non_empty("GITHUB_SHA").and_then(CommitSha::new),
            step_summary: non_empty("GITHUB_STEP_SUMMARY").map(PathBuf::from),
            workspace: non_empty("GITHUB_WORKSPACE").map(PathBuf::from),
        })
    }

    /// Where `project_root` sits inside the repository checkout.
    ///
    /// GitHub reports paths relative to the repository root while tbdocs works
    /// relative to the project; this prefix converts between the two. `None`
    /// when the project is the repository root.
    ///
    /// # Errors
    ///
    /// [`GithubError::InvalidEnv`] if either directory cannot be resolved or the
    /// project lies outside the checkout.
    pub fn project_prefix(&self, project_root: &Path) -> Result<Option<ArtifactPath>, GithubError> {
        let invalid = |message: String| GithubError::InvalidEnv {
            name: "project-path",
            message,
        };
        let cwd = std::env::current_dir()
            .map_err(|e| invalid(format!("reading the working directory: {e}")))?;
        let project = std::fs::canonicalize(cwd.join(project_root))
            .map_err(|e| invalid(format!("{}: {e}", project_root.display())))?;
        let checkout = self.workspace.clone().unwrap_or(cwd);
        let checkout = std::fs::canonicalize(&checkout)
            .map_err(|e| invalid(format!("{}: {e}", checkout.display())))?;

        let relative = project.strip_prefix(&checkout).map_err(|_| {
            invalid(format!(
                "{} is outside the repository checkout {}",
                project.display(),
                checkout.display()
            ))
        })?;
        Ok(ArtifactPath::normalized(relative.to_string_lossy()))
    }

    /// The pull request the run belongs to, if any.
    pub fn pull_request(&self) -> Option<PullRequestNumber> {
        match self.event {
            GithubEvent::PullRequest { number, .. } => Some(number),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Event payload
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct EventPayload {
    pull_request: Option<PullRequestPayload>,
    before: Option<String>,
    after: Option<String>,
}

#[derive(Deserialize)]
struct PullRequestPayload {
    number: u64,
    base: RefPayload,
    head: RefPayload,
}

#[derive(Deserialize)]
struct RefPayload {
    sha: String,
}

/// Parses a webhook payload for `event_name`.
///
/// # Errors
///
/// [`GithubError::Event`] if the JSON is malformed or lacks the fields the
/// event requires.
pub fn parse_event(event_name: &str, payload: &str) -> Result<GithubEvent, GithubError> {
    let parsed: EventPayload = serde_json::from_str(payload).map_err(|e| GithubError::Event {
        message: format!("invalid {event_name} payload: {e}"),
    })?;

    let missing = |field: &str| GithubError::Event {
        message: format!("{event_name} payload has no {field}"),
    };

    match event_name {
        "pull_request" | "pull_request_target" => {
            let pr = parsed.pull_request.ok_or_else(|| missing("pull_request"))?;
            Ok(GithubEvent::PullRequest {
                number: PullRequestNumber::new(pr.number),
                base_sha: CommitSha::new(pr.base.sha).ok_or_else(|| missing("base sha"))?,
                head_sha: CommitSha::new(pr.head.sha).ok_or_else(|| missing("head sha"))?,
            })
        }
        "push" => {
            let after = parsed
                .after
                .and_then(CommitSha::new)
                .ok_or_else(|| missing("after"))?;
            let before = parsed
                .before
                .filter(|sha| !sha.chars().all(|c| c == '0'))
                .and_then(CommitSha::new);
            Ok(GithubEvent::Push { before, after })
        }
        _ => Ok(GithubEvent::Other),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const PR_PAYLOAD: &str = r#"{
        "action": "synchronize",
        "number": 42,
        "pull_request": {
            "number": 42,
            "base": { "sha": "aaa111", "ref": "main" },
            "head": { "sha": "bbb222", "ref": "feature" }
        }
    }"#;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn parses_pull_request_events() {
        let event = parse_event("pull_request", PR_PAYLOAD).unwrap();
        assert_eq!(
            event,
            GithubEvent::PullRequest {
                number: PullRequestNumber::new(42),
                base_sha: CommitSha::new("aaa111").unwrap(),
                head_sha: CommitSha::new("bbb222").unwrap(),
            }
        );
    }

    #[test]
    fn branch_creating_pushes_have_no_base() {
        let payload = r#"{ "before": "0000000000000000000000000000000000000000", "after": "ccc333" }"#;
        assert_eq!(
            parse_event("push", payload).unwrap(),
            GithubEvent::Push {
                before: None,
                after: CommitSha::new("ccc333").unwrap(),
            }
        );
    }

    #[test]
    fn pull_request_events_without_pull_request_are_rejected() {
        assert!(matches!(
            parse_event("pull_request", "{}"),
            Err(GithubError::Event { .. })
        ));
    }

    #[test]
    fn other_events_need_nothing() {
        assert_eq!(parse_event("workflow_dispatch", "{}").unwrap(), GithubEvent::Other);
    }

    #[test]
    fn context_reads_environment_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let event_path = dir.path().join("event.json");
        std::fs::write(&event_path, PR_PAYLOAD).unwrap();
        let event_path = event_path.to_string_lossy().into_owned();

        let ctx = GithubContext::from_lookup(lookup(&[
            ("GITHUB_REPOSITORY", "acme/widgets"),
            ("GITHUB_EVENT_NAME", "pull_request"),
            ("GITHUB_EVENT_PATH", event_path.as_str()),
            ("GITHUB_API_URL", "https://ghes.example.com/api/v3/"),
            ("GITHUB_STEP_SUMMARY", ""),
        ]))
        .unwrap();

        assert_eq!(ctx.repository.as_str(), "acme/widgets");
        assert_eq!(ctx.api_url, "https://ghes.example.com/api/v3");
        assert_eq!(ctx.server_url, "https://github.com");
        assert_eq!(ctx.pull_request(), Some(PullRequestNumber::new(42)));
        assert!(ctx.step_summary.is_none());
        assert!(ctx.sha.is_none());
    }

    #[test]
    fn project_prefix_is_relative_to_the_workspace() {
        let checkout = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(checkout.path().join("packages/api")).unwrap();
        let workspace = checkout.path().to_string_lossy().into_owned();
        let ctx = GithubContext::from_lookup(lookup(&[
            ("GITHUB_REPOSITORY", "acme/widgets"),
            ("GITHUB_WORKSPACE", workspace.as_str()),
        ]))
        .unwrap();

        let prefix = ctx
            .project_prefix(&checkout.path().join("packages/api"))
            .unwrap();
        assert_eq!(prefix.unwrap().as_str(), "packages/api");
        assert!(ctx.project_prefix(checkout.path()).unwrap().is_none());

        let elsewhere = tempfile::tempdir().unwrap();
        assert!(matches!(
            ctx.project_prefix(elsewhere.path()),
            Err(GithubError::InvalidEnv { name: "project-path", .. })
        ));
    }

    #[test]
    fn context_requires_a_repository() {
        let err = GithubContext::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, GithubError::MissingEnv { name: "GITHUB_REPOSITORY" }));

        let err = GithubContext::from_lookup(lookup(&[("GITHUB_REPOSITORY", "widgets")])).unwrap_err();
        assert!(matches!(err, GithubError::InvalidEnv { .. }));
    }
}
