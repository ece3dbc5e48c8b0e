//! tbdocs GitHub infrastructure adapter.
//!
//! Implements the run-environment ports defined in the [`pipeline`] crate on
//! top of GitHub Actions and the GitHub REST API:
//!
//! - [`GithubDiffProvider`] (`DiffProvider`): files changed by the triggering
//!   pull request or push.
//! - [`GithubReportPublisher`] (`ReportPublisher`): report file, job summary,
//!   workflow annotations, and a sticky PR comment.
//! - [`GitDocsPublisher`] (`DocsPublisher`): pushes generated docs to a target
//!   repository branch and opens a PR for them.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. All GitHub
//! API details (pagination, authentication, workflow commands) are handled
//! here; the [`pipeline`] crate never sees them. The failure policy itself is
//! evaluated by [`pipeline::FailurePolicy`]; this crate only acts on the verdict.

pub mod client;
pub mod context;
pub mod diff;
pub mod docs_push;
pub mod report;

pub use client::{ChangedFile, GithubClient, IssueComment, PullRequestSummary};
pub use context::{parse_event, GithubContext, GithubEvent};
pub use diff::GithubDiffProvider;
pub use docs_push::GitDocsPublisher;
pub use report::{GithubReportPublisher, REPORT_COMMENT_MARKER};

use pipeline::ToolError;
use thiserror::Error;

/// Errors raised while talking to GitHub or reading the Actions environment.
#[derive(Debug, Error)]
pub enum GithubError {
    /// A required `GITHUB_*` variable is not set.
    #[error("Environment variable {name} is not set")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },

    /// A variable or input is set but unusable.
    #[error("Invalid {name}: {message}")]
    InvalidEnv {
        /// Variable or input name.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The event payload is unreadable or unsuitable.
    #[error("{message}")]
    Event {
        /// Description.
        message: String,
    },

    /// The request never produced a response.
    #[error("GitHub request failed: {message}")]
    Http {
        /// Transport error.
        message: String,
    },

    /// GitHub answered with a non-success status.
    #[error("GitHub API returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `message` field of the error body, or a body excerpt.
        message: String,
    },

    /// A success response did not have the expected shape.
    #[error("Unexpected GitHub response: {message}")]
    Decode {
        /// Decoder message.
        message: String,
    },
}

impl From<reqwest::Error> for GithubError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GithubError::Decode {
                message: e.to_string(),
            }
        } else {
            GithubError::Http {
                message: e.to_string(),
            }
        }
    }
}

impl From<GithubError> for ToolError {
    fn from(e: GithubError) -> Self {
        match e {
            GithubError::Api { status, message } => ToolError::Api { status, message },
            GithubError::Decode { message } => ToolError::Parse {
                what: "GitHub response".to_string(),
                message,
            },
            other => ToolError::failed(other.to_string()),
        }
    }
}
