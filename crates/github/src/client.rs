//! Minimal GitHub REST client.
//!
//! Covers only the endpoints tbdocs calls: PR files, commit comparison, issue
//! comments, and pull requests. Pagination is followed where GitHub pages the
//! results; rate limiting and retries are not handled.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use pipeline::{BranchName, CommentId, CommitSha, PullRequestNumber, RepositoryId};

use crate::GithubError;

const PER_PAGE: usize = 100;
const API_VERSION: &str = "2022-11-28";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A file entry of a PR or a commit comparison.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangedFile {
    /// Path relative to the repository root.
    pub filename: String,
    /// `added`, `removed`, `modified`, `renamed`, ...
    pub status: String,
}

impl ChangedFile {
    /// Returns `true` unless the file was deleted.
    pub fn still_exists(&self) -> bool {
        self.status != "removed"
    }
}

#[derive(Deserialize)]
struct Comparison {
    #[serde(default)]
    files: Vec<ChangedFile>,
}

/// An issue (or PR conversation) comment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueComment {
    /// Comment id.
    pub id: CommentId,
    /// Markdown body; absent for some bot-deleted comments.
    #[serde(default)]
    pub body: Option<String>,
}

/// The parts of a pull request tbdocs reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestSummary {
    /// PR number.
    pub number: PullRequestNumber,
    /// Web URL of the PR.
    pub html_url: String,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct NewPullRequest<'a> {
    title: &'a str,
    head: &'a str,
    base: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated GitHub REST client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
}

impl GithubClient {
    /// Creates a client for `api_url`, authenticating with `token` when given.
    ///
    /// # Errors
    ///
    /// [`GithubError::InvalidEnv`] if the token cannot be used in a header,
    /// [`GithubError::Http`] if the HTTP client cannot be built.
    pub fn new(api_url: impl Into<String>, token: Option<&str>) -> Result<Self, GithubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("tbdocs/", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                GithubError::InvalidEnv {
                    name: "token",
                    message: "token contains characters not allowed in a header".to_string(),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(GithubError::from)?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, GithubError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.api_url);
        tracing::debug!(%method, %url, "GitHub API request");
        let mut req = self.http.request(method, &url).query(query);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(api_error(status, &text));
        }
        Ok(resp.json::<T>().await?)
    }

    async fn get_paged<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, GithubError> {
        let mut all = Vec::new();
        for page in 1.. {
            let items: Vec<T> = self
                .request::<(), _>(
                    Method::GET,
                    path,
                    &[("per_page", PER_PAGE.to_string()), ("page", page.to_string())],
                    None,
                )
                .await?;
            let last = items.len() < PER_PAGE;
            all.extend(items);
            if last {
                break;
            }
        }
        Ok(all)
    }

    /// Every file touched by a pull request.
    pub async fn pull_request_files(
        &self,
        repo: &RepositoryId,
        number: PullRequestNumber,
    ) -> Result<Vec<ChangedFile>, GithubError> {
        self.get_paged(&format!("/repos/{repo}/pulls/{number}/files"))
            .await
    }

    /// Files changed between two commits (GitHub caps this at 300 files).
    pub async fn compare_commits(
        &self,
        repo: &RepositoryId,
        base: &CommitSha,
        head: &CommitSha,
    ) -> Result<Vec<ChangedFile>, GithubError> {
        let comparison: Comparison = self
            .request::<(), _>(
                Method::GET,
                &format!("/repos/{repo}/compare/{base}...{head}"),
                &[],
                None,
            )
            .await?;
        Ok(comparison.files)
    }

    /// Every comment on an issue or pull request.
    pub async fn issue_comments(
        &self,
        repo: &RepositoryId,
        number: PullRequestNumber,
    ) -> Result<Vec<IssueComment>, GithubError> {
        self.get_paged(&format!("/repos/{repo}/issues/{number}/comments"))
            .await
    }

    /// Adds a comment to an issue or pull request.
    pub async fn create_issue_comment(
        &self,
        repo: &RepositoryId,
        number: PullRequestNumber,
        body: &str,
    ) -> Result<IssueComment, GithubError> {
        self.request(
            Method::POST,
            &format!("/repos/{repo}/issues/{number}/comments"),
            &[],
            Some(&CommentBody { body }),
        )
        .await
    }

    /// Replaces the body of an existing comment.
    pub async fn update_issue_comment(
        &self,
        repo: &RepositoryId,
        id: CommentId,
        body: &str,
    ) -> Result<IssueComment, GithubError> {
        self.request(
            Method::PATCH,
            &format!("/repos/{repo}/issues/comments/{id}"),
            &[],
            Some(&CommentBody { body }),
        )
        .await
    }

    /// Open pull requests from `head` (`owner:branch`) into `base`.
    pub async fn open_pull_requests(
        &self,
        repo: &RepositoryId,
        head: &str,
        base: &BranchName,
    ) -> Result<Vec<PullRequestSummary>, GithubError> {
        self.request::<(), _>(
            Method::GET,
            &format!("/repos/{repo}/pulls"),
            &[
                ("state", "open".to_string()),
                ("head", head.to_string()),
                ("base", base.to_string()),
            ],
            None,
        )
        .await
    }

    /// Opens a pull request from `head` into `base`.
    pub async fn create_pull_request(
        &self,
        repo: &RepositoryId,
        title: &str,
        head: &BranchName,
        base: &BranchName,
        body: &str,
    ) -> Result<PullRequestSummary, GithubError> {
        self.request(
            Method::POST,
            &format!("/repos/{repo}/pulls"),
            &[],
            Some(&NewPullRequest {
                title,
                head: head.as_str(),
                base: base.as_str(),
                body,
            }),
        )
        .await
    }
}

fn api_error(status: StatusCode, body: &str) -> GithubError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.chars().take(500).collect());
    GithubError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_use_the_github_message() {
        let err = api_error(
            StatusCode::NOT_FOUND,
            r#"{"message":"Not Found","documentation_url":"https://docs.github.com"}"#,
        );
        assert_eq!(err.to_string(), "GitHub API returned 404: Not Found");

        let err = api_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(err.to_string().ends_with("<html>bad gateway</html>"));
    }

    #[test]
    fn removed_files_do_not_exist_anymore() {
        let files: Vec<ChangedFile> = serde_json::from_str(
            r#"[{"filename":"a.ts","status":"modified"},{"filename":"b.ts","status":"removed"}]"#,
        )
        .unwrap();
        let kept: Vec<_> = files.iter().filter(|f| f.still_exists()).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].filename, "a.ts");
    }

    #[test]
    fn clients_build_with_and_without_token() {
        assert!(GithubClient::new("https://api.github.com/", Some("ghs_abc")).is_ok());
        assert!(GithubClient::new("https://api.github.com", None).is_ok());
        assert!(GithubClient::new("https://api.github.com", Some("bad\ntoken")).is_err());
    }
}
