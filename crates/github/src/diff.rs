//! Changed files of the triggering pull request or push.

use async_trait::async_trait;

use pipeline::{ArtifactPath, ChangedFiles, DiffProvider, ToolError};

use crate::{ChangedFile, GithubClient, GithubContext, GithubError, GithubEvent};

/// [`DiffProvider`] backed by the GitHub REST API.
///
/// Pull request events list the PR's files; push events compare the commits
/// before and after the push. Deleted files are not part of the result.
///
/// GitHub lists repository-relative paths; with a project prefix only files
/// under the project are kept, rebased onto the project root.
pub struct GithubDiffProvider {
    context: GithubContext,
    client: GithubClient,
    project_prefix: Option<ArtifactPath>,
}

impl GithubDiffProvider {
    /// A provider for the run described by `context`.
    pub fn new(context: GithubContext, client: GithubClient) -> Self {
        Self {
            context,
            client,
            project_prefix: None,
        }
    }

    /// Sets the project's location inside the repository.
    #[must_use]
    pub fn with_project_prefix(self, project_prefix: Option<ArtifactPath>) -> Self {
        Self {
            project_prefix,
            ..self
        }
    }
}

#[async_trait]
impl DiffProvider for GithubDiffProvider {
    #[tracing::instrument(skip_all, fields(event = %self.context.event_name))]
    async fn changed_files(&self) -> Result<ChangedFiles, ToolError> {
        let repo = &self.context.repository;
        let files = match &self.context.event {
            GithubEvent::PullRequest { number, .. } => {
                self.client.pull_request_files(repo, *number).await?
            }
            GithubEvent::Push {
                before: Some(before),
                after,
            } => self.client.compare_commits(repo, before, after).await?,
            GithubEvent::Push { before: None, .. } => {
                return Err(GithubError::Event {
                    message: "push created a new branch; there is no base commit to diff against"
                        .to_string(),
                }
                .into())
            }
            GithubEvent::Other => {
                return Err(GithubError::Event {
                    message: format!(
                        "changed-scope reporting needs a pull_request or push event, got '{}'",
                        self.context.event_name
                    ),
                }
                .into())
            }
        };

        let changed = existing_files(files, self.project_prefix.as_ref());
        tracing::info!(files = changed.len(), "Resolved changed files");
        Ok(changed)
    }
}

/// Keeps files that still exist after the change, normalised and made
/// relative to the project.
fn existing_files(files: Vec<ChangedFile>, project_prefix: Option<&ArtifactPath>) -> ChangedFiles {
    files
        .into_iter()
        .filter(ChangedFile::still_exists)
        .filter_map(|f| ArtifactPath::normalized(f.filename))
        .filter_map(|path| match project_prefix {
            None => Some(path),
            Some(prefix) => path
                .as_str()
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .and_then(ArtifactPath::new),
        })
        .collect()
}
