//! Pushing generated docs to a target repository.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use pipeline::{ArtifactPath, DocsPublisher, DocsTarget, EntryPointResult, ToolError};
use toolchain::{CommandOutput, CommandRunner, CommandSpec};

use crate::{GithubClient, GithubContext};

const BOT_NAME: &str = "tbdocs-bot";
const BOT_EMAIL: &str = "tbdocs-bot@users.noreply.github.com";

/// Child-process variable carrying the token to the credential helper.
const TOKEN_ENV: &str = "TBDOCS_GIT_TOKEN";
/// Answers git's credential requests from [`TOKEN_ENV`]; the token itself never
/// appears in arguments or config values.
const CREDENTIAL_HELPER: &str = r#"!f() { test "$1" = get && echo username=x-access-token && echo "password=$TBDOCS_GIT_TOKEN"; }; f"#;

/// [`DocsPublisher`] that commits generated docs with `git` and opens a pull
/// request through the REST API.
///
/// The target repository is cloned into a temporary directory. The target
/// branch is checked out, or created from `pr_base_branch` (the default branch
/// when unset) if it does not exist yet. Every entry point's docs directory
/// replaces `<target path>/<docs directory name>`.
pub struct GitDocsPublisher {
    context: GithubContext,
    client: GithubClient,
    runner: Arc<dyn CommandRunner>,
    project_root: PathBuf,
    token: Option<String>,
}

impl GitDocsPublisher {
    /// Creates a publisher; `token` authenticates both `git` and the API.
    pub fn new(
        context: GithubContext,
        client: GithubClient,
        runner: Arc<dyn CommandRunner>,
        project_root: impl Into<PathBuf>,
        token: Option<String>,
    ) -> Self {
        Self {
            context,
            client,
            runner,
            project_root: project_root.into(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn remote_url(&self, target: &DocsTarget) -> String {
        let server = self.context.server_url.trim_end_matches('/');
        format!("{server}/{}.git", target.repository)
    }

    /// A `git` command whose credentials come from the environment.
    fn git_command<I, S>(&self, cwd: &Path, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = CommandSpec::new("git", cwd)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0");
        match &self.token {
            Some(token) => spec
                .env("GIT_CONFIG_COUNT", "1")
                .env("GIT_CONFIG_KEY_0", "credential.helper")
                .env("GIT_CONFIG_VALUE_0", CREDENTIAL_HELPER)
                .env(TOKEN_ENV, token.as_str()),
            None => spec,
        }
    }

    fn redact(&self, text: &str) -> String {
        match &self.token {
            Some(token) => text.replace(token.as_str(), "***"),
            None => text.to_string(),
        }
    }

    /// Runs `git` with `args` in `cwd`, keeping the token out of errors.
    async fn git<I, S>(&self, cwd: &Path, args: I) -> Result<CommandOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = self.git_command(cwd, args);
        let output = self.runner.run(&spec).await?;
        output.check(&spec).map_err(|e| match e {
            ToolError::CommandFailed {
                program,
                code,
                stderr,
            } => ToolError::CommandFailed {
                program,
                code,
                stderr: self.redact(&stderr),
            },
            other => other,
        })
    }

    async fn checkout(&self, work: &Path, clone: &Path, target: &DocsTarget) -> Result<(), ToolError> {
        let remote = self.remote_url(target);
        let branch = target.branch.as_str();

        let heads = self
            .git(work, ["ls-remote", "--heads", remote.as_str(), branch])
            .await?;
        let clone_dir = clone.to_string_lossy().into_owned();

        if !heads.stdout.trim().is_empty() {
            self.git(
                work,
                ["clone", "--depth", "1", "--branch", branch, remote.as_str(), clone_dir.as_str()],
            )
            .await?;
            return Ok(());
        }

        let mut args = vec!["clone".to_string(), "--depth".to_string(), "1".to_string()];
        if let Some(base) = &target.pr_base_branch {
            args.push("--branch".to_string());
            args.push(base.to_string());
        }
        args.push(remote);
        args.push(clone_dir);
        self.git(work, args).await?;
        self.git(clone, ["checkout", "-b", branch]).await?;
        tracing::info!(branch, "Created docs branch");
        Ok(())
    }

    async fn open_pull_request(&self, target: &DocsTarget) -> Result<(), ToolError> {
        let Some(base) = &target.pr_base_branch else {
            return Ok(());
        };
        let owner = target
            .repository
            .owner_and_name()
            .map(|(owner, _)| owner)
            .ok_or_else(|| ToolError::failed(format!("invalid repository '{}'", target.repository)))?;
        let head = format!("{owner}:{}", target.branch);

        let open = self
            .client
            .open_pull_requests(&target.repository, &head, base)
            .await?;
        if let Some(pr) = open.first() {
            tracing::info!(pr = %pr.number, url = %pr.html_url, "Docs pull request already open");
            return Ok(());
        }

        let pr = self
            .client
            .create_pull_request(
                &target.repository,
                "Update generated API docs",
                &target.branch,
                base,
                &format!(
                    "Docs generated by tbdocs from {}{}.",
                    self.context.repository,
                    self.source_ref()
                ),
            )
            .await?;
        tracing::info!(pr = %pr.number, url = %pr.html_url, "Opened docs pull request");
        Ok(())
    }

    fn source_ref(&self) -> String {
        self.context
            .sha
            .as_ref()
            .map(|sha| format!("@{sha}"))
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocsPublisher for GitDocsPublisher {
    #[tracing::instrument(skip_all, fields(target = %target.repository, branch = %target.branch))]
    async fn publish_docs(
        &self,
        results: &[EntryPointResult],
        target: &DocsTarget,
    ) -> Result<(), ToolError> {
        let docs: Vec<&ArtifactPath> = results
            .iter()
            .filter_map(EntryPointResult::generated_docs_path)
            .collect();
        if docs.is_empty() {
            tracing::info!("No generated docs to push");
            return Ok(());
        }

        let work = tempfile::tempdir()?;
        let clone = work.path().join("target");
        self.checkout(work.path(), &clone, target).await?;

        let dest_root = clone.join(target.path.as_str());
        for path in docs {
            let src = self.project_root.join(path.as_str());
            let name = src
                .file_name()
                .ok_or_else(|| ToolError::failed(format!("docs path '{path}' has no directory name")))?;
            let dest = dest_root.join(name);
            replace_dir(src, dest).await?;
        }

        self.git(&clone, ["add", "-A"]).await?;
        let status = self.git(&clone, ["status", "--porcelain"]).await?;
        if status.stdout.trim().is_empty() {
            tracing::info!("Docs are already up to date");
            return Ok(());
        }

        let message = format!("Update generated docs from {}{}", self.context.repository, self.source_ref());
        let name = format!("user.name={BOT_NAME}");
        let email = format!("user.email={BOT_EMAIL}");
        self.git(
            &clone,
            ["-c", name.as_str(), "-c", email.as_str(), "commit", "-m", message.as_str()],
        )
        .await?;
        self.git(&clone, ["push", "origin", target.branch.as_str()]).await?;
        tracing::info!("Pushed generated docs");

        self.open_pull_request(target).await
    }
}

/// Replaces `dest` with a copy of the directory tree at `src`.
async fn replace_dir(src: PathBuf, dest: PathBuf) -> Result<(), ToolError> {
    tokio::task::spawn_blocking(move || copy_tree(&src, &dest))
        .await
        .map_err(|e| ToolError::failed(format!("copy task failed: {e}")))?
}

fn copy_tree(src: &Path, dest: &Path) -> Result<(), ToolError> {
    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    for entry in walkdir::WalkDir::new(src) {
        let entry = entry.map_err(|e| ToolError::Io {
            message: format!("walking {}: {e}", src.display()),
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| ToolError::failed(e.to_string()))?;
        let to = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&to)?;
        } else {
            if let Some(parent) = to.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &to)?;
        }
    }
    Ok(())
}
