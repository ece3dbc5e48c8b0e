//! Publishing the docs report to the workflow run.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use pipeline::{
    ArtifactPath, EntryPointResult, FailurePolicy, MessageLevel, PolicyVerdict, PullRequestNumber,
    ReportMessage, ReportPublisher, ToolError,
};

use crate::{GithubClient, GithubContext, GithubError};

/// Hidden marker identifying the sticky report comment on a PR.
pub const REPORT_COMMENT_MARKER: &str = "<!-- tbdocs-report -->";

/// [`ReportPublisher`] for GitHub Actions.
///
/// In order: writes the report file, appends to the job summary, emits one
/// workflow annotation per message, upserts the sticky PR comment, and finally
/// applies the [`FailurePolicy`].
///
/// Annotation paths are repository-relative: the project prefix, if any, is
/// put in front of the project-relative message locations.
pub struct GithubReportPublisher {
    context: GithubContext,
    client: GithubClient,
    report_file: Option<PathBuf>,
    project_prefix: Option<ArtifactPath>,
}

impl GithubReportPublisher {
    /// `report_file` of `None` publishes without persisting the markdown.
    pub fn new(context: GithubContext, client: GithubClient, report_file: Option<PathBuf>) -> Self {
        Self {
            context,
            client,
            report_file,
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

    async fn write_report_file(&self, markdown: &str) -> Result<(), ToolError> {
        let Some(path) = &self.report_file else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, markdown).await.map_err(|e| ToolError::Io {
            message: format!("writing report to {}: {e}", path.display()),
        })?;
        tracing::info!(path = %path.display(), "Wrote docs report");
        Ok(())
    }

    async fn append_step_summary(&self, markdown: &str) -> Result<(), ToolError> {
        let Some(path) = &self.context.step_summary else {
            return Ok(());
        };
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(markdown.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    async fn upsert_comment(
        &self,
        number: PullRequestNumber,
        markdown: &str,
    ) -> Result<(), GithubError> {
        let repo = &self.context.repository;
        let body = comment_body(markdown);
        let existing = self
            .client
            .issue_comments(repo, number)
            .await?
            .into_iter()
            .find(|c| c.body.as_deref().is_some_and(|b| b.contains(REPORT_COMMENT_MARKER)));

        match existing {
            Some(comment) => {
                self.client.update_issue_comment(repo, comment.id, &body).await?;
                tracing::info!(pr = %number, comment = %comment.id, "Updated report comment");
            }
            None => {
                let comment = self.client.create_issue_comment(repo, number, &body).await?;
                tracing::info!(pr = %number, comment = %comment.id, "Created report comment");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ReportPublisher for GithubReportPublisher {
    #[tracing::instrument(skip_all)]
    async fn publish_report(
        &self,
        results: &[EntryPointResult],
        markdown: &str,
        policy: FailurePolicy,
    ) -> Result<(), ToolError> {
        self.write_report_file(markdown).await?;
        self.append_step_summary(markdown).await?;

        for message in results
            .iter()
            .filter_map(EntryPointResult::report)
            .flat_map(|r| r.messages())
        {
            println!("{}", annotation(message, self.project_prefix.as_ref()));
        }

        if let Some(number) = self.context.pull_request() {
            self.upsert_comment(number, markdown).await?;
        }

        match policy.evaluate(results) {
            PolicyVerdict::Pass => Ok(()),
            PolicyVerdict::Fail { errors, warnings } => {
                Err(ToolError::PolicyViolation { errors, warnings })
            }
        }
    }
}

/// Comment body: the marker followed by the report.
fn comment_body(markdown: &str) -> String {
    format!("{REPORT_COMMENT_MARKER}\n{markdown}")
}

/// Formats `message` as a `::error`/`::warning` workflow command.
fn annotation(message: &ReportMessage, project_prefix: Option<&ArtifactPath>) -> String {
    let command = match message.level {
        MessageLevel::Error => "error",
        MessageLevel::Warning => "warning",
    };
    let mut props = Vec::new();
    if let Some(location) = &message.location {
        let file = match project_prefix {
            Some(prefix) => format!("{prefix}/{}", location.path),
            None => location.path.to_string(),
        };
        props.push(format!("file={}", escape_property(&file)));
        if let Some(line) = location.line {
            props.push(format!("line={line}"));
        }
        if let Some(col) = location.column {
            props.push(format!("col={col}"));
        }
    }
    props.push(format!("title={}", escape_property(message.message_id.as_str())));
    format!("::{command} {}::{}", props.join(","), escape_data(&message.text))
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{
        ArtifactPath, DocsReport, EntryPoint, MessageId, ReporterKind, RepositoryId,
        SourceLocation,
    };

    fn message(level: MessageLevel, text: &str, line: Option<u32>) -> ReportMessage {
        ReportMessage {
            level,
            message_id: MessageId::new("ae-missing-release-tag").unwrap(),
            text: text.to_string(),
            location: Some(SourceLocation {
                path: ArtifactPath::new("src/index.ts").unwrap(),
                line,
                column: line.map(|_| 3),
            }),
        }
    }

    fn result_with(messages: Vec<ReportMessage>) -> EntryPointResult {
        let file = ArtifactPath::new("src/index.ts").unwrap();
        EntryPointResult::new(EntryPoint::new(file.clone())).with_report(DocsReport::new(
            ReporterKind::ApiExtractor,
            file,
            messages,
        ))
    }

    fn publisher(root: &std::path::Path) -> GithubReportPublisher {
        let context = GithubContext {
            repository: RepositoryId::new("acme/widgets").unwrap(),
            api_url: "http://127.0.0.1:9".to_string(),
            server_url: "https://github.com".to_string(),
            event_name: "push".to_string(),
            event: crate::GithubEvent::Other,
            sha: None,
            step_summary: Some(root.join("summary.md")),
            workspace: None,
        };
        let client = GithubClient::new(&context.api_url, None).unwrap();
        GithubReportPublisher::new(context, client, Some(root.join("out/docs-report.md")))
    }

    #[test]
    fn annotations_carry_location_and_id() {
        let msg = message(MessageLevel::Warning, "Missing release tag", Some(12));
        assert_eq!(
            annotation(&msg, None),
            "::warning file=src/index.ts,line=12,col=3,title=ae-missing-release-tag::Missing release tag"
        );
    }

    #[test]
    fn annotations_point_into_the_repository() {
        let msg = message(MessageLevel::Error, "Missing release tag", Some(4));
        let prefix = ArtifactPath::new("packages/api").unwrap();
        assert_eq!(
            annotation(&msg, Some(&prefix)),
            "::error file=packages/api/src/index.ts,line=4,col=3,title=ae-missing-release-tag::Missing release tag"
        );
    }

    #[test]
    fn annotation_text_and_properties_are_escaped() {
        let mut msg = message(MessageLevel::Error, "50% done\nnext", None);
        msg.location = None;
        msg.message_id = MessageId::new("a:b,c").unwrap();
        assert_eq!(annotation(&msg, None), "::error title=a%3Ab%2Cc::50%25 done%0Anext");
    }

    #[test]
    fn comment_body_starts_with_the_marker() {
        let body = comment_body("# TBDocs Report");
        assert!(body.starts_with(REPORT_COMMENT_MARKER));
        assert!(body.ends_with("# TBDocs Report"));
    }

    #[tokio::test]
    async fn writes_report_and_summary_outside_pull_requests() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("summary.md"), "earlier step\n").unwrap();

        publisher(root.path())
            .publish_report(&[result_with(vec![])], "# TBDocs Report", FailurePolicy::default())
            .await
            .unwrap();

        let report = std::fs::read_to_string(root.path().join("out/docs-report.md")).unwrap();
        assert_eq!(report, "# TBDocs Report");
        let summary = std::fs::read_to_string(root.path().join("summary.md")).unwrap();
        assert_eq!(summary, "earlier step\n# TBDocs Report\n");
    }

    #[tokio::test]
    async fn policy_violations_fail_after_publishing() {
        let root = tempfile::tempdir().unwrap();
        let results = [result_with(vec![
            message(MessageLevel::Warning, "w", Some(1)),
            message(MessageLevel::Error, "e", Some(2)),
        ])];
        let policy = FailurePolicy {
            fail_on_error: false,
            fail_on_warnings: true,
        };

        let err = publisher(root.path())
            .publish_report(&results, "# TBDocs Report", policy)
            .await
            .unwrap_err();

        assert_eq!(err, ToolError::PolicyViolation { errors: 1, warnings: 1 });
        assert!(root.path().join("out/docs-report.md").exists());
    }

    #[tokio::test]
    async fn errors_pass_when_the_policy_allows_them() {
        let root = tempfile::tempdir().unwrap();
        let results = [result_with(vec![message(MessageLevel::Error, "e", None)])];
        let policy = FailurePolicy {
            fail_on_error: false,
            fail_on_warnings: false,
        };

        publisher(root.path())
            .publish_report(&results, "# TBDocs Report", policy)
            .await
            .unwrap();
    }
}
