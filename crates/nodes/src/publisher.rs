//! Publishing: the report first, then (optionally) the generated docs.

use pipeline::{
    DocsPublisher, DocsTarget, EntryPointResult, FailurePolicy, ReportPublisher, TbdocsError,
};

/// Publishes the report and, when `docs_target` is set, pushes generated docs.
///
/// Returns whether a docs push happened. The push is skipped entirely without
/// a target, and never attempted once the report publisher has failed
/// (including a failure-policy verdict).
///
/// # Errors
///
/// [`TbdocsError::Publish`] or [`TbdocsError::DocsPush`].
pub async fn publish(
    results: &[EntryPointResult],
    markdown: &str,
    policy: FailurePolicy,
    docs_target: Option<&DocsTarget>,
    report_publisher: &dyn ReportPublisher,
    docs_publisher: &dyn DocsPublisher,
) -> Result<bool, TbdocsError> {
    report_publisher
        .publish_report(results, markdown, policy)
        .await
        .map_err(|source| TbdocsError::Publish { source })?;

    let Some(target) = docs_target else {
        tracing::debug!("No docs target configured, skipping generated docs push");
        return Ok(false);
    };

    tracing::info!(
        repository = %target.repository,
        branch = %target.branch,
        "Publishing generated docs"
    );
    docs_publisher
        .publish_docs(results, target)
        .await
        .map_err(|source| TbdocsError::DocsPush { source })?;
    Ok(true)
}
