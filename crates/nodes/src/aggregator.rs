//! Report aggregation: optional docs grouping, then markdown rendering.

use pipeline::{render_report_markdown, DocsGrouper, EntryPointResult, TbdocsError, Timestamp};

/// Groups generated docs (when `group_docs` is set) and renders the report.
///
/// Grouping runs before rendering, so the markdown references the grouped
/// locations. Returns the possibly relocated results alongside the markdown.
///
/// # Errors
///
/// [`TbdocsError::Grouping`] if the grouper fails.
pub async fn aggregate(
    results: Vec<EntryPointResult>,
    group_docs: bool,
    grouper: &dyn DocsGrouper,
    generated_at: Timestamp,
) -> Result<(Vec<EntryPointResult>, String), TbdocsError> {
    let results = if group_docs {
        tracing::info!("Grouping generated docs");
        grouper
            .group(results)
            .await
            .map_err(|source| TbdocsError::Grouping { source })?
    } else {
        results
    };

    let markdown = render_report_markdown(&results, generated_at);
    tracing::debug!(bytes = markdown.len(), "Rendered docs report");
    Ok((results, markdown))
}
