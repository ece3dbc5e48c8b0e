//! Entry point processing.
//!
//! Runs the configured reporter and generator of every entry point, strictly
//! in configuration order. The first failure aborts the loop; later entry
//! points are never touched.

use serde::Serialize;

use pipeline::{
    ArtifactPath, DiffScope, DocsReport, EntryPoint, EntryPointResult, StrategyRegistry,
    TbdocsError,
};

/// Processes `entry_points` one after another and returns their results in
/// the same order.
///
/// # Errors
///
/// The first [`TbdocsError::Reporter`], [`TbdocsError::Generator`] or
/// [`TbdocsError::StrategyNotRegistered`] encountered.
pub async fn process_entry_points(
    entry_points: &[EntryPoint],
    scope: &DiffScope,
    registry: &StrategyRegistry,
) -> Result<Vec<EntryPointResult>, TbdocsError> {
    let mut results = Vec::with_capacity(entry_points.len());
    for entry_point in entry_points {
        results.push(process_entry_point(entry_point, scope, registry).await?);
    }
    Ok(results)
}

#[tracing::instrument(skip_all, fields(entry_point = %entry_point.file))]
async fn process_entry_point(
    entry_point: &EntryPoint,
    scope: &DiffScope,
    registry: &StrategyRegistry,
) -> Result<EntryPointResult, TbdocsError> {
    tracing::info!("Processing entry point");
    let mut result = EntryPointResult::new(entry_point.clone());

    if let Some(kind) = entry_point.docs_reporter {
        tracing::info!(reporter = %kind, "Executing docs reporter");
        let report = registry
            .reporter(kind)?
            .report(entry_point, scope, &entry_point.docs_reporter_ignore)
            .await
            .map_err(|source| TbdocsError::Reporter {
                entry_point: entry_point.file.clone(),
                reporter: kind,
                source,
            })?;
        result = result.with_report(report);
    }

    if let Some(kind) = entry_point.docs_generator {
        tracing::info!(generator = %kind, "Executing docs generator");
        let path = registry
            .generator(kind)?
            .generate(entry_point)
            .await
            .map_err(|source| TbdocsError::Generator {
                entry_point: entry_point.file.clone(),
                generator: kind,
                source,
            })?;
        result = result.with_generated_docs_path(path);
    }

    log_progress(&result);
    Ok(result)
}

#[derive(Serialize)]
struct ProgressRecord<'a> {
    entry_point: &'a ArtifactPath,
    report: Option<&'a DocsReport>,
    generated_docs_path: Option<&'a ArtifactPath>,
}

fn log_progress(result: &EntryPointResult) {
    let record = ProgressRecord {
        entry_point: &result.entry_point().file,
        report: result.report(),
        generated_docs_path: result.generated_docs_path(),
    };
    let json = serde_json::to_string_pretty(&record)
        .unwrap_or_else(|e| format!("<unserialisable progress record: {e}>"));
    tracing::info!(
        errors = result.report().map(DocsReport::errors_count),
        warnings = result.report().map(DocsReport::warnings_count),
        generated_docs_path = result.generated_docs_path().map(ArtifactPath::as_str),
        "Entry point processed:\n{json}"
    );
}
