//! Diff scope resolution.

use pipeline::{DiffProvider, DiffScope, TbdocsError};

/// Computes the scope downstream steps work in.
///
/// With `changed_scope_only` unset the provider is never called and the scope
/// is [`DiffScope::All`].
///
/// # Errors
///
/// [`TbdocsError::DiffScope`] if the provider fails.
pub async fn resolve_diff_scope(
    changed_scope_only: bool,
    provider: &dyn DiffProvider,
) -> Result<DiffScope, TbdocsError> {
    if !changed_scope_only {
        tracing::info!("Reporting on all files");
        return Ok(DiffScope::All);
    }

    let files = provider
        .changed_files()
        .await
        .map_err(|source| TbdocsError::DiffScope { source })?;
    tracing::info!(changed_files = files.len(), "Reporting on changed files only");
    tracing::debug!(files = ?files.iter().map(|f| f.as_str()).collect::<Vec<_>>(), "Changed files");
    Ok(DiffScope::Changed(files))
}
