//! Filesystem docs grouping.
//!
//! Moves the generated docs of every entry point under one directory,
//! `.tbdocs/grouped-docs/`, one sub-directory per entry point, and writes an
//! index `README.md` linking them.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::PathBuf;

use async_trait::async_trait;

use pipeline::{ArtifactPath, DocsGrouper, EntryPointResult, ToolError};

use crate::WORK_DIR;

/// Directory (under the work dir) that receives grouped docs.
pub const GROUPED_DOCS_DIR: &str = "grouped-docs";

/// [`DocsGrouper`] that relocates docs on the local filesystem.
pub struct FsDocsGrouper {
    project_root: PathBuf,
}

impl FsDocsGrouper {
    /// A grouper for the project at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }
}

#[async_trait]
impl DocsGrouper for FsDocsGrouper {
    async fn group(
        &self,
        results: Vec<EntryPointResult>,
    ) -> Result<Vec<EntryPointResult>, ToolError> {
        let group_rel = format!("{WORK_DIR}/{GROUPED_DOCS_DIR}");
        let group_dir = self.project_root.join(&group_rel);
        if tokio::fs::try_exists(&group_dir).await? {
            tokio::fs::remove_dir_all(&group_dir).await?;
        }
        tokio::fs::create_dir_all(&group_dir).await?;

        let mut used = HashSet::new();
        let mut index = String::from("# API Documentation\n\n");
        let mut grouped = Vec::with_capacity(results.len());

        for result in results {
            let Some(source) = result.generated_docs_path().cloned() else {
                grouped.push(result);
                continue;
            };

            let base = source
                .as_str()
                .rsplit('/')
                .next()
                .unwrap_or(source.as_str())
                .to_string();
            let mut slug = base.clone();
            let mut n = 2;
            while !used.insert(slug.clone()) {
                slug = format!("{base}-{n}");
                n += 1;
            }

            tokio::fs::rename(
                self.project_root.join(source.as_str()),
                group_dir.join(&slug),
            )
            .await
            .map_err(|e| ToolError::Io {
                message: format!("moving '{source}' into {group_rel}/{slug}: {e}"),
            })?;
            tracing::debug!(from = %source, to = %slug, "Grouped docs");

            let _ = writeln!(
                index,
                "- [`{}`](./{slug}/) (`{}`)",
                slug,
                result.entry_point().file
            );
            let target = ArtifactPath::new(format!("{group_rel}/{slug}"))
                .ok_or_else(|| ToolError::failed("empty grouped docs path"))?;
            grouped.push(result.with_generated_docs_path(target));
        }

        tokio::fs::write(group_dir.join("README.md"), index).await?;
        tracing::info!(groups = used.len(), dir = %group_rel, "Grouped generated docs");
        Ok(grouped)
    }
}
