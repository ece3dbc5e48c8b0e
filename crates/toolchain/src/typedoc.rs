//! `typedoc-markdown` docs generator.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use pipeline::{ArtifactPath, DocsGenerator, EntryPoint, ToolError};

use crate::{docs_slug, CommandRunner, CommandSpec, WORK_DIR};

/// [`DocsGenerator`] for [`pipeline::GeneratorKind::TypedocMarkdown`].
///
/// Writes markdown docs to `.tbdocs/docs/<slug>/`, replacing earlier output.
/// Within one generator, each entry point owns its directory: a slug already
/// used by another entry point gets a `-2`, `-3`, ... suffix.
pub struct TypedocMarkdownGenerator {
    project_root: PathBuf,
    runner: Arc<dyn CommandRunner>,
    claimed: Mutex<HashMap<String, ArtifactPath>>,
}

impl TypedocMarkdownGenerator {
    /// A generator for the project at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            project_root: project_root.into(),
            runner,
            claimed: Mutex::new(HashMap::new()),
        }
    }

    /// The output directory name for `entry_file`, stable across calls.
    fn claim_slug(&self, entry_file: &ArtifactPath) -> Result<String, ToolError> {
        let base = docs_slug(&self.project_root, entry_file);
        let mut claimed = self
            .claimed
            .lock()
            .map_err(|_| ToolError::failed("docs directory registry is poisoned"))?;
        let mut slug = base.clone();
        let mut n = 2;
        while let Some(owner) = claimed.get(&slug) {
            if owner == entry_file {
                return Ok(slug);
            }
            slug = format!("{base}-{n}");
            n += 1;
        }
        claimed.insert(slug.clone(), entry_file.clone());
        Ok(slug)
    }
}

#[async_trait]
impl DocsGenerator for TypedocMarkdownGenerator {
    #[tracing::instrument(skip_all, fields(entry_point = %entry_point.file))]
    async fn generate(&self, entry_point: &EntryPoint) -> Result<ArtifactPath, ToolError> {
        let out = format!("{WORK_DIR}/docs/{}", self.claim_slug(&entry_point.file)?);
        let out_dir = self.project_root.join(&out);
        if tokio::fs::try_exists(&out_dir).await? {
            tokio::fs::remove_dir_all(&out_dir).await?;
        }

        let spec = CommandSpec::new("npx", &self.project_root)
            .args([
                "--yes",
                "--package",
                "typedoc",
                "--package",
                "typedoc-plugin-markdown",
                "typedoc",
                "--plugin",
                "typedoc-plugin-markdown",
                "--out",
            ])
            .arg(out.as_str())
            .arg(entry_point.file.as_str());
        self.runner.run(&spec).await?.check(&spec)?;

        tracing::info!(out = %out, "Generated docs");
        ArtifactPath::new(out).ok_or_else(|| ToolError::failed("empty docs output path"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{scripted, ScriptedRunner};

    fn entry_point() -> EntryPoint {
        EntryPoint::new(ArtifactPath::new("packages/api/src/index.ts").unwrap())
    }

    #[tokio::test]
    async fn returns_the_output_directory() {
        let root = tempfile::tempdir().unwrap();
        let stale = root.path().join(".tbdocs/docs/packages-api-src-index");
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("old.md"), "old").unwrap();
        let runner = scripted(0, "[info] Documentation generated", "");
        let generator = TypedocMarkdownGenerator::new(root.path(), runner.clone());

        let path = generator.generate(&entry_point()).await.unwrap();

        assert_eq!(path.as_str(), ".tbdocs/docs/packages-api-src-index");
        assert!(!stale.join("old.md").exists());
        let seen = runner.seen.lock().unwrap();
        let args = &seen[0].args;
        assert_eq!(
            &args[args.len() - 3..],
            &[
                "--out".to_string(),
                ".tbdocs/docs/packages-api-src-index".to_string(),
                "packages/api/src/index.ts".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn entry_points_of_one_package_keep_separate_output() {
        use crate::FsDocsGrouper;
        use pipeline::{DocsGrouper, EntryPointResult};

        let root = tempfile::tempdir().unwrap();
        let pkg = root.path().join("packages/sdk");
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::write(pkg.join("package.json"), r#"{ "name": "@acme/sdk" }"#).unwrap();
        let generator = TypedocMarkdownGenerator::new(root.path(), ScriptedRunner::new(vec![]));
        let index = EntryPoint::new(ArtifactPath::new("packages/sdk/src/index.ts").unwrap());
        let crypto = EntryPoint::new(ArtifactPath::new("packages/sdk/src/crypto.ts").unwrap());

        let index_docs = generator.generate(&index).await.unwrap();
        std::fs::create_dir_all(root.path().join(index_docs.as_str())).unwrap();
        std::fs::write(root.path().join(index_docs.as_str()).join("index.md"), "index").unwrap();
        let crypto_docs = generator.generate(&crypto).await.unwrap();
        std::fs::create_dir_all(root.path().join(crypto_docs.as_str())).unwrap();

        assert_eq!(index_docs.as_str(), ".tbdocs/docs/acme-sdk");
        assert_eq!(crypto_docs.as_str(), ".tbdocs/docs/acme-sdk-crypto");
        assert!(root.path().join(".tbdocs/docs/acme-sdk/index.md").exists());

        let grouped = FsDocsGrouper::new(root.path())
            .group(vec![
                EntryPointResult::new(index).with_generated_docs_path(index_docs),
                EntryPointResult::new(crypto).with_generated_docs_path(crypto_docs),
            ])
            .await
            .unwrap();
        assert_eq!(
            grouped[1].generated_docs_path().unwrap().as_str(),
            ".tbdocs/grouped-docs/acme-sdk-crypto"
        );
    }

    #[tokio::test]
    async fn colliding_slugs_are_suffixed_per_entry_point() {
        let root = tempfile::tempdir().unwrap();
        for pkg in ["one", "two"] {
            let dir = root.path().join(pkg);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("package.json"), r#"{ "name": "@acme/sdk" }"#).unwrap();
        }
        let generator = TypedocMarkdownGenerator::new(root.path(), ScriptedRunner::new(vec![]));
        let one = EntryPoint::new(ArtifactPath::new("one/index.ts").unwrap());
        let two = EntryPoint::new(ArtifactPath::new("two/index.ts").unwrap());

        assert_eq!(generator.generate(&one).await.unwrap().as_str(), ".tbdocs/docs/acme-sdk");
        assert_eq!(generator.generate(&two).await.unwrap().as_str(), ".tbdocs/docs/acme-sdk-2");
        assert_eq!(generator.generate(&one).await.unwrap().as_str(), ".tbdocs/docs/acme-sdk");
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_failure() {
        let root = tempfile::tempdir().unwrap();
        let generator = TypedocMarkdownGenerator::new(
            root.path(),
            scripted(3, "", "[error] Unable to find any entry points"),
        );

        let err = generator.generate(&entry_point()).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "`npx` failed (exit code 3): [error] Unable to find any entry points"
        );
    }
}
