//! Directory names for per-entry-point tool output.

use std::path::{Path, PathBuf};

use pipeline::ArtifactPath;

/// Entry files that stand for the whole package, relative to its manifest.
const PACKAGE_ENTRY_STEMS: &[&str] = &["index", "src/index", "lib/index"];

/// Derives a filesystem-safe name for an entry point.
///
/// Uses the `name` of the nearest `package.json` between the entry file and
/// `project_root` (`@scope/pkg` becomes `scope-pkg`). Entry points other than
/// the package's `index` get their path inside the package appended
/// (`scope-pkg-crypto` for `src/crypto.ts`), so entry points sharing a package
/// get distinct names. Without a manifest, falls back to the entry file path
/// minus its extension, with separators replaced by `-`.
pub fn docs_slug(project_root: &Path, entry_file: &ArtifactPath) -> String {
    if let Some((name, package_dir)) = nearest_package(project_root, entry_file) {
        let slug = sanitize(name.trim_start_matches('@'));
        if !slug.is_empty() {
            let inner = project_root
                .join(entry_file.as_str())
                .strip_prefix(&package_dir)
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            let inner = strip_extension(&inner);
            if inner.is_empty() || PACKAGE_ENTRY_STEMS.contains(&inner) {
                return slug;
            }
            let inner = inner
                .strip_prefix("src/")
                .or_else(|| inner.strip_prefix("lib/"))
                .unwrap_or(inner);
            return format!("{slug}-{}", sanitize(inner));
        }
    }

    sanitize(strip_extension(entry_file.as_str()))
}

fn strip_extension(file: &str) -> &str {
    match file.rfind('.') {
        Some(dot) if dot > file.rfind('/').map_or(0, |s| s + 1) => &file[..dot],
        _ => file,
    }
}

fn nearest_package(project_root: &Path, entry_file: &ArtifactPath) -> Option<(String, PathBuf)> {
    let full = project_root.join(entry_file.as_str());
    let mut dir = full.parent();
    while let Some(current) = dir {
        if !current.starts_with(project_root) {
            break;
        }
        let manifest = current.join("package.json");
        if let Ok(raw) = std::fs::read_to_string(&manifest) {
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(json) => {
                    if let Some(name) = json.get("name").and_then(|n| n.as_str()) {
                        return Some((name.to_string(), current.to_path_buf()));
                    }
                }
                Err(e) => {
                    tracing::warn!(manifest = %manifest.display(), error = %e, "Ignoring unreadable package.json");
                }
            }
        }
        dir = current.parent();
    }
    None
}

fn sanitize(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    replaced.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> ArtifactPath {
        ArtifactPath::new(p).unwrap()
    }

    #[test]
    fn uses_nearest_package_name() {
        let root = tempfile::tempdir().unwrap();
        let pkg = root.path().join("packages/api");
        std::fs::create_dir_all(pkg.join("src")).unwrap();
        std::fs::write(pkg.join("package.json"), r#"{ "name": "@web5/api" }"#).unwrap();
        std::fs::write(root.path().join("package.json"), r#"{ "name": "monorepo" }"#).unwrap();

        assert_eq!(
            docs_slug(root.path(), &path("packages/api/src/index.ts")),
            "web5-api"
        );
    }

    #[test]
    fn entry_points_sharing_a_package_get_distinct_names() {
        let root = tempfile::tempdir().unwrap();
        let pkg = root.path().join("packages/sdk");
        std::fs::create_dir_all(pkg.join("src/utils")).unwrap();
        std::fs::write(pkg.join("package.json"), r#"{ "name": "@acme/sdk" }"#).unwrap();

        let index = docs_slug(root.path(), &path("packages/sdk/src/index.ts"));
        let crypto = docs_slug(root.path(), &path("packages/sdk/src/crypto.ts"));
        let nested = docs_slug(root.path(), &path("packages/sdk/src/utils/index.ts"));

        assert_eq!(index, "acme-sdk");
        assert_eq!(crypto, "acme-sdk-crypto");
        assert_eq!(nested, "acme-sdk-utils-index");
    }

    #[test]
    fn falls_back_to_the_file_path() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(
            docs_slug(root.path(), &path("packages/api/src/index.ts")),
            "packages-api-src-index"
        );
        assert_eq!(docs_slug(root.path(), &path("lib.v2/mod")), "lib.v2-mod");
    }

    #[test]
    fn skips_manifests_without_a_name() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("src")).unwrap();
        std::fs::write(root.path().join("src/package.json"), r#"{ "private": true }"#).unwrap();
        std::fs::write(root.path().join("package.json"), r#"{ "name": "root-pkg" }"#).unwrap();

        assert_eq!(docs_slug(root.path(), &path("src/index.ts")), "root-pkg");
    }
}
