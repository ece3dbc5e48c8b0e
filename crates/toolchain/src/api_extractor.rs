//! `api-extractor` docs reporter.
//!
//! Runs Microsoft API Extractor against an entry point with a generated
//! configuration and turns its diagnostics into a [`DocsReport`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use pipeline::{
    ArtifactPath, DiffScope, DocsReport, DocsReporter, EntryPoint, MessageId, MessageLevel,
    ReportMessage, ReporterKind, SourceLocation, ToolError,
};

use crate::{docs_slug, CommandRunner, CommandSpec, WORK_DIR};

/// Printed by API Extractor when it ran to the end, even with diagnostics.
const COMPLETED_MARKER: &str = "API Extractor completed";

/// [`DocsReporter`] for [`ReporterKind::ApiExtractor`].
pub struct ApiExtractorReporter {
    project_root: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl ApiExtractorReporter {
    /// A reporter for the project at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            project_root: project_root.into(),
            runner,
        }
    }

    async fn write_config(&self, entry_point: &EntryPoint) -> Result<PathBuf, ToolError> {
        let dir = self.project_root.join(WORK_DIR).join("api-extractor");
        tokio::fs::create_dir_all(&dir).await?;
        let config_path = dir.join(format!("{}.json", docs_slug(&self.project_root, &entry_point.file)));

        let config = extractor_config(&self.project_root, &entry_point.file);
        let body = serde_json::to_string_pretty(&config).map_err(|e| ToolError::Parse {
            what: "API Extractor config".to_string(),
            message: e.to_string(),
        })?;
        tokio::fs::write(&config_path, body).await?;
        Ok(config_path)
    }
}

#[async_trait]
impl DocsReporter for ApiExtractorReporter {
    #[tracing::instrument(skip_all, fields(entry_point = %entry_point.file))]
    async fn report(
        &self,
        entry_point: &EntryPoint,
        scope: &DiffScope,
        ignore: &[String],
    ) -> Result<DocsReport, ToolError> {
        let ignore = compile_ignore_patterns(ignore)?;
        let config_path = self.write_config(entry_point).await?;

        let spec = CommandSpec::new("npx", &self.project_root)
            .args(["--yes", "@microsoft/api-extractor", "run", "--local", "--config"])
            .path_arg(&config_path);
        let output = self.runner.run(&spec).await?;

        let combined = format!("{}\n{}", output.stdout, output.stderr);
        let diagnostics = parse_diagnostics(&combined, &self.project_root);
        if !output.success() && diagnostics.is_empty() && !combined.contains(COMPLETED_MARKER) {
            return Err(output.into_error(&spec));
        }

        let total = diagnostics.len();
        let messages: Vec<ReportMessage> = diagnostics
            .into_iter()
            .filter(|m| m.location.as_ref().map_or(true, |l| scope.includes(&l.path)))
            .filter(|m| !ignore.iter().any(|p| p.matches(m.message_id.as_str())))
            .collect();
        tracing::info!(
            diagnostics = total,
            kept = messages.len(),
            "API Extractor finished"
        );

        Ok(DocsReport::new(
            ReporterKind::ApiExtractor,
            entry_point.file.clone(),
            messages,
        ))
    }
}

fn compile_ignore_patterns(ignore: &[String]) -> Result<Vec<glob::Pattern>, ToolError> {
    ignore
        .iter()
        .map(|p| {
            glob::Pattern::new(p).map_err(|e| ToolError::Parse {
                what: format!("docs reporter ignore pattern '{p}'"),
                message: e.to_string(),
            })
        })
        .collect()
}

fn extractor_config(project_root: &Path, entry_file: &ArtifactPath) -> serde_json::Value {
    json!({
        "$schema": "https://developer.microsoft.com/json-schemas/api-extractor/v7/api-extractor.schema.json",
        "projectFolder": project_root.to_string_lossy(),
        "mainEntryPointFilePath": format!("<projectFolder>/{entry_file}"),
        "compiler": { "tsconfigFilePath": "<projectFolder>/tsconfig.json" },
        "apiReport": { "enabled": false },
        "docModel": { "enabled": false },
        "dtsRollup": { "enabled": false },
        "tsdocMetadata": { "enabled": false },
        "messages": {
            "compilerMessageReporting": { "default": { "logLevel": "warning" } },
            "extractorMessageReporting": { "default": { "logLevel": "warning" } },
            "tsdocMessageReporting": { "default": { "logLevel": "warning" } }
        }
    })
}

fn diagnostic_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<level>Warning|Error):\s+(?:(?P<path>\S.*?):(?P<line>\d+):(?P<col>\d+)\s+-\s+)?\((?P<id>[A-Za-z0-9_-]+)\)\s+(?P<text>.+)$",
        )
        .expect("diagnostic regex is valid")
    })
}

/// Extracts diagnostics from API Extractor console output.
///
/// Lines that are not diagnostics (progress output, summaries) are skipped.
/// Absolute paths under `project_root` are made relative to it.
pub fn parse_diagnostics(output: &str, project_root: &Path) -> Vec<ReportMessage> {
    let root = project_root.to_string_lossy().replace('\\', "/");
    let root_prefix = format!("{}/", root.trim_end_matches('/'));

    output
        .lines()
        .filter_map(|line| {
            let caps = diagnostic_line().captures(line.trim_end())?;
            let level = match &caps["level"] {
                "Error" => MessageLevel::Error,
                _ => MessageLevel::Warning,
            };
            let location = caps.name("path").and_then(|p| {
                let raw = p.as_str().replace('\\', "/");
                let relative = raw.strip_prefix(root_prefix.as_str()).unwrap_or(&raw);
                Some(SourceLocation {
                    path: ArtifactPath::normalized(relative)?,
                    line: caps.name("line").and_then(|l| l.as_str().parse().ok()),
                    column: caps.name("col").and_then(|c| c.as_str().parse().ok()),
                })
            });
            Some(ReportMessage {
                level,
                message_id: MessageId::new(&caps["id"])?,
                text: caps["text"].trim().to_string(),
                location,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scripted;

    const OUTPUT: &str = "\
api-extractor 7.39.0  - https://api-extractor.com/

Analysis will use the bundled TypeScript version 5.3.3
Warning: src/index.ts:12:1 - (ae-missing-release-tag) \"Foo\" is exported by the package, but it is missing a release tag
Warning: src/util.ts:3:5 - (tsdoc-param-tag-missing-hyphen) The @param block should be followed by a parameter name and then a hyphen
Error: src/util.ts:9:2 - (ae-forgotten-export) The symbol \"Bar\" needs to be exported by the entry point
Warning: (ae-wrong-input-file-type) Unsupported input file type

API Extractor completed with errors
";

    fn entry_point() -> EntryPoint {
        let mut ep = EntryPoint::new(ArtifactPath::new("src/index.ts").unwrap());
        ep.docs_reporter = Some(ReporterKind::ApiExtractor);
        ep
    }

    #[test]
    fn parses_located_and_unlocated_diagnostics() {
        let messages = parse_diagnostics(OUTPUT, Path::new("/work"));
        assert_eq!(messages.len(), 4);

        assert_eq!(messages[0].level, MessageLevel::Warning);
        assert_eq!(messages[0].message_id.as_str(), "ae-missing-release-tag");
        let loc = messages[0].location.as_ref().unwrap();
        assert_eq!(loc.to_string(), "src/index.ts:12:1");

        assert_eq!(messages[2].level, MessageLevel::Error);
        assert_eq!(messages[2].message_id.as_str(), "ae-forgotten-export");

        assert!(messages[3].location.is_none());
    }

    #[test]
    fn absolute_paths_become_project_relative() {
        let line = "Warning: /work/project/src/a.ts:1:1 - (ae-x) text";
        let messages = parse_diagnostics(line, Path::new("/work/project"));
        assert_eq!(
            messages[0].location.as_ref().unwrap().path.as_str(),
            "src/a.ts"
        );
    }

    #[tokio::test]
    async fn reports_diagnostics_even_when_the_tool_exits_non_zero() {
        let root = tempfile::tempdir().unwrap();
        let runner = scripted(1, OUTPUT, "");
        let reporter = ApiExtractorReporter::new(root.path(), runner.clone());

        let report = reporter
            .report(&entry_point(), &DiffScope::All, &[])
            .await
            .unwrap();

        assert_eq!(report.errors_count(), 1);
        assert_eq!(report.warnings_count(), 3);
        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen[0].program, "npx");
        assert!(seen[0].args.contains(&"@microsoft/api-extractor".to_string()));
        assert!(root
            .path()
            .join(".tbdocs/api-extractor/src-index.json")
            .exists());
    }

    #[tokio::test]
    async fn filters_by_scope_and_ignore_patterns() {
        let root = tempfile::tempdir().unwrap();
        let reporter = ApiExtractorReporter::new(root.path(), scripted(1, OUTPUT, ""));
        let scope = DiffScope::Changed(
            [ArtifactPath::new("src/util.ts").unwrap()]
                .into_iter()
                .collect(),
        );

        let report = reporter
            .report(&entry_point(), &scope, &["tsdoc-*".to_string()])
            .await
            .unwrap();

        let ids: Vec<_> = report
            .messages()
            .iter()
            .map(|m| m.message_id.as_str())
            .collect();
        assert_eq!(ids, vec!["ae-forgotten-export", "ae-wrong-input-file-type"]);
    }

    #[tokio::test]
    async fn tool_failure_without_diagnostics_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let reporter = ApiExtractorReporter::new(
            root.path(),
            scripted(1, "", "ERROR: Unable to find tsconfig.json"),
        );

        let err = reporter
            .report(&entry_point(), &DiffScope::All, &[])
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "`npx` failed (exit code 1): ERROR: Unable to find tsconfig.json"
        );
    }

    #[tokio::test]
    async fn invalid_ignore_patterns_are_rejected() {
        let root = tempfile::tempdir().unwrap();
        let reporter = ApiExtractorReporter::new(root.path(), scripted(0, "", ""));

        let err = reporter
            .report(&entry_point(), &DiffScope::All, &["ae-[".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::Parse { .. }));
    }
}
