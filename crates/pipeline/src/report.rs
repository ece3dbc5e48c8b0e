//! Markdown rendering of the aggregated docs report.
//!
//! Pure: the same results and timestamp always render the same document.

use std::fmt::Write as _;

use crate::{total_findings, EntryPointResult, MessageLevel, Timestamp};

/// First line of every report; publishers use it to recognise their own output.
pub const REPORT_TITLE: &str = "# TBDocs Report";

/// Renders one markdown document covering every entry point in `results`.
///
/// Layout: title, overall status, a summary table with one row per entry
/// point, then one `##` section per entry point (in result order) with its
/// findings and generated docs location.
pub fn render_report_markdown(results: &[EntryPointResult], generated_at: Timestamp) -> String {
    let mut md = String::new();
    let (errors, warnings) = total_findings(results);

    // Writing into a String never fails.
    let _ = writeln!(md, "{REPORT_TITLE}");
    md.push('\n');
    if errors == 0 && warnings == 0 {
        let _ = writeln!(md, "✅ No docs issues found.");
    } else {
        let _ = writeln!(
            md,
            "{} {} and {}.",
            if errors > 0 { "❌" } else { "⚠️" },
            plural(errors, "error"),
            plural(warnings, "warning"),
        );
    }
    md.push('\n');

    md.push_str("| Entry Point | Reporter | Errors | Warnings | Generated Docs |\n");
    md.push_str("| --- | --- | --- | --- | --- |\n");
    for result in results {
        let ep = result.entry_point();
        let (reporter, errors, warnings) = match result.report() {
            Some(r) => (
                r.reporter().to_string(),
                r.errors_count().to_string(),
                r.warnings_count().to_string(),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        let docs = result
            .generated_docs_path()
            .map_or_else(|| "-".to_string(), |p| format!("`{p}`"));
        let _ = writeln!(
            md,
            "| `{}` | {} | {} | {} | {} |",
            escape_cell(ep.file.as_str()),
            reporter,
            errors,
            warnings,
            docs
        );
    }

    for result in results {
        md.push('\n');
        render_entry_point_section(&mut md, result);
    }

    md.push('\n');
    let _ = writeln!(md, "---");
    let _ = writeln!(md, "_Generated by tbdocs at {generated_at}._");
    md
}

fn render_entry_point_section(md: &mut String, result: &EntryPointResult) {
    let ep = result.entry_point();
    let _ = writeln!(md, "## `{}`", ep.file);
    md.push('\n');

    match result.report() {
        None => {
            md.push_str("No docs reporter configured.\n");
        }
        Some(report) if report.is_clean() => {
            let _ = writeln!(md, "✅ No issues found by `{}`.", report.reporter());
        }
        Some(report) => {
            let _ = writeln!(
                md,
                "`{}` found {} and {}.",
                report.reporter(),
                plural(report.errors_count(), "error"),
                plural(report.warnings_count(), "warning"),
            );
            md.push('\n');
            md.push_str("| Level | Message | Location | Id |\n");
            md.push_str("| --- | --- | --- | --- |\n");
            for message in report.messages() {
                let level = match message.level {
                    MessageLevel::Error => "🛑 Error",
                    MessageLevel::Warning => "⚠️ Warning",
                };
                let location = message
                    .location
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |l| format!("`{}`", escape_cell(&l.to_string())));
                let _ = writeln!(
                    md,
                    "| {} | {} | {} | `{}` |",
                    level,
                    escape_cell(&message.text),
                    location,
                    message.message_id
                );
            }
        }
    }

    if let Some(path) = result.generated_docs_path() {
        md.push('\n');
        let _ = writeln!(md, "📚 Generated docs: `{path}`");
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Keeps a value inside a single table cell.
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        ArtifactPath, DocsReport, EntryPoint, MessageId, ReportMessage, ReporterKind,
        SourceLocation,
    };

    fn path(p: &str) -> ArtifactPath {
        ArtifactPath::new(p).unwrap()
    }

    fn at() -> Timestamp {
        Timestamp::from_utc(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
    }

    fn with_messages(file: &str, messages: Vec<ReportMessage>) -> EntryPointResult {
        let mut ep = EntryPoint::new(path(file));
        ep.docs_reporter = Some(ReporterKind::ApiExtractor);
        EntryPointResult::new(ep).with_report(DocsReport::new(
            ReporterKind::ApiExtractor,
            path(file),
            messages,
        ))
    }

    #[test]
    fn renders_one_section_per_entry_point() {
        let results = vec![
            with_messages("packages/a/src/index.ts", vec![]),
            with_messages("packages/b/src/index.ts", vec![]),
        ];
        let md = render_report_markdown(&results, at());

        assert!(md.starts_with(REPORT_TITLE));
        assert!(md.contains("✅ No docs issues found."));
        assert_eq!(md.matches("\n## ").count(), 2);
        assert!(md.contains("## `packages/a/src/index.ts`"));
        assert!(md.contains("## `packages/b/src/index.ts`"));
        assert!(md.contains("_Generated by tbdocs at 2024-01-02T03:04:05+00:00._"));
    }

    #[test]
    fn lists_findings_with_locations() {
        let results = vec![with_messages(
            "src/index.ts",
            vec![ReportMessage {
                level: MessageLevel::Warning,
                message_id: MessageId::new("ae-missing-release-tag").unwrap(),
                text: "\"Foo\" is missing a release tag | please fix".to_string(),
                location: Some(SourceLocation {
                    path: path("src/foo.ts"),
                    line: Some(12),
                    column: Some(1),
                }),
            }],
        )];
        let md = render_report_markdown(&results, at());

        assert!(md.contains("⚠️ 0 errors and 1 warning."));
        assert!(md.contains("`api-extractor` found 0 errors and 1 warning."));
        assert!(md.contains("`src/foo.ts:12:1`"));
        assert!(md.contains("missing a release tag \\| please fix"));
        assert!(md.contains("`ae-missing-release-tag`"));
    }

    #[test]
    fn entry_points_without_reporter_still_get_a_section() {
        let result = EntryPointResult::new(EntryPoint::new(path("src/index.ts")))
            .with_generated_docs_path(path(".tbdocs/docs/pkg"));
        let md = render_report_markdown(&[result], at());

        assert!(md.contains("No docs reporter configured."));
        assert!(md.contains("📚 Generated docs: `.tbdocs/docs/pkg`"));
        assert!(md.contains("| `src/index.ts` | - | - | - | `.tbdocs/docs/pkg` |"));
    }
}
