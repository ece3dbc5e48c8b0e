//! tbdocs external docs tool adapters.
//!
//! Implements the docs strategy ports of the [`pipeline`] crate by shelling out
//! to the JavaScript tooling the documented projects already use:
//!
//! - [`ApiExtractorReporter`]: `api-extractor` reporter (Microsoft API Extractor).
//! - [`TypedocMarkdownGenerator`]: `typedoc-markdown` generator (TypeDoc +
//!   `typedoc-plugin-markdown`).
//! - [`FsDocsGrouper`]: groups generated docs on the local filesystem.
//!
//! [`default_registry`] wires every strategy into a
//! [`pipeline::StrategyRegistry`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Process spawning, tool configuration files, and output
//! parsing live here. The [`pipeline`] crate sees only the port traits.

pub mod api_extractor;
pub mod grouping;
pub mod runner;
pub mod slug;
pub mod typedoc;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

use std::path::Path;
use std::sync::Arc;

pub use api_extractor::{parse_diagnostics, ApiExtractorReporter};
pub use grouping::{FsDocsGrouper, GROUPED_DOCS_DIR};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner};
pub use slug::docs_slug;
pub use typedoc::TypedocMarkdownGenerator;

use pipeline::{GeneratorKind, ReporterKind, StrategyRegistry};

/// Scratch directory for tool configs and output, relative to the project root.
pub const WORK_DIR: &str = ".tbdocs";

/// A registry serving every known reporter and generator for the project at
/// `project_root`.
pub fn default_registry(project_root: &Path, runner: Arc<dyn CommandRunner>) -> StrategyRegistry {
    StrategyRegistry::new()
        .with_reporter(
            ReporterKind::ApiExtractor,
            Arc::new(ApiExtractorReporter::new(project_root, runner.clone())),
        )
        .with_generator(
            GeneratorKind::TypedocMarkdown,
            Arc::new(TypedocMarkdownGenerator::new(project_root, runner)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_serves_every_kind() {
        let registry = default_registry(Path::new("."), Arc::new(ProcessRunner));
        for &kind in ReporterKind::ALL {
            assert!(registry.reporter(kind).is_ok());
        }
        for &kind in GeneratorKind::ALL {
            assert!(registry.generator(kind).is_ok());
        }
    }
}
