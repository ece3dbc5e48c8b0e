//! Name-keyed registry of docs strategies.
//!
//! Entry points name their reporter and generator with a [`ReporterKind`] /
//! [`GeneratorKind`]. The registry maps each kind to the implementation that
//! serves it; the composition root fills it once at start-up.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{DocsGenerator, DocsReporter, GeneratorKind, ReporterKind, TbdocsError};

/// Strategy implementations keyed by their configuration name.
#[derive(Default, Clone)]
pub struct StrategyRegistry {
    reporters: HashMap<ReporterKind, Arc<dyn DocsReporter>>,
    generators: HashMap<GeneratorKind, Arc<dyn DocsGenerator>>,
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `reporter` for `kind`, replacing any earlier registration.
    #[must_use]
    pub fn with_reporter(mut self, kind: ReporterKind, reporter: Arc<dyn DocsReporter>) -> Self {
        self.reporters.insert(kind, reporter);
        self
    }

    /// Registers `generator` for `kind`, replacing any earlier registration.
    #[must_use]
    pub fn with_generator(
        mut self,
        kind: GeneratorKind,
        generator: Arc<dyn DocsGenerator>,
    ) -> Self {
        self.generators.insert(kind, generator);
        self
    }

    /// Looks up the reporter for `kind`.
    ///
    /// # Errors
    ///
    /// [`TbdocsError::StrategyNotRegistered`] if nothing serves `kind`.
    pub fn reporter(&self, kind: ReporterKind) -> Result<&Arc<dyn DocsReporter>, TbdocsError> {
        self.reporters
            .get(&kind)
            .ok_or_else(|| TbdocsError::StrategyNotRegistered {
                strategy: format!("docs reporter '{kind}'"),
            })
    }

    /// Looks up the generator for `kind`.
    ///
    /// # Errors
    ///
    /// [`TbdocsError::StrategyNotRegistered`] if nothing serves `kind`.
    pub fn generator(&self, kind: GeneratorKind) -> Result<&Arc<dyn DocsGenerator>, TbdocsError> {
        self.generators
            .get(&kind)
            .ok_or_else(|| TbdocsError::StrategyNotRegistered {
                strategy: format!("docs generator '{kind}'"),
            })
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut reporters: Vec<_> = self.reporters.keys().collect();
        reporters.sort();
        let mut generators: Vec<_> = self.generators.keys().collect();
        generators.sort();
        f.debug_struct("StrategyRegistry")
            .field("reporters", &reporters)
            .field("generators", &generators)
            .finish()
    }
}
