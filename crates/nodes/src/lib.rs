//! tbdocs run steps and the run executor.
//!
//! One module per step of a run:
//!
//! | Step | Module |
//! |------|--------|
//! | Diff scope resolution | [`scope`] |
//! | Entry point processing | [`processor`] |
//! | Grouping + markdown aggregation | [`aggregator`] |
//! | Report and docs publishing | [`publisher`] |
//! | Sequencing + failure boundary | [`executor`] |
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Steps sequence calls between business logic in the
//! [`pipeline`] crate and the port traits it defines (docs tools, GitHub).
//! They contain no domain rules of their own and perform no I/O directly.
//!
//! Steps run strictly one after another; entry points are never processed
//! concurrently.

pub mod aggregator;
pub mod executor;
pub mod processor;
pub mod publisher;
pub mod scope;

pub use aggregator::aggregate;
pub use executor::{RunExecutor, RunFailure, RunPorts, RunState, RunSummary};
pub use processor::process_entry_points;
pub use publisher::publish;
pub use scope::resolve_diff_scope;
