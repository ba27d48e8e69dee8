//! Orchestration engine
//!
//! The engine runs a static graph of [`TaskNode`]s over a shared
//! [`PipelineState`]:
//!
//! - [`state`] - state, deltas and the per-field merge registry
//! - [`node`] - the task node trait and failure containment
//! - [`graph`] - graph declaration and validation
//! - [`scheduler`] - concurrent, dependency-ordered execution
//!
//! Node failures never abort a run. A run aborts only on a [`GraphError`]
//! (budget, stall, merge conflict) or when the assembled report fails
//! validation.

pub mod graph;
pub mod node;
pub mod scheduler;
pub mod state;

pub use graph::{ExecutionGraph, GraphError, GraphSpec, END, START};
pub use node::{run_contained, NodeError, NodeOutcome, Snapshot, TaskNode};
pub use scheduler::{RunOutcome, Scheduler, DEFAULT_STEP_BUDGET};
pub use state::{
    Field, FieldShape, ImageRefs, LogEntry, LogLevel, MergeConflict, MergeRegistry, MergeStrategy,
    PipelineState, ScrapedItem, StateDelta,
};

use crate::report::ValidationError;

/// Reasons a run produced no report
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PipelineError {
    /// Structured diagnostics for API responses
    pub fn detail(&self) -> serde_json::Value {
        match self {
            PipelineError::Graph(err) => serde_json::json!({
                "kind": "graph",
                "message": err.to_string(),
            }),
            PipelineError::Validation(err) => serde_json::json!({
                "kind": "validation",
                "problems": err.problems,
                "partial": err.partial,
            }),
        }
    }
}
