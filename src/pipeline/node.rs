//! Task nodes and error containment

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::FutureExt;

use super::state::{LogEntry, PipelineState, StateDelta};
use crate::report::SectionParseError;
use crate::types::AppError;

/// Read-only view of the state handed to a node
pub type Snapshot = Arc<PipelineState>;

/// Failure of a single node. Always contained by the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("{capability} failed: {source}")]
    Capability {
        capability: &'static str,
        #[source]
        source: AppError,
    },

    #[error(transparent)]
    Parse(#[from] SectionParseError),

    #[error("missing input: {0}")]
    MissingInput(String),
}

impl NodeError {
    pub fn capability(capability: &'static str, source: AppError) -> Self {
        NodeError::Capability { capability, source }
    }
}

/// A unit of work in the execution graph
///
/// Implementations read the snapshot and describe their contribution as a
/// [`StateDelta`]. They must not rely on any state other than the snapshot.
#[async_trait]
pub trait TaskNode: Send + Sync {
    /// Unique name of the node within its graph; also its writer key
    fn name(&self) -> &str;

    async fn execute(&self, state: Snapshot) -> Result<StateDelta, NodeError>;
}

/// Result of running a node through [`run_contained`]
#[derive(Debug)]
pub struct NodeOutcome {
    pub node: String,
    pub delta: StateDelta,
    /// Diagnostic message when the node failed or panicked
    pub error: Option<String>,
    pub duration: Duration,
}

/// Run a node, turning failures and panics into a log-only delta
pub async fn run_contained(node: Arc<dyn TaskNode>, state: Snapshot) -> NodeOutcome {
    let name = node.name().to_string();
    let started = Instant::now();

    let result = AssertUnwindSafe(node.execute(state)).catch_unwind().await;

    let (delta, error) = match result {
        Ok(Ok(delta)) => (delta, None),
        Ok(Err(err)) => {
            let message = format!("Error processing {}: {}", name, err);
            (StateDelta::new().log(LogEntry::error(&name, &message)), Some(message))
        }
        Err(panic) => {
            let message = format!("Node {} panicked: {}", name, panic_message(panic.as_ref()));
            (StateDelta::new().log(LogEntry::error(&name, &message)), Some(message))
        }
    };

    let duration = started.elapsed();
    match &error {
        Some(message) => tracing::warn!(
            node = %name,
            duration_ms = duration.as_millis() as u64,
            "{}",
            message
        ),
        None => tracing::info!(
            node = %name,
            duration_ms = duration.as_millis() as u64,
            "Node completed"
        ),
    }

    NodeOutcome {
        node: name,
        delta,
        error,
        duration,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
