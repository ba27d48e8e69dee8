//! Dependency-count scheduler
//!
//! A node becomes eligible once every predecessor has completed; contained
//! failures count as completion. Eligible nodes run concurrently on a
//! [`JoinSet`] and each receives the snapshot current at the moment it became
//! eligible. Deltas are merged one at a time as nodes finish, before any
//! successor is released, so no node ever observes an in-flight delta.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::task::{Id, JoinSet};
use tracing::Instrument;

use super::graph::{ExecutionGraph, GraphError};
use super::node::{run_contained, NodeOutcome};
use super::state::{LogEntry, MergeRegistry, PipelineState, StateDelta};

pub const DEFAULT_STEP_BUDGET: usize = 25;

/// Final state of a completed run
#[derive(Debug)]
pub struct RunOutcome {
    pub state: PipelineState,
    /// Nodes in completion order
    pub executed: Vec<String>,
    /// Node executions consumed from the step budget
    pub steps: usize,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    registry: MergeRegistry,
    step_budget: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(MergeRegistry::default(), DEFAULT_STEP_BUDGET)
    }
}

impl Scheduler {
    pub fn new(registry: MergeRegistry, step_budget: usize) -> Self {
        Self {
            registry,
            step_budget,
        }
    }

    pub fn step_budget(&self) -> usize {
        self.step_budget
    }

    pub fn registry(&self) -> &MergeRegistry {
        &self.registry
    }

    /// Execute `graph` from `initial` until its terminal node has run
    pub async fn run(&self, graph: &ExecutionGraph, initial: PipelineState) -> Result<RunOutcome, GraphError> {
        let mut state = Arc::new(initial);
        let mut pending: HashMap<&str, usize> = graph
            .topological_order()
            .iter()
            .map(|name| (name.as_str(), graph.predecessors(name).len()))
            .collect();
        let mut ready: VecDeque<String> = graph
            .topological_order()
            .iter()
            .filter(|name| graph.predecessors(name).is_empty())
            .cloned()
            .collect();

        let mut tasks: JoinSet<NodeOutcome> = JoinSet::new();
        let mut running: HashMap<Id, String> = HashMap::new();
        let mut executed = Vec::with_capacity(graph.len());
        let mut steps = 0usize;
        let mut terminal_done = false;

        tracing::info!(
            nodes = graph.len(),
            step_budget = self.step_budget,
            "Starting graph run"
        );

        loop {
            while let Some(name) = ready.pop_front() {
                if steps >= self.step_budget {
                    tasks.abort_all();
                    return Err(GraphError::BudgetExceeded {
                        budget: self.step_budget,
                    });
                }
                let Some(node) = graph.node(&name).cloned() else {
                    continue;
                };
                steps += 1;

                let span = tracing::info_span!("node", node = %name, step = steps);
                let snapshot = Arc::clone(&state);
                let handle = tasks.spawn(run_contained(node, snapshot).instrument(span));
                running.insert(handle.id(), name);
            }

            if terminal_done {
                break;
            }

            let outcome = match tasks.join_next_with_id().await {
                None => {
                    return Err(GraphError::Stalled {
                        terminal: graph.terminal().to_string(),
                        executed: executed.len(),
                    })
                }
                Some(Ok((id, outcome))) => {
                    running.remove(&id);
                    outcome
                }
                Some(Err(err)) => {
                    // Panics are caught inside run_contained; this is a task that
                    // was torn down by the runtime. Treat it like a failed node.
                    let node = running.remove(&err.id()).unwrap_or_default();
                    let message = format!("Error processing {}: task aborted: {}", node, err);
                    tracing::warn!(node = %node, "{}", message);
                    NodeOutcome {
                        delta: StateDelta::new().log(LogEntry::error(&node, &message)),
                        error: Some(message),
                        node,
                        duration: Default::default(),
                    }
                }
            };

            let NodeOutcome { node, delta, .. } = outcome;
            let next = self
                .registry
                .apply(&state, delta, &node)
                .map_err(|source| GraphError::Merge {
                    node: node.clone(),
                    source,
                })?;
            state = Arc::new(next);

            for successor in graph.successors(&node) {
                if let Some(count) = pending.get_mut(successor.as_str()) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.push_back(successor.clone());
                    }
                }
            }
            if node == graph.terminal() {
                terminal_done = true;
            }
            executed.push(node);
        }

        // The terminal is a sink reachable from every node, so nothing is left running
        tasks.abort_all();

        let state = Arc::try_unwrap(state).unwrap_or_else(|shared| (*shared).clone());
        tracing::info!(
            executed = executed.len(),
            steps,
            errors = state.errors().count(),
            "Graph run finished"
        );

        Ok(RunOutcome { state, executed, steps })
    }
}
