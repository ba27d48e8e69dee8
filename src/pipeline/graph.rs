//! Execution graph definition and validation
//!
//! A graph is declared as an explicit list of nodes plus an explicit list of
//! edges. The virtual [`START`] and [`END`] markers delimit it: nodes with an
//! edge from `START` are entry points, and exactly one node (the terminal)
//! has an edge into `END`.
//!
//! Validation happens once, in [`GraphSpec::build`], so a running scheduler
//! never has to deal with unknown nodes or cycles.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use super::node::TaskNode;
use super::state::MergeConflict;

pub const START: &str = "__start__";
pub const END: &str = "__end__";

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("duplicate node name '{0}'")]
    DuplicateNode(String),

    #[error("node name '{0}' is reserved for the graph boundary")]
    ReservedName(String),

    #[error("edge {from} -> {to} references unknown node '{node}'")]
    UnknownNode { from: String, to: String, node: String },

    #[error("invalid edge {from} -> {to}: {reason}")]
    InvalidEdge {
        from: String,
        to: String,
        reason: &'static str,
    },

    #[error("node '{0}' is not reachable from START")]
    Unreachable(String),

    #[error("node '{0}' has no path to the terminal node")]
    DeadEnd(String),

    #[error("graph has no terminal node (no edge into END)")]
    NoTerminal,

    #[error("graph has more than one terminal node: {}", .0.join(", "))]
    MultipleTerminals(Vec<String>),

    #[error("graph contains a cycle through: {}", .0.join(", "))]
    Cycle(Vec<String>),

    #[error("step budget of {budget} node executions exceeded")]
    BudgetExceeded { budget: usize },

    #[error("step budget of {budget} cannot cover the {nodes} nodes of the graph")]
    BudgetBelowGraphSize { budget: usize, nodes: usize },

    #[error("run stalled after {executed} node executions without reaching '{terminal}'")]
    Stalled { terminal: String, executed: usize },

    #[error("merging the output of '{node}' failed: {source}")]
    Merge {
        node: String,
        #[source]
        source: MergeConflict,
    },
}

/// Builder for an [`ExecutionGraph`]
#[derive(Default)]
pub struct GraphSpec {
    nodes: Vec<Arc<dyn TaskNode>>,
    edges: Vec<(String, String)>,
}

impl GraphSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, node: Arc<dyn TaskNode>) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Validate the declaration and freeze it into an executable graph
    pub fn build(self) -> Result<ExecutionGraph, GraphError> {
        let mut nodes: HashMap<String, Arc<dyn TaskNode>> = HashMap::new();
        let mut declared = Vec::with_capacity(self.nodes.len());
        for node in self.nodes {
            let name = node.name().to_string();
            if name == START || name == END {
                return Err(GraphError::ReservedName(name));
            }
            if nodes.contains_key(&name) {
                return Err(GraphError::DuplicateNode(name));
            }
            declared.push(name.clone());
            nodes.insert(name, node);
        }

        let mut predecessors: HashMap<String, Vec<String>> =
            declared.iter().map(|n| (n.clone(), Vec::new())).collect();
        let mut successors: HashMap<String, Vec<String>> =
            declared.iter().map(|n| (n.clone(), Vec::new())).collect();
        let mut entry_nodes = Vec::new();
        let mut terminals = Vec::new();
        let mut seen = HashSet::new();

        for (from, to) in self.edges {
            if from == END {
                return Err(invalid_edge(&from, &to, "END has no outgoing edges"));
            }
            if to == START {
                return Err(invalid_edge(&from, &to, "START has no incoming edges"));
            }
            if from == START && to == END {
                return Err(invalid_edge(&from, &to, "START cannot connect directly to END"));
            }
            for endpoint in [&from, &to] {
                if endpoint != START && endpoint != END && !nodes.contains_key(endpoint) {
                    return Err(GraphError::UnknownNode {
                        from: from.clone(),
                        to: to.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
            if !seen.insert((from.clone(), to.clone())) {
                continue;
            }

            if from == START {
                entry_nodes.push(to);
            } else if to == END {
                terminals.push(from);
            } else {
                if let Some(list) = successors.get_mut(&from) {
                    list.push(to.clone());
                }
                if let Some(list) = predecessors.get_mut(&to) {
                    list.push(from);
                }
            }
        }

        let terminal = match terminals.len() {
            0 => return Err(GraphError::NoTerminal),
            1 => terminals.remove(0),
            _ => return Err(GraphError::MultipleTerminals(terminals)),
        };
        if let Some(next) = successors.get(&terminal).and_then(|s| s.first()) {
            return Err(invalid_edge(&terminal, next, "the terminal node must only lead to END"));
        }

        let order = topological_order(&declared, &predecessors, &successors)?;

        // Every node must be reachable from START...
        let reachable = walk(&entry_nodes, &successors);
        if let Some(node) = declared.iter().find(|n| !reachable.contains(*n)) {
            return Err(GraphError::Unreachable(node.clone()));
        }
        // ...and must lead to the terminal
        let leads_to_terminal = walk(std::slice::from_ref(&terminal), &predecessors);
        if let Some(node) = declared.iter().find(|n| !leads_to_terminal.contains(*n)) {
            return Err(GraphError::DeadEnd(node.clone()));
        }

        Ok(ExecutionGraph {
            nodes,
            order,
            predecessors,
            successors,
            entry_nodes,
            terminal,
        })
    }
}

fn invalid_edge(from: &str, to: &str, reason: &'static str) -> GraphError {
    GraphError::InvalidEdge {
        from: from.to_string(),
        to: to.to_string(),
        reason,
    }
}

/// Kahn's algorithm; ties resolved in declaration order
fn topological_order(
    declared: &[String],
    predecessors: &HashMap<String, Vec<String>>,
    successors: &HashMap<String, Vec<String>>,
) -> Result<Vec<String>, GraphError> {
    let mut in_degree: HashMap<&str, usize> = declared
        .iter()
        .map(|n| (n.as_str(), predecessors.get(n).map_or(0, Vec::len)))
        .collect();
    let mut queue: VecDeque<&str> = declared
        .iter()
        .map(String::as_str)
        .filter(|n| in_degree.get(n) == Some(&0))
        .collect();

    let mut order = Vec::with_capacity(declared.len());
    while let Some(node) = queue.pop_front() {
        order.push(node.to_string());
        for next in successors.get(node).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next.as_str()) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(next.as_str());
                }
            }
        }
    }

    if order.len() < declared.len() {
        let mut stuck: Vec<String> = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(node, _)| node.to_string())
            .collect();
        stuck.sort();
        return Err(GraphError::Cycle(stuck));
    }
    Ok(order)
}

fn walk(roots: &[String], adjacency: &HashMap<String, Vec<String>>) -> HashSet<String> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: Vec<&String> = roots.iter().collect();
    while let Some(node) = stack.pop() {
        if visited.insert(node.clone()) {
            stack.extend(adjacency.get(node).into_iter().flatten());
        }
    }
    visited
}

/// A validated, immutable task graph
pub struct ExecutionGraph {
    nodes: HashMap<String, Arc<dyn TaskNode>>,
    order: Vec<String>,
    predecessors: HashMap<String, Vec<String>>,
    successors: HashMap<String, Vec<String>>,
    entry_nodes: Vec<String>,
    terminal: String,
}

impl ExecutionGraph {
    pub fn node(&self, name: &str) -> Option<&Arc<dyn TaskNode>> {
        self.nodes.get(name)
    }

    /// Upstream nodes, excluding `START`
    pub fn predecessors(&self, name: &str) -> &[String] {
        self.predecessors.get(name).map_or(&[], Vec::as_slice)
    }

    /// Downstream nodes, excluding `END`
    pub fn successors(&self, name: &str) -> &[String] {
        self.successors.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn entry_nodes(&self) -> &[String] {
        &self.entry_nodes
    }

    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    /// A dependency-respecting order of all nodes
    pub fn topological_order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Debug for ExecutionGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionGraph")
            .field("order", &self.order)
            .field("entry_nodes", &self.entry_nodes)
            .field("terminal", &self.terminal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::node::{NodeError, Snapshot};
    use crate::pipeline::state::StateDelta;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl TaskNode for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn execute(&self, _state: Snapshot) -> Result<StateDelta, NodeError> {
            Ok(StateDelta::new())
        }
    }

    fn spec(names: &[&'static str]) -> GraphSpec {
        names
            .iter()
            .fold(GraphSpec::new(), |spec, name| spec.node(Arc::new(Named(name))))
    }

    #[test]
    fn test_diamond_builds_with_topological_order() {
        let graph = spec(&["a", "b", "c", "d"])
            .edge(START, "a")
            .edge("a", "b")
            .edge("a", "c")
            .edge("b", "d")
            .edge("c", "d")
            .edge("d", END)
            .build()
            .unwrap();

        assert_eq!(graph.terminal(), "d");
        assert_eq!(graph.entry_nodes(), ["a".to_string()]);
        assert_eq!(graph.predecessors("d"), ["b".to_string(), "c".to_string()]);
        assert_eq!(graph.topological_order(), ["a", "b", "c", "d"]);
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let err = spec(&["a", "b", "c", "d"])
            .edge(START, "a")
            .edge("a", "b")
            .edge("b", "c")
            .edge("c", "b")
            .edge("c", "d")
            .edge("d", END)
            .build()
            .unwrap_err();
        match err {
            GraphError::Cycle(nodes) => {
                assert!(nodes.contains(&"b".to_string()));
                assert!(nodes.contains(&"c".to_string()));
                assert!(!nodes.contains(&"a".to_string()));
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_node_is_rejected() {
        let err = spec(&["a"])
            .edge(START, "a")
            .edge("a", "ghost")
            .edge("a", END)
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownNode { ref node, .. } if node == "ghost"));
    }

    #[test]
    fn test_duplicate_node_is_rejected() {
        let err = spec(&["a", "a"]).edge(START, "a").edge("a", END).build().unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNode(ref name) if name == "a"));
    }

    #[test]
    fn test_unreachable_node_is_rejected() {
        let err = spec(&["a", "island"])
            .edge(START, "a")
            .edge("island", "a")
            .edge("a", END)
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::Unreachable(ref name) if name == "island"));
    }

    #[test]
    fn test_dead_end_is_rejected() {
        let err = spec(&["a", "b", "side"])
            .edge(START, "a")
            .edge("a", "b")
            .edge("a", "side")
            .edge("b", END)
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::DeadEnd(ref name) if name == "side"));
    }

    #[test]
    fn test_terminal_count_is_checked() {
        let none = spec(&["a"]).edge(START, "a").build().unwrap_err();
        assert!(matches!(none, GraphError::NoTerminal));

        let many = spec(&["a", "b"])
            .edge(START, "a")
            .edge(START, "b")
            .edge("a", END)
            .edge("b", END)
            .build()
            .unwrap_err();
        assert!(matches!(many, GraphError::MultipleTerminals(_)));
    }

    #[test]
    fn test_boundary_edges_are_checked() {
        let err = spec(&["a"])
            .edge(START, "a")
            .edge("a", END)
            .edge(END, "a")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidEdge { .. }));

        let err = spec(&["a"]).edge("a", START).edge("a", END).build().unwrap_err();
        assert!(matches!(err, GraphError::InvalidEdge { .. }));
    }
}
