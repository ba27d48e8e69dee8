use std::sync::Arc;

use async_trait::async_trait;

use crate::pipeline::{LogEntry, NodeError, Snapshot, StateDelta, TaskNode};
use crate::tools::SearchProvider;

/// Finds candidate sources for the query and records them in `search_results`
pub struct ResearchNode {
    search: Arc<dyn SearchProvider>,
    max_sources: usize,
}

impl ResearchNode {
    pub const NAME: &'static str = "research";

    pub fn new(search: Arc<dyn SearchProvider>, max_sources: usize) -> Self {
        Self { search, max_sources }
    }
}

#[async_trait]
impl TaskNode for ResearchNode {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, state: Snapshot) -> Result<StateDelta, NodeError> {
        let query = state.query.trim();
        if query.is_empty() {
            return Err(NodeError::MissingInput("query is empty".to_string()));
        }

        let hits = self
            .search
            .search(query, self.max_sources)
            .await
            .map_err(|e| NodeError::capability("search", e))?;

        let mut seen = std::collections::HashSet::new();
        let hits: Vec<_> = hits
            .into_iter()
            .filter(|hit| seen.insert(hit.url.clone()))
            .take(self.max_sources)
            .collect();

        tracing::info!(
            provider = self.search.provider_name(),
            sources = hits.len(),
            "Research found sources"
        );

        Ok(StateDelta::new()
            .log(LogEntry::info(
                Self::NAME,
                format!("Found {} sources for '{}'", hits.len(), query),
            ))
            .with_search_results(hits))
    }
}
