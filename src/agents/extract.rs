use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::pipeline::{LogEntry, NodeError, ScrapedItem, Snapshot, StateDelta, TaskNode};
use crate::tools::PageExtractor;

/// Fetches every found source concurrently and stores the extracted text
///
/// A page that cannot be fetched still yields an item whose text describes
/// the failure, so writers see every source the research step found.
pub struct ExtractNode {
    extractor: Arc<dyn PageExtractor>,
    max_chars: usize,
}

impl ExtractNode {
    pub const NAME: &'static str = "extract";

    pub fn new(extractor: Arc<dyn PageExtractor>, max_chars: usize) -> Self {
        Self { extractor, max_chars }
    }
}

#[async_trait]
impl TaskNode for ExtractNode {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, state: Snapshot) -> Result<StateDelta, NodeError> {
        let fetches = state.search_results.iter().map(|hit| async move {
            let text = match self.extractor.extract(&hit.url, self.max_chars).await {
                Ok(text) if text.trim().is_empty() => hit.snippet.clone(),
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(url = %hit.url, error = %e, "Extraction failed");
                    format!("Error scraping website: {}", e)
                }
            };
            ScrapedItem {
                source_url: hit.url.clone(),
                text,
            }
        });
        let items: Vec<ScrapedItem> = join_all(fetches).await;

        let failed = items
            .iter()
            .filter(|item| item.text.starts_with("Error scraping website"))
            .count();

        Ok(StateDelta::new()
            .log(LogEntry::info(
                Self::NAME,
                format!("Extracted {} pages ({} failed)", items.len(), failed),
            ))
            .with_scraped_items(items))
    }
}
