use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::pipeline::{ImageRefs, LogEntry, NodeError, Snapshot, StateDelta, TaskNode};
use crate::report::{Section, SectionKind};
use crate::tools::ImageFinder;

/// Looks up a hero image for the query and one image per cited source
///
/// Runs after the cited sources writer. Lookups that fail or find nothing
/// leave an empty reference, which the assembler replaces with a placeholder.
pub struct ImageNode {
    finder: Arc<dyn ImageFinder>,
}

impl ImageNode {
    pub const NAME: &'static str = "image";

    pub fn new(finder: Arc<dyn ImageFinder>) -> Self {
        Self { finder }
    }

    async fn first_image(&self, query: &str) -> Option<String> {
        match self.finder.find_images(query).await {
            Ok(hits) => hits.into_iter().map(|hit| hit.url).find(|url| !url.is_empty()),
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Image lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl TaskNode for ImageNode {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, state: Snapshot) -> Result<StateDelta, NodeError> {
        let source_names: Vec<&str> = match state.section(SectionKind::CitedSources) {
            Some(Section::CitedSources(sources)) => sources.iter().map(|s| s.name.as_str()).collect(),
            _ => Vec::new(),
        };

        let hero = self.first_image(&state.query);
        let per_source = join_all(source_names.iter().map(|name| self.first_image(name)));
        let (hero, per_source) = futures::join!(hero, per_source);

        let found = per_source.iter().filter(|url| url.is_some()).count();
        let refs = ImageRefs {
            hero: hero.unwrap_or_default(),
            per_source: per_source.into_iter().map(Option::unwrap_or_default).collect(),
        };

        Ok(StateDelta::new()
            .log(LogEntry::info(
                Self::NAME,
                format!("Found images for {} of {} sources", found, source_names.len()),
            ))
            .with_image_refs(refs))
    }
}
