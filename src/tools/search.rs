//! Web search and page extraction using daedra
//!
//! daedra uses DuckDuckGo as the search backend and converts fetched pages
//! to markdown, which is what the section writers consume.

use super::{truncate_chars, PageExtractor, SearchProvider};
use crate::types::{AppError, Result, SearchHit};
use async_trait::async_trait;

/// DuckDuckGo search powered by daedra
#[derive(Debug, Clone, Default)]
pub struct WebSearch;

impl WebSearch {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SearchProvider for WebSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: max_results,
                ..Default::default()
            }),
        };

        match daedra::tools::search::perform_search(&search_args).await {
            Ok(response) => Ok(response
                .data
                .iter()
                .filter(|r| !r.url.is_empty())
                .take(max_results)
                .map(|r| SearchHit {
                    url: r.url.clone(),
                    title: r.title.clone(),
                    snippet: r.description.clone(),
                })
                .collect()),
            Err(e) => Err(AppError::Capability(format!("Search failed: {}", e))),
        }
    }

    fn provider_name(&self) -> &str {
        "duckduckgo"
    }
}

/// Page extraction powered by daedra
#[derive(Debug, Clone, Default)]
pub struct PageFetcher {
    /// Optional CSS selector to narrow the extracted content
    selector: Option<String>,
}

impl PageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selector(selector: impl Into<String>) -> Self {
        Self {
            selector: Some(selector.into()),
        }
    }
}

#[async_trait]
impl PageExtractor for PageFetcher {
    async fn extract(&self, url: &str, max_chars: usize) -> Result<String> {
        let fetch_args = daedra::VisitPageArgs {
            url: url.to_string(),
            include_images: false,
            selector: self.selector.clone(),
        };

        match daedra::tools::fetch::fetch_page(&fetch_args).await {
            Ok(page) => Ok(truncate_chars(&page.content, max_chars)),
            Err(e) => Err(AppError::Capability(format!("Failed to fetch page: {}", e))),
        }
    }
}
