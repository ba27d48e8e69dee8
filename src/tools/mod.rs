//! External capabilities used by the pipeline nodes
//!
//! Every capability sits behind a narrow async trait so nodes can be wired
//! to real providers in production and to stubs in tests.
//!
//! # Module Structure
//!
//! - [`search`](crate::tools::search) - DuckDuckGo search and page extraction via daedra
//! - [`tavily`](crate::tools::tavily) - Tavily search API client
//! - [`images`](crate::tools::images) - Pexels image search client
//!
//! # Example
//!
//! ```ignore
//! let search: Arc<dyn SearchProvider> = Arc::new(WebSearch::new());
//! let hits = search.search("flood in Texas", 10).await?;
//! for hit in hits {
//!     println!("{}: {}", hit.title, hit.url);
//! }
//! ```

/// Pexels image lookup.
pub mod images;
/// DuckDuckGo search and page extraction.
pub mod search;
/// Tavily search API.
pub mod tavily;

pub use images::PexelsImages;
pub use search::{PageFetcher, WebSearch};
pub use tavily::TavilySearch;

use crate::types::{ImageHit, Result, SearchHit};
use async_trait::async_trait;

/// Finds candidate source pages for a query
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    /// Short provider identifier used in logs
    fn provider_name(&self) -> &str;
}

/// Turns a URL into plain text
#[async_trait]
pub trait PageExtractor: Send + Sync {
    /// Fetch `url` and return at most `max_chars` characters of its text
    async fn extract(&self, url: &str, max_chars: usize) -> Result<String>;
}

/// Looks up illustrative images for a phrase
#[async_trait]
pub trait ImageFinder: Send + Sync {
    async fn find_images(&self, query: &str) -> Result<Vec<ImageHit>>;
}

/// Truncate to at most `max_chars` characters without splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
