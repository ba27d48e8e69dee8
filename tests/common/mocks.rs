//! Stub capabilities for pipeline and API tests.
//!
//! Every stub is deterministic so a full run over the report graph produces
//! the same report each time.

use async_trait::async_trait;
use dossier::llm::{GenerationRequest, TextGenerator};
use dossier::tools::{ImageFinder, PageExtractor, SearchProvider};
use dossier::types::{AppError, ImageHit, Result, SearchHit};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SOURCE_A: &str = "https://news.example.com/texas-flood";
pub const SOURCE_B: &str = "https://weather.example.org/houston-rain";
pub const HERO_IMAGE: &str = "https://images.example.com/hero.jpg";
pub const FIRST_SOURCE_IMAGE: &str = "https://images.example.com/nws.jpg";
pub const FIRST_SOURCE_NAME: &str = "National Weather Service";

/// Returns two fixed hits, repeating the first to exercise deduplication
pub struct StubSearch;

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        Ok(vec![
            SearchHit {
                url: SOURCE_A.to_string(),
                title: "Flooding across Texas".to_string(),
                snippet: "Rivers crest after days of rain".to_string(),
            },
            SearchHit {
                url: SOURCE_B.to_string(),
                title: "Houston rainfall totals".to_string(),
                snippet: "Record rainfall in Harris County".to_string(),
            },
            SearchHit {
                url: SOURCE_A.to_string(),
                title: "Flooding across Texas (mirror)".to_string(),
                snippet: String::new(),
            },
        ])
    }

    fn provider_name(&self) -> &str {
        "stub"
    }
}

/// Returns a short page body derived from the URL
pub struct StubExtractor;

#[async_trait]
impl PageExtractor for StubExtractor {
    async fn extract(&self, url: &str, _max_chars: usize) -> Result<String> {
        Ok(format!("Page text for {url}: rivers rose quickly and shelters opened."))
    }
}

/// Replies with canned JSON keyed on the request label ("cited sources")
pub struct StubGenerator {
    replies: HashMap<String, Value>,
    failing: Option<String>,
    calls: AtomicUsize,
}

impl StubGenerator {
    pub fn new() -> Self {
        let mut replies = HashMap::new();
        replies.insert(
            "article".to_string(),
            json!({
                "title": "Flood in Texas",
                "excerpt": "Days of rain pushed rivers over their banks across south Texas.",
                "content": "Heavy rain fell across south Texas for four days. Rivers crested above flood stage and shelters opened in several counties."
            }),
        );
        replies.insert(
            "executive summary".to_string(),
            json!({"points": ["Rivers crested above flood stage.", "Shelters opened in several counties."]}),
        );
        replies.insert(
            "timeline items".to_string(),
            json!([{
                "date": "2024-05-02T00:00:00Z",
                "title": "Flood warning issued",
                "description": "Forecasters warn of flash flooding.",
                "type": "Alert",
                "source_label": FIRST_SOURCE_NAME,
                "source_url": SOURCE_A
            }]),
        );
        replies.insert(
            "cited sources".to_string(),
            json!({"cited_sources": [
                {"name": FIRST_SOURCE_NAME, "type": "Official Statement", "description": "Issued the flood warnings.", "url": SOURCE_A},
                {"name": "Harris County Flood Control", "type": "Agency", "description": "Published rainfall totals.", "url": SOURCE_B}
            ]}),
        );
        replies.insert(
            "raw facts".to_string(),
            json!([{"category": "Rainfall", "facts": ["Up to 15 inches fell in four days."]}]),
        );
        replies.insert(
            "perspectives".to_string(),
            json!([{"viewpoint": "Preparedness", "description": "Officials say early warnings saved lives.", "color": "blue"}]),
        );

        Self {
            replies,
            failing: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Replace the reply for one label
    pub fn with_reply(mut self, label: &str, reply: Value) -> Self {
        self.replies.insert(label.to_string(), reply);
        self
    }

    /// Make requests for one label fail
    pub fn failing_on(mut self, label: &str) -> Self {
        self.failing = Some(label.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.as_deref() == Some(request.label.as_str()) {
            return Err(AppError::Capability(format!("generator refused {}", request.label)));
        }
        let reply = self
            .replies
            .get(&request.label)
            .ok_or_else(|| AppError::Capability(format!("no reply for {}", request.label)))?;
        Ok(format!("```json\n{}\n```", reply))
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

/// Finds images only for the query and the first cited source
pub struct StubImages {
    pub query: String,
}

#[async_trait]
impl ImageFinder for StubImages {
    async fn find_images(&self, query: &str) -> Result<Vec<ImageHit>> {
        let hits = if query == self.query {
            vec![ImageHit {
                url: HERO_IMAGE.to_string(),
            }]
        } else if query == FIRST_SOURCE_NAME {
            vec![ImageHit {
                url: FIRST_SOURCE_IMAGE.to_string(),
            }]
        } else {
            Vec::new()
        };
        Ok(hits)
    }
}
