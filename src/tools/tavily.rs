//! Tavily search API client

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::SearchProvider;
use crate::types::{AppError, Result, SearchHit};

pub const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com";

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// Search through the Tavily `/search` endpoint
#[derive(Debug, Clone)]
pub struct TavilySearch {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TavilySearch {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let body = json!({
            "query": query,
            "search_depth": "basic",
            "max_results": max_results,
            "include_answer": false,
            "include_raw_content": false,
        });

        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Capability(format!("Tavily request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Capability(format!(
                "Tavily returned status {}: {}",
                status, text
            )));
        }

        let payload: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Capability(format!("Invalid Tavily response: {}", e)))?;

        Ok(payload
            .results
            .into_iter()
            .filter(|r| !r.url.trim().is_empty())
            .take(max_results)
            .map(|r| SearchHit {
                url: r.url.trim().to_string(),
                title: r.title,
                snippet: r.content,
            })
            .collect())
    }

    fn provider_name(&self) -> &str {
        "tavily"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TavilySearch {
        TavilySearch::new(server.uri(), "tvly-test", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_search_maps_results_and_skips_empty_urls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(bearer_token("tvly-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"url": "https://weather.gov/flood", "title": "NWS", "content": "Flood warning"},
                    {"url": "", "title": "Broken"},
                    {"url": "https://fema.gov", "title": "FEMA", "content": "Aid"}
                ]
            })))
            .mount(&server)
            .await;

        let hits = client(&server).search("flood in Texas", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://weather.gov/flood");
        assert_eq!(hits[0].snippet, "Flood warning");
        assert_eq!(hits[1].title, "FEMA");
    }

    #[tokio::test]
    async fn test_search_respects_max_results() {
        let server = MockServer::start().await;
        let results: Vec<_> = (0..5)
            .map(|i| json!({"url": format!("https://example.com/{i}")}))
            .collect();
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
            .mount(&server)
            .await;

        let hits = client(&server).search("q", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = client(&server).search("q", 3).await.unwrap_err();
        assert!(matches!(err, AppError::Capability(ref msg) if msg.contains("401")));
    }
}
