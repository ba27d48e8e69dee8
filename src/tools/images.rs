//! Pexels image search
//!
//! Without an API key the finder is inert and returns no images, leaving the
//! assembler to fill in placeholders.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::ImageFinder;
use crate::types::{AppError, ImageHit, Result};

pub const DEFAULT_PEXELS_URL: &str = "https://api.pexels.com";

#[derive(Debug, Deserialize)]
struct PexelsSearch {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    src: PexelsSources,
}

#[derive(Debug, Deserialize)]
struct PexelsSources {
    original: String,
}

#[derive(Debug, Clone)]
pub struct PexelsImages {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    per_page: u32,
}

impl PexelsImages {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        per_page: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
            per_page,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl ImageFinder for PexelsImages {
    async fn find_images(&self, query: &str) -> Result<Vec<ImageHit>> {
        let Some(api_key) = &self.api_key else {
            tracing::debug!(query = %query, "No Pexels API key configured, skipping image lookup");
            return Ok(Vec::new());
        };

        let per_page = self.per_page.to_string();
        let response = self
            .http
            .get(format!("{}/v1/search", self.base_url))
            .header(reqwest::header::AUTHORIZATION, api_key)
            .query(&[("query", query), ("page", "1"), ("per_page", per_page.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Capability(format!("Pexels request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Capability(format!(
                "Pexels returned status {}",
                response.status()
            )));
        }

        let payload: PexelsSearch = response
            .json()
            .await
            .map_err(|e| AppError::Capability(format!("Invalid Pexels response: {}", e)))?;

        Ok(payload
            .photos
            .into_iter()
            .map(|photo| ImageHit {
                url: photo.src.original,
            })
            .collect())
    }
}
