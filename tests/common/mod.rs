//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod mocks;

use dossier::{Capabilities, PipelineSettings, ReportCache, ResearchPipeline};
use mocks::{StubExtractor, StubGenerator, StubImages, StubSearch};
use std::sync::Arc;

pub const QUERY: &str = "flood in Texas";

/// Capabilities backed by the deterministic stubs
pub fn stub_capabilities(generator: StubGenerator) -> Capabilities {
    Capabilities {
        search: Arc::new(StubSearch),
        extractor: Arc::new(StubExtractor),
        generator: Arc::new(generator),
        images: Arc::new(StubImages {
            query: QUERY.to_string(),
        }),
    }
}

/// A pipeline over the stubs with its own empty cache
pub fn stub_pipeline(generator: StubGenerator) -> (ResearchPipeline, Arc<ReportCache>) {
    let cache = Arc::new(ReportCache::new());
    let pipeline = ResearchPipeline::new(
        &stub_capabilities(generator),
        &PipelineSettings::default(),
        Arc::clone(&cache),
    )
    .expect("report graph should validate");
    (pipeline, cache)
}
