//! # Dossier - research-report orchestration server
//!
//! Dossier turns a single query ("flood in Texas") into a structured research
//! report. A validated graph of agent tasks searches the web, extracts page
//! text, writes six report sections in parallel with an LLM, attaches images
//! and hands the merged state to an assembler that validates the report
//! before it is published under a slug.
//!
//! ## Overview
//!
//! Dossier can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `dossier-server` binary
//! 2. **As a library** - Build your own graphs on the orchestration engine
//!
//! ### Running the report pipeline
//!
//! ```rust,ignore
//! use dossier::{DossierConfigManager, ReportCache, ResearchPipeline};
//! use std::sync::Arc;
//!
//! let manager = DossierConfigManager::new("dossier.toml")?;
//! let cache = Arc::new(ReportCache::new());
//! let pipeline = ResearchPipeline::from_config(&manager.config(), cache)?;
//!
//! let report = pipeline.run("flood in Texas").await?;
//! println!("{}", report.article.title);
//! ```
//!
//! ### Using the engine directly
//!
//! ```rust,ignore
//! use dossier::pipeline::{GraphSpec, PipelineState, Scheduler, END, START};
//!
//! let graph = GraphSpec::new()
//!     .node(fetch)
//!     .node(summarize)
//!     .edge(START, "fetch")
//!     .edge("fetch", "summarize")
//!     .edge("summarize", END)
//!     .build()?;
//!
//! let outcome = Scheduler::default().run(&graph, PipelineState::new("topic")).await?;
//! ```
//!
//! ## Modules
//!
//! - [`pipeline`] - Graph declaration, validation, scheduling and state merging
//! - [`agents`] - Concrete task nodes (research, extract, writers, image, aggregate)
//! - [`report`] - Report model, section parsing, assembly and the report cache
//! - [`research`] - The report graph wired to production capabilities
//! - [`api`] - REST API handlers and routes
//! - [`llm`] - Text generation client
//! - [`tools`] - Search, page extraction and image capabilities
//! - [`types`] - Common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Concrete task nodes of the report graph.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// Text generation clients.
pub mod llm;
/// Graph orchestration engine.
pub mod pipeline;
/// Report model, assembly and cache.
pub mod report;
/// The research report pipeline.
pub mod research;
/// External capabilities (search, page extraction, images).
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{ChatCompletionsClient, GenerationRequest, TextGenerator};
pub use pipeline::{ExecutionGraph, GraphSpec, PipelineError, PipelineState, Scheduler};
pub use report::{Report, ReportCache};
pub use research::{Capabilities, PipelineSettings, ResearchPipeline};
pub use types::{AppError, Result};
pub use utils::toml_config::{DossierConfig, DossierConfigManager};

use arc_swap::ArcSwap;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based configuration with reload support
    pub config_manager: Arc<DossierConfigManager>,
    /// The report pipeline, replaced as a whole on reload
    pipeline: Arc<ArcSwap<ResearchPipeline>>,
    /// Published reports, keyed by slug
    pub cache: Arc<ReportCache>,
}

impl AppState {
    /// Build state around an existing pipeline, sharing its cache
    pub fn new(config_manager: Arc<DossierConfigManager>, pipeline: Arc<ResearchPipeline>) -> Self {
        let cache = Arc::clone(pipeline.cache());
        Self {
            config_manager,
            pipeline: Arc::new(ArcSwap::new(pipeline)),
            cache,
        }
    }

    /// The pipeline new requests run on; in-flight runs keep the one they started with
    pub fn pipeline(&self) -> Arc<ResearchPipeline> {
        self.pipeline.load_full()
    }

    /// Re-read the config file and rebuild the pipeline from it
    ///
    /// Published reports stay in the shared cache. If the new file does not
    /// load or the pipeline cannot be built, the running config and pipeline
    /// are kept. Returns `false` when there is no file to reload from.
    pub fn reload(&self) -> Result<bool> {
        let rebuilt = self
            .config_manager
            .reload_with(|config| ResearchPipeline::from_config(config, Arc::clone(&self.cache)))?;

        let Some(pipeline) = rebuilt else {
            return Ok(false);
        };
        tracing::info!(
            step_budget = pipeline.settings().step_budget,
            max_sources = pipeline.settings().max_sources,
            "Research pipeline rebuilt from reloaded configuration"
        );
        self.pipeline.store(Arc::new(pipeline));
        Ok(true)
    }
}
