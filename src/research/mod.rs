//! Research report pipeline
//!
//! [`ResearchPipeline`] ties the orchestration engine, the concrete nodes,
//! the assembler and the report cache together:
//!
//! ```ignore
//! use dossier::research::ResearchPipeline;
//!
//! let pipeline = ResearchPipeline::from_config(&config, cache)?;
//! let report = pipeline.run("flood in Texas").await?;
//! println!("/api/article/{}", report.slug());
//! ```

/// Graph wiring, capabilities and the run facade.
pub mod pipeline;

pub use pipeline::{build_research_graph, Capabilities, PipelineSettings, ResearchPipeline};
