//! The research report pipeline
//!
//! Wires the concrete nodes into the report graph:
//!
//! ```text
//! START -> research -> extract -> article ------------.
//!                             -> executive_summary ---|
//!                             -> timeline_items ------|
//!                             -> raw_facts -----------+-> aggregate -> END
//!                             -> perspectives --------|
//!                             -> cited_sources -> image
//!                                     \_______________/
//! ```
//!
//! `cited_sources` feeds both `image` and `aggregate`; `image` feeds
//! `aggregate`.

use std::sync::Arc;

use tracing::Instrument;

use crate::agents::{AggregateNode, ExtractNode, ImageNode, ResearchNode, SectionWriterNode};
use crate::llm::{ChatCompletionsClient, TextGenerator};
use crate::pipeline::{
    ExecutionGraph, GraphError, GraphSpec, MergeRegistry, PipelineError, PipelineState, RunOutcome, Scheduler, END,
    START,
};
use crate::report::{Assembler, Report, ReportCache, SectionKind};
use crate::tools::{
    ImageFinder, PageExtractor, PageFetcher, PexelsImages, SearchProvider, TavilySearch, WebSearch,
};
use crate::types::{AppError, Result};
use crate::utils::toml_config::{DossierConfig, SearchProviderKind};

/// External capabilities the pipeline nodes call
#[derive(Clone)]
pub struct Capabilities {
    pub search: Arc<dyn SearchProvider>,
    pub extractor: Arc<dyn PageExtractor>,
    pub generator: Arc<dyn TextGenerator>,
    pub images: Arc<dyn ImageFinder>,
}

impl Capabilities {
    /// Build the production providers described by `config`
    pub fn from_config(config: &DossierConfig) -> Result<Self> {
        let search: Arc<dyn SearchProvider> = match config.search.provider {
            SearchProviderKind::Duckduckgo => Arc::new(WebSearch::new()),
            SearchProviderKind::Tavily => {
                let env = config.search.api_key_env.as_deref();
                let key = config.resolve_env(env).ok_or_else(|| {
                    AppError::Configuration(format!(
                        "Tavily search needs an API key in {}",
                        env.unwrap_or("search.api_key_env")
                    ))
                })?;
                Arc::new(TavilySearch::new(
                    config.search.base_url.clone(),
                    key,
                    config.search_timeout(),
                )?)
            }
        };

        let generator = ChatCompletionsClient::new(
            config.llm.base_url.clone(),
            config.llm.model.clone(),
            config.resolve_env(config.llm.api_key_env.as_deref()),
            config.llm.temperature,
            config.llm_timeout(),
        )?;

        let images = PexelsImages::new(
            config.images.base_url.clone(),
            config.resolve_env(config.images.api_key_env.as_deref()),
            config.images.per_page,
            config.images_timeout(),
        )?;
        if !images.is_enabled() {
            tracing::warn!("No image API key configured; reports will use placeholder images");
        }

        Ok(Self {
            search,
            extractor: Arc::new(PageFetcher::new()),
            generator: Arc::new(generator),
            images: Arc::new(images),
        })
    }
}

/// Tunables of a pipeline, usually taken from [`DossierConfig`]
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_sources: usize,
    pub extract_max_chars: usize,
    pub step_budget: usize,
    pub hero_placeholder: String,
    pub source_placeholder: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&DossierConfig::default())
    }
}

impl From<&DossierConfig> for PipelineSettings {
    fn from(config: &DossierConfig) -> Self {
        Self {
            max_sources: config.pipeline.max_sources,
            extract_max_chars: config.pipeline.extract_max_chars,
            step_budget: config.pipeline.step_budget,
            hero_placeholder: config.images.hero_placeholder.clone(),
            source_placeholder: config.images.source_placeholder.clone(),
        }
    }
}

/// Declare and validate the report graph
pub fn build_research_graph(caps: &Capabilities, settings: &PipelineSettings) -> std::result::Result<ExecutionGraph, GraphError> {
    let mut spec = GraphSpec::new()
        .node(Arc::new(ResearchNode::new(Arc::clone(&caps.search), settings.max_sources)))
        .node(Arc::new(ExtractNode::new(
            Arc::clone(&caps.extractor),
            settings.extract_max_chars,
        )))
        .node(Arc::new(ImageNode::new(Arc::clone(&caps.images))))
        .node(Arc::new(AggregateNode))
        .edge(START, ResearchNode::NAME)
        .edge(ResearchNode::NAME, ExtractNode::NAME);

    for kind in SectionKind::ALL {
        spec = spec
            .node(Arc::new(SectionWriterNode::new(kind, Arc::clone(&caps.generator))))
            .edge(ExtractNode::NAME, kind.as_str())
            .edge(kind.as_str(), AggregateNode::NAME);
    }

    spec.edge(SectionKind::CitedSources.as_str(), ImageNode::NAME)
        .edge(ImageNode::NAME, AggregateNode::NAME)
        .edge(AggregateNode::NAME, END)
        .build()
}

/// Runs the report graph for a query, validates the result and caches it
pub struct ResearchPipeline {
    graph: ExecutionGraph,
    settings: PipelineSettings,
    scheduler: Scheduler,
    assembler: Assembler,
    cache: Arc<ReportCache>,
}

impl ResearchPipeline {
    pub fn new(
        caps: &Capabilities,
        settings: &PipelineSettings,
        cache: Arc<ReportCache>,
    ) -> std::result::Result<Self, GraphError> {
        let graph = build_research_graph(caps, settings)?;
        if settings.step_budget < graph.len() {
            return Err(GraphError::BudgetBelowGraphSize {
                budget: settings.step_budget,
                nodes: graph.len(),
            });
        }
        tracing::debug!(order = ?graph.topological_order(), "Research graph validated");

        Ok(Self {
            graph,
            settings: settings.clone(),
            scheduler: Scheduler::new(MergeRegistry::default(), settings.step_budget),
            assembler: Assembler::new(settings.hero_placeholder.clone(), settings.source_placeholder.clone()),
            cache,
        })
    }

    /// Build with production capabilities
    pub fn from_config(config: &DossierConfig, cache: Arc<ReportCache>) -> Result<Self> {
        let caps = Capabilities::from_config(config)?;
        Self::new(&caps, &PipelineSettings::from(config), cache).map_err(|e| AppError::Pipeline(e.into()))
    }

    pub fn graph(&self) -> &ExecutionGraph {
        &self.graph
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<ReportCache> {
        &self.cache
    }

    /// Run the graph and assemble a validated report without caching it
    pub async fn execute(&self, query: &str) -> std::result::Result<Report, PipelineError> {
        let span = tracing::info_span!("research_run", query = %query);
        async {
            let RunOutcome { state, executed, steps } =
                self.scheduler.run(&self.graph, PipelineState::new(query)).await?;

            for entry in state.errors() {
                tracing::warn!(node = %entry.node, "{}", entry.message);
            }
            tracing::info!(
                executed = executed.len(),
                steps,
                sections = state.report_sections.len(),
                "Pipeline finished, assembling report"
            );

            let report = self.assembler.assemble(&state)?;
            Ok::<_, PipelineError>(report)
        }
        .instrument(span)
        .await
    }

    /// Run, validate, and publish the report under its slug
    pub async fn run(&self, query: &str) -> std::result::Result<Arc<Report>, PipelineError> {
        let report = self.execute(query).await?;
        let slug = report.slug().to_string();
        let report = self.cache.put(slug.clone(), report);
        tracing::info!(slug = %slug, "Report cached");
        Ok(report)
    }
}
