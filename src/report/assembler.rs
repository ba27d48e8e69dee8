//! Report assembly and validation
//!
//! The assembler turns the final [`PipelineState`] into a [`Report`]: it
//! derives the slug, stamps a run identifier on every item, resolves image
//! references and fills article metadata. The result is validated before it
//! is handed back; a report with problems is never returned.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::model::{Article, CitedSource, ExecutiveSummary, Perspective, RawFacts, Report, TimelineItem};
use super::section::{Section, SectionKind};
use crate::pipeline::state::{ImageRefs, PipelineState};

pub const DEFAULT_HERO_PLACEHOLDER: &str = "https://images.pexels.com/photos/12345/flood-image.jpg";
pub const DEFAULT_SOURCE_PLACEHOLDER: &str = "https://p-cdn.com/generic-source-logo.png";

const CATEGORY: &str = "Research";
const AUTHOR_NAME: &str = "AI Agent";
const AUTHOR_TITLE: &str = "Research Specialist";
const WORDS_PER_MINUTE: usize = 200;

/// The assembled report failed validation
#[derive(Debug, thiserror::Error)]
#[error("report validation failed: {}", .problems.join("; "))]
pub struct ValidationError {
    pub problems: Vec<String>,
    /// Everything that could be assembled, for diagnostics
    pub partial: serde_json::Value,
}

/// Derive a URL slug from a title
///
/// Lower-cases, turns spaces into `-`, drops anything outside `[a-z0-9-]`,
/// collapses runs of `-` and trims `-` from both ends.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        let c = if c == ' ' { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Random positive 31-bit run identifier
pub fn new_run_id() -> i64 {
    let id = (Uuid::new_v4().as_u128() & 0x7fff_ffff) as i64;
    id.max(1)
}

fn read_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct Assembler {
    hero_placeholder: String,
    source_placeholder: String,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(DEFAULT_HERO_PLACEHOLDER, DEFAULT_SOURCE_PLACEHOLDER)
    }
}

impl Assembler {
    pub fn new(hero_placeholder: impl Into<String>, source_placeholder: impl Into<String>) -> Self {
        Self {
            hero_placeholder: hero_placeholder.into(),
            source_placeholder: source_placeholder.into(),
        }
    }

    /// Assemble with a fresh run identifier and the current time
    pub fn assemble(&self, state: &PipelineState) -> Result<Report, ValidationError> {
        self.assemble_with(state, new_run_id(), Utc::now())
    }

    pub fn assemble_with(
        &self,
        state: &PipelineState,
        run_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Report, ValidationError> {
        let mut problems = Vec::new();
        let empty_refs = ImageRefs::default();
        let refs = state.image_refs.as_ref().unwrap_or(&empty_refs);

        let article = match state.section(SectionKind::Article) {
            Some(Section::Article(draft)) => {
                let slug = slugify(&draft.title);
                let hero_image_url = non_empty(Some(refs.hero.as_str()))
                    .unwrap_or(&self.hero_placeholder)
                    .to_string();
                Article {
                    id: run_id,
                    slug,
                    title: draft.title.trim().to_string(),
                    excerpt: draft.excerpt.clone(),
                    content: draft.content.clone(),
                    category: CATEGORY.to_string(),
                    published_at: now,
                    read_time: read_time(&draft.content),
                    source_count: state.scraped_items.len(),
                    hero_image_url,
                    author_name: AUTHOR_NAME.to_string(),
                    author_title: AUTHOR_TITLE.to_string(),
                }
            }
            _ => {
                problems.push("article section is missing".to_string());
                Article {
                    id: run_id,
                    published_at: now,
                    ..Default::default()
                }
            }
        };

        let executive_summary = match state.section(SectionKind::ExecutiveSummary) {
            Some(Section::ExecutiveSummary(draft)) => Some(ExecutiveSummary {
                article_id: run_id,
                points: draft.points.clone(),
            }),
            _ => None,
        };

        let timeline_items = match state.section(SectionKind::TimelineItems) {
            Some(Section::TimelineItems(items)) => items
                .iter()
                .map(|item| TimelineItem {
                    article_id: run_id,
                    date: item.date.clone(),
                    title: item.title.clone(),
                    description: item.description.clone(),
                    kind: item.kind.clone(),
                    source_label: item.source_label.clone(),
                    source_url: item.source_url.clone(),
                })
                .collect(),
            _ => Vec::new(),
        };

        let cited_sources = match state.section(SectionKind::CitedSources) {
            Some(Section::CitedSources(sources)) => sources
                .iter()
                .enumerate()
                .map(|(i, source)| CitedSource {
                    article_id: run_id,
                    name: source.name.clone(),
                    kind: source.kind.clone(),
                    description: source.description.clone(),
                    url: source.url.clone(),
                    image_url: non_empty(refs.per_source.get(i).map(String::as_str))
                        .unwrap_or(&self.source_placeholder)
                        .to_string(),
                })
                .collect(),
            _ => Vec::new(),
        };

        let raw_facts = match state.section(SectionKind::RawFacts) {
            Some(Section::RawFacts(groups)) => groups
                .iter()
                .map(|group| RawFacts {
                    article_id: run_id,
                    category: group.category.clone(),
                    facts: group.facts.clone(),
                })
                .collect(),
            _ => Vec::new(),
        };

        let perspectives = match state.section(SectionKind::Perspectives) {
            Some(Section::Perspectives(items)) => items
                .iter()
                .map(|p| Perspective {
                    article_id: run_id,
                    viewpoint: p.viewpoint.clone(),
                    description: p.description.clone(),
                    source: p.source.clone(),
                    quote: p.quote.clone(),
                    color: p.color.clone(),
                    url: p.url.clone(),
                    reasoning: p.reasoning.clone(),
                    evidence: p.evidence.clone(),
                    conflict_source: p.conflict_source.clone(),
                    conflict_quote: p.conflict_quote.clone(),
                    conflict_url: p.conflict_url.clone(),
                })
                .collect(),
            _ => Vec::new(),
        };

        let report = Report {
            article,
            executive_summary,
            timeline_items,
            cited_sources,
            raw_facts,
            perspectives,
        };

        problems.extend(report.problems());
        if !problems.is_empty() {
            let partial = serde_json::to_value(&report).unwrap_or(serde_json::Value::Null);
            return Err(ValidationError { problems, partial });
        }

        tracing::debug!(
            slug = %report.slug(),
            run_id,
            cited_sources = report.cited_sources.len(),
            "Report assembled"
        );
        Ok(report)
    }
}
