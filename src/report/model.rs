//! Validated report structure served by `/api/article/{slug}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The primary document of a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Article {
    /// Run identifier shared by every item of the report
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub published_at: DateTime<Utc>,
    /// Estimated reading time in minutes
    pub read_time: u32,
    /// Number of pages the report was written from
    pub source_count: usize,
    pub hero_image_url: String,
    pub author_name: String,
    pub author_title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExecutiveSummary {
    pub article_id: i64,
    pub points: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TimelineItem {
    pub article_id: i64,
    pub date: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source_label: String,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CitedSource {
    pub article_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub url: Option<String>,
    pub image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RawFacts {
    pub article_id: i64,
    pub category: String,
    pub facts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Perspective {
    pub article_id: i64,
    pub viewpoint: String,
    pub description: String,
    pub source: Option<String>,
    pub quote: Option<String>,
    pub color: String,
    pub url: Option<String>,
    pub reasoning: Option<String>,
    pub evidence: Option<String>,
    pub conflict_source: Option<String>,
    pub conflict_quote: Option<String>,
    pub conflict_url: Option<String>,
}

/// A complete research report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Report {
    pub article: Article,
    pub executive_summary: Option<ExecutiveSummary>,
    pub timeline_items: Vec<TimelineItem>,
    pub cited_sources: Vec<CitedSource>,
    pub raw_facts: Vec<RawFacts>,
    pub perspectives: Vec<Perspective>,
}

impl Report {
    pub fn slug(&self) -> &str {
        &self.article.slug
    }

    /// Check required fields and back-references, returning every problem found
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let id = self.article.id;

        let article = &self.article;
        if article.title.trim().is_empty() {
            problems.push("article.title is required".to_string());
        }
        if article.slug.is_empty() {
            problems.push("article.slug could not be derived from the title".to_string());
        }
        if article.excerpt.trim().is_empty() {
            problems.push("article.excerpt is required".to_string());
        }
        if article.content.trim().is_empty() {
            problems.push("article.content is required".to_string());
        }
        if article.hero_image_url.is_empty() {
            problems.push("article.hero_image_url is required".to_string());
        }

        if let Some(summary) = &self.executive_summary {
            if summary.article_id != id {
                problems.push("executive_summary.article_id does not match the article".to_string());
            }
        }

        for (i, item) in self.timeline_items.iter().enumerate() {
            if item.title.trim().is_empty() {
                problems.push(format!("timeline_items[{}].title is required", i));
            }
            if item.date.trim().is_empty() {
                problems.push(format!("timeline_items[{}].date is required", i));
            }
            if item.article_id != id {
                problems.push(format!("timeline_items[{}].article_id does not match the article", i));
            }
        }

        for (i, source) in self.cited_sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                problems.push(format!("cited_sources[{}].name is required", i));
            }
            if source.image_url.is_empty() {
                problems.push(format!("cited_sources[{}].image_url is required", i));
            }
            if source.article_id != id {
                problems.push(format!("cited_sources[{}].article_id does not match the article", i));
            }
        }

        for (i, group) in self.raw_facts.iter().enumerate() {
            if group.category.trim().is_empty() {
                problems.push(format!("raw_facts[{}].category is required", i));
            }
            if group.article_id != id {
                problems.push(format!("raw_facts[{}].article_id does not match the article", i));
            }
        }

        for (i, perspective) in self.perspectives.iter().enumerate() {
            if perspective.viewpoint.trim().is_empty() {
                problems.push(format!("perspectives[{}].viewpoint is required", i));
            }
            if perspective.article_id != id {
                problems.push(format!("perspectives[{}].article_id does not match the article", i));
            }
        }

        problems
    }
}
