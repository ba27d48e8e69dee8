//! Typed report sections
//!
//! Every section writer produces exactly one [`Section`] variant. Generators
//! return loosely formatted text, so parsing is tolerant about wrappers
//! (code fences, `{"cited_sources": [...]}` envelopes) but strict about JSON
//! types. Missing string fields parse as empty strings and are rejected later
//! by the assembler's validation step.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// The fixed set of section names, one per writer node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Article,
    ExecutiveSummary,
    TimelineItems,
    CitedSources,
    RawFacts,
    Perspectives,
}

impl SectionKind {
    /// All section kinds in report order
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Article,
        SectionKind::ExecutiveSummary,
        SectionKind::TimelineItems,
        SectionKind::CitedSources,
        SectionKind::RawFacts,
        SectionKind::Perspectives,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Article => "article",
            SectionKind::ExecutiveSummary => "executive_summary",
            SectionKind::TimelineItems => "timeline_items",
            SectionKind::CitedSources => "cited_sources",
            SectionKind::RawFacts => "raw_facts",
            SectionKind::Perspectives => "perspectives",
        }
    }

    /// Human readable label used in prompts ("cited sources")
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Whether the payload is a JSON array rather than an object
    pub fn is_collection(&self) -> bool {
        !matches!(self, SectionKind::Article | SectionKind::ExecutiveSummary)
    }

    /// Example payload shown to the generator so it mirrors the expected shape
    pub fn example(&self) -> Value {
        match self {
            SectionKind::Article => json!({
                "title": "Heat Domes and the Strain on Urban Power Grids",
                "excerpt": "A look at how prolonged heat waves push city grids to their limits and what utilities are doing about it.",
                "content": "When a heat dome settles over a metropolitan area, electricity demand climbs for days without relief. Air conditioning load peaks in the late afternoon, transformers run hot overnight, and reserve margins shrink...",
                "hero_image_url": "https://images.example.com/heat-grid.jpg"
            }),
            SectionKind::ExecutiveSummary => json!({
                "points": [
                    "Multi-day heat waves raise peak electricity demand well above seasonal forecasts.",
                    "Utilities rely on demand response programs and rolling conservation alerts to avoid outages.",
                    "Grid operators are investing in storage to cover evening demand peaks."
                ]
            }),
            SectionKind::TimelineItems => json!([
                {
                    "date": "2023-07-15T00:00:00Z",
                    "title": "Record Evening Demand",
                    "description": "The regional operator reports an all-time evening demand peak during the third week of extreme heat.",
                    "type": "Milestone",
                    "source_label": "Grid Operator Bulletin",
                    "source_url": "https://example.org/bulletins/2023-07-15"
                }
            ]),
            SectionKind::CitedSources => json!([
                {
                    "name": "Regional Transmission Organization",
                    "type": "Official Statement",
                    "description": "Publishes daily load forecasts and emergency alerts during heat events.",
                    "url": "https://example.org/rto"
                }
            ]),
            SectionKind::RawFacts => json!([
                {
                    "category": "Demand Figures",
                    "facts": [
                        "Peak load exceeded the forecast by 6 percent.",
                        "Three conservation alerts were issued in one week."
                    ]
                }
            ]),
            SectionKind::Perspectives => json!([
                {
                    "viewpoint": "Reliability First",
                    "description": "Operators argue that firm generation capacity is the only dependable hedge against heat-driven demand.",
                    "source": "Grid Operator Bulletin",
                    "quote": "Reserve margins were thinner than at any point this decade.",
                    "color": "blue",
                    "url": "https://example.org/bulletins/2023-07-15",
                    "reasoning": "Focuses on near-term outage risk.",
                    "evidence": "Published reserve margin data.",
                    "conflict_source": "Clean Energy Council",
                    "conflict_quote": "Batteries covered the evening ramp without incident.",
                    "conflict_url": "https://example.org/council"
                }
            ]),
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============= Section Payloads =============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleDraft {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub hero_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryDraft {
    pub points: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineDraft {
    pub date: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source_label: String,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactsDraft {
    pub category: String,
    pub facts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveDraft {
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

/// A parsed section, one variant per [`SectionKind`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Section {
    Article(ArticleDraft),
    ExecutiveSummary(SummaryDraft),
    TimelineItems(Vec<TimelineDraft>),
    CitedSources(Vec<SourceDraft>),
    RawFacts(Vec<FactsDraft>),
    Perspectives(Vec<PerspectiveDraft>),
}

#[derive(Debug, thiserror::Error)]
pub enum SectionParseError {
    #[error("generator returned no content for {kind}")]
    Empty { kind: SectionKind },

    #[error("invalid JSON for {kind}: {source}")]
    Json {
        kind: SectionKind,
        #[source]
        source: serde_json::Error,
    },
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Article(_) => SectionKind::Article,
            Section::ExecutiveSummary(_) => SectionKind::ExecutiveSummary,
            Section::TimelineItems(_) => SectionKind::TimelineItems,
            Section::CitedSources(_) => SectionKind::CitedSources,
            Section::RawFacts(_) => SectionKind::RawFacts,
            Section::Perspectives(_) => SectionKind::Perspectives,
        }
    }

    /// Parse raw generator output into the variant for `kind`
    pub fn parse(kind: SectionKind, raw: &str) -> Result<Self, SectionParseError> {
        let body = strip_code_fence(raw);
        if body.is_empty() {
            return Err(SectionParseError::Empty { kind });
        }

        let json_err = |source| SectionParseError::Json { kind, source };
        let value: Value = serde_json::from_str(body).map_err(json_err)?;
        let value = unwrap_envelope(kind, value);

        let section = match kind {
            SectionKind::Article => Section::Article(serde_json::from_value(value).map_err(json_err)?),
            SectionKind::ExecutiveSummary => {
                // A bare list of strings is accepted as the points list
                let value = match value {
                    Value::Array(points) => json!({ "points": points }),
                    other => other,
                };
                Section::ExecutiveSummary(serde_json::from_value(value).map_err(json_err)?)
            }
            SectionKind::TimelineItems => {
                Section::TimelineItems(serde_json::from_value(value).map_err(json_err)?)
            }
            SectionKind::CitedSources => {
                Section::CitedSources(serde_json::from_value(value).map_err(json_err)?)
            }
            SectionKind::RawFacts => Section::RawFacts(serde_json::from_value(value).map_err(json_err)?),
            SectionKind::Perspectives => {
                Section::Perspectives(serde_json::from_value(value).map_err(json_err)?)
            }
        };

        Ok(section)
    }
}

/// Remove a surrounding markdown code fence (```` ```json ... ``` ````) if present
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening fence line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Collections are sometimes wrapped as `{ "<kind>": [...] }` or another single-key object
fn unwrap_envelope(kind: SectionKind, value: Value) -> Value {
    if !kind.is_collection() {
        return value;
    }

    match value {
        Value::Object(mut map) => {
            if let Some(inner) = map.remove(kind.as_str()) {
                return inner;
            }
            let single_array = map.len() == 1 && map.values().all(Value::is_array);
            if single_array {
                if let Some((_, inner)) = map.into_iter().next() {
                    return inner;
                }
                return Value::Null;
            }
            Value::Object(map)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence_with_language() {
        let raw = "```json\n{\"points\": [\"a\"]}\n```";
        assert_eq!(strip_code_fence(raw), "{\"points\": [\"a\"]}");
    }

    #[test]
    fn test_strip_code_fence_without_language() {
        let raw = "  ```\n[1, 2]\n```  ";
        assert_eq!(strip_code_fence(raw), "[1, 2]");
    }

    #[test]
    fn test_strip_code_fence_passthrough() {
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_article_from_fenced_output() {
        let raw = "```json\n{\"title\": \"Flood Watch\", \"excerpt\": \"e\", \"content\": \"c\"}\n```";
        let section = Section::parse(SectionKind::Article, raw).unwrap();
        match section {
            Section::Article(article) => {
                assert_eq!(article.title, "Flood Watch");
                assert!(article.hero_image_url.is_none());
            }
            other => panic!("unexpected section: {:?}", other),
        }
    }

    #[test]
    fn test_parse_article_missing_title_defaults_to_empty() {
        let section = Section::parse(SectionKind::Article, r#"{"content": "body"}"#).unwrap();
        let Section::Article(article) = section else {
            panic!("expected article");
        };
        assert!(article.title.is_empty());
        assert_eq!(article.content, "body");
    }

    #[test]
    fn test_parse_cited_sources_envelope() {
        let raw = r#"{"cited_sources": [{"name": "TDEM", "type": "Agency", "description": "d"}]}"#;
        let section = Section::parse(SectionKind::CitedSources, raw).unwrap();
        let Section::CitedSources(sources) = section else {
            panic!("expected cited sources");
        };
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "TDEM");
        assert_eq!(sources[0].kind, "Agency");
    }

    #[test]
    fn test_parse_collection_with_foreign_envelope_key() {
        let raw = r#"{"items": [{"category": "Stats", "facts": ["one"]}]}"#;
        let section = Section::parse(SectionKind::RawFacts, raw).unwrap();
        assert_eq!(section.kind(), SectionKind::RawFacts);
    }

    #[test]
    fn test_parse_summary_from_bare_list() {
        let section = Section::parse(SectionKind::ExecutiveSummary, r#"["a", "b"]"#).unwrap();
        assert_eq!(
            section,
            Section::ExecutiveSummary(SummaryDraft {
                points: vec!["a".to_string(), "b".to_string()]
            })
        );
    }

    #[test]
    fn test_parse_rejects_prose() {
        let err = Section::parse(SectionKind::TimelineItems, "Sorry, I cannot help.").unwrap_err();
        assert!(matches!(err, SectionParseError::Json { kind: SectionKind::TimelineItems, .. }));
    }

    #[test]
    fn test_parse_rejects_wrong_json_type() {
        let err = Section::parse(SectionKind::RawFacts, r#"[{"category": 42}]"#).unwrap_err();
        assert!(matches!(err, SectionParseError::Json { .. }));
    }

    #[test]
    fn test_parse_rejects_empty_output() {
        let err = Section::parse(SectionKind::Perspectives, "```json\n```").unwrap_err();
        assert!(matches!(err, SectionParseError::Empty { .. }));
    }

    #[test]
    fn test_examples_parse_as_their_own_kind() {
        for kind in SectionKind::ALL {
            let raw = kind.example().to_string();
            let section = Section::parse(kind, &raw).unwrap();
            assert_eq!(section.kind(), kind);
        }
    }
}
