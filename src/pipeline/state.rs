//! Pipeline state, deltas and merge strategies
//!
//! Nodes never mutate [`PipelineState`] directly. They receive a shared,
//! read-only snapshot and return a [`StateDelta`]; the scheduler folds the
//! delta into a new state through a [`MergeRegistry`].
//!
//! | Field | Shape | Default strategy |
//! |-------|-------|------------------|
//! | `query` | scalar | overwrite |
//! | `message_log` | sequence | append |
//! | `search_results` | sequence | overwrite |
//! | `scraped_items` | sequence | overwrite |
//! | `report_sections` | mapping | shallow merge |
//! | `image_refs` | scalar | overwrite |

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::{Section, SectionKind};
use crate::types::SearchHit;

// ============= State Values =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// One entry of the run's message log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub node: String,
    pub level: LogLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl LogEntry {
    pub fn info(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            level: LogLevel::Info,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn error(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            level: LogLevel::Error,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }
}

/// Text extracted from one source page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedItem {
    pub source_url: String,
    pub text: String,
}

/// Image references found for the report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRefs {
    pub hero: String,
    /// One entry per cited source, in source order
    pub per_source: Vec<String>,
}

// ============= Fields & Strategies =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Query,
    MessageLog,
    SearchResults,
    ScrapedItems,
    ReportSections,
    ImageRefs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Scalar,
    Sequence,
    Mapping,
}

/// How an incoming value combines with the current value of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Concatenate, in the order deltas are applied
    Append,
    /// Union of keys; a colliding key takes the last applied value
    ShallowMerge,
    /// Last write wins
    Overwrite,
    /// Only one writer may ever set the field
    WriteOnce,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Query,
        Field::MessageLog,
        Field::SearchResults,
        Field::ScrapedItems,
        Field::ReportSections,
        Field::ImageRefs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Query => "query",
            Field::MessageLog => "message_log",
            Field::SearchResults => "search_results",
            Field::ScrapedItems => "scraped_items",
            Field::ReportSections => "report_sections",
            Field::ImageRefs => "image_refs",
        }
    }

    pub fn shape(&self) -> FieldShape {
        match self {
            Field::Query | Field::ImageRefs => FieldShape::Scalar,
            Field::MessageLog | Field::SearchResults | Field::ScrapedItems => FieldShape::Sequence,
            Field::ReportSections => FieldShape::Mapping,
        }
    }

    pub fn default_strategy(&self) -> MergeStrategy {
        match self {
            Field::MessageLog => MergeStrategy::Append,
            Field::ReportSections => MergeStrategy::ShallowMerge,
            Field::Query | Field::SearchResults | Field::ScrapedItems | Field::ImageRefs => {
                MergeStrategy::Overwrite
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MergeStrategy {
    pub fn supports(&self, shape: FieldShape) -> bool {
        match self {
            MergeStrategy::Append => shape == FieldShape::Sequence,
            MergeStrategy::ShallowMerge => shape == FieldShape::Mapping,
            MergeStrategy::Overwrite | MergeStrategy::WriteOnce => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeConflict {
    #[error("field '{field}' is owned by '{owner}' and cannot be written by '{writer}'")]
    AlreadyWritten {
        field: Field,
        owner: String,
        writer: String,
    },

    #[error("strategy {strategy:?} cannot merge {shape:?} field '{field}'")]
    IncompatibleStrategy {
        field: Field,
        strategy: MergeStrategy,
        shape: FieldShape,
    },
}

// ============= State & Delta =============

/// Accumulated progress of one pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineState {
    pub query: String,
    pub message_log: Vec<LogEntry>,
    pub search_results: Vec<SearchHit>,
    pub scraped_items: Vec<ScrapedItem>,
    pub report_sections: BTreeMap<SectionKind, Section>,
    pub image_refs: Option<ImageRefs>,
    /// Last writer of each field
    writers: BTreeMap<Field, String>,
}

/// Writer key recorded for fields set when a run starts
pub const RUN_START_WRITER: &str = "start";

impl PipelineState {
    pub fn new(query: impl Into<String>) -> Self {
        let mut writers = BTreeMap::new();
        writers.insert(Field::Query, RUN_START_WRITER.to_string());
        Self {
            query: query.into(),
            writers,
            ..Default::default()
        }
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.report_sections.get(&kind)
    }

    pub fn writer_of(&self, field: Field) -> Option<&str> {
        self.writers.get(&field).map(String::as_str)
    }

    /// Error entries of the message log, in log order
    pub fn errors(&self) -> impl Iterator<Item = &LogEntry> {
        self.message_log.iter().filter(|entry| entry.is_error())
    }
}

/// Partial update returned by a node; `None` means the field is untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDelta {
    pub query: Option<String>,
    pub message_log: Option<Vec<LogEntry>>,
    pub search_results: Option<Vec<SearchHit>>,
    pub scraped_items: Option<Vec<ScrapedItem>>,
    pub report_sections: Option<BTreeMap<SectionKind, Section>>,
    pub image_refs: Option<ImageRefs>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(mut self, entry: LogEntry) -> Self {
        self.message_log.get_or_insert_with(Vec::new).push(entry);
        self
    }

    pub fn with_search_results(mut self, hits: Vec<SearchHit>) -> Self {
        self.search_results = Some(hits);
        self
    }

    pub fn with_scraped_items(mut self, items: Vec<ScrapedItem>) -> Self {
        self.scraped_items = Some(items);
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.report_sections
            .get_or_insert_with(BTreeMap::new)
            .insert(section.kind(), section);
        self
    }

    pub fn with_image_refs(mut self, refs: ImageRefs) -> Self {
        self.image_refs = Some(refs);
        self
    }

    /// Fields this delta writes
    pub fn touched_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| match field {
                Field::Query => self.query.is_some(),
                Field::MessageLog => self.message_log.is_some(),
                Field::SearchResults => self.search_results.is_some(),
                Field::ScrapedItems => self.scraped_items.is_some(),
                Field::ReportSections => self.report_sections.is_some(),
                Field::ImageRefs => self.image_refs.is_some(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.touched_fields().is_empty()
    }
}

// ============= Merge Registry =============

/// Per-field merge strategies
#[derive(Debug, Clone)]
pub struct MergeRegistry {
    strategies: BTreeMap<Field, MergeStrategy>,
}

impl Default for MergeRegistry {
    fn default() -> Self {
        Self {
            strategies: Field::ALL
                .into_iter()
                .map(|field| (field, field.default_strategy()))
                .collect(),
        }
    }
}

impl MergeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the strategy of one field, rejecting shape mismatches
    pub fn with_strategy(mut self, field: Field, strategy: MergeStrategy) -> Result<Self, MergeConflict> {
        if !strategy.supports(field.shape()) {
            return Err(MergeConflict::IncompatibleStrategy {
                field,
                strategy,
                shape: field.shape(),
            });
        }
        self.strategies.insert(field, strategy);
        Ok(self)
    }

    pub fn strategy(&self, field: Field) -> MergeStrategy {
        self.strategies
            .get(&field)
            .copied()
            .unwrap_or_else(|| field.default_strategy())
    }

    /// Fold `delta` into a copy of `current`; `current` is left untouched
    pub fn apply(
        &self,
        current: &PipelineState,
        delta: StateDelta,
        writer: &str,
    ) -> Result<PipelineState, MergeConflict> {
        // Check every touched field first so a conflict leaves nothing half-applied
        for field in delta.touched_fields() {
            self.check_owner(current, field, writer)?;
        }

        let mut next = current.clone();
        let StateDelta {
            query,
            message_log,
            search_results,
            scraped_items,
            report_sections,
            image_refs,
        } = delta;

        if let Some(query) = query {
            next.query = query;
            next.record(Field::Query, writer);
        }
        if let Some(entries) = message_log {
            merge_sequence(self.strategy(Field::MessageLog), &mut next.message_log, entries);
            next.record(Field::MessageLog, writer);
        }
        if let Some(hits) = search_results {
            merge_sequence(self.strategy(Field::SearchResults), &mut next.search_results, hits);
            next.record(Field::SearchResults, writer);
        }
        if let Some(items) = scraped_items {
            merge_sequence(self.strategy(Field::ScrapedItems), &mut next.scraped_items, items);
            next.record(Field::ScrapedItems, writer);
        }
        if let Some(sections) = report_sections {
            merge_mapping(
                self.strategy(Field::ReportSections),
                &mut next.report_sections,
                sections,
                writer,
            );
            next.record(Field::ReportSections, writer);
        }
        if let Some(refs) = image_refs {
            next.image_refs = Some(refs);
            next.record(Field::ImageRefs, writer);
        }

        Ok(next)
    }

    fn check_owner(&self, state: &PipelineState, field: Field, writer: &str) -> Result<(), MergeConflict> {
        if self.strategy(field) != MergeStrategy::WriteOnce {
            return Ok(());
        }
        match state.writer_of(field) {
            Some(owner) if owner != writer => Err(MergeConflict::AlreadyWritten {
                field,
                owner: owner.to_string(),
                writer: writer.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl PipelineState {
    fn record(&mut self, field: Field, writer: &str) {
        self.writers.insert(field, writer.to_string());
    }
}

fn merge_sequence<T>(strategy: MergeStrategy, current: &mut Vec<T>, incoming: Vec<T>) {
    if strategy == MergeStrategy::Append {
        current.extend(incoming);
    } else {
        *current = incoming;
    }
}

fn merge_mapping<K, V>(strategy: MergeStrategy, current: &mut BTreeMap<K, V>, incoming: BTreeMap<K, V>, writer: &str)
where
    K: Ord,
{
    if strategy != MergeStrategy::ShallowMerge {
        *current = incoming;
        return;
    }
    for (key, value) in incoming {
        if current.insert(key, value).is_some() {
            tracing::warn!(writer = %writer, "Overwrote existing key during shallow merge");
        }
    }
}
