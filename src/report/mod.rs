//! Report sections, assembly, and the in-memory report cache

pub mod assembler;
pub mod cache;
pub mod model;
pub mod section;

pub use assembler::{slugify, Assembler, ValidationError};
pub use cache::ReportCache;
pub use model::{Article, CitedSource, ExecutiveSummary, Perspective, RawFacts, Report, TimelineItem};
pub use section::{Section, SectionKind, SectionParseError};
