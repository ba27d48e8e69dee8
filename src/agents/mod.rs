//! Task nodes of the research pipeline
//!
//! | Node | Reads | Writes |
//! |------|-------|--------|
//! | `research` | `query` | `search_results` |
//! | `extract` | `search_results` | `scraped_items` |
//! | one per [`SectionKind`](crate::report::SectionKind) | `scraped_items` | `report_sections[kind]` |
//! | `image` | `query`, `report_sections[cited_sources]` | `image_refs` |
//! | `aggregate` | everything | - |
//!
//! Every node also appends to `message_log`.

pub mod aggregate;
pub mod extract;
pub mod images;
pub mod research;
pub mod writer;

pub use aggregate::AggregateNode;
pub use extract::ExtractNode;
pub use images::ImageNode;
pub use research::ResearchNode;
pub use writer::SectionWriterNode;
