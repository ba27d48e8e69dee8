use async_trait::async_trait;

use crate::pipeline::{LogEntry, NodeError, Snapshot, StateDelta, TaskNode};
use crate::report::SectionKind;

/// Terminal node; waits for every writer and the image lookup
///
/// Sections are merged as each writer completes, so this node only records
/// which sections made it into the state.
#[derive(Debug, Default)]
pub struct AggregateNode;

impl AggregateNode {
    pub const NAME: &'static str = "aggregate";
}

#[async_trait]
impl TaskNode for AggregateNode {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, state: Snapshot) -> Result<StateDelta, NodeError> {
        let missing: Vec<&str> = SectionKind::ALL
            .iter()
            .filter(|kind| state.section(**kind).is_none())
            .map(|kind| kind.as_str())
            .collect();

        let message = if missing.is_empty() {
            format!("Aggregated all {} sections", SectionKind::ALL.len())
        } else {
            format!(
                "Aggregated {} of {} sections (missing: {})",
                SectionKind::ALL.len() - missing.len(),
                SectionKind::ALL.len(),
                missing.join(", ")
            )
        };
        tracing::info!(missing = missing.len(), "{}", message);

        Ok(StateDelta::new().log(LogEntry::info(Self::NAME, message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineState;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_reports_missing_sections() {
        let delta = AggregateNode
            .execute(Arc::new(PipelineState::new("q")))
            .await
            .unwrap();
        let log = delta.message_log.unwrap();
        assert!(log[0].message.contains("0 of 6"));
        assert!(log[0].message.contains("perspectives"));
        assert!(delta.report_sections.is_none());
    }
}
