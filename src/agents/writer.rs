use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::{GenerationRequest, TextGenerator};
use crate::pipeline::{LogEntry, NodeError, PipelineState, Snapshot, StateDelta, TaskNode};
use crate::report::{Section, SectionKind};

/// Generates one report section from the extracted pages
///
/// The node is named after its section kind, so each writer owns exactly one
/// key of `report_sections`.
pub struct SectionWriterNode {
    kind: SectionKind,
    generator: Arc<dyn TextGenerator>,
}

impl SectionWriterNode {
    pub fn new(kind: SectionKind, generator: Arc<dyn TextGenerator>) -> Self {
        Self { kind, generator }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    fn system_prompt(&self) -> String {
        let example = serde_json::to_string_pretty(&self.kind.example()).unwrap_or_default();
        format!(
            r#"You are an expert writing agent. Your sole purpose is to generate a specific section of a research report based on provided web content.

You MUST generate a valid JSON output that strictly follows the structure and field names of the example below.
Do not add any commentary, explanations, or any text outside of the JSON output.

### EXAMPLE FORMAT ###
```json
{example}
```

Now, using the provided web content, generate the '{name}' section of the report. Adhere to the example format precisely."#,
            example = example,
            name = self.kind.as_str(),
        )
    }

    fn prompt(&self, state: &PipelineState) -> String {
        let mut prompt = format!(
            "Topic: {}\n\nGenerate the {} based on the following scraped content:\n\n",
            state.query,
            self.kind.label()
        );
        for item in &state.scraped_items {
            let _ = write!(prompt, "URL: {}\nContent: {}\n\n", item.source_url, item.text);
        }
        prompt
    }
}

#[async_trait]
impl TaskNode for SectionWriterNode {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    async fn execute(&self, state: Snapshot) -> Result<StateDelta, NodeError> {
        if state.scraped_items.is_empty() {
            return Err(NodeError::MissingInput("no extracted content to write from".to_string()));
        }

        let request = GenerationRequest::new(self.kind.label(), self.system_prompt(), self.prompt(&state));
        let raw = self
            .generator
            .generate(&request)
            .await
            .map_err(|e| NodeError::capability("generate", e))?;

        tracing::debug!(section = %self.kind, chars = raw.len(), "Raw section output received");
        let section = Section::parse(self.kind, &raw)?;

        Ok(StateDelta::new()
            .log(LogEntry::info(self.kind.as_str(), format!("Wrote {}", self.kind.label())))
            .with_section(section))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{MergeRegistry, ScrapedItem};
    use crate::types::Result;
    use parking_lot::Mutex;

    /// Returns a fixed reply and remembers the last request
    struct Recorder {
        reply: String,
        last: Mutex<Option<GenerationRequest>>,
    }

    impl Recorder {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                last: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Recorder {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            *self.last.lock() = Some(request.clone());
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "recorder"
        }
    }

    fn scraped_state() -> Snapshot {
        let delta = StateDelta::new().with_scraped_items(vec![ScrapedItem {
            source_url: "https://weather.gov".to_string(),
            text: "Rivers crest at record levels".to_string(),
        }]);
        Arc::new(
            MergeRegistry::new()
                .apply(&PipelineState::new("flood in Texas"), delta, "extract")
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_writes_parsed_section_from_fenced_output() {
        let generator = Arc::new(Recorder::new("```json\n{\"points\": [\"One\", \"Two\"]}\n```"));
        let node = SectionWriterNode::new(SectionKind::ExecutiveSummary, generator.clone());

        let delta = node.execute(scraped_state()).await.unwrap();
        let sections = delta.report_sections.unwrap();
        match sections.get(&SectionKind::ExecutiveSummary) {
            Some(Section::ExecutiveSummary(summary)) => assert_eq!(summary.points, vec!["One", "Two"]),
            other => panic!("unexpected section: {other:?}"),
        }

        let request = generator.last.lock().clone().unwrap();
        assert_eq!(request.label, "executive summary");
        assert!(request.prompt.contains("URL: https://weather.gov"));
        assert!(request.system.contains("'executive_summary'"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let node = SectionWriterNode::new(SectionKind::Article, Arc::new(Recorder::new("Sorry, I can't")));
        let err = node.execute(scraped_state()).await.unwrap_err();
        assert!(matches!(err, NodeError::Parse(_)));
    }

    #[tokio::test]
    async fn test_without_scraped_items_is_missing_input() {
        let node = SectionWriterNode::new(SectionKind::Article, Arc::new(Recorder::new("{}")));
        let err = node.execute(Arc::new(PipelineState::new("q"))).await.unwrap_err();
        assert!(matches!(err, NodeError::MissingInput(_)));
        assert_eq!(node.name(), "article");
    }
}
