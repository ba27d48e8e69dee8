//! End-to-end runs of the report graph over stub capabilities.

mod common;

use common::mocks::{
    StubGenerator, FIRST_SOURCE_IMAGE, FIRST_SOURCE_NAME, HERO_IMAGE, SOURCE_A, SOURCE_B,
};
use common::{stub_capabilities, stub_pipeline, QUERY};
use dossier::pipeline::{GraphError, MergeRegistry, PipelineError, PipelineState, Scheduler};
use dossier::report::assembler::DEFAULT_SOURCE_PLACEHOLDER;
use dossier::report::{slugify, SectionKind};
use dossier::research::{build_research_graph, PipelineSettings};
use dossier::{ReportCache, ResearchPipeline};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_flood_report_end_to_end() {
    let (pipeline, cache) = stub_pipeline(StubGenerator::new());

    let report = pipeline.run(QUERY).await.unwrap();

    assert_eq!(report.article.title, "Flood in Texas");
    assert_eq!(report.slug(), slugify(&report.article.title));
    assert_eq!(report.slug(), "flood-in-texas");
    assert_eq!(report.article.source_count, 2);
    assert_eq!(report.article.hero_image_url, HERO_IMAGE);
    assert_eq!(report.article.category, "Research");
    assert!(report.article.read_time >= 1);

    assert_eq!(report.cited_sources.len(), 2);
    assert_eq!(report.cited_sources[0].name, FIRST_SOURCE_NAME);
    assert_eq!(report.cited_sources[0].image_url, FIRST_SOURCE_IMAGE);
    assert_eq!(report.cited_sources[1].image_url, DEFAULT_SOURCE_PLACEHOLDER);

    let id = report.article.id;
    assert!(id > 0);
    assert_eq!(report.executive_summary.as_ref().unwrap().article_id, id);
    assert!(report.timeline_items.iter().all(|item| item.article_id == id));
    assert!(report.cited_sources.iter().all(|source| source.article_id == id));
    assert!(report.raw_facts.iter().all(|facts| facts.article_id == id));
    assert!(report.perspectives.iter().all(|p| p.article_id == id));

    let cached = cache.get("flood-in-texas").unwrap();
    assert_eq!(cached.as_ref(), report.as_ref());
}

#[tokio::test]
async fn test_every_writer_sees_the_same_extracted_pages() {
    let caps = stub_capabilities(StubGenerator::new());
    let graph = build_research_graph(&caps, &PipelineSettings::default()).unwrap();

    let outcome = Scheduler::default()
        .run(&graph, PipelineState::new(QUERY))
        .await
        .unwrap();

    let urls: Vec<&str> = outcome.state.scraped_items.iter().map(|i| i.source_url.as_str()).collect();
    assert_eq!(urls, [SOURCE_A, SOURCE_B]);
    for kind in SectionKind::ALL {
        assert!(outcome.state.section(kind).is_some(), "missing {kind}");
    }
    assert_eq!(outcome.executed.last().map(String::as_str), Some("aggregate"));
    assert_eq!(outcome.state.errors().count(), 0);
}

#[tokio::test]
async fn test_missing_title_fails_validation_and_caches_nothing() {
    let generator = StubGenerator::new().with_reply(
        "article",
        json!({"excerpt": "No headline was produced.", "content": "Body text."}),
    );
    let (pipeline, cache) = stub_pipeline(generator);

    let err = pipeline.run(QUERY).await.unwrap_err();

    match &err {
        PipelineError::Validation(validation) => {
            assert!(validation.problems.iter().any(|p| p.contains("article.title")));
            assert_eq!(validation.partial["article"]["excerpt"], "No headline was produced.");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(err.detail()["kind"], "validation");
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_failing_writer_is_contained() {
    let (pipeline, _cache) = stub_pipeline(StubGenerator::new().failing_on("cited sources"));

    let report = pipeline.run(QUERY).await.unwrap();

    assert!(report.cited_sources.is_empty());
    assert_eq!(report.article.hero_image_url, HERO_IMAGE);
    assert_eq!(report.perspectives.len(), 1);
}

#[tokio::test]
async fn test_failing_writer_is_logged_against_its_node() {
    let caps = stub_capabilities(StubGenerator::new().failing_on("perspectives"));
    let graph = build_research_graph(&caps, &PipelineSettings::default()).unwrap();

    let outcome = Scheduler::default()
        .run(&graph, PipelineState::new(QUERY))
        .await
        .unwrap();

    let errors: Vec<_> = outcome.state.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].node, "perspectives");
    assert!(errors[0].message.starts_with("Error processing perspectives"));
    assert!(outcome.state.section(SectionKind::Perspectives).is_none());
}

#[test]
fn test_step_budget_below_graph_size_is_rejected() {
    let caps = stub_capabilities(StubGenerator::new());
    let settings = PipelineSettings {
        step_budget: 5,
        ..Default::default()
    };

    let result = ResearchPipeline::new(&caps, &settings, Arc::new(ReportCache::new()));
    assert!(matches!(
        result,
        Err(GraphError::BudgetBelowGraphSize { budget: 5, nodes: 10 })
    ));
}

#[tokio::test]
async fn test_scheduler_budget_aborts_report_graph() {
    let caps = stub_capabilities(StubGenerator::new());
    let graph = build_research_graph(&caps, &PipelineSettings::default()).unwrap();

    let err = Scheduler::new(MergeRegistry::default(), 5)
        .run(&graph, PipelineState::new(QUERY))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::BudgetExceeded { budget: 5 }));
}
