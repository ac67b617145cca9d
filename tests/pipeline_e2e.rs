// tests/pipeline_e2e.rs
//! End-to-end runs against canned sources, a mock model, and a recording
//! delivery channel.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{pipeline_with, three_idea_reply, MockModel, RecordingChannel, StaticSource};
use daily_idea_bot::scrape::types::TrendSource;

const RUN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::test]
async fn two_sources_flow_into_a_delivered_three_idea_result() {
    let sources: Vec<Box<dyn TrendSource>> = vec![
        Box::new(StaticSource::ok("GitHub", &["g1", "g2", "g3"])),
        Box::new(StaticSource::ok("Twitter/X (AI agent)", &["t1", "t2"])),
    ];
    let model = Arc::new(MockModel::replying(three_idea_reply()));
    let channel = Arc::new(RecordingChannel::default());
    let pipeline = pipeline_with(sources, model.clone(), channel.clone(), RUN_TIMEOUT);

    let result = pipeline.trigger().await.expect("run completes");
    assert_eq!(result.topic(), "AI agent");
    assert_eq!(result.ideas().len(), 3);

    // all five trend titles reached the prompt
    let prompts = model.prompts.lock();
    assert_eq!(prompts.len(), 1);
    for title in ["g1", "g2", "g3", "t1", "t2"] {
        assert!(prompts[0].contains(title), "prompt misses {title}");
    }

    let delivered = channel.results.lock();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].ideas().len(), 3);
    assert!(channel.failures.lock().is_empty());
}

#[tokio::test]
async fn pipeline_completes_on_the_free_source_alone() {
    // the credentialed scraper never makes it into the enabled set
    let built = daily_idea_bot::scrape::build_sources(
        &["twitter".to_string(), "github".to_string()],
        None,
        &daily_idea_bot::config::ScraperConfig::default(),
    );
    assert_eq!(built.len(), 1);
    assert_eq!(built[0].name(), "github");

    let sources: Vec<Box<dyn TrendSource>> =
        vec![Box::new(StaticSource::ok("GitHub", &["only-repo"]))];
    let model = Arc::new(MockModel::replying(three_idea_reply()));
    let channel = Arc::new(RecordingChannel::default());
    let pipeline = pipeline_with(sources, model.clone(), channel.clone(), RUN_TIMEOUT);

    pipeline.trigger().await.expect("run completes");
    assert!(model.prompts.lock()[0].contains("only-repo"));
    assert_eq!(channel.results.lock().len(), 1);
}

#[tokio::test]
async fn non_json_model_output_is_delivered_as_a_failure() {
    let sources: Vec<Box<dyn TrendSource>> =
        vec![Box::new(StaticSource::ok("GitHub", &["g1"]))];
    let model = Arc::new(MockModel::replying("Here are some great ideas: 1) ..."));
    let channel = Arc::new(RecordingChannel::default());
    let pipeline = pipeline_with(sources, model, channel.clone(), RUN_TIMEOUT);

    let err = pipeline.trigger().await.unwrap_err();
    assert_eq!(err.kind(), "malformed_response");

    // no partial result was delivered, exactly one failure notice was
    assert!(channel.results.lock().is_empty());
    assert_eq!(
        channel.failures.lock().as_slice(),
        &[("validate".to_string(), "malformed_response".to_string())]
    );
}

#[tokio::test]
async fn all_sources_failing_still_produces_a_run() {
    let sources: Vec<Box<dyn TrendSource>> = vec![
        Box::new(StaticSource::failing("a")),
        Box::new(StaticSource::failing("b")),
    ];
    let model = Arc::new(MockModel::replying(three_idea_reply()));
    let channel = Arc::new(RecordingChannel::default());
    let pipeline = pipeline_with(sources, model, channel.clone(), RUN_TIMEOUT);

    // empty trend input is valid, low-value input, not a failure
    let result = pipeline.trigger().await.expect("run completes");
    assert_eq!(result.ideas().len(), 3);
    assert_eq!(channel.results.lock().len(), 1);
    assert!(channel.failures.lock().is_empty());
}

#[tokio::test]
async fn schema_violation_is_fatal_for_the_run() {
    let model = Arc::new(MockModel::replying(r#"{"ideas":[]}"#));
    let channel = Arc::new(RecordingChannel::default());
    let pipeline = pipeline_with(Vec::new(), model, channel.clone(), RUN_TIMEOUT);

    let err = pipeline.trigger().await.unwrap_err();
    assert_eq!(err.kind(), "schema_violation");
    assert_eq!(
        channel.failures.lock().as_slice(),
        &[("validate".to_string(), "schema_violation".to_string())]
    );
}
