// tests/common/mod.rs
//! Shared test doubles: canned trend sources, a scriptable model client,
//! and a delivery channel that records what reached it.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use daily_idea_bot::analyze::{AnalysisResult, ModelClient};
use daily_idea_bot::error::PipelineError;
use daily_idea_bot::notify::DeliveryChannel;
use daily_idea_bot::pipeline::IdeaPipeline;
use daily_idea_bot::scrape::types::{TrendItem, TrendSource};

pub struct StaticSource {
    name: &'static str,
    items: Vec<TrendItem>,
    delay: Duration,
    fail: bool,
}

impl StaticSource {
    pub fn ok(name: &'static str, titles: &[&str]) -> Self {
        Self {
            name,
            items: titles.iter().map(|t| TrendItem::new(name, *t)).collect(),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn slow(name: &'static str, titles: &[&str], delay: Duration) -> Self {
        let mut s = Self::ok(name, titles);
        s.delay = delay;
        s
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            items: Vec::new(),
            delay: Duration::ZERO,
            fail: true,
        }
    }
}

#[async_trait]
impl TrendSource for StaticSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> Result<Vec<TrendItem>, PipelineError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(PipelineError::SourceUnavailable {
                source: self.name,
                reason: "HTTP 500".into(),
            });
        }
        Ok(self.items.clone())
    }
}

/// Model double: records every prompt, replies with a canned string, can be
/// told to fail once, and can be gated on a semaphore to hold a run open.
pub struct MockModel {
    reply: Mutex<String>,
    pub prompts: Mutex<Vec<String>>,
    fail_next: AtomicBool,
    gate: Option<Arc<Semaphore>>,
}

impl MockModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Mutex::new(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
            gate: None,
        }
    }

    pub fn gated(reply: &str, gate: Arc<Semaphore>) -> Self {
        let mut m = Self::replying(reply);
        m.gate = Some(gate);
        m
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock() = reply.to_string();
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModelClient for MockModel {
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        self.prompts.lock().push(prompt.to_string());
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PipelineError::TransportFailure {
                detail: "connection refused".into(),
            });
        }
        Ok(self.reply.lock().clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[derive(Default)]
pub struct RecordingChannel {
    pub results: Mutex<Vec<AnalysisResult>>,
    /// (stage, kind) per delivered failure.
    pub failures: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn deliver_result(&self, result: &AnalysisResult) -> anyhow::Result<()> {
        self.results.lock().push(result.clone());
        Ok(())
    }

    async fn deliver_failure(&self, error: &PipelineError) -> anyhow::Result<()> {
        self.failures
            .lock()
            .push((error.stage().to_string(), error.kind().to_string()));
        Ok(())
    }
}

/// A well-formed reply with three ideas, as the prompt contract asks for.
pub fn three_idea_reply() -> &'static str {
    r#"{
        "summary": "Agents and dev tools dominate today's feeds.",
        "ideas": [
            {"title":"Idea One","description":"Build one","rationale":"Trend one",
             "difficulty":"easy","tags":["rust"],"first_step":"cargo new"},
            {"title":"Idea Two","description":"Build two","rationale":"Trend two"},
            {"title":"Idea Three","description":"Build three","rationale":"Trend three"}
        ]
    }"#
}

pub fn pipeline_with(
    sources: Vec<Box<dyn TrendSource>>,
    model: Arc<MockModel>,
    channel: Arc<RecordingChannel>,
    run_timeout: Duration,
) -> Arc<IdeaPipeline> {
    Arc::new(IdeaPipeline::new(
        sources,
        model,
        channel,
        "AI agent",
        10,
        run_timeout,
    ))
}
