// src/pipeline.rs
//! The orchestrator: one end-to-end run from trigger to delivery.
//!
//! States are `Idle → Running → {Completed, Failed} → Idle`, tracked by a
//! single atomic flag. The `Idle → Running` transition is a compare-exchange
//! with no await point between check and set, so two triggers racing on the
//! multi-threaded runtime cannot both start a run. A rejected trigger is not
//! a run: no pipeline work happens for it and no delivery callback fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::analyze::{build_prompt, AnalysisResult, ModelClient, ResponseValidator};
use crate::error::PipelineError;
use crate::notify::DeliveryChannel;
use crate::scrape::collect_trends;
use crate::scrape::types::TrendSource;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_runs_total", "Completed pipeline runs.");
        describe_counter!("pipeline_failures_total", "Failed pipeline runs, by kind.");
        describe_counter!(
            "pipeline_rejected_triggers_total",
            "Triggers rejected because a run was already in flight."
        );
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix timestamp of the last completed run."
        );
    });
}

pub struct IdeaPipeline {
    sources: Vec<Box<dyn TrendSource>>,
    model: Arc<dyn ModelClient>,
    channel: Arc<dyn DeliveryChannel>,
    validator: ResponseValidator,
    topic: String,
    run_timeout: Duration,
    running: AtomicBool,
}

impl IdeaPipeline {
    pub fn new(
        sources: Vec<Box<dyn TrendSource>>,
        model: Arc<dyn ModelClient>,
        channel: Arc<dyn DeliveryChannel>,
        topic: impl Into<String>,
        max_ideas: usize,
        run_timeout: Duration,
    ) -> Self {
        let topic = topic.into();
        Self {
            sources,
            model,
            channel,
            validator: ResponseValidator::new(topic.clone(), max_ideas),
            topic,
            run_timeout,
            running: AtomicBool::new(false),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the full pipeline once: collect trends, build the prompt, call
    /// the model, validate the reply, deliver. At most one run is in flight
    /// at a time; a trigger arriving during a run gets
    /// `ConcurrentRunRejected` immediately. Exactly one delivery callback
    /// fires per accepted run, success or failure.
    pub async fn trigger(&self) -> Result<AnalysisResult, PipelineError> {
        ensure_metrics_described();

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            counter!("pipeline_rejected_triggers_total").increment(1);
            tracing::info!("trigger rejected, a run is already in progress");
            return Err(PipelineError::ConcurrentRunRejected);
        }

        let outcome = tokio::time::timeout(self.run_timeout, self.execute())
            .await
            // on expiry the in-flight futures are dropped, abandoning any
            // adapter or model calls still on the wire
            .unwrap_or(Err(PipelineError::RunTimeout {
                timeout_secs: self.run_timeout.as_secs(),
            }));

        match &outcome {
            Ok(result) => {
                counter!("pipeline_runs_total").increment(1);
                gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
                tracing::info!(ideas = result.ideas().len(), "pipeline run completed");
                if let Err(e) = self.channel.deliver_result(result).await {
                    tracing::warn!(error = ?e, "result delivery failed");
                }
            }
            Err(e) => {
                counter!("pipeline_failures_total", "kind" => e.kind()).increment(1);
                tracing::warn!(stage = e.stage(), kind = e.kind(), "pipeline run failed");
                if let Err(send_err) = self.channel.deliver_failure(e).await {
                    tracing::warn!(error = ?send_err, "failure delivery failed");
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        outcome
    }

    async fn execute(&self) -> Result<AnalysisResult, PipelineError> {
        let items = collect_trends(&self.sources).await;
        // empty input is valid, low-value — the run proceeds
        tracing::info!(items = items.len(), "trends collected");

        let prompt = build_prompt(&items, &self.topic);
        tracing::debug!(
            chars = prompt.len(),
            model = self.model.model_name(),
            "calling model"
        );
        let raw = self.model.generate(&prompt).await?;

        self.validator.validate(&raw).inspect_err(|e| {
            tracing::debug!(kind = e.kind(), raw = %raw, "model reply rejected");
        })
    }
}
