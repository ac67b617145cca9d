// src/notify/mod.rs
pub mod telegram;

use crate::analyze::schema::AnalysisResult;
use crate::error::PipelineError;

/// Delivery seam between the pipeline and the chat destination. Exactly one
/// of the two callbacks fires per completed or failed run. The channel may
/// read the result but never mutates it.
#[async_trait::async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver_result(&self, result: &AnalysisResult) -> anyhow::Result<()>;
    async fn deliver_failure(&self, error: &PipelineError) -> anyhow::Result<()>;
}
