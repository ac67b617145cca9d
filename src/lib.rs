// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod analyze;
pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod schedule;
pub mod scrape;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{AnalysisResult, IdeaSuggestion, ModelClient, ResponseValidator};
pub use crate::error::PipelineError;
pub use crate::notify::DeliveryChannel;
pub use crate::pipeline::IdeaPipeline;
pub use crate::scrape::types::{TrendItem, TrendSource};
