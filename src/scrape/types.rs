// src/scrape/types.rs
use std::collections::BTreeMap;

use crate::error::PipelineError;

/// One observed trend signal, normalized to a common shape.
/// `source` and `title` are always non-empty: adapters skip records that
/// would violate this instead of emitting placeholder items.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct TrendItem {
    pub source: String, // e.g. "GitHub", "Twitter/X (AI agent)"
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    /// Source-specific extras ("stars", "likes", "language", "query", ...).
    /// BTreeMap keeps prompt rendering deterministic.
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl TrendItem {
    pub fn new(source: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            description: None,
            url: None,
            metadata: BTreeMap::new(),
        }
    }
}

/// One trend source. Implementations do network I/O only inside `fetch`
/// and keep no shared mutable state, so the aggregator can run all of
/// them concurrently without coordination.
#[async_trait::async_trait]
pub trait TrendSource: Send + Sync {
    /// Stable identifier used for configuration and logging ("twitter", "github").
    fn name(&self) -> &'static str;

    /// Whether this source needs a secret to operate. Credentialed sources
    /// are excluded from the enabled set when the credential is absent,
    /// rather than failing the whole run.
    fn requires_credential(&self) -> bool {
        false
    }

    /// Fetch the current trends, capped to a source-defined limit.
    /// Zero results is a valid empty outcome, not an error; network, auth
    /// and rate-limit problems surface as `SourceUnavailable`.
    async fn fetch(&self) -> Result<Vec<TrendItem>, PipelineError>;
}
