// src/error.rs
//! Error taxonomy for the idea pipeline.
//!
//! `SourceUnavailable` is adapter-local and absorbed at the aggregator
//! boundary; every other kind is fatal for the run that raised it and is
//! surfaced to the delivery channel exactly once.

use std::fmt;

// Display/Error are implemented by hand rather than via `#[derive(Error)]`:
// thiserror unconditionally treats a field named `source` as the error's
// `Error::source()`, and `&'static str` does not implement `Error`.
#[derive(Debug)]
pub enum PipelineError {
    /// A trend source could not be fetched (network, auth, rate limit).
    /// Never fatal: the aggregator logs it and continues with the rest.
    SourceUnavailable {
        source: &'static str,
        reason: String,
    },

    /// The model reply was not parseable as JSON at all.
    MalformedResponse { detail: String },

    /// The model reply parsed as JSON but fails the idea-list contract
    /// (missing fields, wrong types, empty or oversized ideas list).
    SchemaViolation { detail: String },

    /// A trigger arrived while another run was in flight. The new trigger
    /// is rejected, not queued; no pipeline work happens for it.
    ConcurrentRunRejected,

    /// The call to the generative model failed at the transport level.
    TransportFailure { detail: String },

    /// The whole run exceeded its deadline; in-flight futures were dropped.
    RunTimeout { timeout_secs: u64 },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable { source, reason } => {
                write!(f, "source '{source}' unavailable: {reason}")
            }
            Self::MalformedResponse { detail } => {
                write!(f, "model response is not valid JSON: {detail}")
            }
            Self::SchemaViolation { detail } => {
                write!(f, "model response violates the idea schema: {detail}")
            }
            Self::ConcurrentRunRejected => {
                write!(f, "a pipeline run is already in progress")
            }
            Self::TransportFailure { detail } => {
                write!(f, "model call failed: {detail}")
            }
            Self::RunTimeout { timeout_secs } => {
                write!(f, "pipeline run exceeded {timeout_secs}s and was cancelled")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

impl PipelineError {
    /// Stable machine-readable kind, used in logs, metrics and the ops API.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::ConcurrentRunRejected => "concurrent_run_rejected",
            Self::TransportFailure { .. } => "transport_failure",
            Self::RunTimeout { .. } => "run_timeout",
        }
    }

    /// Pipeline stage the error belongs to, for the user-visible notice.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "scrape",
            Self::TransportFailure { .. } => "model",
            Self::MalformedResponse { .. } | Self::SchemaViolation { .. } => "validate",
            Self::ConcurrentRunRejected => "trigger",
            Self::RunTimeout { .. } => "run",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_stage_are_stable() {
        let e = PipelineError::SchemaViolation {
            detail: "ideas list is empty".into(),
        };
        assert_eq!(e.kind(), "schema_violation");
        assert_eq!(e.stage(), "validate");

        let e = PipelineError::ConcurrentRunRejected;
        assert_eq!(e.kind(), "concurrent_run_rejected");
        assert_eq!(e.stage(), "trigger");
    }

    #[test]
    fn display_names_the_source() {
        let e = PipelineError::SourceUnavailable {
            source: "twitter",
            reason: "HTTP 429".into(),
        };
        assert!(e.to_string().contains("twitter"));
        assert!(e.to_string().contains("429"));
    }
}
