// src/analyze/schema.rs
//! Strict-schema parsing of the model reply.
//!
//! Validation is two-phase: the raw text must parse as JSON at all
//! (`MalformedResponse` otherwise), and the parsed value must match the
//! declared idea-list shape and its semantic rules (`SchemaViolation`
//! otherwise). Nothing is patched: a partial or loosely-shaped reply is
//! rejected wholesale, because a malformed idea list is worse than no list.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Upper bound on the ideas list unless configured otherwise (MAX_IDEAS).
pub const DEFAULT_MAX_IDEAS: usize = 10;

/// One generated project idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaSuggestion {
    pub title: String,
    pub description: String,
    /// Why this idea follows from the observed trends.
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Suggested tech stack.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_step: Option<String>,
}

/// The validated output of one analysis call. Immutable once constructed:
/// fields are private and only the validator builds values of this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    ideas: Vec<IdeaSuggestion>,
}

impl AnalysisResult {
    /// Echo of the topic the analysis was asked for.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Ideas in model order (insertion order = presentation order).
    pub fn ideas(&self) -> &[IdeaSuggestion] {
        &self.ideas
    }
}

/// Shape the raw reply must deserialize into. Unknown extra fields are
/// ignored; missing or mistyped ones reject the reply.
#[derive(Debug, Deserialize)]
struct ResponsePayload {
    #[serde(default)]
    summary: Option<String>,
    ideas: Vec<IdeaSuggestion>,
}

pub struct ResponseValidator {
    topic: String,
    max_ideas: usize,
}

impl ResponseValidator {
    pub fn new(topic: impl Into<String>, max_ideas: usize) -> Self {
        Self {
            topic: topic.into(),
            max_ideas,
        }
    }

    /// Validate one raw model reply. On failure the caller keeps the raw
    /// text for diagnostic logging; it is never baked into the error.
    pub fn validate(&self, raw: &str) -> Result<AnalysisResult, PipelineError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| PipelineError::MalformedResponse {
                detail: e.to_string(),
            })?;

        let payload: ResponsePayload =
            serde_json::from_value(value).map_err(|e| PipelineError::SchemaViolation {
                detail: e.to_string(),
            })?;

        if payload.ideas.is_empty() {
            return Err(PipelineError::SchemaViolation {
                detail: "ideas list is empty".into(),
            });
        }
        if payload.ideas.len() > self.max_ideas {
            return Err(PipelineError::SchemaViolation {
                detail: format!(
                    "{} ideas exceeds the configured maximum of {}",
                    payload.ideas.len(),
                    self.max_ideas
                ),
            });
        }
        for (i, idea) in payload.ideas.iter().enumerate() {
            for (field, value) in [
                ("title", &idea.title),
                ("description", &idea.description),
                ("rationale", &idea.rationale),
            ] {
                if value.trim().is_empty() {
                    return Err(PipelineError::SchemaViolation {
                        detail: format!("idea #{} has an empty {field}", i + 1),
                    });
                }
            }
        }

        Ok(AnalysisResult {
            topic: self.topic.clone(),
            summary: payload.summary,
            ideas: payload.ideas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ResponseValidator {
        ResponseValidator::new("AI agent", DEFAULT_MAX_IDEAS)
    }

    #[test]
    fn minimal_valid_reply_passes_and_echoes_topic() {
        let raw = r#"{"ideas":[{"title":"t","description":"d","rationale":"r"}]}"#;
        let res = validator().validate(raw).expect("valid reply");
        assert_eq!(res.topic(), "AI agent");
        assert_eq!(res.ideas().len(), 1);
        assert!(res.summary().is_none());
    }

    #[test]
    fn unknown_extra_fields_are_ignored() {
        let raw = r#"{
            "summary": "s",
            "ideas": [{"title":"t","description":"d","rationale":"r","mood":"sunny"}],
            "confidence": 0.9
        }"#;
        let res = validator().validate(raw).expect("extra fields are fine");
        assert_eq!(res.summary(), Some("s"));
    }

    #[test]
    fn whitespace_only_title_is_a_schema_violation() {
        let raw = r#"{"ideas":[{"title":"   ","description":"d","rationale":"r"}]}"#;
        let err = validator().validate(raw).unwrap_err();
        assert_eq!(err.kind(), "schema_violation");
    }
}
