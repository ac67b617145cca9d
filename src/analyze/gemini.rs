// src/analyze/gemini.rs
//! Gemini REST transport behind the `ModelClient` seam. The pipeline owns
//! request construction and reply validation; this module owns only the wire.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// The generative-model seam, kept narrow so tests can swap in mocks.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one prompt, return the raw reply text (expected to be JSON,
    /// but not parsed here).
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError>;

    /// Model name for diagnostics.
    fn model_name(&self) -> &str;
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("daily-idea-bot/0.1")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let url = format!("{GEMINI_BASE}/{}:generateContent", self.model);
        let req = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.8,
                response_mime_type: "application/json",
            },
        };

        let resp = self
            .http
            .post(&url)
            // key goes in a header, not the URL, so it never lands in a log line
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| PipelineError::TransportFailure {
                detail: format!("gemini request: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::TransportFailure {
                detail: format!("gemini returned HTTP {status}"),
            });
        }

        let body: GenerateResponse =
            resp.json()
                .await
                .map_err(|e| PipelineError::TransportFailure {
                    detail: format!("gemini response body: {e}"),
                })?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(PipelineError::TransportFailure {
                detail: "gemini returned no candidate text".into(),
            });
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
