// src/notify/telegram.rs
//! Telegram delivery: Markdown messages to the single configured chat.

use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;

use super::DeliveryChannel;
use crate::analyze::schema::{AnalysisResult, IdeaSuggestion};
use crate::error::PipelineError;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Clone)]
pub struct TelegramChannel {
    token: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

impl TelegramChannel {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            token,
            chat_id,
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Send one Markdown message to the configured chat, with a small
    /// exponential backoff on transient failures. Error messages carry the
    /// HTTP status only — the request URL embeds the bot token and must
    /// never reach a log line.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let url = format!("{TELEGRAM_API_BASE}/bot{}/sendMessage", self.token);
        let payload = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
        };

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&url)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    let status = rsp.status();
                    if status.is_success() {
                        return Ok(());
                    }
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(anyhow!("telegram sendMessage returned HTTP {status}"));
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(anyhow!(
                        "telegram sendMessage request failed: {}",
                        e.without_url()
                    ));
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for TelegramChannel {
    async fn deliver_result(&self, result: &AnalysisResult) -> Result<()> {
        self.send_message(&format_idea_message(result)).await
    }

    async fn deliver_failure(&self, error: &PipelineError) -> Result<()> {
        self.send_message(&format_failure_message(error)).await
    }
}

/// Render one analysis result the way the chat expects it: trend summary,
/// numbered ideas with difficulty marker, rationale/stack/first-step lines.
pub fn format_idea_message(result: &AnalysisResult) -> String {
    let mut lines: Vec<String> = vec![
        format!("🎯 *Today's {} ideas*", result.topic()),
        String::new(),
    ];

    if let Some(summary) = result.summary() {
        lines.push("📊 *Trend summary*".to_string());
        lines.push(summary.to_string());
        lines.push(String::new());
    }
    lines.push("─".repeat(30));

    for (i, idea) in result.ideas().iter().enumerate() {
        push_single_idea(&mut lines, i + 1, idea);
    }

    lines.push(String::new());
    lines.push("─".repeat(30));
    lines.push("💡 _Pick one and build it today!_".to_string());

    lines.join("\n")
}

fn push_single_idea(lines: &mut Vec<String>, index: usize, idea: &IdeaSuggestion) {
    let marker = difficulty_marker(idea.difficulty.as_deref());

    lines.push(String::new());
    lines.push(format!("*{index}. {}* {marker}", idea.title));
    lines.push(String::new());
    lines.push(format!("📝 {}", idea.description));
    lines.push(String::new());
    lines.push(format!("⏰ *Why now?* {}", idea.rationale));
    if !idea.tags.is_empty() {
        lines.push(String::new());
        lines.push(format!("🛠 *Stack:* {}", idea.tags.join(", ")));
    }
    if let Some(step) = &idea.first_step {
        lines.push(String::new());
        lines.push(format!("👉 *First step:* {step}"));
    }
}

fn difficulty_marker(difficulty: Option<&str>) -> &'static str {
    match difficulty.map(|d| d.to_ascii_lowercase()).as_deref() {
        Some("easy") => "🟢",
        Some("medium") => "🟡",
        Some("hard") => "🔴",
        _ => "⚪",
    }
}

/// Render a failed run as a short operator-actionable notice: stage and
/// kind, never credentials or raw model payloads.
pub fn format_failure_message(error: &PipelineError) -> String {
    format!(
        "❌ *Idea run failed* ({}/{})\n\n{error}",
        error.stage(),
        error.kind()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::schema::{ResponseValidator, DEFAULT_MAX_IDEAS};

    fn sample_result() -> AnalysisResult {
        let raw = r#"{
            "summary": "Agents everywhere.",
            "ideas": [
                {"title":"Agent One","description":"Build it","rationale":"Trend says so",
                 "difficulty":"easy","tags":["rust","tokio"],"first_step":"cargo new"},
                {"title":"Agent Two","description":"Ship it","rationale":"Still trending"}
            ]
        }"#;
        ResponseValidator::new("AI agent", DEFAULT_MAX_IDEAS)
            .validate(raw)
            .expect("sample result")
    }

    #[test]
    fn idea_message_numbers_ideas_and_keeps_order() {
        let msg = format_idea_message(&sample_result());
        assert!(msg.contains("*Today's AI agent ideas*"));
        assert!(msg.contains("*1. Agent One* 🟢"));
        assert!(msg.contains("*2. Agent Two* ⚪"));
        assert!(msg.find("Agent One").unwrap() < msg.find("Agent Two").unwrap());
        assert!(msg.contains("🛠 *Stack:* rust, tokio"));
        assert!(msg.contains("👉 *First step:* cargo new"));
    }

    #[test]
    fn failure_message_names_stage_and_kind_without_payload() {
        let e = PipelineError::MalformedResponse {
            detail: "expected value at line 1 column 1".into(),
        };
        let msg = format_failure_message(&e);
        assert!(msg.contains("validate"));
        assert!(msg.contains("malformed_response"));
    }
}
