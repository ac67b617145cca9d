// src/bot.rs
//! Manual trigger: a long-poll loop over Telegram `getUpdates`, answering
//! commands from the single configured chat. Errors in the loop are logged
//! and polling continues.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::config::ScheduleTime;
use crate::error::PipelineError;
use crate::notify::telegram::TelegramChannel;
use crate::pipeline::IdeaPipeline;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Long-poll wait passed to getUpdates, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

pub struct CommandPoller {
    http: reqwest::Client,
    token: String,
    chat_id: String,
    channel: TelegramChannel,
    pipeline: Arc<IdeaPipeline>,
    schedule: ScheduleTime,
}

impl CommandPoller {
    pub fn new(
        token: impl Into<String>,
        chat_id: impl Into<String>,
        channel: TelegramChannel,
        pipeline: Arc<IdeaPipeline>,
        schedule: ScheduleTime,
    ) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("daily-idea-bot/0.1")
            .connect_timeout(Duration::from_secs(10))
            // must outlast the long-poll wait
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 15))
            .build()
            .expect("reqwest client");
        Self {
            http,
            token: token.into(),
            chat_id: chat_id.into(),
            channel,
            pipeline,
            schedule,
        }
    }

    async fn poll_once(&self, offset: i64) -> Result<(Vec<Update>, i64)> {
        let url = format!("{TELEGRAM_API_BASE}/bot{}/getUpdates", self.token);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", POLL_TIMEOUT_SECS.to_string()),
                ("allowed_updates", "[\"message\"]".to_string()),
            ])
            .send()
            .await
            .map_err(|e| anyhow!("getUpdates request failed: {}", e.without_url()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("getUpdates returned HTTP {status}"));
        }
        let body: UpdatesResponse = resp.json().await.context("decoding getUpdates body")?;
        if !body.ok {
            return Err(anyhow!("getUpdates replied ok=false"));
        }

        let next_offset = body
            .result
            .iter()
            .map(|u| u.update_id + 1)
            .max()
            .unwrap_or(offset);
        Ok((body.result, next_offset))
    }

    async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        // single-chat bot: anything from another chat is ignored
        if message.chat.id.to_string() != self.chat_id {
            tracing::debug!(chat = message.chat.id, "ignoring message from foreign chat");
            return;
        }
        let Some(command) = message.text.as_deref().and_then(parse_command) else {
            return;
        };

        tracing::info!(command = %command, "bot command received");
        let reply = match command {
            "/idea" => {
                self.reply("🔍 Collecting trends... this can take a minute.")
                    .await;
                match self.pipeline.trigger().await {
                    // result/failure reached the chat via the delivery channel
                    Ok(_) => None,
                    Err(PipelineError::ConcurrentRunRejected) => {
                        Some("⏳ A run is already in progress, hold on.".to_string())
                    }
                    Err(_) => None,
                }
            }
            "/start" => Some(format!(
                "👋 *Daily Idea Bot*\n\n\
                 Every day at {} UTC you get fresh *{}* project ideas.\n\n\
                 *Commands:*\n\
                 /idea - get ideas right now\n\
                 /status - bot status\n\
                 /help - this help",
                self.schedule,
                self.pipeline.topic()
            )),
            "/help" => Some(format!(
                "🤖 *How this works*\n\n\
                 The bot collects today's tech trends and asks a model for *{}* ideas.\n\n\
                 *Commands:*\n\
                 • /idea - generate today's ideas immediately\n\
                 • /status - bot status and schedule\n\
                 • /help - this help\n\n\
                 Ideas are also sent automatically once a day.",
                self.pipeline.topic()
            )),
            "/status" => {
                let state = if self.pipeline.is_running() {
                    "a run is in progress"
                } else {
                    "idle"
                };
                Some(format!(
                    "✅ *Bot status: up* ({state})\n\nNext automatic run: daily at {} UTC.",
                    self.schedule
                ))
            }
            _ => None,
        };

        if let Some(text) = reply {
            self.reply(&text).await;
        }
    }

    async fn reply(&self, text: &str) {
        if let Err(e) = self.channel.send_message(text).await {
            tracing::warn!(error = ?e, "command reply failed");
        }
    }

    pub async fn run(self) {
        let mut offset: i64 = 0;
        loop {
            match self.poll_once(offset).await {
                Ok((updates, next_offset)) => {
                    offset = next_offset;
                    for update in updates {
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = ?e, "getUpdates poll failed, backing off");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }
}

pub fn spawn_command_poller(poller: CommandPoller) -> JoinHandle<()> {
    tokio::spawn(poller.run())
}

/// Extract the command from a message text: first word, `@botname` suffix
/// stripped. Non-command text yields `None`.
fn parse_command(text: &str) -> Option<&str> {
    let first = text.trim().split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }
    Some(first.split('@').next().unwrap_or(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_first_word_without_botname() {
        assert_eq!(parse_command("/idea"), Some("/idea"));
        assert_eq!(parse_command("/idea@daily_idea_bot now"), Some("/idea"));
        assert_eq!(parse_command("  /status  "), Some("/status"));
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn updates_payload_decodes() {
        let body = r#"{
            "ok": true,
            "result": [
                {"update_id": 7, "message": {"chat": {"id": 42}, "text": "/idea"}},
                {"update_id": 8}
            ]
        }"#;
        let parsed: UpdatesResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.ok);
        assert_eq!(parsed.result.len(), 2);
        assert_eq!(parsed.result[0].update_id, 7);
        assert_eq!(
            parsed.result[0].message.as_ref().unwrap().text.as_deref(),
            Some("/idea")
        );
        assert!(parsed.result[1].message.is_none());
    }
}
