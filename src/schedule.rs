// src/schedule.rs
//! Daily schedule trigger: sleep until the next HH:MM UTC, run the
//! pipeline, repeat. Failures are already delivered to chat by the
//! orchestrator; here they are only logged.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use tokio::task::JoinHandle;

use crate::config::ScheduleTime;
use crate::pipeline::IdeaPipeline;

/// Delay from `now` to the next occurrence of `at` (UTC). If the wall
/// clock is exactly at `at`, the next occurrence is tomorrow.
pub fn next_run_delay(now: DateTime<Utc>, at: ScheduleTime) -> Duration {
    let today = now
        .with_hour(at.hour)
        .and_then(|t| t.with_minute(at.minute))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);

    let next = if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    };
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

pub fn spawn_daily_scheduler(pipeline: Arc<IdeaPipeline>, at: ScheduleTime) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let delay = next_run_delay(Utc::now(), at);
            tracing::info!(
                next_in_secs = delay.as_secs(),
                at = %at,
                "daily idea run scheduled"
            );
            tokio::time::sleep(delay).await;

            match pipeline.trigger().await {
                Ok(result) => {
                    tracing::info!(ideas = result.ideas().len(), "scheduled run delivered");
                }
                Err(e) => {
                    tracing::warn!(kind = e.kind(), "scheduled run did not complete");
                }
            }
        }
    })
}
