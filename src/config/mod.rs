// src/config/mod.rs
//! Process configuration: environment variables plus an optional
//! `config/scrapers.toml` for per-adapter parameters. Loaded once at
//! startup; read-only for the lifetime of the process.

use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::scrape::sources::github_trending::DEFAULT_PER_PAGE;
use crate::scrape::sources::x_search::{DEFAULT_POST_COUNT, DEFAULT_QUERIES};

const ENV_SCRAPER_CONFIG_PATH: &str = "SCRAPER_CONFIG_PATH";
const DEFAULT_SCRAPER_CONFIG_PATH: &str = "config/scrapers.toml";

/// Everything the daemon needs, resolved from the environment once.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// Absent key disables the credentialed scraper instead of failing.
    pub sela_api_key: Option<String>,
    /// Scraper names to enable, in the order they were listed.
    pub enabled_scrapers: Vec<String>,
    pub idea_topic: String,
    pub schedule: ScheduleTime,
    pub max_ideas: usize,
    pub run_timeout_secs: u64,
    pub ops_addr: String,
    pub scrapers: ScraperConfig,
}

/// "HH:MM" wall-clock time, interpreted in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleTime {
    pub hour: u32,
    pub minute: u32,
}

impl ScheduleTime {
    pub fn parse(s: &str) -> Result<Self> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("schedule time '{s}' is not HH:MM"))?;
        let hour: u32 = h.parse().with_context(|| format!("hour in '{s}'"))?;
        let minute: u32 = m.parse().with_context(|| format!("minute in '{s}'"))?;
        if hour > 23 || minute > 59 {
            return Err(anyhow!("schedule time '{s}' out of range"));
        }
        Ok(Self { hour, minute })
    }
}

impl std::fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Per-adapter parameters from `config/scrapers.toml` (or defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ScraperConfig {
    pub twitter: TwitterParams,
    pub github: GithubParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TwitterParams {
    pub queries: Vec<String>,
    pub post_count: usize,
}

impl Default for TwitterParams {
    fn default() -> Self {
        Self {
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            post_count: DEFAULT_POST_COUNT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubParams {
    pub per_page: usize,
}

impl Default for GithubParams {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ScraperConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scraper config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing scraper config {}", path.display()))
    }

    /// Load using env var + fallback:
    /// 1) $SCRAPER_CONFIG_PATH (must exist if set)
    /// 2) config/scrapers.toml if present
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_SCRAPER_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("SCRAPER_CONFIG_PATH points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default = PathBuf::from(DEFAULT_SCRAPER_CONFIG_PATH);
        if default.exists() {
            return Self::load_from(&default);
        }
        Ok(Self::default())
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("{name} is required"))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a CSV of scraper names, preserving order and dropping blanks.
pub fn parse_scraper_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let schedule_raw = optional("DAILY_SCHEDULE_TIME").unwrap_or_else(|| "09:00".into());
        let schedule = ScheduleTime::parse(&schedule_raw)?;

        let enabled_scrapers = optional("ENABLED_SCRAPERS")
            .map(|csv| parse_scraper_list(&csv))
            .unwrap_or_else(|| vec!["twitter".into(), "github".into()]);

        let max_ideas = optional("MAX_IDEAS")
            .map(|v| v.parse::<usize>().context("MAX_IDEAS"))
            .transpose()?
            .unwrap_or(crate::analyze::DEFAULT_MAX_IDEAS);
        if max_ideas == 0 {
            return Err(anyhow!("MAX_IDEAS must be at least 1"));
        }

        let run_timeout_secs = optional("RUN_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>().context("RUN_TIMEOUT_SECS"))
            .transpose()?
            .unwrap_or(180);

        Ok(Self {
            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,
            telegram_chat_id: required("TELEGRAM_CHAT_ID")?,
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: optional("GEMINI_MODEL")
                .unwrap_or_else(|| crate::analyze::DEFAULT_GEMINI_MODEL.into()),
            sela_api_key: optional("SELA_API_KEY"),
            enabled_scrapers,
            idea_topic: optional("IDEA_TOPIC").unwrap_or_else(|| "AI agent".into()),
            schedule,
            max_ideas,
            run_timeout_secs,
            ops_addr: optional("OPS_ADDR").unwrap_or_else(|| "127.0.0.1:8080".into()),
            scrapers: ScraperConfig::load_default()?,
        })
    }
}
