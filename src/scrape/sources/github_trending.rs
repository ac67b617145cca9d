// src/scrape/sources/github_trending.rs
//! Trending repositories via the free GitHub search API (no credential).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::PipelineError;
use crate::scrape::normalize_text;
use crate::scrape::types::{TrendItem, TrendSource};

const GITHUB_SEARCH_ENDPOINT: &str = "https://api.github.com/search/repositories";

/// Repositories taken per run unless configured otherwise.
pub const DEFAULT_PER_PAGE: usize = 10;

pub struct GithubTrendingSource {
    http: reqwest::Client,
    per_page: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    full_name: String,
    #[serde(default)]
    language: Option<String>,
    html_url: String,
    stargazers_count: u64,
    #[serde(default)]
    description: Option<String>,
}

impl GithubTrendingSource {
    pub fn new(per_page: usize) -> Self {
        // GitHub rejects requests without a User-Agent.
        let http = reqwest::Client::builder()
            .user_agent("daily-idea-bot/0.1")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self { http, per_page }
    }

    async fn fetch_inner(&self) -> Result<Vec<TrendItem>> {
        // Repositories created since yesterday, most-starred first.
        let yesterday = (chrono::Utc::now() - chrono::Duration::days(1))
            .format("%Y-%m-%d")
            .to_string();
        let created = format!("created:>{yesterday}");
        let per_page = self.per_page.to_string();

        let resp = self
            .http
            .get(GITHUB_SEARCH_ENDPOINT)
            .query(&[
                ("q", created.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ])
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await
            .context("github search request")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("github returned HTTP {status}");
        }
        let body = resp.text().await.context("reading github body")?;
        parse_repo_payload(self.per_page, &body)
    }
}

/// Map one GitHub search payload into TrendItems. Kept separate from the
/// HTTP call so tests can feed fixture JSON.
pub fn parse_repo_payload(cap: usize, body: &str) -> Result<Vec<TrendItem>> {
    let parsed: SearchResponse = serde_json::from_str(body).context("parsing github payload")?;

    let mut out = Vec::new();
    for repo in parsed.items.into_iter().take(cap) {
        let language = repo.language.as_deref().unwrap_or("Unknown").to_string();
        let title = format!("{} - {}", repo.full_name, language);

        let mut item = TrendItem::new("GitHub", title);
        item.description = repo
            .description
            .map(|d| normalize_text(&d))
            .filter(|d| !d.is_empty());
        item.url = Some(repo.html_url);
        item.metadata
            .insert("stars".into(), serde_json::json!(repo.stargazers_count));
        if let Some(lang) = repo.language {
            item.metadata
                .insert("language".into(), serde_json::json!(lang));
        }
        out.push(item);
    }
    Ok(out)
}

#[async_trait]
impl TrendSource for GithubTrendingSource {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn fetch(&self) -> Result<Vec<TrendItem>, PipelineError> {
        self.fetch_inner()
            .await
            .map_err(|e| PipelineError::SourceUnavailable {
                source: self.name(),
                reason: format!("{e:#}"),
            })
    }
}
