// src/scrape/sources/x_search.rs
//! X/Twitter search source, scraped through the Sela Net API.
//! Credentialed: skipped entirely when SELA_API_KEY is absent.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::scrape::types::{TrendItem, TrendSource};
use crate::scrape::{normalize_text, truncate_chars};

const SELA_ENDPOINT: &str = "https://api.selanetwork.io/api/rpc/scrapeUrl";

/// Queries used when scrapers.toml provides none.
pub const DEFAULT_QUERIES: &[&str] = &["AI agent", "developer tools", "tech meme", "viral app"];

/// Posts taken per query unless configured otherwise.
pub const DEFAULT_POST_COUNT: usize = 5;

pub struct XSearchSource {
    http: reqwest::Client,
    api_key: String,
    queries: Vec<String>,
    post_count: usize,
}

#[derive(Serialize)]
struct ScrapeUrlRequest<'a> {
    url: &'a str,
    #[serde(rename = "scrapeType")]
    scrape_type: &'static str,
    #[serde(rename = "timeoutMs")]
    timeout_ms: u64,
    #[serde(rename = "postCount")]
    post_count: usize,
    #[serde(rename = "scrollPauseTime")]
    scroll_pause_time: u64,
}

#[derive(Debug, Deserialize)]
struct ScrapeUrlResponse {
    #[serde(default)]
    data: ScrapeData,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    result: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default, rename = "tweetUrl")]
    tweet_url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, rename = "likesCount")]
    likes_count: Option<u64>,
    #[serde(default, rename = "viewsCount")]
    views_count: Option<u64>,
}

impl XSearchSource {
    pub fn new(api_key: impl Into<String>, queries: Vec<String>, post_count: usize) -> Self {
        // The Sela scrape drives a headless browser on their side; give it
        // a generous request timeout.
        let http = reqwest::Client::builder()
            .user_agent("daily-idea-bot/0.1")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(90))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: api_key.into(),
            queries,
            post_count,
        }
    }

    async fn search_query(&self, query: &str) -> Result<Vec<TrendItem>> {
        let search_url =
            reqwest::Url::parse_with_params("https://x.com/search", [("q", query), ("f", "top")])
                .context("building x search url")?;

        let req = ScrapeUrlRequest {
            url: search_url.as_str(),
            scrape_type: "TWITTER_PROFILE",
            timeout_ms: 60_000,
            post_count: self.post_count,
            scroll_pause_time: 2_000,
        };

        let resp = self
            .http
            .post(SELA_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("sela scrapeUrl request")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("sela returned HTTP {status}");
        }
        let body = resp.text().await.context("reading sela body")?;
        parse_search_payload(query, self.post_count, &body)
    }
}

/// Map one Sela scrape payload into TrendItems. Kept separate from the HTTP
/// call so tests can feed fixture JSON.
pub fn parse_search_payload(query: &str, cap: usize, body: &str) -> Result<Vec<TrendItem>> {
    let parsed: ScrapeUrlResponse =
        serde_json::from_str(body).context("parsing sela scrape payload")?;

    let mut out = Vec::new();
    for post in parsed.data.result.into_iter().take(cap) {
        let content = normalize_text(post.content.as_deref().unwrap_or_default());
        let title = truncate_chars(&content, 100);
        if title.is_empty() {
            // items must carry a non-empty title
            continue;
        }

        let url = post.tweet_url.filter(|u| !u.is_empty()).map(|u| {
            if u.starts_with("http") {
                u
            } else {
                format!("https://x.com{u}")
            }
        });

        let mut item = TrendItem::new(format!("Twitter/X ({query})"), title);
        item.description = Some(content);
        item.url = url;
        if let Some(likes) = post.likes_count {
            item.metadata.insert("likes".into(), serde_json::json!(likes));
        } else if let Some(views) = post.views_count {
            item.metadata.insert("views".into(), serde_json::json!(views));
        }
        item.metadata
            .insert("query".into(), serde_json::json!(query));
        out.push(item);
    }
    Ok(out)
}

#[async_trait]
impl TrendSource for XSearchSource {
    fn name(&self) -> &'static str {
        "twitter"
    }

    fn requires_credential(&self) -> bool {
        true
    }

    /// One Sela call per configured query. A failed query is logged and
    /// skipped; the source only fails wholesale when every query fails.
    async fn fetch(&self) -> Result<Vec<TrendItem>, PipelineError> {
        let mut items = Vec::new();
        let mut failed = 0usize;
        let mut last_err: Option<anyhow::Error> = None;

        for query in &self.queries {
            match self.search_query(query).await {
                Ok(mut found) => {
                    tracing::debug!(query = %query, count = found.len(), "x search query ok");
                    items.append(&mut found);
                }
                Err(e) => {
                    tracing::warn!(error = ?e, query = %query, "x search query failed");
                    failed += 1;
                    last_err = Some(e);
                }
            }
        }

        if failed > 0 && failed == self.queries.len() {
            let last = last_err.map(|e| format!("{e:#}")).unwrap_or_default();
            return Err(PipelineError::SourceUnavailable {
                source: self.name(),
                reason: format!("all {failed} queries failed; last: {last}"),
            });
        }
        Ok(items)
    }
}
