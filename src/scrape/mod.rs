// src/scrape/mod.rs
//! Trend scraping: source registry, concurrent collection, text hygiene.
//!
//! The aggregator fans out to every enabled source at once and reassembles
//! the results in registration order, so output is deterministic no matter
//! which network call returns first. A failing source is logged and
//! contributes nothing; it never aborts the run.

pub mod sources;
pub mod types;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;

use crate::config::ScraperConfig;
use crate::scrape::sources::{github_trending::GithubTrendingSource, x_search::XSearchSource};
use crate::scrape::types::{TrendItem, TrendSource};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "scrape_items_total",
            "Trend items collected across all sources."
        );
        describe_counter!(
            "scrape_source_errors_total",
            "Source fetches that failed and were skipped."
        );
        describe_histogram!("scrape_fetch_ms", "Per-source fetch time in milliseconds.");
    });
}

/// Scraper names the registry knows, in registration order.
pub fn available_sources() -> &'static [&'static str] {
    &["twitter", "github"]
}

/// Resolve enabled names against the registry and construct one adapter per
/// name. Unknown names are logged and skipped; credentialed adapters whose
/// credential is absent are logged and skipped instead of failing startup.
pub fn build_sources(
    enabled: &[String],
    sela_api_key: Option<&str>,
    params: &ScraperConfig,
) -> Vec<Box<dyn TrendSource>> {
    let mut out: Vec<Box<dyn TrendSource>> = Vec::with_capacity(enabled.len());
    for name in enabled {
        match name.as_str() {
            "twitter" => match sela_api_key {
                Some(key) => out.push(Box::new(XSearchSource::new(
                    key,
                    params.twitter.queries.clone(),
                    params.twitter.post_count,
                ))),
                None => {
                    tracing::warn!("scraper 'twitter' requires SELA_API_KEY, skipping");
                }
            },
            "github" => out.push(Box::new(GithubTrendingSource::new(params.github.per_page))),
            other => {
                tracing::warn!(scraper = other, "unknown scraper name, skipping");
            }
        }
    }
    out
}

/// Fetch every source concurrently and concatenate the successful results
/// in registration order. A `SourceUnavailable` failure is isolated: it is
/// logged, counted, and contributes zero items. If every source fails the
/// result is simply empty — downstream treats that as valid, low-value input.
pub async fn collect_trends(sources: &[Box<dyn TrendSource>]) -> Vec<TrendItem> {
    ensure_metrics_described();

    if sources.is_empty() {
        tracing::warn!("no trend sources enabled");
        return Vec::new();
    }

    let fetches = sources.iter().map(|s| async move {
        let t0 = std::time::Instant::now();
        let res = s.fetch().await;
        histogram!("scrape_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        res
    });
    let outcomes = futures::future::join_all(fetches).await;

    let mut all = Vec::new();
    for (source, outcome) in sources.iter().zip(outcomes) {
        match outcome {
            Ok(mut items) => {
                tracing::info!(source = source.name(), count = items.len(), "source fetched");
                all.append(&mut items);
            }
            Err(e) => {
                tracing::warn!(error = ?e, source = source.name(), "trend source failed");
                counter!("scrape_source_errors_total").increment(1);
            }
        }
    }

    counter!("scrape_items_total").increment(all.len() as u64);
    all
}

/// Normalize scraped text: decode HTML entities, strip tags, normalize
/// curly quotes, collapse whitespace, cap the length.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap: 500 chars
    if out.chars().count() > 500 {
        out = out.chars().take(500).collect();
    }

    out
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_decodes_and_collapses() {
        let s = "  <b>Hello&nbsp;&nbsp;world</b> &ldquo;ok&rdquo;  ";
        assert_eq!(normalize_text(s), r#"Hello world "ok""#);
    }

    #[test]
    fn normalize_text_caps_length() {
        let s = "x".repeat(2000);
        assert_eq!(normalize_text(&s).chars().count(), 500);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }

    #[test]
    fn registry_lists_twitter_then_github() {
        assert_eq!(available_sources(), &["twitter", "github"]);
    }
}
