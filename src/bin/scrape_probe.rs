//! Dev tool: build the enabled scrapers from the environment and print one
//! aggregation pass (no model call, no delivery).

use daily_idea_bot::config::{parse_scraper_list, ScraperConfig};
use daily_idea_bot::scrape::{build_sources, collect_trends};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let enabled = std::env::var("ENABLED_SCRAPERS")
        .map(|csv| parse_scraper_list(&csv))
        .unwrap_or_else(|_| vec!["twitter".into(), "github".into()]);
    let sela_key = std::env::var("SELA_API_KEY").ok();
    let params = ScraperConfig::load_default()?;

    let sources = build_sources(&enabled, sela_key.as_deref(), &params);
    let items = collect_trends(&sources).await;

    for item in &items {
        let score = item
            .metadata
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("[{}] {} {}", item.source, item.title, score);
    }
    println!("scrape-probe done, {} items", items.len());
    Ok(())
}
