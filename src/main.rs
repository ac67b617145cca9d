//! Daily Idea Bot — Binary Entrypoint
//! Boots the pipeline, the daily scheduler, the Telegram command poller,
//! and the ops HTTP server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use daily_idea_bot::analyze::GeminiClient;
use daily_idea_bot::api::{create_router, AppState};
use daily_idea_bot::bot::{spawn_command_poller, CommandPoller};
use daily_idea_bot::config::AppConfig;
use daily_idea_bot::metrics::Metrics;
use daily_idea_bot::notify::telegram::TelegramChannel;
use daily_idea_bot::pipeline::IdeaPipeline;
use daily_idea_bot::schedule::spawn_daily_scheduler;
use daily_idea_bot::scrape::build_sources;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("daily_idea_bot=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env()?;
    let metrics = Metrics::init(cfg.max_ideas);

    let sources = build_sources(
        &cfg.enabled_scrapers,
        cfg.sela_api_key.as_deref(),
        &cfg.scrapers,
    );
    tracing::info!(
        sources = sources.len(),
        topic = %cfg.idea_topic,
        schedule = %cfg.schedule,
        "daily idea bot starting"
    );

    let model = Arc::new(GeminiClient::new(&cfg.gemini_api_key, &cfg.gemini_model));
    let channel = TelegramChannel::new(cfg.telegram_bot_token.clone(), cfg.telegram_chat_id.clone());

    let pipeline = Arc::new(IdeaPipeline::new(
        sources,
        model,
        Arc::new(channel.clone()),
        cfg.idea_topic.clone(),
        cfg.max_ideas,
        Duration::from_secs(cfg.run_timeout_secs),
    ));

    // Startup notice to the chat: best-effort, the daemon runs without it.
    let startup = format!(
        "🚀 *Daily Idea Bot started*\n\nTopic: *{}*\nIdeas arrive daily at {} UTC.\nUse /idea to get a batch right now!",
        cfg.idea_topic, cfg.schedule
    );
    if let Err(e) = channel.send_message(&startup).await {
        tracing::warn!(error = ?e, "could not send startup message");
    }

    let scheduler = spawn_daily_scheduler(pipeline.clone(), cfg.schedule);
    let poller = spawn_command_poller(CommandPoller::new(
        cfg.telegram_bot_token.clone(),
        cfg.telegram_chat_id.clone(),
        channel,
        pipeline.clone(),
        cfg.schedule,
    ));

    let router = create_router(AppState {
        pipeline: pipeline.clone(),
    })
    .merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.ops_addr).await?;
    tracing::info!(addr = %cfg.ops_addr, "ops server listening");

    tokio::select! {
        res = axum::serve(listener, router) => {
            res?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    scheduler.abort();
    poller.abort();
    Ok(())
}
