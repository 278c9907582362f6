mod analytics;
mod auth;
mod config;
mod contacts;
mod db;
mod errors;
mod job_value;
mod jobs;
mod models;
mod pagination;
mod reminders;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::job_value::market::{FallbackMarketData, MarketDataProvider};
use crate::job_value::remote::RemoteMarketData;
use crate::reminders::notifier::{ReminderNotifier, WebhookNotifier};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobTrail API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    let market_data = build_market_data(&config)?;
    info!("Market data backend: {}", market_data.backend());

    let notifier = build_notifier(&config)?;

    if config.reminders.enabled {
        if let Some(notifier) = &notifier {
            reminders::dispatcher::spawn(
                db.clone(),
                Arc::clone(notifier),
                config.reminders.poll_interval,
            );
        }
    } else {
        info!("Email reminders disabled");
    }

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        market_data,
        notifier,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the client host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Remote-first market data when `MARKET_DATA_URL` is set, local estimates otherwise.
fn build_market_data(config: &Config) -> Result<Arc<dyn MarketDataProvider>> {
    let cfg = &config.market_data;
    let provider = match &cfg.url {
        Some(url) => {
            let remote: Arc<dyn MarketDataProvider> = Arc::new(RemoteMarketData::new(url)?);
            FallbackMarketData::new(Some(remote), cfg.max_attempts, cfg.backoff)
        }
        None => FallbackMarketData::local_only(),
    };
    Ok(Arc::new(provider))
}

/// Webhook email delivery when both the URL and sender address are configured.
fn build_notifier(config: &Config) -> Result<Option<Arc<dyn ReminderNotifier>>> {
    let cfg = &config.reminders;
    match (&cfg.webhook_url, &cfg.from_address) {
        (Some(url), Some(from)) => {
            let notifier: Arc<dyn ReminderNotifier> = Arc::new(WebhookNotifier::new(url, from)?);
            info!("Reminder emails delivered via webhook");
            Ok(Some(notifier))
        }
        _ => Ok(None),
    }
}
