use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::job_value::market::MarketDataProvider;
use crate::reminders::notifier::ReminderNotifier;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Market estimates. Default: `FallbackMarketData` over the configured remote.
    pub market_data: Arc<dyn MarketDataProvider>,
    /// Email delivery for reminders; `None` when no webhook is configured.
    pub notifier: Option<Arc<dyn ReminderNotifier>>,
}
