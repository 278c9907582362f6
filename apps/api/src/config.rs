use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub market_data: MarketDataConfig,
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone)]
pub struct MarketDataConfig {
    /// Remote market-data service. Unset means local estimates only.
    pub url: Option<String>,
    pub max_attempts: u32,
    pub backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct ReminderConfig {
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub from_address: Option<String>,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let enabled = optional_env("ENABLE_EMAIL_REMINDERS")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let reminders = ReminderConfig {
            enabled,
            webhook_url: if enabled {
                Some(require_env("EMAIL_WEBHOOK_URL")?)
            } else {
                optional_env("EMAIL_WEBHOOK_URL")
            },
            from_address: if enabled {
                Some(require_env("EMAIL_FROM")?)
            } else {
                optional_env("EMAIL_FROM")
            },
            poll_interval: poll_interval(parse_env("REMINDER_POLL_SECS", 60)?)?,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            market_data: MarketDataConfig {
                url: optional_env("MARKET_DATA_URL"),
                max_attempts: parse_env("MARKET_DATA_MAX_ATTEMPTS", 2)?,
                backoff: Duration::from_millis(parse_env("MARKET_DATA_BACKOFF_MS", 500)?),
            },
            reminders,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got {raw:?}")),
        None => Ok(default),
    }
}

/// The dispatcher's tick period. Zero would stop the interval timer.
fn poll_interval(secs: u64) -> Result<Duration> {
    if secs == 0 {
        anyhow::bail!("REMINDER_POLL_SECS must be at least 1 second");
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let err = poll_interval(0).unwrap_err();
        assert!(err.to_string().contains("REMINDER_POLL_SECS"));
    }

    #[test]
    fn test_poll_interval_in_seconds() {
        assert_eq!(poll_interval(90).unwrap(), Duration::from_secs(90));
    }
}
