//! Market data: salary ranges and cost-of-living indices for a title/location.
//!
//! `MarketDataProvider` is the only seam: `RemoteMarketData` calls an HTTP
//! service, `LocalMarketEstimator` derives a deterministic estimate offline, and
//! `FallbackMarketData` retries the remote a bounded number of times before
//! falling back to the local estimate. Scoring never sees which path ran except
//! through `MarketEstimate::source`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::job_value::local_estimate::LocalMarketEstimator;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostOfLivingIndex {
    pub overall: f64,
    pub housing: f64,
    pub groceries: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketSource {
    #[serde(rename = "api")]
    Api,
    #[serde(rename = "local-estimate")]
    LocalEstimate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEstimate {
    pub salary_range: SalaryRange,
    pub cost_of_living_index: CostOfLivingIndex,
    pub source: MarketSource,
}

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("market data API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("market data response was malformed: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_estimate(
        &self,
        title: &str,
        location: &str,
    ) -> Result<MarketEstimate, MarketDataError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Remote-first market data with a bounded retry budget and a local fallback.
pub struct FallbackMarketData {
    primary: Option<Arc<dyn MarketDataProvider>>,
    local: LocalMarketEstimator,
    max_attempts: u32,
    backoff: Duration,
}

impl FallbackMarketData {
    pub fn new(
        primary: Option<Arc<dyn MarketDataProvider>>,
        max_attempts: u32,
        backoff: Duration,
    ) -> Self {
        Self {
            primary,
            local: LocalMarketEstimator,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Local estimates only, used when no remote service is configured.
    pub fn local_only() -> Self {
        Self::new(None, 1, Duration::ZERO)
    }
}

#[async_trait]
impl MarketDataProvider for FallbackMarketData {
    async fn fetch_estimate(
        &self,
        title: &str,
        location: &str,
    ) -> Result<MarketEstimate, MarketDataError> {
        if let Some(primary) = &self.primary {
            for attempt in 0..self.max_attempts {
                if attempt > 0 {
                    // Linear backoff: backoff, 2×backoff, ...
                    let delay = self.backoff * attempt;
                    tokio::time::sleep(delay).await;
                }

                match primary.fetch_estimate(title, location).await {
                    Ok(estimate) => {
                        debug!(
                            "Market data from {} for {title:?} in {location:?}",
                            primary.backend()
                        );
                        return Ok(estimate);
                    }
                    Err(e) => warn!(
                        "Market data attempt {}/{} via {} failed: {e}",
                        attempt + 1,
                        self.max_attempts,
                        primary.backend()
                    ),
                }
            }
            warn!("Falling back to local market estimate for {title:?} in {location:?}");
        }

        Ok(self.local.estimate(title, location))
    }

    fn backend(&self) -> &'static str {
        "fallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyProvider {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl MarketDataProvider for FlakyProvider {
        async fn fetch_estimate(
            &self,
            _title: &str,
            _location: &str,
        ) -> Result<MarketEstimate, MarketDataError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                return Err(MarketDataError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(MarketEstimate {
                salary_range: SalaryRange {
                    min: 1.0,
                    max: 3.0,
                    median: 2.0,
                },
                cost_of_living_index: CostOfLivingIndex {
                    overall: 110.0,
                    housing: 120.0,
                    groceries: 100.0,
                },
                source: MarketSource::Api,
            })
        }

        fn backend(&self) -> &'static str {
            "flaky"
        }
    }

    fn flaky(failures: u32) -> Arc<FlakyProvider> {
        Arc::new(FlakyProvider {
            failures_before_success: failures,
            calls: AtomicU32::new(0),
        })
    }

    #[tokio::test]
    async fn test_retry_recovers_within_budget() {
        let provider = flaky(1);
        let market = FallbackMarketData::new(Some(provider.clone()), 2, Duration::ZERO);
        let estimate = market.fetch_estimate("Engineer", "Austin").await.unwrap();
        assert_eq!(estimate.source, MarketSource::Api);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fall_back_to_local() {
        let provider = flaky(10);
        let market = FallbackMarketData::new(Some(provider.clone()), 2, Duration::ZERO);
        let estimate = market.fetch_estimate("Engineer", "Austin").await.unwrap();
        assert_eq!(estimate.source, MarketSource::LocalEstimate);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_local_only_never_labels_api() {
        let estimate = FallbackMarketData::local_only()
            .fetch_estimate("Designer", "Nowhere")
            .await
            .unwrap();
        assert_eq!(estimate.source, MarketSource::LocalEstimate);
    }

    #[test]
    fn test_source_labels_on_the_wire() {
        assert_eq!(serde_json::to_string(&MarketSource::Api).unwrap(), "\"api\"");
        assert_eq!(
            serde_json::to_string(&MarketSource::LocalEstimate).unwrap(),
            "\"local-estimate\""
        );
    }
}
