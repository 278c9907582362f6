use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::job_value::market::{
    CostOfLivingIndex, MarketDataError, MarketDataProvider, MarketEstimate, MarketSource,
    SalaryRange,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of `GET {base_url}/estimate?title=..&location=..`.
#[derive(Debug, Deserialize)]
struct EstimateBody {
    salary_range: SalaryRange,
    cost_of_living_index: CostOfLivingIndex,
}

/// HTTP market-data client. Single attempt per call; retries live in
/// `FallbackMarketData`.
#[derive(Clone)]
pub struct RemoteMarketData {
    client: Client,
    base_url: String,
}

impl RemoteMarketData {
    pub fn new(base_url: impl Into<String>) -> Result<Self, MarketDataError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MarketDataProvider for RemoteMarketData {
    async fn fetch_estimate(
        &self,
        title: &str,
        location: &str,
    ) -> Result<MarketEstimate, MarketDataError> {
        let response = self
            .client
            .get(format!("{}/estimate", self.base_url))
            .query(&[("title", title), ("location", location)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EstimateBody = response
            .json()
            .await
            .map_err(|e| MarketDataError::Malformed(e.to_string()))?;

        if body.cost_of_living_index.overall <= 0.0 {
            return Err(MarketDataError::Malformed(format!(
                "cost-of-living index must be positive, got {}",
                body.cost_of_living_index.overall
            )));
        }

        Ok(MarketEstimate {
            salary_range: body.salary_range,
            cost_of_living_index: body.cost_of_living_index,
            source: MarketSource::Api,
        })
    }

    fn backend(&self) -> &'static str {
        "remote"
    }
}
