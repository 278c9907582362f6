use async_trait::async_trait;

use crate::job_value::market::{
    CostOfLivingIndex, MarketDataError, MarketDataProvider, MarketEstimate, MarketSource,
    SalaryRange,
};

/// National-average cost-of-living baseline.
pub const NATIONAL_AVERAGE_INDEX: f64 = 100.0;

/// (city, overall, housing, groceries)
const COST_OF_LIVING: &[(&str, f64, f64, f64)] = &[
    ("new york", 187.2, 242.3, 169.8),
    ("san francisco", 192.3, 296.5, 162.4),
    ("los angeles", 166.5, 243.1, 154.2),
    ("chicago", 123.4, 164.7, 118.9),
    ("austin", 119.3, 154.8, 109.7),
    ("denver", 128.7, 184.6, 112.1),
    ("seattle", 152.8, 203.4, 139.5),
    ("boston", 162.4, 226.9, 143.7),
    ("dallas", 112.6, 134.3, 107.2),
    ("miami", 129.8, 173.2, 121.6),
];

/// (city substrings, salary multiplier)
const SALARY_MULTIPLIERS: &[(&[&str], f64)] = &[
    (&["san francisco", "new york"], 1.4),
    (&["seattle", "boston"], 1.25),
    (&["austin", "denver"], 1.1),
];

/// Deterministic offline estimator. Same title and location, same estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMarketEstimator;

impl LocalMarketEstimator {
    pub fn estimate(&self, title: &str, location: &str) -> MarketEstimate {
        MarketEstimate {
            salary_range: estimate_salary(title, location),
            cost_of_living_index: estimate_cost_of_living(location),
            source: MarketSource::LocalEstimate,
        }
    }
}

#[async_trait]
impl MarketDataProvider for LocalMarketEstimator {
    async fn fetch_estimate(
        &self,
        title: &str,
        location: &str,
    ) -> Result<MarketEstimate, MarketDataError> {
        Ok(self.estimate(title, location))
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}

fn estimate_salary(title: &str, location: &str) -> SalaryRange {
    let title = title.to_lowercase();
    let location = location.to_lowercase();

    let (mut min, mut max, mut median) = (70_000.0, 140_000.0, 100_000.0);

    if title.contains("senior") || title.contains("lead") {
        (min, max, median) = (100_000.0, 180_000.0, 135_000.0);
    }
    if title.contains("engineer") || title.contains("developer") {
        min += 10_000.0;
        max += 20_000.0;
        median += 15_000.0;
    }

    let multiplier = SALARY_MULTIPLIERS
        .iter()
        .find(|(cities, _)| cities.iter().any(|city| location.contains(city)))
        .map(|(_, m)| *m)
        .unwrap_or(1.0);

    SalaryRange {
        min: (min * multiplier).round(),
        max: (max * multiplier).round(),
        median: (median * multiplier).round(),
    }
}

fn estimate_cost_of_living(location: &str) -> CostOfLivingIndex {
    let location = location.to_lowercase();
    COST_OF_LIVING
        .iter()
        .find(|(city, ..)| location.contains(city))
        .map(|&(_, overall, housing, groceries)| CostOfLivingIndex {
            overall,
            housing,
            groceries,
        })
        .unwrap_or(CostOfLivingIndex {
            overall: NATIONAL_AVERAGE_INDEX,
            housing: NATIONAL_AVERAGE_INDEX,
            groceries: NATIONAL_AVERAGE_INDEX,
        })
}
