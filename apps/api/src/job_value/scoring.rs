//! Offer value scoring. Puts dissimilar offers on one comparable axis.
//!
//! total = w.salary × basis / (col / 100) + w.benefits × benefit_value
//!
//! The basis salary is the stated salary, or the market median when no salary
//! has been stated yet. An offer with neither is marked not computable and
//! ranked after every scored offer; it never receives a numeric score.
//! Ranking is descending by total with input order breaking ties.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job_value::local_estimate::NATIONAL_AVERAGE_INDEX;
use crate::job_value::market::{MarketEstimate, MarketSource};

pub const MIN_OFFERS: usize = 2;
pub const MAX_OFFERS: usize = 4;

// Dollar values per benefit.
const HEALTH_INSURANCE_VALUE: f64 = 5_000.0;
const DENTAL_INSURANCE_VALUE: f64 = 1_000.0;
const VISION_INSURANCE_VALUE: f64 = 500.0;
const RETIREMENT_401K_VALUE: f64 = 3_000.0;
const PTO_DAY_VALUE: f64 = 500.0;
const REMOTE_WORK_VALUE: f64 = 5_000.0;
const FLEXIBLE_HOURS_VALUE: f64 = 3_000.0;
const STOCK_OPTIONS_VALUE: f64 = 5_000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenefitFlags {
    pub health_insurance: bool,
    pub dental_insurance: bool,
    pub vision_insurance: bool,
    pub retirement_401k: bool,
    pub paid_time_off_days: f64,
    pub remote_work: bool,
    pub flexible_hours: bool,
    pub stock_options: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferInput {
    #[serde(default)]
    pub label: Option<String>,
    /// Employer-stated salary; absent before an offer is made.
    #[serde(default)]
    pub salary: Option<f64>,
    #[serde(default)]
    pub bonus: f64,
    #[serde(default)]
    pub benefits: BenefitFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub salary: f64,
    pub benefits: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            salary: 1.0,
            benefits: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisSource {
    Stated,
    MarketMedian,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedOffer {
    pub input_index: usize,
    pub label: Option<String>,
    /// 1-based position among computable offers.
    pub rank: Option<usize>,
    pub score_computable: bool,
    pub basis_salary: Option<f64>,
    pub basis_source: Option<BasisSource>,
    pub cost_of_living_index: f64,
    pub adjusted_salary: Option<f64>,
    pub benefit_value: f64,
    pub total_score: Option<f64>,
    /// Set whenever a market estimate fed into this offer's score.
    pub market_source: Option<MarketSource>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("at least {MIN_OFFERS} offers are required, got {0}")]
    InsufficientOffers(usize),

    #[error("at most {MAX_OFFERS} offers can be compared, got {0}")]
    TooManyOffers(usize),

    #[error("offer {index}: {reason}")]
    InvalidOffer { index: usize, reason: String },

    #[error("market estimate {index}: {reason}")]
    InvalidEstimate { index: usize, reason: String },

    #[error("expected {expected} market estimates (one per offer), got {actual}")]
    MismatchedEstimates { expected: usize, actual: usize },

    #[error("weights must be finite and non-negative")]
    InvalidWeights,
}

/// Dollar value of everything in an offer other than base salary.
pub fn benefit_value(offer: &OfferInput) -> f64 {
    let b = &offer.benefits;
    let flag = |on: bool, value: f64| if on { value } else { 0.0 };

    offer.bonus
        + flag(b.health_insurance, HEALTH_INSURANCE_VALUE)
        + flag(b.dental_insurance, DENTAL_INSURANCE_VALUE)
        + flag(b.vision_insurance, VISION_INSURANCE_VALUE)
        + flag(b.retirement_401k, RETIREMENT_401K_VALUE)
        + PTO_DAY_VALUE * b.paid_time_off_days
        + flag(b.remote_work, REMOTE_WORK_VALUE)
        + flag(b.flexible_hours, FLEXIBLE_HOURS_VALUE)
        + flag(b.stock_options, STOCK_OPTIONS_VALUE)
}

/// Salary expressed in national-average dollars (index 100 = baseline).
pub fn cost_of_living_adjusted_salary(basis_salary: f64, col_index: f64) -> f64 {
    basis_salary / (col_index / NATIONAL_AVERAGE_INDEX)
}

/// Scores and ranks between two and four offers.
///
/// `market_estimates` is either empty or holds one optional estimate per offer,
/// in the same order.
pub fn score_offers(
    offers: &[OfferInput],
    weights: Option<ScoringWeights>,
    market_estimates: &[Option<MarketEstimate>],
) -> Result<Vec<RankedOffer>, ScoringError> {
    if offers.len() < MIN_OFFERS {
        return Err(ScoringError::InsufficientOffers(offers.len()));
    }
    if offers.len() > MAX_OFFERS {
        return Err(ScoringError::TooManyOffers(offers.len()));
    }
    if !market_estimates.is_empty() && market_estimates.len() != offers.len() {
        return Err(ScoringError::MismatchedEstimates {
            expected: offers.len(),
            actual: market_estimates.len(),
        });
    }

    let weights = weights.unwrap_or_default();
    if !is_non_negative(weights.salary) || !is_non_negative(weights.benefits) {
        return Err(ScoringError::InvalidWeights);
    }

    let mut scored = Vec::with_capacity(offers.len());
    for (index, offer) in offers.iter().enumerate() {
        validate_offer(index, offer)?;
        let estimate = market_estimates.get(index).and_then(Option::as_ref);
        if let Some(estimate) = estimate {
            validate_estimate(index, estimate)?;
        }
        scored.push(score_one(index, offer, estimate, &weights));
    }

    Ok(rank(scored))
}

fn score_one(
    index: usize,
    offer: &OfferInput,
    estimate: Option<&MarketEstimate>,
    weights: &ScoringWeights,
) -> RankedOffer {
    let stated = offer.salary.filter(|salary| *salary > 0.0);
    let market_median = estimate
        .map(|e| e.salary_range.median)
        .filter(|median| *median > 0.0);

    let (basis_salary, basis_source) = match (stated, market_median) {
        (Some(salary), _) => (Some(salary), Some(BasisSource::Stated)),
        (None, Some(median)) => (Some(median), Some(BasisSource::MarketMedian)),
        (None, None) => (None, None),
    };

    let cost_of_living_index = estimate
        .map(|e| e.cost_of_living_index.overall)
        .unwrap_or(NATIONAL_AVERAGE_INDEX);
    let benefit_value = benefit_value(offer);
    let adjusted_salary =
        basis_salary.map(|basis| cost_of_living_adjusted_salary(basis, cost_of_living_index));
    let total_score =
        adjusted_salary.map(|adjusted| weights.salary * adjusted + weights.benefits * benefit_value);

    RankedOffer {
        input_index: index,
        label: offer.label.clone(),
        rank: None,
        score_computable: total_score.is_some(),
        basis_salary,
        basis_source,
        cost_of_living_index,
        adjusted_salary,
        benefit_value,
        total_score,
        market_source: estimate.map(|e| e.source),
    }
}

/// Stable descending sort of computable offers, then the rest in input order.
fn rank(scored: Vec<RankedOffer>) -> Vec<RankedOffer> {
    let (mut computable, incomparable): (Vec<_>, Vec<_>) =
        scored.into_iter().partition(|offer| offer.score_computable);

    computable.sort_by(|a, b| score_key(b).total_cmp(&score_key(a)));

    for (position, offer) in computable.iter_mut().enumerate() {
        offer.rank = Some(position + 1);
    }

    computable.extend(incomparable);
    computable
}

fn score_key(offer: &RankedOffer) -> f64 {
    offer.total_score.unwrap_or(f64::NEG_INFINITY)
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn validate_offer(index: usize, offer: &OfferInput) -> Result<(), ScoringError> {
    let invalid = |reason: &str| ScoringError::InvalidOffer {
        index,
        reason: reason.to_string(),
    };

    if let Some(salary) = offer.salary {
        if !is_non_negative(salary) {
            return Err(invalid("salary must be a non-negative number"));
        }
    }
    if !is_non_negative(offer.bonus) {
        return Err(invalid("bonus must be a non-negative number"));
    }
    if !is_non_negative(offer.benefits.paid_time_off_days) {
        return Err(invalid("paid_time_off_days must be a non-negative number"));
    }
    Ok(())
}

fn validate_estimate(index: usize, estimate: &MarketEstimate) -> Result<(), ScoringError> {
    let overall = estimate.cost_of_living_index.overall;
    if !overall.is_finite() || overall <= 0.0 {
        return Err(ScoringError::InvalidEstimate {
            index,
            reason: format!("cost-of-living index must be positive, got {overall}"),
        });
    }
    if !is_non_negative(estimate.salary_range.median) {
        return Err(ScoringError::InvalidEstimate {
            index,
            reason: "median salary must be a non-negative number".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_value::market::{CostOfLivingIndex, SalaryRange};

    fn offer(label: &str, salary: Option<f64>) -> OfferInput {
        OfferInput {
            label: Some(label.to_string()),
            salary,
            ..OfferInput::default()
        }
    }

    fn estimate(median: f64, col: f64, source: MarketSource) -> MarketEstimate {
        MarketEstimate {
            salary_range: SalaryRange {
                min: median * 0.8,
                max: median * 1.2,
                median,
            },
            cost_of_living_index: CostOfLivingIndex {
                overall: col,
                housing: col,
                groceries: col,
            },
            source,
        }
    }

    fn labels(ranked: &[RankedOffer]) -> Vec<&str> {
        ranked.iter().filter_map(|r| r.label.as_deref()).collect()
    }

    #[test]
    fn test_benefit_value_uses_documented_constants() {
        let everything = OfferInput {
            bonus: 2_000.0,
            benefits: BenefitFlags {
                health_insurance: true,
                dental_insurance: true,
                vision_insurance: true,
                retirement_401k: true,
                paid_time_off_days: 20.0,
                remote_work: true,
                flexible_hours: true,
                stock_options: true,
            },
            ..OfferInput::default()
        };
        // 2000 + 5000 + 1000 + 500 + 3000 + 10000 + 5000 + 3000 + 5000
        assert_eq!(benefit_value(&everything), 34_500.0);
        assert_eq!(benefit_value(&OfferInput::default()), 0.0);
    }

    #[test]
    fn test_cost_of_living_adjustment() {
        assert_eq!(cost_of_living_adjusted_salary(100_000.0, 100.0), 100_000.0);
        assert_eq!(cost_of_living_adjusted_salary(150_000.0, 150.0), 100_000.0);
        assert_eq!(cost_of_living_adjusted_salary(80_000.0, 80.0), 100_000.0);
    }

    #[test]
    fn test_reference_comparison_ranks_salary_over_benefits() {
        let a = offer("A", Some(100_000.0));
        let b = OfferInput {
            label: Some("B".to_string()),
            salary: Some(90_000.0),
            bonus: 0.0,
            benefits: BenefitFlags {
                health_insurance: true,
                paid_time_off_days: 10.0,
                ..BenefitFlags::default()
            },
        };

        let ranked = score_offers(&[b, a], None, &[]).unwrap();
        assert_eq!(labels(&ranked), vec!["A", "B"]);
        assert_eq!(ranked[0].total_score, Some(100_000.0));
        assert_eq!(ranked[1].benefit_value, 10_000.0);
        assert_eq!(ranked[1].total_score, Some(95_000.0));
        assert_eq!(ranked[0].rank, Some(1));
        assert_eq!(ranked[1].rank, Some(2));
        assert_eq!(ranked[0].input_index, 1);
    }

    #[test]
    fn test_offer_count_bounds() {
        let one = vec![offer("A", Some(1.0))];
        assert_eq!(
            score_offers(&one, None, &[]).unwrap_err(),
            ScoringError::InsufficientOffers(1)
        );
        assert_eq!(
            score_offers(&[], None, &[]).unwrap_err(),
            ScoringError::InsufficientOffers(0)
        );

        let five: Vec<_> = (0..5).map(|i| offer(&i.to_string(), Some(1.0))).collect();
        assert_eq!(
            score_offers(&five, None, &[]).unwrap_err(),
            ScoringError::TooManyOffers(5)
        );

        let four: Vec<_> = (0..4).map(|i| offer(&i.to_string(), Some(1.0))).collect();
        assert_eq!(score_offers(&four, None, &[]).unwrap().len(), 4);
    }

    #[test]
    fn test_missing_salary_is_not_scored_as_zero() {
        let ranked = score_offers(
            &[offer("unknown", None), offer("tiny", Some(1.0))],
            None,
            &[],
        )
        .unwrap();
        assert_eq!(labels(&ranked), vec!["tiny", "unknown"]);
        let unknown = &ranked[1];
        assert!(!unknown.score_computable);
        assert_eq!(unknown.total_score, None);
        assert_eq!(unknown.rank, None);
        assert_eq!(unknown.basis_source, None);
    }

    #[test]
    fn test_zero_salary_without_estimate_is_incomparable() {
        let ranked = score_offers(&[offer("zero", Some(0.0)), offer("x", Some(10.0))], None, &[])
            .unwrap();
        assert!(!ranked[1].score_computable);
    }

    #[test]
    fn test_market_median_substitutes_for_missing_salary() {
        let estimates = vec![
            Some(estimate(120_000.0, 120.0, MarketSource::LocalEstimate)),
            None,
        ];
        let ranked = score_offers(
            &[offer("pre-offer", None), offer("stated", Some(90_000.0))],
            None,
            &estimates,
        )
        .unwrap();

        let pre = ranked
            .iter()
            .find(|r| r.label.as_deref() == Some("pre-offer"))
            .unwrap();
        assert_eq!(pre.basis_source, Some(BasisSource::MarketMedian));
        assert_eq!(pre.basis_salary, Some(120_000.0));
        assert_eq!(pre.cost_of_living_index, 120.0);
        assert_eq!(pre.total_score, Some(100_000.0));
        assert_eq!(pre.market_source, Some(MarketSource::LocalEstimate));

        let stated = ranked
            .iter()
            .find(|r| r.label.as_deref() == Some("stated"))
            .unwrap();
        assert_eq!(stated.market_source, None);
        assert_eq!(stated.cost_of_living_index, NATIONAL_AVERAGE_INDEX);
    }

    #[test]
    fn test_stated_salary_beats_market_median_but_uses_its_index() {
        let estimates = vec![
            Some(estimate(200_000.0, 200.0, MarketSource::Api)),
            Some(estimate(50_000.0, 100.0, MarketSource::Api)),
        ];
        let ranked = score_offers(
            &[offer("expensive", Some(150_000.0)), offer("cheap", Some(80_000.0))],
            None,
            &estimates,
        )
        .unwrap();
        // 150k / 2.0 = 75k vs 80k / 1.0 = 80k
        assert_eq!(labels(&ranked), vec!["cheap", "expensive"]);
        assert_eq!(ranked[1].basis_source, Some(BasisSource::Stated));
        assert_eq!(ranked[1].adjusted_salary, Some(75_000.0));
        assert_eq!(ranked[1].market_source, Some(MarketSource::Api));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let offers = vec![
            offer("first", Some(50_000.0)),
            offer("second", Some(70_000.0)),
            offer("third", Some(50_000.0)),
        ];
        let ranked = score_offers(&offers, None, &[]).unwrap();
        assert_eq!(labels(&ranked), vec!["second", "first", "third"]);
    }

    #[test]
    fn test_ranking_is_permutation_invariant() {
        let base = vec![
            offer("a", Some(90_000.0)),
            offer("b", Some(110_000.0)),
            offer("c", None),
            offer("d", Some(100_000.0)),
        ];
        let expected = labels(&score_offers(&base, None, &[]).unwrap())
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let permutations = [[3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]];
        for order in permutations {
            let permuted: Vec<_> = order.iter().map(|&i| base[i].clone()).collect();
            let ranked = score_offers(&permuted, None, &[]).unwrap();
            assert_eq!(labels(&ranked), expected);
        }
    }

    #[test]
    fn test_custom_weights_apply_multiplicatively() {
        let weights = ScoringWeights {
            salary: 0.5,
            benefits: 2.0,
        };
        let with_bonus = OfferInput {
            label: Some("bonus".to_string()),
            salary: Some(60_000.0),
            bonus: 10_000.0,
            ..OfferInput::default()
        };
        let ranked = score_offers(
            &[offer("plain", Some(80_000.0)), with_bonus],
            Some(weights),
            &[],
        )
        .unwrap();
        // 0.5×60k + 2×10k = 50k vs 0.5×80k = 40k
        assert_eq!(labels(&ranked), vec!["bonus", "plain"]);
        assert_eq!(ranked[0].total_score, Some(50_000.0));
    }

    #[test]
    fn test_rejects_negative_inputs() {
        let bad = OfferInput {
            bonus: -1.0,
            ..offer("bad", Some(1.0))
        };
        let err = score_offers(&[offer("ok", Some(1.0)), bad], None, &[]).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidOffer { index: 1, .. }));

        let err = score_offers(
            &[offer("a", Some(1.0)), offer("b", Some(1.0))],
            Some(ScoringWeights {
                salary: f64::NAN,
                benefits: 0.5,
            }),
            &[],
        )
        .unwrap_err();
        assert_eq!(err, ScoringError::InvalidWeights);
    }

    #[test]
    fn test_estimate_alignment_is_checked() {
        let err = score_offers(
            &[offer("a", Some(1.0)), offer("b", Some(1.0))],
            None,
            &[None],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ScoringError::MismatchedEstimates {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_non_positive_cost_of_living_is_rejected() {
        let err = score_offers(
            &[offer("a", Some(1.0)), offer("b", Some(1.0))],
            None,
            &[Some(estimate(1.0, 0.0, MarketSource::Api)), None],
        )
        .unwrap_err();
        assert!(matches!(err, ScoringError::InvalidEstimate { index: 0, .. }));
    }
}
