use crate::job_value::local_estimate::NATIONAL_AVERAGE_INDEX;
use crate::job_value::scoring::{BenefitFlags, OfferInput};
use crate::models::job::{JobRow, RemoteStatus};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valuation {
    pub normalized_salary: f64,
    pub value_ratio: Option<f64>,
}

/// Cost-of-living normalized salary and its ratio to the industry average.
/// `None` when the salary or index is missing or not positive.
pub fn value_job(
    salary: Option<f64>,
    cost_of_living_index: Option<f64>,
    average_industry_salary: Option<f64>,
) -> Option<Valuation> {
    let salary = salary.filter(|s| *s > 0.0)?;
    let index = cost_of_living_index.filter(|i| *i > 0.0)?;

    let normalized_salary = salary * (NATIONAL_AVERAGE_INDEX / index);
    let value_ratio = average_industry_salary
        .filter(|avg| *avg > 0.0)
        .map(|avg| normalized_salary / avg);

    Some(Valuation {
        normalized_salary,
        value_ratio,
    })
}

/// Maps a tracked job onto a scorer input. The offer's base salary wins over the
/// advertised salary; benefits come from the recorded offer details.
pub fn offer_input_from_job(job: &JobRow) -> OfferInput {
    let offer = job.offer_details.as_ref().map(|o| &o.0);
    let benefits = offer.and_then(|o| o.benefits.as_ref());

    OfferInput {
        label: Some(format!("{} - {}", job.company, job.title)),
        salary: offer.and_then(|o| o.base_salary).or(job.salary),
        bonus: offer.and_then(|o| o.bonus).unwrap_or(0.0).max(0.0),
        benefits: BenefitFlags {
            health_insurance: benefits.map(|b| b.healthcare).unwrap_or(false),
            dental_insurance: benefits.map(|b| b.dental).unwrap_or(false),
            vision_insurance: benefits.map(|b| b.vision).unwrap_or(false),
            retirement_401k: benefits
                .and_then(|b| b.retirement.as_ref())
                .map(|r| r.has_401k)
                .unwrap_or(false),
            paid_time_off_days: benefits
                .and_then(|b| b.pto_days)
                .unwrap_or(0.0)
                .max(0.0),
            remote_work: job.remote_status == RemoteStatus::Remote.as_str(),
            flexible_hours: job.remote_status == RemoteStatus::Hybrid.as_str(),
            stock_options: offer
                .and_then(|o| o.stock_options)
                .map(|units| units > 0.0)
                .unwrap_or(false),
        },
    }
}
