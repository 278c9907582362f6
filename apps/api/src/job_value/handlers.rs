use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::job_value::market::{CostOfLivingIndex, MarketEstimate, MarketSource, SalaryRange};
use crate::job_value::repository;
use crate::job_value::salary_data::{salary_data, SalaryData};
use crate::job_value::scoring::{score_offers, OfferInput, RankedOffer, ScoringWeights, MIN_OFFERS};
use crate::job_value::valuation::{offer_input_from_job, value_job};
use crate::jobs::handlers::load_owned_job;
use crate::jobs::repository as jobs_repository;
use crate::models::job::JobRow;
use crate::models::job_value::{CustomWeights, JobValueRow};
use crate::state::AppState;

// ──────────────────────────────────────────────────────────────────────────────
// Scoring
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub offers: Vec<OfferInput>,
    pub weights: Option<ScoringWeights>,
    #[serde(default)]
    pub market_estimates: Vec<Option<MarketEstimate>>,
}

/// POST /api/v1/job-value/score
pub async fn handle_score(Json(req): Json<ScoreRequest>) -> Result<Json<Vec<RankedOffer>>, AppError> {
    let ranked = score_offers(&req.offers, req.weights, &req.market_estimates)?;
    Ok(Json(ranked))
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub job_ids: Vec<Uuid>,
    pub weights: Option<ScoringWeights>,
}

#[derive(Debug, Serialize)]
pub struct ComparedJob {
    pub job_id: Uuid,
    pub company: String,
    pub title: String,
    pub location: Option<String>,
    #[serde(flatten)]
    pub score: RankedOffer,
}

/// POST /api/v1/job-value/compare
pub async fn handle_compare(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CompareRequest>,
) -> Result<Json<Vec<ComparedJob>>, AppError> {
    if req.job_ids.len() < MIN_OFFERS {
        return Err(AppError::Validation(format!(
            "Please provide at least {MIN_OFFERS} job IDs to compare"
        )));
    }

    let jobs = jobs_repository::find_owned_jobs(&state.db, user.id(), &req.job_ids).await?;
    if jobs.len() < MIN_OFFERS {
        return Err(AppError::Validation(format!(
            "At least {MIN_OFFERS} of the given jobs must exist and belong to you"
        )));
    }

    let offers: Vec<OfferInput> = jobs.iter().map(offer_input_from_job).collect();
    let mut estimates = Vec::with_capacity(jobs.len());
    for job in &jobs {
        let location = job.location.as_deref().unwrap_or_default();
        let estimate = state.market_data.fetch_estimate(&job.title, location).await?;
        estimates.push(Some(estimate));
    }

    let ranked = score_offers(&offers, req.weights, &estimates)?;

    if let Some(weights) = req.weights {
        remember_weights(&state, &jobs, weights).await?;
    }

    info!("Compared {} jobs for user {}", jobs.len(), user.id());
    Ok(Json(attach_jobs(&jobs, ranked)))
}

/// Keeps the caller's salary/benefit weights on each compared job's value record.
async fn remember_weights(
    state: &AppState,
    jobs: &[JobRow],
    weights: ScoringWeights,
) -> Result<(), AppError> {
    let now = Utc::now();
    for job in jobs {
        let mut value = repository::get_or_create(&state.db, job, now).await?;
        value.custom_weights.0.salary = weights.salary;
        value.custom_weights.0.benefits = weights.benefits;
        value.updated_at = now;
        repository::save_job_value(&state.db, &value).await?;
    }
    Ok(())
}

fn attach_jobs(jobs: &[JobRow], ranked: Vec<RankedOffer>) -> Vec<ComparedJob> {
    ranked
        .into_iter()
        .filter_map(|score| {
            let job = jobs.get(score.input_index)?;
            Some(ComparedJob {
                job_id: job.id,
                company: job.company.clone(),
                title: job.title.clone(),
                location: job.location.clone(),
                score,
            })
        })
        .collect()
}

// ──────────────────────────────────────────────────────────────────────────────
// Market lookups
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MarketSalaryQuery {
    pub title: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MarketSalaryResponse {
    pub title: String,
    pub location: String,
    pub salary_range: SalaryRange,
    pub source: MarketSource,
}

#[derive(Debug, Deserialize)]
pub struct CostOfLivingQuery {
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CostOfLivingResponse {
    pub location: String,
    pub cost_of_living_index: CostOfLivingIndex,
    pub source: MarketSource,
}

fn required_param(value: Option<String>, message: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

/// GET /api/v1/job-value/market-salary?title=..&location=..
pub async fn handle_market_salary(
    State(state): State<AppState>,
    Query(query): Query<MarketSalaryQuery>,
) -> Result<Json<MarketSalaryResponse>, AppError> {
    let message = "Please provide both job title and location";
    let title = required_param(query.title, message)?;
    let location = required_param(query.location, message)?;

    let estimate = state.market_data.fetch_estimate(&title, &location).await?;
    Ok(Json(MarketSalaryResponse {
        title,
        location,
        salary_range: estimate.salary_range,
        source: estimate.source,
    }))
}

/// GET /api/v1/job-value/cost-of-living?location=..
pub async fn handle_cost_of_living(
    State(state): State<AppState>,
    Query(query): Query<CostOfLivingQuery>,
) -> Result<Json<CostOfLivingResponse>, AppError> {
    let location = required_param(query.location, "Please provide a location")?;

    let estimate = state.market_data.fetch_estimate("", &location).await?;
    Ok(Json(CostOfLivingResponse {
        location,
        cost_of_living_index: estimate.cost_of_living_index,
        source: estimate.source,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SalaryDataQuery {
    pub title: Option<String>,
}

/// GET /api/v1/job-value/salary-data/:city?title=..
pub async fn handle_salary_data(
    _user: AuthUser,
    Path(city): Path<String>,
    Query(query): Query<SalaryDataQuery>,
) -> Result<Json<SalaryData>, AppError> {
    let title = required_param(query.title, "Please provide a job title")?;
    Ok(Json(salary_data(&title, Some(&city), Utc::now().date_naive())))
}

// ──────────────────────────────────────────────────────────────────────────────
// Stored job-value records
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub company: String,
    pub title: String,
    pub location: Option<String>,
    pub salary: Option<f64>,
    pub salary_time_frame: String,
    pub remote_status: String,
}

impl From<&JobRow> for JobSummary {
    fn from(job: &JobRow) -> Self {
        Self {
            company: job.company.clone(),
            title: job.title.clone(),
            location: job.location.clone(),
            salary: job.salary,
            salary_time_frame: job.salary_time_frame.clone(),
            remote_status: job.remote_status.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobValueView {
    #[serde(flatten)]
    pub value: JobValueRow,
    pub job: JobSummary,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateJobValueRequest {
    pub average_industry_salary: Option<f64>,
    pub cost_of_living_index: Option<f64>,
    pub cost_of_living_source: Option<String>,
    pub location: Option<String>,
    pub custom_weights: Option<CustomWeights>,
}

impl UpdateJobValueRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(avg) = self.average_industry_salary {
            if !avg.is_finite() || avg < 0.0 {
                return Err(AppError::Validation(
                    "average_industry_salary must be a non-negative number".to_string(),
                ));
            }
        }
        if let Some(index) = self.cost_of_living_index {
            if !index.is_finite() || index <= 0.0 {
                return Err(AppError::Validation(
                    "cost_of_living_index must be a positive number".to_string(),
                ));
            }
        }
        if let Some(weights) = &self.custom_weights {
            let all = [
                weights.salary,
                weights.benefits,
                weights.cost_of_living,
                weights.commute,
            ];
            if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(AppError::Validation(
                    "custom_weights must be finite and non-negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Applies the patch and recomputes the derived salary figures from the job's salary.
fn apply_job_value_update(value: &mut JobValueRow, job: &JobRow, req: UpdateJobValueRequest) {
    if req.average_industry_salary.is_some() {
        value.average_industry_salary = req.average_industry_salary;
    }
    if req.cost_of_living_index.is_some() {
        value.cost_of_living_index = req.cost_of_living_index;
    }
    if req.cost_of_living_source.is_some() {
        value.cost_of_living_source = req.cost_of_living_source;
    }
    if req.location.is_some() {
        value.location = req.location;
    }
    if let Some(weights) = req.custom_weights {
        value.custom_weights = SqlJson(weights);
    }

    if let Some(valuation) = value_job(
        job.salary,
        value.cost_of_living_index,
        value.average_industry_salary,
    ) {
        value.normalized_salary = Some(valuation.normalized_salary);
        if valuation.value_ratio.is_some() {
            value.value_ratio = valuation.value_ratio;
        }
    }
}

/// GET /api/v1/job-value
pub async fn handle_list_job_values(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<JobValueRow>>, AppError> {
    Ok(Json(repository::list_job_values(&state.db, user.id()).await?))
}

/// GET /api/v1/job-value/:job_id
pub async fn handle_get_job_value(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobValueView>, AppError> {
    let job = load_owned_job(&state.db, &user, job_id).await?;
    let value = repository::get_or_create(&state.db, &job, Utc::now()).await?;
    Ok(Json(JobValueView {
        value,
        job: JobSummary::from(&job),
    }))
}

/// PUT /api/v1/job-value/:job_id
pub async fn handle_update_job_value(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
    Json(req): Json<UpdateJobValueRequest>,
) -> Result<Json<JobValueView>, AppError> {
    req.validate()?;
    let job = load_owned_job(&state.db, &user, job_id).await?;
    let now = Utc::now();

    let mut value = repository::get_or_create(&state.db, &job, now).await?;
    apply_job_value_update(&mut value, &job, req);
    value.updated_at = now;
    repository::save_job_value(&state.db, &value).await?;

    Ok(Json(JobValueView {
        value,
        job: JobSummary::from(&job),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::fixtures;

    fn value_row(job: &JobRow) -> JobValueRow {
        let now = Utc::now();
        JobValueRow {
            id: Uuid::new_v4(),
            job_id: job.id,
            user_id: job.user_id,
            average_industry_salary: Some(0.0),
            cost_of_living_index: Some(100.0),
            cost_of_living_source: None,
            value_ratio: None,
            normalized_salary: None,
            location: None,
            custom_weights: SqlJson(CustomWeights::default()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_update_recomputes_value_ratio() {
        let mut job = fixtures::job("Offer Received");
        job.salary = Some(180_000.0);
        let mut value = value_row(&job);

        let req = UpdateJobValueRequest {
            average_industry_salary: Some(100_000.0),
            cost_of_living_index: Some(150.0),
            ..UpdateJobValueRequest::default()
        };
        apply_job_value_update(&mut value, &job, req);

        assert!((value.normalized_salary.unwrap() - 120_000.0).abs() < 1e-6);
        assert!((value.value_ratio.unwrap() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_update_without_salary_leaves_derived_fields() {
        let job = fixtures::job("Applied");
        let mut value = value_row(&job);
        apply_job_value_update(
            &mut value,
            &job,
            UpdateJobValueRequest {
                cost_of_living_index: Some(120.0),
                ..UpdateJobValueRequest::default()
            },
        );
        assert_eq!(value.cost_of_living_index, Some(120.0));
        assert_eq!(value.normalized_salary, None);
    }

    #[test]
    fn test_update_validation() {
        let bad_index = UpdateJobValueRequest {
            cost_of_living_index: Some(0.0),
            ..UpdateJobValueRequest::default()
        };
        assert!(bad_index.validate().is_err());

        let bad_weights = UpdateJobValueRequest {
            custom_weights: Some(CustomWeights {
                commute: -1.0,
                ..CustomWeights::default()
            }),
            ..UpdateJobValueRequest::default()
        };
        assert!(bad_weights.validate().is_err());
    }

    #[test]
    fn test_compared_jobs_follow_ranking() {
        let mut low = fixtures::job("Offer Received");
        low.salary = Some(90_000.0);
        let mut high = fixtures::job("Offer Received");
        high.salary = Some(130_000.0);
        let jobs = vec![low, high];

        let offers: Vec<OfferInput> = jobs.iter().map(offer_input_from_job).collect();
        let ranked = score_offers(&offers, None, &[]).unwrap();
        let compared = attach_jobs(&jobs, ranked);

        assert_eq!(compared[0].job_id, jobs[1].id);
        assert_eq!(compared[0].score.rank, Some(1));
        assert_eq!(compared[1].job_id, jobs[0].id);
    }

    #[test]
    fn test_compared_job_serializes_flat() {
        let job = fixtures::job("Applied");
        let offers = vec![offer_input_from_job(&job), offer_input_from_job(&job)];
        let ranked = score_offers(&offers, None, &[]).unwrap();
        let compared = attach_jobs(&[job.clone(), job], ranked);

        let json = serde_json::to_value(&compared[0]).unwrap();
        assert_eq!(json["company"], "Acme");
        assert_eq!(json["score_computable"], false);
        assert!(json.get("score").is_none());
    }
}
