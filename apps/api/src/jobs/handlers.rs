use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::lifecycle;
use crate::jobs::repository::{self, JobFilter};
use crate::jobs::validation::{
    CreateJobRequest, InterviewRequest, NoteRequest, OfferRequest, UpdateJobRequest,
};
use crate::models::job::{JobRow, JobStatus};
use crate::pagination::{parse_date_param, DateBound, PageParams, Paged};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub status: Option<JobStatus>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl JobListQuery {
    fn filter(&self) -> Result<JobFilter, AppError> {
        Ok(JobFilter {
            status: self.status,
            company: non_blank(&self.company),
            title: non_blank(&self.title),
            location: non_blank(&self.location),
            start_date: self
                .start_date
                .as_deref()
                .map(|raw| parse_date_param("start_date", raw, DateBound::Start))
                .transpose()?,
            end_date: self
                .end_date
                .as_deref()
                .map(|raw| parse_date_param("end_date", raw, DateBound::End))
                .transpose()?,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Loads a job the caller owns: 404 when missing, 403 when it belongs to someone else.
pub async fn load_owned_job(pool: &PgPool, user: &AuthUser, id: Uuid) -> Result<JobRow, AppError> {
    let job = repository::find_job(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job not found with id of {id}")))?;
    user.ensure_owns(job.user_id)?;
    Ok(job)
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<JobListQuery>,
) -> Result<Json<Paged<JobRow>>, AppError> {
    let filter = query.filter()?;
    let page = PageParams::new(query.page, query.limit);
    let (jobs, total) = repository::list_jobs(&state.db, user.id(), &filter, page).await?;
    Ok(Json(Paged::new(jobs, page, total)))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    Ok(Json(load_owned_job(&state.db, &user, id).await?))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    req.validate()?;
    let contact_ids = req.contacts.clone();
    let job = lifecycle::new_job(user.id(), req, Utc::now());
    let created = repository::insert_job(&state.db, &job, &contact_ids).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<JobRow>, AppError> {
    req.validate()?;
    let mut job = load_owned_job(&state.db, &user, id).await?;
    lifecycle::apply_update(&mut job, req, Utc::now());
    repository::save_job(&state.db, &job).await?;
    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let job = load_owned_job(&state.db, &user, id).await?;
    repository::delete_job(&state.db, job.id).await?;
    Ok(Json(json!({})))
}

/// PUT /api/v1/jobs/:id/notes
pub async fn handle_add_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<JobRow>, AppError> {
    let note = req
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Validation("Please provide a note".to_string()))?;

    let mut job = load_owned_job(&state.db, &user, id).await?;
    lifecycle::add_note(&mut job, note, Utc::now());
    repository::save_job(&state.db, &job).await?;
    Ok(Json(job))
}

/// PUT /api/v1/jobs/:id/interviews
pub async fn handle_add_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<InterviewRequest>,
) -> Result<Json<JobRow>, AppError> {
    let mut job = load_owned_job(&state.db, &user, id).await?;
    lifecycle::schedule_interview(&mut job, req, Utc::now());
    repository::save_job(&state.db, &job).await?;
    Ok(Json(job))
}

/// PUT /api/v1/jobs/:id/interviews/:interview_id
pub async fn handle_update_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, interview_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<InterviewRequest>,
) -> Result<Json<JobRow>, AppError> {
    let mut job = load_owned_job(&state.db, &user, id).await?;
    if !lifecycle::update_interview(&mut job, interview_id, req) {
        return Err(AppError::NotFound(format!(
            "Interview not found with id of {interview_id}"
        )));
    }
    repository::save_job(&state.db, &job).await?;
    Ok(Json(job))
}

/// PUT /api/v1/jobs/:id/offer
pub async fn handle_record_offer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<OfferRequest>,
) -> Result<Json<JobRow>, AppError> {
    req.validate()?;
    let mut job = load_owned_job(&state.db, &user, id).await?;
    lifecycle::record_offer(&mut job, req, Utc::now());
    repository::save_job(&state.db, &job).await?;
    Ok(Json(job))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(raw: &str) -> JobListQuery {
        let uri: axum::http::Uri = format!("/api/v1/jobs?{raw}").parse().unwrap();
        Query::<JobListQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_list_query_builds_filter() {
        let q = query("status=Offer%20Received&company=acme&title=%20&start_date=2026-01-01&page=2");
        let filter = q.filter().unwrap();
        assert_eq!(filter.status, Some(JobStatus::OfferReceived));
        assert_eq!(filter.company.as_deref(), Some("acme"));
        assert_eq!(filter.title, None);
        assert!(filter.start_date.is_some());
        assert_eq!(q.page, Some(2));
    }

    #[test]
    fn test_list_query_rejects_bad_dates() {
        assert!(query("end_date=soon").filter().is_err());
    }
}
