use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::analytics::flow::{reconstruct_flow, FlowGraph, JobApplication};
use crate::analytics::stats::{compute_stats, ApplicationStats};
use crate::analytics::timeline::{activity_timeline, TimelineEvent};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::repository;
use crate::state::AppState;

const DEFAULT_ACTIVITY_DAYS: i64 = 30;
const MAX_ACTIVITY_DAYS: i64 = 3650;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub days: Option<i64>,
}

/// GET /api/v1/analytics/sankey
///
/// An empty graph is returned as-is; placeholder data is left to the client.
pub async fn handle_sankey(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<FlowGraph>, AppError> {
    let jobs = repository::all_jobs(&state.db, user.id()).await?;
    let applications: Vec<JobApplication> = jobs.iter().map(JobApplication::from).collect();
    Ok(Json(reconstruct_flow(&applications)?))
}

/// GET /api/v1/analytics/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApplicationStats>, AppError> {
    let jobs = repository::all_jobs(&state.db, user.id()).await?;
    Ok(Json(compute_stats(&jobs, Utc::now())?))
}

/// GET /api/v1/analytics/activity?days=30
pub async fn handle_activity(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<TimelineEvent>>, AppError> {
    let days = match query.days {
        None => DEFAULT_ACTIVITY_DAYS,
        Some(days) if (1..=MAX_ACTIVITY_DAYS).contains(&days) => days,
        Some(_) => {
            return Err(AppError::Validation(format!(
                "days must be between 1 and {MAX_ACTIVITY_DAYS}"
            )))
        }
    };
    let since = Utc::now() - Duration::days(days);
    let jobs = repository::all_jobs(&state.db, user.id()).await?;
    Ok(Json(activity_timeline(&jobs, since)))
}
