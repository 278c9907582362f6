use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::contacts::repository as contacts_repository;
use crate::errors::AppError;
use crate::jobs::handlers::load_owned_job;
use crate::jobs::lifecycle;
use crate::jobs::repository as jobs_repository;
use crate::jobs::validation::validate_required;
use crate::models::job::JobRow;
use crate::models::reminder::{NotificationType, Priority, ReminderRow, RepeatFrequency};
use crate::pagination::{parse_date_param, DateBound, PageParams, Paged};
use crate::reminders::email::render_reminder_email;
use crate::reminders::repository::{self, ReminderFilter};
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;
const UPCOMING_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReminderRequest {
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub notification_type: Option<NotificationType>,
    pub remind_at: Option<DateTime<Utc>>,
    pub repeating: Option<bool>,
    pub repeat_frequency: Option<RepeatFrequency>,
    pub job: Option<Uuid>,
    pub contact: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReminderRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub notification_type: Option<NotificationType>,
    pub remind_at: Option<DateTime<Utc>>,
    pub repeating: Option<bool>,
    pub repeat_frequency: Option<RepeatFrequency>,
    pub job: Option<Uuid>,
    pub contact: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReminderListQuery {
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub job: Option<Uuid>,
    pub contact: Option<Uuid>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub upcoming: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ReminderListQuery {
    /// `upcoming=true` means due from now on and, unless `completed` is given, still open.
    fn filter(&self, now: DateTime<Utc>) -> Result<ReminderFilter, AppError> {
        let mut filter = ReminderFilter {
            completed: self.completed,
            priority: self.priority,
            job: self.job,
            contact: self.contact,
            due_after: self
                .start_date
                .as_deref()
                .map(|raw| parse_date_param("start_date", raw, DateBound::Start))
                .transpose()?,
            due_before: self
                .end_date
                .as_deref()
                .map(|raw| parse_date_param("end_date", raw, DateBound::End))
                .transpose()?,
        };
        if self.upcoming == Some(true) {
            filter.due_after = Some(now);
            filter.due_before = None;
            filter.completed = Some(self.completed.unwrap_or(false));
        }
        Ok(filter)
    }
}

fn validate_description(description: Option<&str>) -> Result<(), AppError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(AppError::Validation(format!(
            "description cannot be more than {MAX_DESCRIPTION_LEN} characters"
        ))),
        _ => Ok(()),
    }
}

impl CreateReminderRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_required("title", &self.title, MAX_TITLE_LEN)?;
        validate_description(self.description.as_deref())
    }
}

impl UpdateReminderRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_required("title", title, MAX_TITLE_LEN)?;
        }
        validate_description(self.description.as_deref())
    }
}

fn new_reminder(user_id: Uuid, req: CreateReminderRequest, now: DateTime<Utc>) -> ReminderRow {
    ReminderRow {
        id: Uuid::new_v4(),
        user_id,
        title: req.title.trim().to_string(),
        description: req.description,
        due_date: req.due_date,
        completed: req.completed.unwrap_or(false),
        priority: req.priority.unwrap_or_default().as_str().to_string(),
        notification_type: req.notification_type.unwrap_or_default().as_str().to_string(),
        remind_at: req.remind_at,
        repeating: req.repeating.unwrap_or(false),
        repeat_frequency: req.repeat_frequency.unwrap_or_default().as_str().to_string(),
        job_id: req.job,
        contact_id: req.contact,
        email_sent: false,
        last_notification_sent: None,
        next_notification_date: None,
        created_at: now,
    }
}

/// Applies the patch. Returns true when this update completes the reminder.
fn apply_update(reminder: &mut ReminderRow, req: UpdateReminderRequest) -> bool {
    let newly_completed = req.completed == Some(true) && !reminder.completed;

    if let Some(title) = req.title {
        reminder.title = title.trim().to_string();
    }
    if req.description.is_some() {
        reminder.description = req.description;
    }
    if let Some(due_date) = req.due_date {
        reminder.due_date = due_date;
    }
    if let Some(completed) = req.completed {
        reminder.completed = completed;
    }
    if let Some(priority) = req.priority {
        reminder.priority = priority.as_str().to_string();
    }
    if let Some(kind) = req.notification_type {
        reminder.notification_type = kind.as_str().to_string();
    }
    if req.remind_at.is_some() && req.remind_at != reminder.remind_at {
        // A new reminder time re-arms the email.
        reminder.remind_at = req.remind_at;
        reminder.email_sent = false;
    }
    if let Some(repeating) = req.repeating {
        reminder.repeating = repeating;
    }
    if let Some(frequency) = req.repeat_frequency {
        reminder.repeat_frequency = frequency.as_str().to_string();
    }
    if req.job.is_some() {
        reminder.job_id = req.job;
    }
    if req.contact.is_some() {
        reminder.contact_id = req.contact;
    }
    newly_completed
}

/// The reminder to insert and, when it is linked to a job, the job carrying its
/// `Reminder Set` activity. Both are written in one transaction.
fn plan_reminder_creation(
    user_id: Uuid,
    req: CreateReminderRequest,
    job: Option<JobRow>,
    now: DateTime<Utc>,
) -> (ReminderRow, Option<JobRow>) {
    let reminder = new_reminder(user_id, req, now);
    let job = job.map(|mut job| {
        lifecycle::record_reminder_set(&mut job, &reminder.title, reminder.due_date, now);
        job
    });
    (reminder, job)
}

async fn load_owned_reminder(pool: &PgPool, user: &AuthUser, id: Uuid) -> Result<ReminderRow, AppError> {
    let reminder = repository::find_reminder(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reminder not found with id of {id}")))?;
    user.ensure_owns(reminder.user_id)?;
    Ok(reminder)
}

async fn ensure_owned_contact(pool: &PgPool, user: &AuthUser, id: Uuid) -> Result<(), AppError> {
    let contact = contacts_repository::find_contact(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contact not found with id of {id}")))?;
    user.ensure_owns(contact.user_id)
}

/// GET /api/v1/reminders
pub async fn handle_list_reminders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReminderListQuery>,
) -> Result<Json<Paged<ReminderRow>>, AppError> {
    let filter = query.filter(Utc::now())?;
    let page = PageParams::new(query.page, query.limit);
    let (reminders, total) =
        repository::list_reminders(&state.db, user.id(), &filter, page).await?;
    Ok(Json(Paged::new(reminders, page, total)))
}

/// GET /api/v1/reminders/upcoming
pub async fn handle_upcoming_reminders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ReminderRow>>, AppError> {
    let now = Utc::now();
    let until = now + Duration::hours(UPCOMING_WINDOW_HOURS);
    Ok(Json(
        repository::due_between(&state.db, user.id(), now, until).await?,
    ))
}

/// GET /api/v1/reminders/:id
pub async fn handle_get_reminder(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReminderRow>, AppError> {
    Ok(Json(load_owned_reminder(&state.db, &user, id).await?))
}

/// POST /api/v1/reminders
pub async fn handle_create_reminder(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateReminderRequest>,
) -> Result<(StatusCode, Json<ReminderRow>), AppError> {
    req.validate()?;
    let now = Utc::now();

    let job = match req.job {
        Some(job_id) => Some(load_owned_job(&state.db, &user, job_id).await?),
        None => None,
    };
    if let Some(contact_id) = req.contact {
        ensure_owned_contact(&state.db, &user, contact_id).await?;
    }

    let (reminder, job) = plan_reminder_creation(user.id(), req, job, now);

    let mut tx = state.db.begin().await?;
    repository::insert_reminder(&mut *tx, &reminder).await?;
    if let Some(job) = &job {
        jobs_repository::save_job(&mut *tx, job).await?;
    }
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(reminder)))
}

/// PUT /api/v1/reminders/:id
pub async fn handle_update_reminder(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReminderRequest>,
) -> Result<Json<ReminderRow>, AppError> {
    req.validate()?;
    let mut reminder = load_owned_reminder(&state.db, &user, id).await?;

    if let Some(job_id) = req.job {
        load_owned_job(&state.db, &user, job_id).await?;
    }
    if let Some(contact_id) = req.contact {
        ensure_owned_contact(&state.db, &user, contact_id).await?;
    }

    let newly_completed = apply_update(&mut reminder, req);
    let completed_job = match reminder.job_id.filter(|_| newly_completed) {
        Some(job_id) => {
            let mut job = load_owned_job(&state.db, &user, job_id).await?;
            lifecycle::record_reminder_completed(&mut job, &reminder.title, Utc::now());
            Some(job)
        }
        None => None,
    };

    let mut tx = state.db.begin().await?;
    repository::save_reminder(&mut *tx, &reminder).await?;
    if let Some(job) = &completed_job {
        jobs_repository::save_job(&mut *tx, job).await?;
    }
    tx.commit().await?;

    Ok(Json(reminder))
}

/// DELETE /api/v1/reminders/:id
pub async fn handle_delete_reminder(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let reminder = load_owned_reminder(&state.db, &user, id).await?;
    repository::delete_reminder(&state.db, reminder.id).await?;
    Ok(Json(json!({})))
}

/// POST /api/v1/reminders/:id/send-test-email
///
/// Sends the reminder email now without touching its delivery state.
pub async fn handle_send_test_email(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let reminder = load_owned_reminder(&state.db, &user, id).await?;
    let notifier = state.notifier.as_ref().ok_or_else(|| {
        AppError::UnprocessableEntity("Email delivery is not configured".to_string())
    })?;

    let ctx = repository::email_context(&state.db, &reminder)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let email = render_reminder_email(&reminder, &ctx);
    notifier.deliver(&email).await?;

    info!("Test email for reminder {} sent to {}", reminder.id, email.to);
    Ok(Json(json!({ "message": "Test email sent successfully" })))
}
