use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::contacts::repository::{self, ContactFilter};
use crate::errors::AppError;
use crate::jobs::handlers::load_owned_job;
use crate::jobs::lifecycle;
use crate::jobs::repository as jobs_repository;
use crate::jobs::validation::validate_required;
use crate::models::contact::{ContactRole, ContactRow, Interaction, InteractionKind};
use crate::pagination::{PageParams, Paged};
use crate::state::AppState;

const MAX_NAME_LEN: usize = 50;
const MAX_COMPANY_LEN: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: String,
    pub role: Option<ContactRole>,
    pub notes: Option<String>,
    pub linkedin_profile: Option<String>,
    pub last_contacted: Option<DateTime<Utc>>,
    #[serde(default)]
    pub jobs: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub role: Option<ContactRole>,
    pub notes: Option<String>,
    pub linkedin_profile: Option<String>,
    pub last_contacted: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionRequest {
    #[serde(rename = "type")]
    pub kind: Option<InteractionKind>,
    pub notes: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    pub role: Option<ContactRole>,
    pub company: Option<String>,
    pub name: Option<String>,
    pub search: Option<String>,
    pub job: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ContactListQuery {
    fn filter(&self) -> ContactFilter {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        ContactFilter {
            role: self.role,
            company: non_blank(&self.company),
            name: non_blank(&self.name),
            search: non_blank(&self.search),
            job: self.job,
        }
    }
}

impl CreateContactRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_required("name", &self.name, MAX_NAME_LEN)?;
        validate_required("company", &self.company, MAX_COMPANY_LEN)?;
        validate_email(self.email.as_deref())
    }
}

impl UpdateContactRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validate_required("name", name, MAX_NAME_LEN)?;
        }
        if let Some(company) = &self.company {
            validate_required("company", company, MAX_COMPANY_LEN)?;
        }
        validate_email(self.email.as_deref())
    }
}

/// `local@domain.tld` with a 2+ letter TLD. Empty strings are treated as absent.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let word = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || "._-+".contains(c));
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    word(local)
        && word(host)
        && !domain.contains('@')
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

fn validate_email(email: Option<&str>) -> Result<(), AppError> {
    match email.map(str::trim) {
        Some(email) if !email.is_empty() && !is_valid_email(email) => Err(AppError::Validation(
            "Please add a valid email".to_string(),
        )),
        _ => Ok(()),
    }
}

fn new_contact(user_id: Uuid, req: CreateContactRequest, now: DateTime<Utc>) -> ContactRow {
    ContactRow {
        id: Uuid::new_v4(),
        user_id,
        name: req.name.trim().to_string(),
        email: req.email.filter(|e| !e.trim().is_empty()),
        phone: req.phone,
        company: req.company.trim().to_string(),
        role: req.role.unwrap_or_default().as_str().to_string(),
        notes: req.notes,
        linkedin_profile: req.linkedin_profile,
        last_contacted: req.last_contacted,
        interactions: SqlJson(vec![]),
        created_at: now,
        jobs: vec![],
    }
}

fn apply_update(contact: &mut ContactRow, req: UpdateContactRequest) {
    if let Some(name) = req.name {
        contact.name = name.trim().to_string();
    }
    if req.email.is_some() {
        contact.email = req.email.filter(|e| !e.trim().is_empty());
    }
    if req.phone.is_some() {
        contact.phone = req.phone;
    }
    if let Some(company) = req.company {
        contact.company = company.trim().to_string();
    }
    if let Some(role) = req.role {
        contact.role = role.as_str().to_string();
    }
    if req.notes.is_some() {
        contact.notes = req.notes;
    }
    if req.linkedin_profile.is_some() {
        contact.linkedin_profile = req.linkedin_profile;
    }
    if req.last_contacted.is_some() {
        contact.last_contacted = req.last_contacted;
    }
}

fn add_interaction(
    contact: &mut ContactRow,
    req: InteractionRequest,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let (Some(kind), Some(notes)) = (req.kind, req.notes.filter(|n| !n.trim().is_empty())) else {
        return Err(AppError::Validation(
            "Please provide interaction type and notes".to_string(),
        ));
    };
    contact.interactions.0.push(Interaction {
        date: req.date.unwrap_or(now),
        kind,
        notes: Some(notes),
    });
    contact.last_contacted = Some(now);
    Ok(())
}

async fn load_owned_contact(pool: &PgPool, user: &AuthUser, id: Uuid) -> Result<ContactRow, AppError> {
    let contact = repository::find_contact(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contact not found with id of {id}")))?;
    user.ensure_owns(contact.user_id)?;
    Ok(contact)
}

/// GET /api/v1/contacts
pub async fn handle_list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ContactListQuery>,
) -> Result<Json<Paged<ContactRow>>, AppError> {
    let page = PageParams::new(query.page, query.limit);
    let (contacts, total) =
        repository::list_contacts(&state.db, user.id(), &query.filter(), page).await?;
    Ok(Json(Paged::new(contacts, page, total)))
}

/// GET /api/v1/contacts/:id
pub async fn handle_get_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactRow>, AppError> {
    Ok(Json(load_owned_contact(&state.db, &user, id).await?))
}

/// POST /api/v1/contacts
pub async fn handle_create_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<ContactRow>), AppError> {
    req.validate()?;
    let job_ids = req.jobs.clone();
    let contact = new_contact(user.id(), req, Utc::now());
    let created = repository::insert_contact(&state.db, &contact, &job_ids).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/contacts/:id
pub async fn handle_update_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateContactRequest>,
) -> Result<Json<ContactRow>, AppError> {
    req.validate()?;
    let mut contact = load_owned_contact(&state.db, &user, id).await?;
    apply_update(&mut contact, req);
    repository::save_contact(&state.db, &contact).await?;
    Ok(Json(contact))
}

/// DELETE /api/v1/contacts/:id
pub async fn handle_delete_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let contact = load_owned_contact(&state.db, &user, id).await?;
    repository::delete_contact(&state.db, contact.id).await?;
    Ok(Json(json!({})))
}

/// PUT /api/v1/contacts/:id/interactions
pub async fn handle_add_interaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<InteractionRequest>,
) -> Result<Json<ContactRow>, AppError> {
    let mut contact = load_owned_contact(&state.db, &user, id).await?;
    add_interaction(&mut contact, req, Utc::now())?;
    repository::save_contact(&state.db, &contact).await?;
    Ok(Json(contact))
}

/// PUT /api/v1/contacts/:id/jobs/:job_id
///
/// Idempotent: linking an already-linked pair returns the contact unchanged.
pub async fn handle_link_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, job_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ContactRow>, AppError> {
    let contact = load_owned_contact(&state.db, &user, id).await?;
    let mut job = load_owned_job(&state.db, &user, job_id).await?;

    if repository::link_job(&state.db, contact.id, job.id).await? {
        lifecycle::record_contact_added(&mut job, &contact.name, &contact.role, Utc::now());
        jobs_repository::save_job(&state.db, &job).await?;
    }

    let contact = load_owned_contact(&state.db, &user, id).await?;
    Ok(Json(contact))
}
