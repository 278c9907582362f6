use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContactRole {
    #[default]
    Recruiter,
    #[serde(rename = "Hiring Manager")]
    HiringManager,
    #[serde(rename = "HR")]
    Hr,
    #[serde(rename = "Team Member")]
    TeamMember,
    Other,
}

impl ContactRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactRole::Recruiter => "Recruiter",
            ContactRole::HiringManager => "Hiring Manager",
            ContactRole::Hr => "HR",
            ContactRole::TeamMember => "Team Member",
            ContactRole::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionKind {
    Email,
    Phone,
    #[serde(rename = "Video Call")]
    VideoCall,
    #[serde(rename = "In-person")]
    InPerson,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub notes: Option<String>,
}

pub const CONTACT_COLUMNS: &str = r#"
    id, user_id, name, email, phone, company, role, notes, linkedin_profile,
    last_contacted, interactions, created_at,
    ARRAY(SELECT job_id FROM job_contacts WHERE job_contacts.contact_id = contacts.id) AS jobs
"#;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: String,
    pub role: String,
    pub notes: Option<String>,
    pub linkedin_profile: Option<String>,
    pub last_contacted: Option<DateTime<Utc>>,
    pub interactions: Json<Vec<Interaction>>,
    pub created_at: DateTime<Utc>,
    pub jobs: Vec<Uuid>,
}
