use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Where a job application currently sits. Stored as its display string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Applied,
    Interviewing,
    #[serde(rename = "Offer Received")]
    OfferReceived,
    Accepted,
    Rejected,
    Withdrawn,
    #[serde(rename = "Not Applied")]
    NotApplied,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid job status: {0:?}")]
pub struct InvalidStatus(pub String);

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::Applied,
        JobStatus::Interviewing,
        JobStatus::OfferReceived,
        JobStatus::Accepted,
        JobStatus::Rejected,
        JobStatus::Withdrawn,
        JobStatus::NotApplied,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Applied => "Applied",
            JobStatus::Interviewing => "Interviewing",
            JobStatus::OfferReceived => "Offer Received",
            JobStatus::Accepted => "Accepted",
            JobStatus::Rejected => "Rejected",
            JobStatus::Withdrawn => "Withdrawn",
            JobStatus::NotApplied => "Not Applied",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SalaryTimeFrame {
    Hourly,
    Weekly,
    Monthly,
    #[default]
    Yearly,
}

impl SalaryTimeFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalaryTimeFrame::Hourly => "Hourly",
            SalaryTimeFrame::Weekly => "Weekly",
            SalaryTimeFrame::Monthly => "Monthly",
            SalaryTimeFrame::Yearly => "Yearly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RemoteStatus {
    Remote,
    Hybrid,
    #[default]
    #[serde(rename = "On-site")]
    OnSite,
}

impl RemoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteStatus::Remote => "Remote",
            RemoteStatus::Hybrid => "Hybrid",
            RemoteStatus::OnSite => "On-site",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewKind {
    #[serde(rename = "Phone Screen")]
    PhoneScreen,
    Technical,
    Behavioral,
    #[serde(rename = "Take-home")]
    TakeHome,
    #[serde(rename = "Final Round")]
    FinalRound,
    Other,
}

impl InterviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewKind::PhoneScreen => "Phone Screen",
            InterviewKind::Technical => "Technical",
            InterviewKind::Behavioral => "Behavioral",
            InterviewKind::TakeHome => "Take-home",
            InterviewKind::FinalRound => "Final Round",
            InterviewKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    #[serde(rename = "Status Change")]
    StatusChange,
    #[serde(rename = "Note Added")]
    NoteAdded,
    #[serde(rename = "Reminder Set")]
    ReminderSet,
    #[serde(rename = "Contact Added")]
    ContactAdded,
    Other,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::StatusChange => "Status Change",
            ActivityKind::NoteAdded => "Note Added",
            ActivityKind::ReminderSet => "Reminder Set",
            ActivityKind::ContactAdded => "Contact Added",
            ActivityKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: Option<InterviewKind>,
    pub date: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub with: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl Activity {
    pub fn new(kind: ActivityKind, description: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            kind,
            description: description.into(),
            date,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyDetails {
    pub size: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetirementPlan {
    #[serde(default)]
    pub has_401k: bool,
    pub match_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferBenefits {
    #[serde(default)]
    pub healthcare: bool,
    #[serde(default)]
    pub dental: bool,
    #[serde(default)]
    pub vision: bool,
    pub retirement: Option<RetirementPlan>,
    pub pto_days: Option<f64>,
    #[serde(default)]
    pub other_benefits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferDetails {
    pub base_salary: Option<f64>,
    pub bonus: Option<f64>,
    pub stock_options: Option<f64>,
    pub benefits: Option<OfferBenefits>,
    pub negotiation_notes: Option<String>,
    pub offer_deadline: Option<DateTime<Utc>>,
}

impl OfferDetails {
    /// An offer counts as present once a base salary has been recorded.
    pub fn has_base_salary(&self) -> bool {
        self.base_salary.is_some()
    }
}

/// Column list shared by every `jobs` SELECT so `contacts` is always populated.
pub const JOB_COLUMNS: &str = r#"
    id, user_id, company, title, status, date_applied, job_posting_link, salary,
    salary_time_frame, location, remote_status, description, notes, requirements,
    benefits, company_details, interview_process, activities, offer_details, created_at,
    ARRAY(SELECT contact_id FROM job_contacts WHERE job_contacts.job_id = jobs.id) AS contacts
"#;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company: String,
    pub title: String,
    pub status: String,
    pub date_applied: DateTime<Utc>,
    pub job_posting_link: Option<String>,
    pub salary: Option<f64>,
    pub salary_time_frame: String,
    pub location: Option<String>,
    pub remote_status: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    pub company_details: Option<Json<CompanyDetails>>,
    pub interview_process: Json<Vec<Interview>>,
    pub activities: Json<Vec<Activity>>,
    pub offer_details: Option<Json<OfferDetails>>,
    pub created_at: DateTime<Utc>,
    pub contacts: Vec<Uuid>,
}

impl JobRow {
    pub fn has_interview_history(&self) -> bool {
        !self.interview_process.0.is_empty()
    }

    pub fn has_offer(&self) -> bool {
        self.offer_details
            .as_ref()
            .map(|offer| offer.0.has_base_salary())
            .unwrap_or(false)
    }

    /// Earliest dated interview, if any.
    pub fn first_interview_date(&self) -> Option<DateTime<Utc>> {
        self.interview_process
            .0
            .iter()
            .filter_map(|interview| interview.date)
            .min()
    }
}
