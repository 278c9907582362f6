use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotificationType {
    Email,
    #[default]
    App,
    Both,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Email => "Email",
            NotificationType::App => "App",
            NotificationType::Both => "Both",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepeatFrequency {
    Daily,
    Weekly,
    #[serde(rename = "Bi-weekly")]
    BiWeekly,
    Monthly,
    #[default]
    None,
}

impl RepeatFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatFrequency::Daily => "Daily",
            RepeatFrequency::Weekly => "Weekly",
            RepeatFrequency::BiWeekly => "Bi-weekly",
            RepeatFrequency::Monthly => "Monthly",
            RepeatFrequency::None => "None",
        }
    }
}

impl FromStr for RepeatFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Daily" => Ok(RepeatFrequency::Daily),
            "Weekly" => Ok(RepeatFrequency::Weekly),
            "Bi-weekly" => Ok(RepeatFrequency::BiWeekly),
            "Monthly" => Ok(RepeatFrequency::Monthly),
            "None" => Ok(RepeatFrequency::None),
            other => Err(format!("unknown repeat frequency {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReminderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub completed: bool,
    pub priority: String,
    pub notification_type: String,
    pub remind_at: Option<DateTime<Utc>>,
    pub repeating: bool,
    pub repeat_frequency: String,
    pub job_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub email_sent: bool,
    pub last_notification_sent: Option<DateTime<Utc>>,
    pub next_notification_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
