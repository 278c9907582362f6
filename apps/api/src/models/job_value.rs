use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Per-job weighting preferences saved alongside a job-value record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomWeights {
    pub salary: f64,
    pub benefits: f64,
    pub cost_of_living: f64,
    pub commute: f64,
}

impl Default for CustomWeights {
    fn default() -> Self {
        Self {
            salary: 1.0,
            benefits: 0.5,
            cost_of_living: 0.8,
            commute: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobValueRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub average_industry_salary: Option<f64>,
    pub cost_of_living_index: Option<f64>,
    pub cost_of_living_source: Option<String>,
    pub value_ratio: Option<f64>,
    pub normalized_salary: Option<f64>,
    pub location: Option<String>,
    pub custom_weights: Json<CustomWeights>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
