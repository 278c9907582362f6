use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{
    CompanyDetails, InterviewKind, JobStatus, OfferBenefits, RemoteStatus, SalaryTimeFrame,
};

pub const MAX_COMPANY_LEN: usize = 100;
pub const MAX_TITLE_LEN: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    pub company: String,
    pub title: String,
    pub status: Option<JobStatus>,
    pub date_applied: Option<DateTime<Utc>>,
    pub job_posting_link: Option<String>,
    pub salary: Option<f64>,
    pub salary_time_frame: Option<SalaryTimeFrame>,
    pub location: Option<String>,
    pub remote_status: Option<RemoteStatus>,
    pub description: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub company_details: Option<CompanyDetails>,
    #[serde(default)]
    pub contacts: Vec<Uuid>,
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateJobRequest {
    pub company: Option<String>,
    pub title: Option<String>,
    pub status: Option<JobStatus>,
    pub date_applied: Option<DateTime<Utc>>,
    pub job_posting_link: Option<String>,
    pub salary: Option<f64>,
    pub salary_time_frame: Option<SalaryTimeFrame>,
    pub location: Option<String>,
    pub remote_status: Option<RemoteStatus>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub company_details: Option<CompanyDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteRequest {
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterviewRequest {
    #[serde(rename = "type")]
    pub kind: Option<InterviewKind>,
    pub date: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub with: Option<String>,
    pub notes: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferRequest {
    pub base_salary: Option<f64>,
    pub bonus: Option<f64>,
    pub stock_options: Option<f64>,
    pub benefits: Option<OfferBenefits>,
    pub negotiation_notes: Option<String>,
    pub offer_deadline: Option<DateTime<Utc>>,
}

impl CreateJobRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_company(&self.company)?;
        validate_title(&self.title)?;
        validate_link(self.job_posting_link.as_deref())?;
        validate_amount("salary", self.salary)
    }
}

impl UpdateJobRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(company) = &self.company {
            validate_company(company)?;
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        validate_link(self.job_posting_link.as_deref())?;
        validate_amount("salary", self.salary)
    }
}

impl OfferRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_amount("base_salary", self.base_salary)?;
        validate_amount("bonus", self.bonus)?;
        validate_amount("stock_options", self.stock_options)?;
        if let Some(pto) = self.benefits.as_ref().and_then(|b| b.pto_days) {
            validate_amount("pto_days", Some(pto))?;
        }
        Ok(())
    }
}

fn validate_company(company: &str) -> Result<(), AppError> {
    validate_required("company", company, MAX_COMPANY_LEN)
}

fn validate_title(title: &str) -> Result<(), AppError> {
    validate_required("title", title, MAX_TITLE_LEN)
}

pub(crate) fn validate_required(field: &str, value: &str, max_len: usize) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::Validation(format!(
            "{field} cannot be more than {max_len} characters"
        )));
    }
    Ok(())
}

fn validate_link(link: Option<&str>) -> Result<(), AppError> {
    match link {
        Some(link) if !(link.starts_with("http://") || link.starts_with("https://")) => Err(
            AppError::Validation("job_posting_link must be an http(s) URL".to_string()),
        ),
        _ => Ok(()),
    }
}

fn validate_amount(field: &str, amount: Option<f64>) -> Result<(), AppError> {
    match amount {
        Some(value) if !value.is_finite() || value < 0.0 => Err(AppError::Validation(format!(
            "{field} must be a non-negative number"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(company: &str, title: &str) -> CreateJobRequest {
        serde_json::from_value(serde_json::json!({ "company": company, "title": title })).unwrap()
    }

    #[test]
    fn test_minimal_create_is_valid() {
        let req = create("Acme", "Engineer");
        assert!(req.validate().is_ok());
        assert!(req.contacts.is_empty());
        assert_eq!(req.status, None);
    }

    #[test]
    fn test_blank_and_overlong_fields_are_rejected() {
        assert!(create("  ", "Engineer").validate().is_err());
        assert!(create("Acme", &"x".repeat(101)).validate().is_err());
        assert!(create("Acme", &"x".repeat(100)).validate().is_ok());
    }

    #[test]
    fn test_link_must_be_http() {
        let mut req = create("Acme", "Engineer");
        req.job_posting_link = Some("ftp://jobs.example.com/1".to_string());
        assert!(req.validate().is_err());
        req.job_posting_link = Some("https://jobs.example.com/1".to_string());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_negative_salary_is_rejected() {
        let req = UpdateJobRequest {
            salary: Some(-1.0),
            ..UpdateJobRequest::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_status_uses_display_strings() {
        let req: UpdateJobRequest =
            serde_json::from_value(serde_json::json!({ "status": "Offer Received" })).unwrap();
        assert_eq!(req.status, Some(JobStatus::OfferReceived));
        assert!(serde_json::from_value::<UpdateJobRequest>(serde_json::json!({ "status": "Ghosted" }))
            .is_err());
    }
}
