//! In-memory job transitions. Handlers load a row, apply one of these, then
//! save the whole row back, so every activity-log rule lives here and is
//! testable without a database.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::jobs::validation::{CreateJobRequest, InterviewRequest, OfferRequest, UpdateJobRequest};
use crate::models::job::{Activity, ActivityKind, Interview, JobRow, JobStatus, OfferDetails};

/// US-style short date used in activity descriptions.
const ACTIVITY_DATE_FORMAT: &str = "%-m/%-d/%Y";

pub fn new_job(user_id: Uuid, req: CreateJobRequest, now: DateTime<Utc>) -> JobRow {
    JobRow {
        id: Uuid::new_v4(),
        user_id,
        company: req.company.trim().to_string(),
        title: req.title.trim().to_string(),
        status: req.status.unwrap_or(JobStatus::Applied).as_str().to_string(),
        date_applied: req.date_applied.unwrap_or(now),
        job_posting_link: req.job_posting_link,
        salary: req.salary,
        salary_time_frame: req.salary_time_frame.unwrap_or_default().as_str().to_string(),
        location: req.location,
        remote_status: req.remote_status.unwrap_or_default().as_str().to_string(),
        description: req.description,
        notes: req.notes,
        requirements: req.requirements,
        benefits: req.benefits,
        company_details: req.company_details.map(Json),
        interview_process: Json(vec![]),
        activities: Json(vec![]),
        offer_details: None,
        created_at: now,
        contacts: vec![],
    }
}

pub fn apply_update(job: &mut JobRow, req: UpdateJobRequest, now: DateTime<Utc>) {
    if let Some(status) = req.status {
        change_status(job, status, now);
    }
    if let Some(company) = req.company {
        job.company = company.trim().to_string();
    }
    if let Some(title) = req.title {
        job.title = title.trim().to_string();
    }
    if let Some(date_applied) = req.date_applied {
        job.date_applied = date_applied;
    }
    if req.job_posting_link.is_some() {
        job.job_posting_link = req.job_posting_link;
    }
    if req.salary.is_some() {
        job.salary = req.salary;
    }
    if let Some(frame) = req.salary_time_frame {
        job.salary_time_frame = frame.as_str().to_string();
    }
    if req.location.is_some() {
        job.location = req.location;
    }
    if let Some(remote) = req.remote_status {
        job.remote_status = remote.as_str().to_string();
    }
    if req.description.is_some() {
        job.description = req.description;
    }
    if req.notes.is_some() {
        job.notes = req.notes;
    }
    if let Some(requirements) = req.requirements {
        job.requirements = requirements;
    }
    if let Some(benefits) = req.benefits {
        job.benefits = benefits;
    }
    if let Some(details) = req.company_details {
        job.company_details = Some(Json(details));
    }
}

/// Sets the status, logging a `Status Change` activity when it actually changes.
pub fn change_status(job: &mut JobRow, status: JobStatus, now: DateTime<Utc>) {
    if job.status == status.as_str() {
        return;
    }
    let description = format!("Status changed from {} to {}", job.status, status);
    job.activities
        .0
        .push(Activity::new(ActivityKind::StatusChange, description, now));
    job.status = status.as_str().to_string();
}

pub fn add_note(job: &mut JobRow, note: &str, now: DateTime<Utc>) {
    job.activities
        .0
        .push(Activity::new(ActivityKind::NoteAdded, note, now));
    job.notes = Some(match job.notes.take().filter(|n| !n.is_empty()) {
        Some(existing) => format!("{existing}\n\n{note}"),
        None => note.to_string(),
    });
}

/// Appends an interview. A job still at `Applied` moves to `Interviewing`.
pub fn schedule_interview(job: &mut JobRow, req: InterviewRequest, now: DateTime<Utc>) -> Uuid {
    let interview = Interview {
        id: Uuid::new_v4(),
        kind: req.kind,
        date: req.date,
        duration_minutes: req.duration_minutes,
        with: req.with,
        notes: req.notes,
        completed: req.completed.unwrap_or(false),
    };
    let id = interview.id;

    if job.status == JobStatus::Applied.as_str() {
        job.status = JobStatus::Interviewing.as_str().to_string();
    }

    let kind = interview.kind.map(|k| k.as_str()).unwrap_or("Interview");
    let description = match interview.date {
        Some(date) => format!(
            "Interview scheduled: {kind} on {}",
            date.format(ACTIVITY_DATE_FORMAT)
        ),
        None => format!("Interview scheduled: {kind}"),
    };
    job.interview_process.0.push(interview);
    job.activities
        .0
        .push(Activity::new(ActivityKind::StatusChange, description, now));
    id
}

/// Merges the given fields into an existing interview. Returns false when the
/// job has no interview with that id.
pub fn update_interview(job: &mut JobRow, interview_id: Uuid, req: InterviewRequest) -> bool {
    let Some(interview) = job
        .interview_process
        .0
        .iter_mut()
        .find(|interview| interview.id == interview_id)
    else {
        return false;
    };

    if req.kind.is_some() {
        interview.kind = req.kind;
    }
    if req.date.is_some() {
        interview.date = req.date;
    }
    if req.duration_minutes.is_some() {
        interview.duration_minutes = req.duration_minutes;
    }
    if req.with.is_some() {
        interview.with = req.with;
    }
    if req.notes.is_some() {
        interview.notes = req.notes;
    }
    if let Some(completed) = req.completed {
        interview.completed = completed;
    }
    true
}

/// Merges offer details. Jobs not already at an offer stage move to
/// `Offer Received` with an activity naming the base salary.
pub fn record_offer(job: &mut JobRow, req: OfferRequest, now: DateTime<Utc>) {
    let mut offer = job
        .offer_details
        .take()
        .map(|Json(offer)| offer)
        .unwrap_or_default();
    merge_offer(&mut offer, req);

    let at_offer_stage = job.status == JobStatus::OfferReceived.as_str()
        || job.status == JobStatus::Accepted.as_str();
    if !at_offer_stage {
        job.status = JobStatus::OfferReceived.as_str().to_string();
        let salary = offer
            .base_salary
            .map(format_amount)
            .unwrap_or_else(|| "not specified".to_string());
        job.activities.0.push(Activity::new(
            ActivityKind::StatusChange,
            format!("Offer received with base salary of {salary}"),
            now,
        ));
    }

    job.offer_details = Some(Json(offer));
}

fn merge_offer(offer: &mut OfferDetails, req: OfferRequest) {
    if req.base_salary.is_some() {
        offer.base_salary = req.base_salary;
    }
    if req.bonus.is_some() {
        offer.bonus = req.bonus;
    }
    if req.stock_options.is_some() {
        offer.stock_options = req.stock_options;
    }
    if req.benefits.is_some() {
        offer.benefits = req.benefits;
    }
    if req.negotiation_notes.is_some() {
        offer.negotiation_notes = req.negotiation_notes;
    }
    if req.offer_deadline.is_some() {
        offer.offer_deadline = req.offer_deadline;
    }
}

pub fn record_reminder_set(job: &mut JobRow, title: &str, due: DateTime<Utc>, now: DateTime<Utc>) {
    job.activities.0.push(Activity::new(
        ActivityKind::ReminderSet,
        format!("Reminder set: {title} for {}", due.format(ACTIVITY_DATE_FORMAT)),
        now,
    ));
}

pub fn record_reminder_completed(job: &mut JobRow, title: &str, now: DateTime<Utc>) {
    job.activities.0.push(Activity::new(
        ActivityKind::Other,
        format!("Completed reminder: {title}"),
        now,
    ));
}

pub fn record_contact_added(job: &mut JobRow, name: &str, role: &str, now: DateTime<Utc>) {
    job.activities.0.push(Activity::new(
        ActivityKind::ContactAdded,
        format!("Contact {name} ({role}) added to job"),
        now,
    ));
}

/// Whole amounts print without a fractional part.
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        format!("{amount:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{fixtures, InterviewKind};
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_status_change_is_logged_once() {
        let mut job = fixtures::job("Applied");
        change_status(&mut job, JobStatus::Rejected, at(1));
        change_status(&mut job, JobStatus::Rejected, at(2));

        assert_eq!(job.status, "Rejected");
        assert_eq!(job.activities.0.len(), 1);
        assert_eq!(job.activities.0[0].kind, ActivityKind::StatusChange);
        assert_eq!(
            job.activities.0[0].description,
            "Status changed from Applied to Rejected"
        );
    }

    #[test]
    fn test_partial_update_leaves_other_fields() {
        let mut job = fixtures::job("Applied");
        job.location = Some("Denver".to_string());
        let req = UpdateJobRequest {
            title: Some(" Staff Engineer ".to_string()),
            ..UpdateJobRequest::default()
        };
        apply_update(&mut job, req, at(1));

        assert_eq!(job.title, "Staff Engineer");
        assert_eq!(job.location.as_deref(), Some("Denver"));
        assert!(job.activities.0.is_empty());
    }

    #[test]
    fn test_notes_are_appended_with_blank_line() {
        let mut job = fixtures::job("Applied");
        add_note(&mut job, "Sent thank-you email", at(1));
        add_note(&mut job, "Recruiter replied", at(2));

        assert_eq!(
            job.notes.as_deref(),
            Some("Sent thank-you email\n\nRecruiter replied")
        );
        assert_eq!(job.activities.0.len(), 2);
        assert_eq!(job.activities.0[1].kind, ActivityKind::NoteAdded);
    }

    #[test]
    fn test_interview_promotes_applied() {
        let mut job = fixtures::job("Applied");
        let req = InterviewRequest {
            kind: Some(InterviewKind::PhoneScreen),
            date: Some(at(14)),
            ..InterviewRequest::default()
        };
        let id = schedule_interview(&mut job, req, at(1));

        assert_eq!(job.status, "Interviewing");
        assert_eq!(job.interview_process.0[0].id, id);
        assert_eq!(
            job.activities.0[0].description,
            "Interview scheduled: Phone Screen on 3/14/2026"
        );
    }

    #[test]
    fn test_interview_does_not_demote_later_stages() {
        let mut job = fixtures::job("Offer Received");
        schedule_interview(&mut job, InterviewRequest::default(), at(1));
        assert_eq!(job.status, "Offer Received");
        assert_eq!(job.activities.0[0].description, "Interview scheduled: Interview");
    }

    #[test]
    fn test_update_interview_merges_fields() {
        let mut job = fixtures::job("Interviewing");
        let id = schedule_interview(
            &mut job,
            InterviewRequest {
                kind: Some(InterviewKind::Technical),
                notes: Some("Prep system design".to_string()),
                ..InterviewRequest::default()
            },
            at(1),
        );

        let patch = InterviewRequest {
            completed: Some(true),
            ..InterviewRequest::default()
        };
        assert!(update_interview(&mut job, id, patch));
        let interview = &job.interview_process.0[0];
        assert!(interview.completed);
        assert_eq!(interview.kind, Some(InterviewKind::Technical));
        assert_eq!(interview.notes.as_deref(), Some("Prep system design"));

        assert!(!update_interview(&mut job, Uuid::new_v4(), InterviewRequest::default()));
    }

    #[test]
    fn test_offer_moves_to_offer_received() {
        let mut job = fixtures::job("Interviewing");
        let req = OfferRequest {
            base_salary: Some(120_000.0),
            ..OfferRequest::default()
        };
        record_offer(&mut job, req, at(1));

        assert_eq!(job.status, "Offer Received");
        assert!(job.has_offer());
        assert_eq!(
            job.activities.0[0].description,
            "Offer received with base salary of 120000"
        );
    }

    #[test]
    fn test_offer_on_accepted_job_only_merges() {
        let mut job = fixtures::job("Accepted");
        job.offer_details = Some(Json(fixtures::offer(100_000.0)));
        let req = OfferRequest {
            bonus: Some(10_000.0),
            ..OfferRequest::default()
        };
        record_offer(&mut job, req, at(1));

        assert_eq!(job.status, "Accepted");
        assert!(job.activities.0.is_empty());
        let offer = &job.offer_details.as_ref().unwrap().0;
        assert_eq!(offer.base_salary, Some(100_000.0));
        assert_eq!(offer.bonus, Some(10_000.0));
    }

    #[test]
    fn test_reminder_activities() {
        let mut job = fixtures::job("Applied");
        record_reminder_set(&mut job, "Follow up", at(20), at(1));
        record_reminder_completed(&mut job, "Follow up", at(2));

        assert_eq!(job.activities.0[0].kind, ActivityKind::ReminderSet);
        assert_eq!(
            job.activities.0[0].description,
            "Reminder set: Follow up for 3/20/2026"
        );
        assert_eq!(job.activities.0[1].kind, ActivityKind::Other);
        assert_eq!(job.activities.0[1].description, "Completed reminder: Follow up");
    }

    #[test]
    fn test_new_job_defaults() {
        let req: CreateJobRequest =
            serde_json::from_value(serde_json::json!({ "company": " Acme ", "title": "Engineer" }))
                .unwrap();
        let user = Uuid::new_v4();
        let job = new_job(user, req, at(1));

        assert_eq!(job.user_id, user);
        assert_eq!(job.company, "Acme");
        assert_eq!(job.status, "Applied");
        assert_eq!(job.salary_time_frame, "Yearly");
        assert_eq!(job.remote_status, "On-site");
        assert_eq!(job.date_applied, at(1));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(95_000.0), "95000");
        assert_eq!(format_amount(95_000.5), "95000.50");
    }
}
