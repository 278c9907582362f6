use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::flow::{reconstruct_flow, FlowError, FlowGraph, JobApplication};
use crate::models::job::{JobRow, JobStatus};

const RECENT_WINDOW_DAYS: i64 = 30;
const MONTHLY_WINDOW_MONTHS: u32 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub date: String, // YYYY-MM
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationStats {
    pub status_counts: BTreeMap<String, usize>,
    pub total_applications: usize,
    pub recent_applications: usize,
    pub total_interviews: usize,
    pub total_offers: usize,
    pub rejection_rate: f64,
    pub success_rate: f64,
    pub average_response_days: Option<i64>,
    pub applications_by_month: Vec<MonthlyCount>,
    pub flow: FlowGraph,
}

/// Aggregates a user's jobs into dashboard statistics as of `now`.
pub fn compute_stats(jobs: &[JobRow], now: DateTime<Utc>) -> Result<ApplicationStats, FlowError> {
    let applications: Vec<JobApplication> = jobs.iter().map(JobApplication::from).collect();
    let flow = reconstruct_flow(&applications)?;

    // reconstruct_flow has validated every status at this point
    let statuses: Vec<JobStatus> = jobs
        .iter()
        .filter_map(|job| job.status.parse().ok())
        .collect();

    let mut status_counts = BTreeMap::new();
    for status in &statuses {
        *status_counts.entry(status.as_str().to_string()).or_insert(0) += 1;
    }

    let total_applications = jobs.len();
    let recent_cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let recent_applications = jobs
        .iter()
        .filter(|job| job.date_applied >= recent_cutoff)
        .count();

    let count_in = |wanted: &[JobStatus]| statuses.iter().filter(|s| wanted.contains(s)).count();
    let total_interviews = count_in(&[
        JobStatus::Interviewing,
        JobStatus::OfferReceived,
        JobStatus::Accepted,
    ]);
    let total_offers = count_in(&[JobStatus::OfferReceived, JobStatus::Accepted]);
    let rejected = count_in(&[JobStatus::Rejected]);

    Ok(ApplicationStats {
        status_counts,
        total_applications,
        recent_applications,
        total_interviews,
        total_offers,
        rejection_rate: percentage(rejected, total_applications),
        success_rate: percentage(total_offers, total_applications),
        average_response_days: average_response_days(jobs),
        applications_by_month: applications_by_month(jobs, now),
        flow,
    })
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Mean whole days from application to the first dated interview.
/// Interviews dated before the application are ignored.
fn average_response_days(jobs: &[JobRow]) -> Option<i64> {
    let spans: Vec<i64> = jobs
        .iter()
        .filter_map(|job| {
            let first = job.first_interview_date()?;
            let days = (first - job.date_applied).num_days();
            (days >= 0).then_some(days)
        })
        .collect();

    if spans.is_empty() {
        return None;
    }
    let total: i64 = spans.iter().sum();
    Some((total as f64 / spans.len() as f64).round() as i64)
}

fn applications_by_month(jobs: &[JobRow], now: DateTime<Utc>) -> Vec<MonthlyCount> {
    let cutoff = now
        .checked_sub_months(Months::new(MONTHLY_WINDOW_MONTHS))
        .unwrap_or(now);

    let mut buckets: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for job in jobs.iter().filter(|job| job.date_applied >= cutoff) {
        let key = (job.date_applied.year(), job.date_applied.month());
        *buckets.entry(key).or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .map(|((year, month), count)| MonthlyCount {
            date: format!("{year}-{month:02}"),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::flow::PipelineStage;
    use crate::models::job::fixtures;
    use chrono::TimeZone;
    use sqlx::types::Json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn job_on(status: &str, applied: DateTime<Utc>) -> JobRow {
        let mut job = fixtures::job(status);
        job.date_applied = applied;
        job
    }

    #[test]
    fn test_empty_history_has_zero_rates() {
        let stats = compute_stats(&[], now()).unwrap();
        assert_eq!(stats.total_applications, 0);
        assert_eq!(stats.rejection_rate, 0.0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.average_response_days, None);
        assert!(stats.flow.edges.is_empty());
    }

    #[test]
    fn test_counts_and_rates() {
        let jobs = vec![
            job_on("Applied", now()),
            job_on("Interviewing", now()),
            job_on("Offer Received", now()),
            job_on("Accepted", now()),
            job_on("Rejected", now()),
        ];
        let stats = compute_stats(&jobs, now()).unwrap();
        assert_eq!(stats.total_interviews, 3);
        assert_eq!(stats.total_offers, 2);
        assert!((stats.rejection_rate - 20.0).abs() < 1e-9);
        assert!((stats.success_rate - 40.0).abs() < 1e-9);
        assert_eq!(stats.status_counts.get("Offer Received"), Some(&1));
        assert_eq!(stats.flow.edge_count(PipelineStage::Applied, PipelineStage::Pending), 1);
    }

    #[test]
    fn test_recent_window_is_thirty_days() {
        let jobs = vec![
            job_on("Applied", now() - Duration::days(10)),
            job_on("Applied", now() - Duration::days(45)),
        ];
        let stats = compute_stats(&jobs, now()).unwrap();
        assert_eq!(stats.recent_applications, 1);
    }

    #[test]
    fn test_average_response_days_ignores_negative_spans() {
        let applied = now() - Duration::days(20);
        let mut quick = job_on("Interviewing", applied);
        quick.interview_process = Json(vec![fixtures::interview(Some(applied + Duration::days(4)))]);
        let mut slow = job_on("Interviewing", applied);
        slow.interview_process = Json(vec![fixtures::interview(Some(applied + Duration::days(9)))]);
        let mut backdated = job_on("Interviewing", applied);
        backdated.interview_process =
            Json(vec![fixtures::interview(Some(applied - Duration::days(2)))]);

        let stats = compute_stats(&[quick, slow, backdated], now()).unwrap();
        // (4 + 9) / 2 = 6.5 → 7
        assert_eq!(stats.average_response_days, Some(7));
    }

    #[test]
    fn test_monthly_buckets_are_ascending_and_windowed() {
        let jobs = vec![
            job_on("Applied", Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()),
            job_on("Applied", Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap()),
            job_on("Applied", Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap()),
            job_on("Applied", Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).unwrap()),
        ];
        let stats = compute_stats(&jobs, now()).unwrap();
        assert_eq!(
            stats.applications_by_month,
            vec![
                MonthlyCount {
                    date: "2024-03".to_string(),
                    count: 1
                },
                MonthlyCount {
                    date: "2024-05".to_string(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_invalid_status_propagates() {
        let jobs = vec![job_on("Maybe", now())];
        assert!(compute_stats(&jobs, now()).is_err());
    }
}
