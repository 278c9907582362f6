use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::job::JobRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub details: String,
}

/// Application submissions and job activities on or after `since`, oldest first.
pub fn activity_timeline(jobs: &[JobRow], since: DateTime<Utc>) -> Vec<TimelineEvent> {
    let mut events = Vec::new();

    for job in jobs {
        if job.date_applied >= since {
            events.push(TimelineEvent {
                date: job.date_applied,
                kind: "Application".to_string(),
                details: format!("Applied to a job (status: {})", job.status),
            });
        }

        events.extend(
            job.activities
                .0
                .iter()
                .filter(|activity| activity.date >= since)
                .map(|activity| TimelineEvent {
                    date: activity.date,
                    kind: activity.kind.as_str().to_string(),
                    details: activity.description.clone(),
                }),
        );
    }

    events.sort_by_key(|event| event.date);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{fixtures, Activity, ActivityKind};
    use chrono::Duration;
    use sqlx::types::Json;

    #[test]
    fn test_timeline_merges_and_sorts_events() {
        let now = Utc::now();
        let mut job = fixtures::job("Interviewing");
        job.date_applied = now - Duration::days(5);
        job.activities = Json(vec![
            Activity::new(ActivityKind::NoteAdded, "Sent thank-you note", now - Duration::days(1)),
            Activity::new(ActivityKind::StatusChange, "Status changed", now - Duration::days(3)),
            Activity::new(ActivityKind::Other, "Ancient", now - Duration::days(90)),
        ]);

        let events = activity_timeline(&[job], now - Duration::days(30));
        let kinds: Vec<&str> = events.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Application", "Status Change", "Note Added"]);
        assert_eq!(events[0].details, "Applied to a job (status: Interviewing)");
    }

    #[test]
    fn test_old_applications_are_excluded() {
        let now = Utc::now();
        let mut job = fixtures::job("Applied");
        job.date_applied = now - Duration::days(60);
        assert!(activity_timeline(&[job], now - Duration::days(30)).is_empty());
    }
}
