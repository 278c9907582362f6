use chrono::{DateTime, Duration, Months, Utc};

use crate::models::reminder::{NotificationType, ReminderRow, RepeatFrequency};

/// Next firing time for a repeating reminder, counted from `now`.
pub fn next_reminder_date(frequency: RepeatFrequency, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match frequency {
        RepeatFrequency::Daily => Some(now + Duration::days(1)),
        RepeatFrequency::Weekly => Some(now + Duration::days(7)),
        RepeatFrequency::BiWeekly => Some(now + Duration::days(14)),
        // Clamps to the last day of a shorter month (Jan 31 -> Feb 28).
        RepeatFrequency::Monthly => now.checked_add_months(Months::new(1)),
        RepeatFrequency::None => None,
    }
}

/// Column values to write once a reminder email has gone out.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryPlan {
    pub email_sent: bool,
    pub last_notification_sent: DateTime<Utc>,
    pub remind_at: Option<DateTime<Utc>>,
    pub next_notification_date: Option<DateTime<Utc>>,
}

/// One-off reminders are marked sent. Repeating ones are re-armed for their
/// next date and stay unsent.
pub fn plan_after_delivery(reminder: &ReminderRow, now: DateTime<Utc>) -> DeliveryPlan {
    let frequency = reminder
        .repeat_frequency
        .parse::<RepeatFrequency>()
        .unwrap_or_default();
    let next = reminder
        .repeating
        .then(|| next_reminder_date(frequency, now))
        .flatten();

    match next {
        Some(next) => DeliveryPlan {
            email_sent: false,
            last_notification_sent: now,
            remind_at: Some(next),
            next_notification_date: Some(next),
        },
        None => DeliveryPlan {
            email_sent: true,
            last_notification_sent: now,
            remind_at: reminder.remind_at,
            next_notification_date: reminder.next_notification_date,
        },
    }
}

/// Same predicate the dispatcher's query applies, re-checked per row before sending.
pub fn is_due_for_email(reminder: &ReminderRow, now: DateTime<Utc>) -> bool {
    let wants_email = reminder.notification_type == NotificationType::Email.as_str()
        || reminder.notification_type == NotificationType::Both.as_str();
    wants_email
        && !reminder.email_sent
        && !reminder.completed
        && reminder.remind_at.is_some_and(|at| at <= now)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use uuid::Uuid;

    pub fn reminder(now: DateTime<Utc>) -> ReminderRow {
        ReminderRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Follow up with recruiter".to_string(),
            description: None,
            due_date: now + Duration::days(1),
            completed: false,
            priority: "Medium".to_string(),
            notification_type: "Email".to_string(),
            remind_at: Some(now - Duration::minutes(5)),
            repeating: false,
            repeat_frequency: "None".to_string(),
            job_id: None,
            contact_id: None,
            email_sent: false,
            last_notification_sent: None,
            next_notification_date: None,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_fixed_intervals() {
        let now = at(2026, 3, 1);
        assert_eq!(next_reminder_date(RepeatFrequency::Daily, now), Some(at(2026, 3, 2)));
        assert_eq!(next_reminder_date(RepeatFrequency::Weekly, now), Some(at(2026, 3, 8)));
        assert_eq!(next_reminder_date(RepeatFrequency::BiWeekly, now), Some(at(2026, 3, 15)));
        assert_eq!(next_reminder_date(RepeatFrequency::None, now), None);
    }

    #[test]
    fn test_monthly_is_calendar_month() {
        assert_eq!(
            next_reminder_date(RepeatFrequency::Monthly, at(2026, 3, 15)),
            Some(at(2026, 4, 15))
        );
        assert_eq!(
            next_reminder_date(RepeatFrequency::Monthly, at(2026, 1, 31)),
            Some(at(2026, 2, 28))
        );
    }

    #[test]
    fn test_one_off_is_marked_sent() {
        let now = at(2026, 3, 1);
        let reminder = fixtures::reminder(now);
        let plan = plan_after_delivery(&reminder, now);
        assert!(plan.email_sent);
        assert_eq!(plan.last_notification_sent, now);
        assert_eq!(plan.remind_at, reminder.remind_at);
    }

    #[test]
    fn test_repeating_is_rearmed() {
        let now = at(2026, 3, 1);
        let mut reminder = fixtures::reminder(now);
        reminder.repeating = true;
        reminder.repeat_frequency = "Weekly".to_string();

        let plan = plan_after_delivery(&reminder, now);
        assert!(!plan.email_sent);
        assert_eq!(plan.remind_at, Some(at(2026, 3, 8)));
        assert_eq!(plan.next_notification_date, Some(at(2026, 3, 8)));
    }

    #[test]
    fn test_repeating_without_frequency_behaves_as_one_off() {
        let now = at(2026, 3, 1);
        let mut reminder = fixtures::reminder(now);
        reminder.repeating = true;
        assert!(plan_after_delivery(&reminder, now).email_sent);
    }

    #[test]
    fn test_due_predicate() {
        let now = at(2026, 3, 1);
        let mut reminder = fixtures::reminder(now);
        assert!(is_due_for_email(&reminder, now));

        reminder.notification_type = "App".to_string();
        assert!(!is_due_for_email(&reminder, now));

        reminder.notification_type = "Both".to_string();
        reminder.remind_at = Some(now + Duration::minutes(1));
        assert!(!is_due_for_email(&reminder, now));

        reminder.remind_at = Some(now);
        reminder.completed = true;
        assert!(!is_due_for_email(&reminder, now));
    }
}
