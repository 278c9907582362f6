use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::reminders::email::render_reminder_email;
use crate::reminders::notifier::ReminderNotifier;
use crate::reminders::repository;
use crate::reminders::schedule::{is_due_for_email, plan_after_delivery};

/// Upper bound on emails sent per tick.
const BATCH_SIZE: i64 = 100;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Polls for due reminder emails every `poll_interval` until the runtime shuts down.
pub fn spawn(pool: PgPool, notifier: Arc<dyn ReminderNotifier>, poll_interval: Duration) -> JoinHandle<()> {
    info!("Reminder dispatcher polling every {}s", poll_interval.as_secs());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_interval);
        loop {
            interval.tick().await;
            match dispatch_due_reminders(&pool, notifier.as_ref(), Utc::now()).await {
                Ok(summary) if summary.sent + summary.failed + summary.skipped > 0 => {
                    info!(
                        "Reminder dispatch: {} sent, {} failed, {} skipped",
                        summary.sent, summary.failed, summary.skipped
                    );
                }
                Ok(_) => debug!("No reminders due"),
                Err(e) => error!("Reminder dispatch error: {e:?}"),
            }
        }
    })
}

/// Sends every due reminder once. A failed delivery leaves the reminder
/// pending so the next tick retries it.
pub async fn dispatch_due_reminders(
    pool: &PgPool,
    notifier: &dyn ReminderNotifier,
    now: DateTime<Utc>,
) -> Result<DispatchSummary> {
    let due = repository::due_for_email(pool, now, BATCH_SIZE).await?;
    let mut summary = DispatchSummary::default();

    for reminder in due {
        if !is_due_for_email(&reminder, now) {
            debug!("Reminder {} no longer due, skipping", reminder.id);
            summary.skipped += 1;
            continue;
        }

        let Some(ctx) = repository::email_context(pool, &reminder).await? else {
            warn!("User not found for reminder {}", reminder.id);
            summary.skipped += 1;
            continue;
        };

        let email = render_reminder_email(&reminder, &ctx);
        if let Err(e) = notifier.deliver(&email).await {
            warn!("Failed to send reminder {} to {}: {e}", reminder.id, email.to);
            summary.failed += 1;
            continue;
        }

        let plan = plan_after_delivery(&reminder, now);
        repository::record_delivery(pool, reminder.id, &plan).await?;
        summary.sent += 1;

        match plan.remind_at.filter(|_| !plan.email_sent) {
            Some(next) => info!("Reminder {:?} sent; next notification at {next}", reminder.title),
            None => info!("Reminder {:?} sent to {}", reminder.title, email.to),
        }
    }

    Ok(summary)
}
