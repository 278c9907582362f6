use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::models::reminder::{NotificationType, Priority, ReminderRow};
use crate::pagination::PageParams;
use crate::reminders::email::EmailContext;
use crate::reminders::schedule::DeliveryPlan;

const REMINDER_COLUMNS: &str = r#"
    id, user_id, title, description, due_date, completed, priority, notification_type,
    remind_at, repeating, repeat_frequency, job_id, contact_id, email_sent,
    last_notification_sent, next_notification_date, created_at
"#;

#[derive(Debug, Clone, Default)]
pub struct ReminderFilter {
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub job: Option<Uuid>,
    pub contact: Option<Uuid>,
    pub due_after: Option<DateTime<Utc>>,
    pub due_before: Option<DateTime<Utc>>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, filter: &ReminderFilter) {
    qb.push(" WHERE user_id = ").push_bind(user_id);

    if let Some(completed) = filter.completed {
        qb.push(" AND completed = ").push_bind(completed);
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority.as_str());
    }
    if let Some(job) = filter.job {
        qb.push(" AND job_id = ").push_bind(job);
    }
    if let Some(contact) = filter.contact {
        qb.push(" AND contact_id = ").push_bind(contact);
    }
    if let Some(after) = filter.due_after {
        qb.push(" AND due_date >= ").push_bind(after);
    }
    if let Some(before) = filter.due_before {
        qb.push(" AND due_date <= ").push_bind(before);
    }
}

/// One page of reminders, soonest due first.
pub async fn list_reminders(
    pool: &PgPool,
    user_id: Uuid,
    filter: &ReminderFilter,
    page: PageParams,
) -> Result<(Vec<ReminderRow>, i64)> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reminders");
    push_filters(&mut count, user_id, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut select =
        QueryBuilder::<Postgres>::new(format!("SELECT {REMINDER_COLUMNS} FROM reminders"));
    push_filters(&mut select, user_id, filter);
    select
        .push(" ORDER BY due_date ASC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let reminders = select.build_query_as::<ReminderRow>().fetch_all(pool).await?;

    Ok((reminders, total))
}

pub async fn find_reminder(pool: &PgPool, id: Uuid) -> Result<Option<ReminderRow>> {
    Ok(sqlx::query_as::<_, ReminderRow>(&format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

pub async fn insert_reminder<'e>(executor: impl PgExecutor<'e>, r: &ReminderRow) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO reminders
            (id, user_id, title, description, due_date, completed, priority, notification_type,
             remind_at, repeating, repeat_frequency, job_id, contact_id, email_sent,
             last_notification_sent, next_notification_date, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        "#,
    )
    .bind(r.id)
    .bind(r.user_id)
    .bind(&r.title)
    .bind(&r.description)
    .bind(r.due_date)
    .bind(r.completed)
    .bind(&r.priority)
    .bind(&r.notification_type)
    .bind(r.remind_at)
    .bind(r.repeating)
    .bind(&r.repeat_frequency)
    .bind(r.job_id)
    .bind(r.contact_id)
    .bind(r.email_sent)
    .bind(r.last_notification_sent)
    .bind(r.next_notification_date)
    .bind(r.created_at)
    .execute(executor)
    .await?;
    info!("Created reminder {} for user {}", r.id, r.user_id);
    Ok(())
}

pub async fn save_reminder<'e>(executor: impl PgExecutor<'e>, r: &ReminderRow) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE reminders SET
            title = $2, description = $3, due_date = $4, completed = $5, priority = $6,
            notification_type = $7, remind_at = $8, repeating = $9, repeat_frequency = $10,
            job_id = $11, contact_id = $12, email_sent = $13, last_notification_sent = $14,
            next_notification_date = $15
        WHERE id = $1
        "#,
    )
    .bind(r.id)
    .bind(&r.title)
    .bind(&r.description)
    .bind(r.due_date)
    .bind(r.completed)
    .bind(&r.priority)
    .bind(&r.notification_type)
    .bind(r.remind_at)
    .bind(r.repeating)
    .bind(&r.repeat_frequency)
    .bind(r.job_id)
    .bind(r.contact_id)
    .bind(r.email_sent)
    .bind(r.last_notification_sent)
    .bind(r.next_notification_date)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete_reminder(pool: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM reminders WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Open reminders due between `from` and `until`, soonest first.
pub async fn due_between(
    pool: &PgPool,
    user_id: Uuid,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<ReminderRow>> {
    Ok(sqlx::query_as::<_, ReminderRow>(&format!(
        r#"
        SELECT {REMINDER_COLUMNS} FROM reminders
        WHERE user_id = $1 AND completed = FALSE AND due_date >= $2 AND due_date <= $3
        ORDER BY due_date ASC
        "#
    ))
    .bind(user_id)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await?)
}

/// Reminders whose email is due: `remind_at <= now`, Email or Both, unsent, open.
pub async fn due_for_email(pool: &PgPool, now: DateTime<Utc>, limit: i64) -> Result<Vec<ReminderRow>> {
    Ok(sqlx::query_as::<_, ReminderRow>(&format!(
        r#"
        SELECT {REMINDER_COLUMNS} FROM reminders
        WHERE remind_at <= $1
          AND notification_type IN ($2, $3)
          AND email_sent = FALSE
          AND completed = FALSE
        ORDER BY remind_at ASC
        LIMIT $4
        "#
    ))
    .bind(now)
    .bind(NotificationType::Email.as_str())
    .bind(NotificationType::Both.as_str())
    .bind(limit)
    .fetch_all(pool)
    .await?)
}

pub async fn record_delivery(pool: &PgPool, id: Uuid, plan: &DeliveryPlan) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE reminders SET
            email_sent = $2, last_notification_sent = $3, remind_at = $4,
            next_notification_date = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(plan.email_sent)
    .bind(plan.last_notification_sent)
    .bind(plan.remind_at)
    .bind(plan.next_notification_date)
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(Debug, FromRow)]
struct EmailContextRow {
    user_name: String,
    user_email: String,
    job_company: Option<String>,
    job_title: Option<String>,
    contact_name: Option<String>,
    contact_company: Option<String>,
}

/// Recipient plus the related job/contact labels, or `None` if the owner is gone.
pub async fn email_context(pool: &PgPool, reminder: &ReminderRow) -> Result<Option<EmailContext>> {
    let row: Option<EmailContextRow> = sqlx::query_as(
        r#"
        SELECT u.name AS user_name, u.email AS user_email,
               j.company AS job_company, j.title AS job_title,
               c.name AS contact_name, c.company AS contact_company
        FROM users u
        LEFT JOIN jobs j ON j.id = $2
        LEFT JOIN contacts c ON c.id = $3
        WHERE u.id = $1
        "#,
    )
    .bind(reminder.user_id)
    .bind(reminder.job_id)
    .bind(reminder.contact_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| EmailContext {
        recipient_name: row.user_name,
        recipient_email: row.user_email,
        related_job: row
            .job_company
            .zip(row.job_title)
            .map(|(company, title)| format!("{company} - {title}")),
        related_contact: row
            .contact_name
            .zip(row.contact_company)
            .map(|(name, company)| format!("{name} ({company})")),
    }))
}
