use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::db::contains_pattern;
use crate::models::job::{JobRow, JobStatus, JOB_COLUMNS};
use crate::pagination::PageParams;

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, filter: &JobFilter) {
    qb.push(" WHERE user_id = ").push_bind(user_id);

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    for (column, needle) in [
        ("company", &filter.company),
        ("title", &filter.title),
        ("location", &filter.location),
    ] {
        if let Some(needle) = needle {
            qb.push(format!(" AND {column} ILIKE "))
                .push_bind(contains_pattern(needle));
        }
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND date_applied >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND date_applied <= ").push_bind(end);
    }
}

/// One page of the user's jobs, newest application first, plus the total match count.
pub async fn list_jobs(
    pool: &PgPool,
    user_id: Uuid,
    filter: &JobFilter,
    page: PageParams,
) -> Result<(Vec<JobRow>, i64)> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs");
    push_filters(&mut count, user_id, filter);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {JOB_COLUMNS} FROM jobs"));
    push_filters(&mut select, user_id, filter);
    select
        .push(" ORDER BY date_applied DESC, created_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let jobs = select.build_query_as::<JobRow>().fetch_all(pool).await?;

    Ok((jobs, total))
}

/// Every job the user owns. Analytics works over the whole set.
pub async fn all_jobs(pool: &PgPool, user_id: Uuid) -> Result<Vec<JobRow>> {
    Ok(sqlx::query_as::<_, JobRow>(&format!(
        "SELECT {JOB_COLUMNS} FROM jobs WHERE user_id = $1 ORDER BY date_applied DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn find_job(pool: &PgPool, id: Uuid) -> Result<Option<JobRow>> {
    Ok(
        sqlx::query_as::<_, JobRow>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

/// The listed jobs that belong to the user, in the order the ids were given.
pub async fn find_owned_jobs(pool: &PgPool, user_id: Uuid, ids: &[Uuid]) -> Result<Vec<JobRow>> {
    let rows = sqlx::query_as::<_, JobRow>(&format!(
        "SELECT {JOB_COLUMNS} FROM jobs WHERE user_id = $1 AND id = ANY($2)"
    ))
    .bind(user_id)
    .bind(ids)
    .fetch_all(pool)
    .await?;

    let mut ordered = Vec::with_capacity(rows.len());
    for id in ids {
        if ordered.iter().any(|job: &JobRow| job.id == *id) {
            continue;
        }
        if let Some(job) = rows.iter().find(|job| job.id == *id) {
            ordered.push(job.clone());
        }
    }
    Ok(ordered)
}

/// Inserts a new job and links the listed contacts the user owns.
pub async fn insert_job(pool: &PgPool, job: &JobRow, contact_ids: &[Uuid]) -> Result<JobRow> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO jobs
            (id, user_id, company, title, status, date_applied, job_posting_link, salary,
             salary_time_frame, location, remote_status, description, notes, requirements,
             benefits, company_details, interview_process, activities, offer_details, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
        "#,
    )
    .bind(job.id)
    .bind(job.user_id)
    .bind(&job.company)
    .bind(&job.title)
    .bind(&job.status)
    .bind(job.date_applied)
    .bind(&job.job_posting_link)
    .bind(job.salary)
    .bind(&job.salary_time_frame)
    .bind(&job.location)
    .bind(&job.remote_status)
    .bind(&job.description)
    .bind(&job.notes)
    .bind(&job.requirements)
    .bind(&job.benefits)
    .bind(&job.company_details)
    .bind(&job.interview_process)
    .bind(&job.activities)
    .bind(&job.offer_details)
    .bind(job.created_at)
    .execute(&mut *tx)
    .await?;

    let linked = link_owned_contacts(&mut tx, job.id, job.user_id, contact_ids).await?;
    tx.commit().await?;

    info!("Created job {} for user {} ({linked} contacts linked)", job.id, job.user_id);

    find_job(pool, job.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("job {} vanished after insert", job.id))
}

async fn link_owned_contacts(
    conn: &mut PgConnection,
    job_id: Uuid,
    user_id: Uuid,
    contact_ids: &[Uuid],
) -> Result<u64> {
    if contact_ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query(
        r#"
        INSERT INTO job_contacts (job_id, contact_id)
        SELECT $1, id FROM contacts WHERE user_id = $2 AND id = ANY($3)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(job_id)
    .bind(user_id)
    .bind(contact_ids)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Writes every mutable column of the row back, on the pool or inside a transaction.
pub async fn save_job<'e>(executor: impl PgExecutor<'e>, job: &JobRow) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE jobs SET
            company = $2, title = $3, status = $4, date_applied = $5, job_posting_link = $6,
            salary = $7, salary_time_frame = $8, location = $9, remote_status = $10,
            description = $11, notes = $12, requirements = $13, benefits = $14,
            company_details = $15, interview_process = $16, activities = $17,
            offer_details = $18
        WHERE id = $1
        "#,
    )
    .bind(job.id)
    .bind(&job.company)
    .bind(&job.title)
    .bind(&job.status)
    .bind(job.date_applied)
    .bind(&job.job_posting_link)
    .bind(job.salary)
    .bind(&job.salary_time_frame)
    .bind(&job.location)
    .bind(&job.remote_status)
    .bind(&job.description)
    .bind(&job.notes)
    .bind(&job.requirements)
    .bind(&job.benefits)
    .bind(&job.company_details)
    .bind(&job.interview_process)
    .bind(&job.activities)
    .bind(&job.offer_details)
    .execute(executor)
    .await?;
    Ok(())
}

/// Deletes a job together with its contact links, reminders and value record.
pub async fn delete_job(pool: &PgPool, id: Uuid) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM job_contacts WHERE job_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let reminders = sqlx::query("DELETE FROM reminders WHERE job_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM job_values WHERE job_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!("Deleted job {id} and {reminders} reminders");
    Ok(())
}

