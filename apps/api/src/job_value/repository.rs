use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::job_value::local_estimate::NATIONAL_AVERAGE_INDEX;
use crate::models::job::JobRow;
use crate::models::job_value::{CustomWeights, JobValueRow};

const JOB_VALUE_COLUMNS: &str = r#"
    id, job_id, user_id, average_industry_salary, cost_of_living_index, cost_of_living_source,
    value_ratio, normalized_salary, location, custom_weights, created_at, updated_at
"#;

pub async fn list_job_values(pool: &PgPool, user_id: Uuid) -> Result<Vec<JobValueRow>> {
    Ok(sqlx::query_as::<_, JobValueRow>(&format!(
        "SELECT {JOB_VALUE_COLUMNS} FROM job_values WHERE user_id = $1 ORDER BY updated_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

async fn find_for_job(pool: &PgPool, job_id: Uuid) -> Result<Option<JobValueRow>> {
    Ok(sqlx::query_as::<_, JobValueRow>(&format!(
        "SELECT {JOB_VALUE_COLUMNS} FROM job_values WHERE job_id = $1"
    ))
    .bind(job_id)
    .fetch_optional(pool)
    .await?)
}

/// The job's value record, created with national-average defaults if missing.
pub async fn get_or_create(pool: &PgPool, job: &JobRow, now: DateTime<Utc>) -> Result<JobValueRow> {
    if let Some(existing) = find_for_job(pool, job.id).await? {
        return Ok(existing);
    }

    sqlx::query(
        r#"
        INSERT INTO job_values
            (id, job_id, user_id, average_industry_salary, cost_of_living_index, location,
             custom_weights, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        ON CONFLICT (job_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job.id)
    .bind(job.user_id)
    .bind(job.salary.unwrap_or(0.0))
    .bind(NATIONAL_AVERAGE_INDEX)
    .bind(&job.location)
    .bind(Json(CustomWeights::default()))
    .bind(now)
    .execute(pool)
    .await?;

    find_for_job(pool, job.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("job value for job {} missing after insert", job.id))
}

pub async fn save_job_value(pool: &PgPool, value: &JobValueRow) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE job_values SET
            average_industry_salary = $2, cost_of_living_index = $3, cost_of_living_source = $4,
            value_ratio = $5, normalized_salary = $6, location = $7, custom_weights = $8,
            updated_at = $9
        WHERE id = $1
        "#,
    )
    .bind(value.id)
    .bind(value.average_industry_salary)
    .bind(value.cost_of_living_index)
    .bind(&value.cost_of_living_source)
    .bind(value.value_ratio)
    .bind(value.normalized_salary)
    .bind(&value.location)
    .bind(&value.custom_weights)
    .bind(value.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}
