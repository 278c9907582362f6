use anyhow::Result;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::db::contains_pattern;
use crate::models::contact::{ContactRole, ContactRow, CONTACT_COLUMNS};
use crate::pagination::PageParams;

#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    pub role: Option<ContactRole>,
    pub company: Option<String>,
    pub name: Option<String>,
    pub search: Option<String>,
    pub job: Option<Uuid>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, filter: &ContactFilter) {
    qb.push(" WHERE user_id = ").push_bind(user_id);

    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(company) = &filter.company {
        qb.push(" AND company ILIKE ").push_bind(contains_pattern(company));
    }
    if let Some(name) = &filter.name {
        qb.push(" AND name ILIKE ").push_bind(contains_pattern(name));
    }
    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR company ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR role ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(notes, '') ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(email, '') ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(job) = filter.job {
        qb.push(" AND EXISTS (SELECT 1 FROM job_contacts jc WHERE jc.contact_id = contacts.id AND jc.job_id = ")
            .push_bind(job)
            .push(")");
    }
}

pub async fn list_contacts(
    pool: &PgPool,
    user_id: Uuid,
    filter: &ContactFilter,
    page: PageParams,
) -> Result<(Vec<ContactRow>, i64)> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM contacts");
    push_filters(&mut count, user_id, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut select =
        QueryBuilder::<Postgres>::new(format!("SELECT {CONTACT_COLUMNS} FROM contacts"));
    push_filters(&mut select, user_id, filter);
    select
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let contacts = select.build_query_as::<ContactRow>().fetch_all(pool).await?;

    Ok((contacts, total))
}

pub async fn find_contact(pool: &PgPool, id: Uuid) -> Result<Option<ContactRow>> {
    Ok(sqlx::query_as::<_, ContactRow>(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

pub async fn insert_contact(pool: &PgPool, contact: &ContactRow, job_ids: &[Uuid]) -> Result<ContactRow> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO contacts
            (id, user_id, name, email, phone, company, role, notes, linkedin_profile,
             last_contacted, interactions, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(contact.id)
    .bind(contact.user_id)
    .bind(&contact.name)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.company)
    .bind(&contact.role)
    .bind(&contact.notes)
    .bind(&contact.linkedin_profile)
    .bind(contact.last_contacted)
    .bind(&contact.interactions)
    .bind(contact.created_at)
    .execute(&mut *tx)
    .await?;

    if !job_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO job_contacts (job_id, contact_id)
            SELECT id, $1 FROM jobs WHERE user_id = $2 AND id = ANY($3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(contact.id)
        .bind(contact.user_id)
        .bind(job_ids)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!("Created contact {} for user {}", contact.id, contact.user_id);

    find_contact(pool, contact.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("contact {} vanished after insert", contact.id))
}

pub async fn save_contact(pool: &PgPool, contact: &ContactRow) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE contacts SET
            name = $2, email = $3, phone = $4, company = $5, role = $6, notes = $7,
            linkedin_profile = $8, last_contacted = $9, interactions = $10
        WHERE id = $1
        "#,
    )
    .bind(contact.id)
    .bind(&contact.name)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.company)
    .bind(&contact.role)
    .bind(&contact.notes)
    .bind(&contact.linkedin_profile)
    .bind(contact.last_contacted)
    .bind(&contact.interactions)
    .execute(pool)
    .await?;
    Ok(())
}

/// Removes the contact, its job links, and detaches it from reminders.
pub async fn delete_contact(pool: &PgPool, id: Uuid) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM job_contacts WHERE contact_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE reminders SET contact_id = NULL WHERE contact_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM contacts WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    info!("Deleted contact {id}");
    Ok(())
}

/// Links a contact and a job. Returns false when they were already linked.
pub async fn link_job(pool: &PgPool, contact_id: Uuid, job_id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO job_contacts (job_id, contact_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(job_id)
    .bind(contact_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}
