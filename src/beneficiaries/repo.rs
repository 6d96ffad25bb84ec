use std::collections::HashMap;

use anyhow::Context;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::beneficiaries::dto::{CreateBeneficiaryRequest, Page, UpdateBeneficiaryRequest};
use crate::beneficiaries::filter::{BeneficiaryQuery, Column};
use crate::beneficiaries::repo_types::Beneficiary;
use crate::meals;

const SELECT_BENEFICIARY: &str = r#"
    SELECT id, user_id, names, email, phone_number, id_number, age, sex, state, lga,
           community, religion, disability, physical_fitness, photo, qr_code_url,
           created_at, updated_at
      FROM beneficiaries"#;

const RETURNING_BENEFICIARY: &str = r#"
    RETURNING id, user_id, names, email, phone_number, id_number, age, sex, state, lga,
              community, religion, disability, physical_fitness, photo, qr_code_url,
              created_at, updated_at"#;

// ---- Uniqueness ----

/// Whether another record already holds `value` in `column`.
/// `exclude` skips the record being updated.
pub async fn value_taken(
    db: &PgPool,
    column: Column,
    value: &str,
    exclude: Option<Uuid>,
) -> anyhow::Result<bool> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT EXISTS (SELECT 1 FROM beneficiaries WHERE ");
    qb.push(column.as_sql()).push(" = ").push_bind(value.to_string());
    if let Some(id) = exclude {
        qb.push(" AND id <> ").push_bind(id);
    }
    qb.push(")");
    let taken = qb
        .build_query_scalar::<bool>()
        .fetch_one(db)
        .await
        .with_context(|| format!("check {} uniqueness", column.as_sql()))?;
    Ok(taken)
}

// ---- Allocation (inside the create transaction) ----

/// Serializes allocations for one year prefix until the transaction ends.
pub async fn lock_prefix_tx(tx: &mut Transaction<'_, Postgres>, prefix: &str) -> anyhow::Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(prefix)
        .execute(&mut **tx)
        .await
        .context("lock user id prefix")?;
    Ok(())
}

/// Greatest `user_id` starting with `prefix`, compared as text.
pub async fn last_user_id_tx(
    tx: &mut Transaction<'_, Postgres>,
    prefix: &str,
) -> anyhow::Result<Option<String>> {
    let last = sqlx::query_scalar::<_, String>(
        r#"
        SELECT user_id
          FROM beneficiaries
         WHERE starts_with(user_id, $1)
         ORDER BY user_id COLLATE "C" DESC
         LIMIT 1
        "#,
    )
    .bind(prefix)
    .fetch_optional(&mut **tx)
    .await
    .context("find last user id")?;
    Ok(last)
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    req: &CreateBeneficiaryRequest,
) -> anyhow::Result<Beneficiary> {
    let sql = format!(
        r#"
        INSERT INTO beneficiaries (
            id, user_id, names, email, phone_number, id_number, age, sex, state, lga,
            community, religion, disability, physical_fitness, photo, qr_code_url
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        {RETURNING_BENEFICIARY}
        "#
    );
    let row = sqlx::query_as::<_, Beneficiary>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&req.names)
        .bind(&req.email)
        .bind(&req.phone_number)
        .bind(&req.id_number)
        .bind(req.age)
        .bind(&req.sex)
        .bind(&req.state)
        .bind(&req.lga)
        .bind(&req.community)
        .bind(&req.religion)
        .bind(&req.disability)
        .bind(&req.physical_fitness)
        .bind(&req.photo)
        .bind(&req.qr_code_url)
        .fetch_one(&mut **tx)
        .await
        .with_context(|| format!("insert beneficiary {user_id}"))?;
    Ok(row)
}

/// True when `err` wraps a Postgres unique violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|e| e.is_unique_violation())
}

// ---- Queries ----

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Beneficiary>> {
    let sql = format!("{SELECT_BENEFICIARY} WHERE id = $1");
    let row = sqlx::query_as::<_, Beneficiary>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find beneficiary by id")?;
    with_meal_records(db, row.into_iter().collect())
        .await
        .map(|mut v| v.pop())
}

/// Exact match on email, phone number or user id; email wins over phone,
/// phone over user id.
pub async fn find_by_contact(db: &PgPool, term: &str) -> anyhow::Result<Option<Beneficiary>> {
    let sql = format!(
        r#"{SELECT_BENEFICIARY}
         WHERE email = $1 OR phone_number = $1 OR user_id = $1
         ORDER BY (email = $1) IS TRUE DESC, (phone_number = $1) IS TRUE DESC, created_at ASC
         LIMIT 1"#
    );
    let row = sqlx::query_as::<_, Beneficiary>(&sql)
        .bind(term)
        .fetch_optional(db)
        .await
        .context("find beneficiary by contact")?;
    with_meal_records(db, row.into_iter().collect())
        .await
        .map(|mut v| v.pop())
}

pub async fn count(db: &PgPool, query: &BeneficiaryQuery) -> anyhow::Result<i64> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM beneficiaries");
    query.push_where(&mut qb);
    let total = qb
        .build_query_scalar::<i64>()
        .fetch_one(db)
        .await
        .context("count beneficiaries")?;
    Ok(total)
}

/// One page of `query`, meal history attached.
pub async fn list_page(
    db: &PgPool,
    query: &BeneficiaryQuery,
    page: Page,
) -> anyhow::Result<Vec<Beneficiary>> {
    let mut qb = QueryBuilder::<Postgres>::new(SELECT_BENEFICIARY);
    query.push_where(&mut qb);
    query.push_order_by(&mut qb);
    qb.push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb
        .build_query_as::<Beneficiary>()
        .fetch_all(db)
        .await
        .context("list beneficiaries")?;
    with_meal_records(db, rows).await
}

async fn with_meal_records(db: &PgPool, mut rows: Vec<Beneficiary>) -> anyhow::Result<Vec<Beneficiary>> {
    if rows.is_empty() {
        return Ok(rows);
    }
    let ids: Vec<Uuid> = rows.iter().map(|b| b.id).collect();
    let mut by_owner: HashMap<Uuid, Vec<_>> = HashMap::new();
    for record in meals::repo::list_for_beneficiaries(db, &ids).await? {
        by_owner.entry(record.beneficiary_id).or_default().push(record);
    }
    for row in &mut rows {
        row.meal_records = by_owner.remove(&row.id).unwrap_or_default();
    }
    Ok(rows)
}

// ---- Mutations ----

pub async fn update(
    db: &PgPool,
    id: Uuid,
    req: &UpdateBeneficiaryRequest,
) -> anyhow::Result<Option<Beneficiary>> {
    let sql = format!(
        r#"
        UPDATE beneficiaries SET
            names            = COALESCE($2, names),
            email            = COALESCE($3, email),
            phone_number     = COALESCE($4, phone_number),
            id_number        = COALESCE($5, id_number),
            age              = COALESCE($6, age),
            sex              = COALESCE($7, sex),
            state            = COALESCE($8, state),
            lga              = COALESCE($9, lga),
            community        = COALESCE($10, community),
            religion         = COALESCE($11, religion),
            disability       = COALESCE($12, disability),
            physical_fitness = COALESCE($13, physical_fitness),
            photo            = COALESCE($14, photo),
            qr_code_url      = COALESCE($15, qr_code_url),
            updated_at       = now()
        WHERE id = $1
        {RETURNING_BENEFICIARY}
        "#
    );
    let row = sqlx::query_as::<_, Beneficiary>(&sql)
        .bind(id)
        .bind(&req.names)
        .bind(&req.email)
        .bind(&req.phone_number)
        .bind(&req.id_number)
        .bind(req.age)
        .bind(&req.sex)
        .bind(&req.state)
        .bind(&req.lga)
        .bind(&req.community)
        .bind(&req.religion)
        .bind(&req.disability)
        .bind(&req.physical_fitness)
        .bind(&req.photo)
        .bind(&req.qr_code_url)
        .fetch_optional(db)
        .await
        .context("update beneficiary")?;
    with_meal_records(db, row.into_iter().collect())
        .await
        .map(|mut v| v.pop())
}

/// Hard delete; meal records go with it. Returns whether a row existed.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM beneficiaries WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete beneficiary")?;
    Ok(res.rows_affected() > 0)
}
