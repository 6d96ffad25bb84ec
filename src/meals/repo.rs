use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use time::Date;
use uuid::Uuid;

use crate::meals::repo_types::{MealRecord, MealTotalsRow};

pub async fn list_for_beneficiaries(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<MealRecord>> {
    let rows = sqlx::query_as::<_, MealRecord>(
        r#"
        SELECT beneficiary_id, served_on, breakfast, lunch, dinner
          FROM meal_records
         WHERE beneficiary_id = ANY($1)
         ORDER BY served_on ASC
        "#,
    )
    .bind(ids)
    .fetch_all(db)
    .await
    .context("list meal records")?;
    Ok(rows)
}

pub async fn beneficiary_exists_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM beneficiaries WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .context("check beneficiary exists")?;
    Ok(exists)
}

/// Returns the day's record, creating an empty one first, locked for the
/// rest of the transaction.
pub async fn lock_day_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    day: Date,
) -> anyhow::Result<MealRecord> {
    sqlx::query(
        r#"
        INSERT INTO meal_records (beneficiary_id, served_on)
        VALUES ($1, $2)
        ON CONFLICT (beneficiary_id, served_on) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(day)
    .execute(&mut **tx)
    .await
    .context("ensure meal record")?;

    let record = sqlx::query_as::<_, MealRecord>(
        r#"
        SELECT beneficiary_id, served_on, breakfast, lunch, dinner
          FROM meal_records
         WHERE beneficiary_id = $1 AND served_on = $2
           FOR UPDATE
        "#,
    )
    .bind(id)
    .bind(day)
    .fetch_one(&mut **tx)
    .await
    .context("lock meal record")?;
    Ok(record)
}

pub async fn save_day_tx(tx: &mut Transaction<'_, Postgres>, record: &MealRecord) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE meal_records
           SET breakfast = $3, lunch = $4, dinner = $5
         WHERE beneficiary_id = $1 AND served_on = $2
        "#,
    )
    .bind(record.beneficiary_id)
    .bind(record.served_on)
    .bind(record.breakfast)
    .bind(record.lunch)
    .bind(record.dinner)
    .execute(&mut **tx)
    .await
    .context("save meal record")?;
    Ok(())
}

/// Counts for one day. Always one row; zeros when nothing was served.
pub async fn totals_for_day(db: &PgPool, day: Date) -> anyhow::Result<MealTotalsRow> {
    let row = sqlx::query_as::<_, MealTotalsRow>(
        r#"
        SELECT COUNT(*) FILTER (WHERE breakfast) AS breakfast,
               COUNT(*) FILTER (WHERE lunch)     AS lunch,
               COUNT(*) FILTER (WHERE dinner)    AS dinner,
               COUNT(DISTINCT beneficiary_id)    AS total_unique_users
          FROM meal_records
         WHERE served_on = $1
        "#,
    )
    .bind(day)
    .fetch_one(db)
    .await
    .context("daily meal totals")?;
    Ok(row)
}
