use anyhow::Context;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::beneficiaries::filter::BeneficiaryQuery;
use crate::export::sheet::ExportRow;

/// Every row matching `query`, unpaginated, projected onto the sheet columns.
pub async fn export_rows(db: &PgPool, query: &BeneficiaryQuery) -> anyhow::Result<Vec<ExportRow>> {
    let mut qb = QueryBuilder::<Postgres>::new(
        r#"
        SELECT user_id, names, email, phone_number, age, sex, state, lga,
               community, religion, disability, physical_fitness, photo
          FROM beneficiaries"#,
    );
    query.push_where(&mut qb);
    query.push_order_by(&mut qb);
    let rows = qb
        .build_query_as::<ExportRow>()
        .fetch_all(db)
        .await
        .context("export beneficiaries")?;
    Ok(rows)
}
