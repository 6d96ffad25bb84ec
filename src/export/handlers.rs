use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::{info, instrument};

use crate::beneficiaries::dto::ListParams;
use crate::beneficiaries::filter::BeneficiaryQuery;
use crate::error::{AppError, AppResult};
use crate::export::{repo, sheet};
use crate::extract::AppQuery;
use crate::state::AppState;

pub fn export_routes() -> Router<AppState> {
    Router::new().route("/download", get(download_workbook))
}

#[instrument(skip(state))]
pub async fn download_workbook(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> AppResult<impl IntoResponse> {
    let query = BeneficiaryQuery::export(&params)?;
    let rows = repo::export_rows(&state.db, &query).await?;

    // The writer is synchronous and CPU bound.
    let count = rows.len();
    let bytes = tokio::task::spawn_blocking(move || sheet::write_workbook(&rows))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("export task failed: {e}")))??;

    info!(rows = count, size = bytes.len(), "workbook exported");
    Ok((
        [
            (header::CONTENT_TYPE, sheet::CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", sheet::FILE_NAME),
            ),
        ],
        bytes,
    ))
}
