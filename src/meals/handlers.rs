use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::AppPath;
use crate::meals::dto::{DailyMealTotals, MealRecordedResponse};
use crate::meals::services;
use crate::state::AppState;

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(get_daily_totals))
        .route("/:id/meals", post(record_meal))
        .route("/:id/health", post(not_implemented))
        .route("/:id/attendance", post(not_implemented))
}

#[instrument(skip(state))]
pub async fn record_meal(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<MealRecordedResponse>> {
    Ok(Json(services::record_meal(&state, id).await?))
}

#[instrument(skip(state))]
pub async fn get_daily_totals(State(state): State<AppState>) -> AppResult<Json<DailyMealTotals>> {
    Ok(Json(services::daily_totals(&state).await?))
}

/// Health appointments and attendance are declared but served elsewhere.
async fn not_implemented(AppPath(_id): AppPath<Uuid>) -> impl IntoResponse {
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(json!({ "status": "fail", "message": "Not implemented" })),
    )
}
