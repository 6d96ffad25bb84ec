use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::beneficiaries::dto::{
    CreateBeneficiaryRequest, CreatedResponse, ListParams, ListResponse, RegisteredListResponse,
    SearchParams, UpdateBeneficiaryRequest, UpdatedResponse,
};
use crate::beneficiaries::repo_types::Beneficiary;
use crate::beneficiaries::services;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_beneficiaries))
        .route("/search", get(search_beneficiary))
        .route("/numbers", get(list_registered))
        .route("/:id", get(get_beneficiary))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_beneficiary).put(update_beneficiary_from_body))
        .route("/:id", put(update_beneficiary).delete(delete_beneficiary))
}

#[instrument(skip(state, payload))]
pub async fn create_beneficiary(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBeneficiaryRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<CreatedResponse>)> {
    let user = services::create(&state, payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/users/{}", user.id).parse() {
        headers.insert(header::LOCATION, location);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(CreatedResponse {
            status: "success",
            user,
            message: "User created successfully",
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_beneficiary(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateBeneficiaryRequest>,
) -> AppResult<Json<UpdatedResponse>> {
    let data = services::update(&state, id, payload).await?;
    Ok(Json(UpdatedResponse {
        status: "success",
        message: "User updated successfully",
        data,
    }))
}

/// `PUT /` variant: the id travels in the body as `_id` or `id`.
#[instrument(skip(state, payload))]
pub async fn update_beneficiary_from_body(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateBeneficiaryRequest>,
) -> AppResult<Json<UpdatedResponse>> {
    let id = payload
        .id
        .ok_or_else(|| AppError::Validation("User id is required".into()))?;
    let data = services::update(&state, id, payload).await?;
    Ok(Json(UpdatedResponse {
        status: "success",
        message: "User updated successfully",
        data,
    }))
}

#[instrument(skip(state))]
pub async fn list_beneficiaries(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> AppResult<Json<ListResponse>> {
    Ok(Json(services::list_directory(&state, &params).await?))
}

#[instrument(skip(state))]
pub async fn list_registered(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> AppResult<Json<RegisteredListResponse>> {
    Ok(Json(services::list_registered(&state, &params).await?))
}

#[instrument(skip(state))]
pub async fn search_beneficiary(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SearchParams>,
) -> AppResult<Json<Beneficiary>> {
    Ok(Json(
        services::search(&state, params.search_term.as_deref()).await?,
    ))
}

#[instrument(skip(state))]
pub async fn get_beneficiary(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Beneficiary>> {
    Ok(Json(services::get(&state, id).await?))
}

#[instrument(skip(state))]
pub async fn delete_beneficiary(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    services::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
