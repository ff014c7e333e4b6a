use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use super::types::{ApprovedDto, CreatedDto, FlatRequestDto, RowsDto};

#[derive(Deserialize)]
pub struct CreateRequestBody {
    pub flat_id: String,
    pub name: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<String>,
    pub limit: Option<u64>,
}

/// POST /admin/api/requests
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRequestBody>,
) -> Result<Json<ApiResponse<CreatedDto>>, ApiError> {
    let id = state
        .lifecycle()
        .create_request(&payload.flat_id, &payload.name, &payload.note)
        .await?;

    Ok(Json(ApiResponse::ok(CreatedDto { id })))
}

/// GET /admin/api/requests
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<ApiResponse<RowsDto<FlatRequestDto>>>, ApiError> {
    let rows = state
        .lifecycle()
        .list_requests(query.status.as_deref(), query.limit)
        .await?;

    Ok(Json(ApiResponse::ok(RowsDto {
        rows: rows.into_iter().map(FlatRequestDto::from).collect(),
    })))
}

/// POST /admin/api/requests/{id}/approve
pub async fn approve_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ApprovedDto>>, ApiError> {
    let flat_id = state.lifecycle().approve_request(id).await?;

    Ok(Json(ApiResponse::ok(ApprovedDto { flat_id })))
}

/// POST /admin/api/requests/{id}/reject
pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.lifecycle().reject_request(id).await?;

    Ok(Json(ApiResponse::empty()))
}
