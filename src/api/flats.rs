use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use super::types::{FlatDto, RowsDto, SetupCodeDto};

#[derive(Deserialize)]
pub struct ListFlatsQuery {
    pub q: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Deserialize, Default)]
pub struct SetupCodeBody {
    pub ttl_minutes: Option<u32>,
}

#[derive(Deserialize, Default)]
pub struct DisableBody {
    pub disabled: Option<bool>,
}

/// GET /admin/api/flats
pub async fn list_flats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListFlatsQuery>,
) -> Result<Json<ApiResponse<RowsDto<FlatDto>>>, ApiError> {
    let rows = state
        .lifecycle()
        .list_flats(query.q.as_deref(), query.limit)
        .await?;

    Ok(Json(ApiResponse::ok(RowsDto {
        rows: rows.into_iter().map(FlatDto::from).collect(),
    })))
}

/// POST /admin/api/flats/{flat_id}/setup-code
///
/// The plaintext code appears in this response exactly once; only its hash
/// is persisted.
pub async fn issue_setup_code(
    State(state): State<Arc<AppState>>,
    Path(flat_id): Path<String>,
    payload: Option<Json<SetupCodeBody>>,
) -> Result<Json<ApiResponse<SetupCodeDto>>, ApiError> {
    let ttl_minutes = payload.and_then(|Json(body)| body.ttl_minutes);

    let issued = state
        .lifecycle()
        .generate_setup_code(&flat_id, ttl_minutes)
        .await?;

    Ok(Json(ApiResponse::ok(SetupCodeDto {
        flat_id: issued.flat_id,
        code: issued.code,
        expires_at: issued.expires_at,
    })))
}

/// POST /admin/api/flats/{flat_id}/revoke-ban
pub async fn revoke_ban(
    State(state): State<Arc<AppState>>,
    Path(flat_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.lifecycle().revoke_ban(&flat_id).await?;

    Ok(Json(ApiResponse::empty()))
}

/// POST /admin/api/flats/{flat_id}/disable
///
/// `disabled` defaults to true; pass `false` to re-enable.
pub async fn set_disabled(
    State(state): State<Arc<AppState>>,
    Path(flat_id): Path<String>,
    payload: Option<Json<DisableBody>>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let disabled = payload
        .and_then(|Json(body)| body.disabled)
        .unwrap_or(true);

    state.lifecycle().set_disabled(&flat_id, disabled).await?;

    Ok(Json(ApiResponse::empty()))
}
