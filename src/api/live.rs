use axum::{Json, extract::State};
use std::sync::Arc;

use super::types::LiveSnapshotDto;
use super::{ApiError, ApiResponse, AppState};

/// GET /admin/api/live
///
/// On-demand relay of the live routing service's activity snapshot. The
/// payload is returned verbatim; its structure is opaque to this service.
pub async fn get_live_snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<LiveSnapshotDto>>, ApiError> {
    let snap = state.shared.live.fetch_snapshot().await?;

    Ok(Json(ApiResponse::ok(LiveSnapshotDto { snap })))
}
