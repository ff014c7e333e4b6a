use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::{Expiry, Session};

use super::{ApiError, ApiResponse, AppState};

/// Session key marking an authenticated admin.
const SESSION_ADMIN_KEY: &str = "admin";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

/// Returns whether the session carries the admin marker.
pub async fn session_is_admin(session: &Session) -> Result<bool, ApiError> {
    let is_admin = session
        .get::<bool>(SESSION_ADMIN_KEY)
        .await
        .map_err(|e| ApiError::Internal(format!("Session error: {e}")))?
        .unwrap_or(false);
    Ok(is_admin)
}

/// Gatekeeper middleware for the admin surface. API calls get a structured
/// 401 envelope; page paths bounce to the login view.
pub async fn require_admin(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if session_is_admin(&session).await? {
        return Ok(next.run(request).await);
    }

    if request.uri().path().starts_with("/admin/api") {
        return Err(ApiError::Unauthorized);
    }

    Ok(Redirect::to("/admin/login").into_response())
}

/// POST /admin/login
///
/// Exact match against the single configured admin secret. With `remember`,
/// the session record (and cookie) lives for the configured long duration;
/// without it the cookie is a non-persistent session cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if payload.password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }

    if payload.password != state.shared.config.admin.password {
        return Err(ApiError::Unauthorized);
    }

    session
        .insert(SESSION_ADMIN_KEY, true)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to create session: {e}")))?;

    if payload.remember {
        let until = time::OffsetDateTime::now_utc()
            + time::Duration::days(state.shared.config.admin.remember_days);
        session.set_expiry(Some(Expiry::AtDateTime(until)));
    }

    tracing::info!("Admin session established (remember: {})", payload.remember);

    Ok(Json(ApiResponse::empty()))
}

/// POST /admin/logout
///
/// Destroys the session record, collapsing back to anonymous.
pub async fn logout(session: Session) -> Result<Json<ApiResponse<()>>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to destroy session: {e}")))?;

    Ok(Json(ApiResponse::empty()))
}

/// GET /admin/login
///
/// Minimal login view; the dashboard UI proper ships separately.
pub async fn login_page() -> Html<&'static str> {
    Html(
        "<!doctype html><title>Audix Admin</title>\
         <form method=\"post\" action=\"/admin/login\">\
         <input type=\"password\" name=\"password\" placeholder=\"Admin password\">\
         <button>Sign in</button></form>",
    )
}

/// GET /admin
pub async fn dashboard_page() -> Html<&'static str> {
    Html("<!doctype html><title>Audix Admin</title><p>Audix admin console</p>")
}
