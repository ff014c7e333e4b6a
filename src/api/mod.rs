use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod error;
mod flats;
mod live;
mod observability;
mod requests;
mod types;
pub mod ws;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn lifecycle(&self) -> &Arc<dyn crate::services::LifecycleService> {
        &self.shared.lifecycle
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.shared.config.server.cors_allowed_origins.clone();
    let secure_cookies = state.shared.config.server.secure_cookies;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnSessionEnd);

    let api_routes = Router::new()
        .route(
            "/requests",
            post(requests::create_request).get(requests::list_requests),
        )
        .route("/requests/{id}/approve", post(requests::approve_request))
        .route("/requests/{id}/reject", post(requests::reject_request))
        .route("/flats", get(flats::list_flats))
        .route("/flats/{flat_id}/setup-code", post(flats::issue_setup_code))
        .route("/flats/{flat_id}/revoke-ban", post(flats::revoke_ban))
        .route("/flats/{flat_id}/disable", post(flats::set_disabled))
        .route("/live", get(live::get_live_snapshot))
        .route("/metrics", get(observability::get_metrics))
        .route("/metrics/prometheus", get(observability::get_prometheus))
        .route_layer(middleware::from_fn(auth::require_admin));

    let pages = Router::new()
        .route("/", get(auth::dashboard_page))
        .route_layer(middleware::from_fn(auth::require_admin));

    // The WebSocket route sits outside the gatekeeper middleware: the
    // handler performs the session lookup itself during the upgrade
    // handshake so rejected attempts get a plain unauthorized response.
    let admin = Router::new()
        .nest("/api", api_routes)
        .merge(pages)
        .route("/ws", get(ws::admin_ws))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/admin", admin)
        .layer(session_layer)
        .with_state(state.clone())
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(
            state,
            observability::track_requests,
        ))
}
