use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::middleware::logging_middleware;
use super::proxy::ENTRY_PATH;
use super::state::AppState;
use super::{admin, entry, health, proxy, teams};

/// Prefix of every endpoint served by the balancer itself
pub const API_PREFIX: &str = "/balancer/api";

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/readiness", get(health::ready_check))
        .route("/teams/{team}/join", post(teams::join))
        .route("/teams/logout", post(teams::logout))
        .route("/teams/reset-passcode", post(teams::reset_passcode))
        .route("/admin/all", get(admin::list_instances))
        .route("/admin/teams/{team}/delete", delete(admin::delete_instance))
        .route("/admin/teams/{team}/restart", post(admin::restart_instance))
        .route("/admin/settings", post(admin::update_settings))
        .route("/admin/settings/{setting}", get(admin::get_setting))
}

/// Balancer API, the entry page, and the proxy for every other path
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest(API_PREFIX, api_routes())
        .route(ENTRY_PATH, get(entry::entry_page))
        .route(&format!("{}/", ENTRY_PATH), get(entry::entry_page))
        .route(&format!("{}/{{*path}}", ENTRY_PATH), get(entry::entry_page))
        .fallback(proxy::proxy)
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
