//! Catch-all handler routing session holders to their team instance

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::api::middleware::session_token;
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::infrastructure::proxy::{ForwardError, RouteDecision};

/// Entry page for users without a usable session
pub const ENTRY_PATH: &str = "/balancer";

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)], Body::empty()).into_response()
}

pub async fn proxy(State(state): State<AppState>, request: Request) -> Response {
    let token = session_token(request.headers(), &state.cookie.name);

    match state.proxy_router.route(token.as_deref()).await {
        RouteDecision::RedirectToEntry => redirect(ENTRY_PATH),
        RouteDecision::Redirect { reason, team } => {
            redirect(&format!("{}/?msg={}&team={}", ENTRY_PATH, reason, team))
        }
        RouteDecision::Failed { .. } => {
            ApiError::internal("Failed to check instance status").into_response()
        }
        RouteDecision::Forward { team } => {
            let backend = state.backend_urls.resolve(&team);

            match state.forwarder.forward(&backend, request).await {
                Ok(response) => response,
                Err(ForwardError::Body(message)) => ApiError::bad_request(message).into_response(),
                Err(e) => {
                    error!(team = %team, error = %e, "Failed to reach team instance");
                    ApiError::bad_gateway("Failed to reach team instance").into_response()
                }
            }
        }
    }
}
