//! Team-facing endpoints: join, logout and passcode reset

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::api::middleware::RequireTeam;
use crate::api::state::AppState;
use crate::api::types::{ApiError, JoinRequest, Json, MessageResponse};
use crate::infrastructure::team::JoinOutcome;

/// POST /teams/{team}/join
///
/// The body is optional; one that is missing or malformed counts as no passcode.
pub async fn join(
    State(state): State<AppState>,
    Path(team): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let passcode = serde_json::from_slice::<JoinRequest>(&body)
        .ok()
        .and_then(|request| request.passcode);

    let outcome = state.teams.join(&team, passcode.as_deref()).await?;
    let cookie = state.cookie.issue(outcome.token());

    let response = match outcome {
        JoinOutcome::Created { passcode, .. } => {
            MessageResponse::new("Created instance").with_passcode(passcode)
        }
        JoinOutcome::Joined { .. } => MessageResponse::new("Joined team"),
        JoinOutcome::Admin { .. } => MessageResponse::new("Signed in as admin"),
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(response)).into_response())
}

/// POST /teams/logout
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, state.cookie.clear())],
        Json(MessageResponse::new("Signed out")),
    )
        .into_response()
}

/// POST /teams/reset-passcode
pub async fn reset_passcode(
    State(state): State<AppState>,
    RequireTeam(team): RequireTeam,
) -> Result<Json<MessageResponse>, ApiError> {
    let passcode = state.teams.reset_passcode(&team).await?;

    Ok(Json(
        MessageResponse::new("Reset passcode").with_passcode(passcode),
    ))
}
