//! Session cookie extractors

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::TeamName;

/// Raw value of the named cookie
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_string())
}

/// Extractor for a request carrying a valid team session
#[derive(Debug, Clone)]
pub struct RequireTeam(pub TeamName);

impl FromRequestParts<AppState> for RequireTeam {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_token(&parts.headers, &state.cookie.name)
            .and_then(|token| state.tokens.verify(&token))
            .and_then(|identity| TeamName::new(identity).ok())
            .map(RequireTeam)
            .ok_or_else(|| ApiError::unauthorized("Invalid session"))
    }
}

/// Extractor for a request carrying the admin session
#[derive(Debug, Clone)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireTeam(team) = RequireTeam::from_request_parts(parts, state).await?;

        if !team.is_admin() {
            debug!(team = %team, "Rejected admin request");
            return Err(ApiError::unauthorized("Admin access required"));
        }

        Ok(RequireAdmin)
    }
}
