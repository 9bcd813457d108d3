//! Admin endpoints: instance management and settings

use std::str::FromStr;

use axum::extract::{Path, State};
use serde_json::{Map, Value};
use tracing::info;

use crate::api::middleware::{RequireAdmin, RequireTeam};
use crate::api::state::AppState;
use crate::api::types::{ApiError, InstanceListResponse, Json, MessageResponse};
use crate::domain::{parse_settings_update, Setting, SettingsSnapshot, TeamName};

const ALL_SETTINGS: &str = "all";

fn team_from_path(team: &str) -> Result<TeamName, ApiError> {
    TeamName::new(team).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// GET /admin/all
pub async fn list_instances(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<InstanceListResponse>, ApiError> {
    let instances = state.teams.list_instances().await?;

    Ok(Json(InstanceListResponse {
        instances: instances.into_iter().map(Into::into).collect(),
    }))
}

/// DELETE /admin/teams/{team}/delete
pub async fn delete_instance(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(team): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let team = team_from_path(&team)?;
    state.teams.delete(&team).await?;

    Ok(Json(MessageResponse::new("Deleted instance")))
}

/// POST /admin/teams/{team}/restart
pub async fn restart_instance(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(team): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let team = team_from_path(&team)?;
    state.teams.restart(&team).await?;

    Ok(Json(MessageResponse::new("Restarted instance")))
}

/// GET /admin/settings/{setting}, where `all` returns every setting
pub async fn get_setting(
    State(state): State<AppState>,
    RequireTeam(_team): RequireTeam,
    Path(setting): Path<String>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    if setting == ALL_SETTINGS {
        return Ok(Json(snapshot_map(&state.settings.snapshot())));
    }

    let setting = Setting::from_str(&setting)?;
    let mut body = Map::new();
    body.insert(setting.name().to_string(), Value::Bool(state.settings.get(setting)));

    Ok(Json(body))
}

/// POST /admin/settings
///
/// Every entry is validated before any of them is applied.
pub async fn update_settings(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let updates = parse_settings_update(&body)?;
    state.settings.apply(&updates);

    info!(count = updates.len(), "Settings updated");
    Ok(Json(snapshot_map(&state.settings.snapshot())))
}

fn snapshot_map(snapshot: &SettingsSnapshot) -> Map<String, Value> {
    Setting::ALL
        .iter()
        .map(|setting| (setting.name().to_string(), Value::Bool(snapshot.get(*setting))))
        .collect()
}
