// handlers/protected/devices.rs - HWID devices bound to panel users

use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::validate_identifier;
use crate::app::AppState;
use crate::auth::Principal;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct DevicesQuery {
    #[serde(rename = "userUuid")]
    pub user_uuid: Option<String>,
}

/// GET /api/devices?userUuid=
pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<DevicesQuery>,
) -> Result<Json<Value>, ApiError> {
    let user_uuid = query
        .user_uuid
        .as_deref()
        .map(str::trim)
        .filter(|uuid| !uuid.is_empty())
        .ok_or_else(|| ApiError::bad_request("userUuid parameter is required"))?;

    let devices = state
        .panel
        .user_devices(user_uuid)
        .await
        .map_err(|e| ApiError::upstream("fetch devices", &e))?;

    Ok(Json(json!({ "devices": devices })))
}

/// DELETE /api/devices/:device_uuid
pub async fn delete_device(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    Path(device_uuid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let device_uuid = validate_identifier(&device_uuid)?;
    state
        .panel
        .delete_device(device_uuid)
        .await
        .map_err(|e| ApiError::upstream("delete device", &e))?;

    info!("Admin {} deleted device {}", admin.id_label(), device_uuid);
    Ok(Json(json!({ "message": "Device deleted successfully" })))
}
