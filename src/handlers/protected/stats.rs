// handlers/protected/stats.rs - Dashboard statistics

use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use tracing::warn;

use super::users::{users_array, PANEL_FETCH_LIMIT};
use crate::app::AppState;
use crate::error::ApiError;
use crate::models::{StatsResponse, SystemStats, UsageStats};

/**
 * GET /api/stats - System and usage statistics
 *
 * Usage counters come from the panel's system stats. When that call fails
 * or its payload does not decode, they are recomputed from the user list and
 * `system` is null.
 */
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let system = match state.panel.system_stats().await {
        Ok(payload) => match SystemStats::from_panel(payload) {
            Ok(system) => Some(system),
            Err(e) => {
                warn!("Unrecognized system stats payload, counting users instead: {}", e);
                None
            }
        },
        Err(e) => {
            warn!("System stats unavailable, counting users instead: {}", e);
            None
        }
    };

    let usage = match &system {
        Some(system) => UsageStats::from_system(system),
        None => {
            let result = state
                .panel
                .list_users(0, PANEL_FETCH_LIMIT, None)
                .await
                .map_err(|e| ApiError::upstream("fetch stats", &e))?;
            UsageStats::from_users(&users_array(result))
        }
    };

    Ok(Json(StatsResponse { system, usage }))
}

/// GET /api/stats/nodes
pub async fn get_nodes(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let nodes = state
        .panel
        .nodes()
        .await
        .map_err(|e| ApiError::upstream("fetch nodes", &e))?;

    Ok(Json(json!({ "nodes": nodes })))
}

/// GET /api/stats/squads
pub async fn get_squads(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let squads = state
        .panel
        .internal_squads()
        .await
        .map_err(|e| ApiError::upstream("fetch squads", &e))?;

    Ok(Json(json!({ "squads": squads })))
}
