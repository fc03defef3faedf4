// handlers/public/system.rs - Service info and liveness endpoints

use axum::response::Json;
use serde_json::{json, Value};

/// GET / - Service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Remna Mini App API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/**
 * GET /api - Endpoint map for the Mini App frontend
 *
 * Lists the protected route groups. Every route below requires a verified
 * `X-Telegram-Init-Data` header from an allow-listed administrator.
 */
pub async fn api_root() -> Json<Value> {
    Json(json!({
        "name": "Remna Mini App API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "users": "/api/users[/:identifier[/reset|/revoke]] (admin)",
            "stats": "/api/stats, /api/stats/nodes, /api/stats/squads (admin)",
            "devices": "/api/devices?userUuid=, /api/devices/:device_uuid (admin)",
            "health": "/health (public)",
        }
    }))
}

/// GET /health - Liveness only; the panel is not contacted.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
