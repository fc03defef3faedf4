// handlers/public/debug.rs - Diagnostics for Mini App integration
//
// Neither endpoint applies the admin allow-list. The Telegram check reports
// whether the caller's init-data verifies; it never returns panel data.

use std::collections::BTreeMap;

use axum::{http::HeaderMap, response::Json};
use serde_json::{json, Value};

use crate::auth::INIT_DATA_HEADER;
use crate::middleware::{extract_init_data, MaybePrincipal};

const INIT_DATA_PREVIEW_CHARS: usize = 100;

/**
 * GET /debug/telegram - Init-data verification check
 *
 * Output:
 * ```json
 * {
 *   "has_init_data": true,
 *   "init_data_length": 312,
 *   "init_data_preview": "query_id=...",
 *   "verified": true,
 *   "user_id": 42
 * }
 * ```
 */
pub async fn debug_telegram(headers: HeaderMap, MaybePrincipal(principal): MaybePrincipal) -> Json<Value> {
    let header = extract_init_data(&headers);
    let init_data = header.payload();
    let preview = init_data.map(|raw| raw.chars().take(INIT_DATA_PREVIEW_CHARS).collect::<String>());

    Json(json!({
        "has_init_data": header.is_supplied(),
        "init_data_length": init_data.map_or(0, |raw| raw.chars().count()),
        "init_data_preview": preview,
        "verified": principal.is_some(),
        "user_id": principal.and_then(|p| p.id),
    }))
}

/// GET /debug/headers - Echo request headers, surfacing the ones the Mini App depends on
pub async fn debug_headers(headers: HeaderMap) -> Json<Value> {
    let echoed: BTreeMap<String, String> = headers
        .iter()
        .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        .collect();

    Json(json!({
        "all_headers": echoed,
        "telegram_init_data": echoed.get(INIT_DATA_HEADER),
        "origin": echoed.get("origin"),
        "user_agent": echoed.get("user-agent"),
        "referer": echoed.get("referer"),
    }))
}
