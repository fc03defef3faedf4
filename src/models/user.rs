use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;

/// Panel user as exposed to the Mini App. Wire names follow the panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserResponse {
    pub uuid: String,
    pub username: String,
    pub short_uuid: String,
    pub status: String,
    pub expire_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub used_traffic_bytes: i64,
    pub lifetime_used_traffic_bytes: i64,
    pub traffic_limit_bytes: i64,
    pub traffic_limit_strategy: Option<String>,
    pub sub_last_user_agent: Option<String>,
    pub sub_last_opened_at: Option<String>,
    pub online_at: Option<String>,
    pub sub_revoked_at: Option<String>,
    pub last_traffic_reset_at: Option<String>,
    pub trojan_password: Option<String>,
    pub vless_uuid: Option<String>,
    pub ss_password: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub telegram_id: Option<Value>,
    pub email: Option<String>,
    pub hwid_device_limit: Option<i64>,
    pub first_connected_at: Option<String>,
    pub last_triggered_threshold: Option<i64>,
    pub subscription_url: Option<String>,
    pub active_internal_squads: Vec<ActiveInternalSquad>,
    pub last_connected_node: Option<LastConnectedNode>,
    pub happ: Option<HappData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveInternalSquad {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LastConnectedNode {
    pub node_name: Option<String>,
    pub country_code: Option<String>,
    pub connected_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HappData {
    pub crypto_link: Option<String>,
}

/// Traffic fields newer panels nest under `userTraffic`.
const LIFTED_TRAFFIC_FIELDS: &[&str] = &[
    "usedTrafficBytes",
    "lifetimeUsedTrafficBytes",
    "onlineAt",
    "firstConnectedAt",
    "lastConnectedNode",
];

impl UserResponse {
    /// Decode a panel user object, lifting nested traffic fields when the
    /// top-level ones are missing.
    pub fn from_panel(value: Value) -> Result<Self, ApiError> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                tracing::error!("Unexpected user payload from panel: {}", other);
                return Err(ApiError::internal_server_error("Panel returned an unexpected user payload"));
            }
        };

        if let Some(Value::Object(traffic)) = object.remove("userTraffic") {
            lift_missing(&mut object, traffic);
        }

        normalize_numbers(&mut object);

        serde_json::from_value(Value::Object(object)).map_err(|e| {
            tracing::error!("Failed to decode panel user: {}", e);
            ApiError::internal_server_error(format!("Failed to decode panel user: {}", e))
        })
    }
}

fn lift_missing(object: &mut Map<String, Value>, traffic: Map<String, Value>) {
    for (key, value) in traffic {
        if LIFTED_TRAFFIC_FIELDS.contains(&key.as_str()) && object.get(&key).map_or(true, Value::is_null) {
            object.insert(key, value);
        }
    }
}

/// Byte counters arrive as numbers or numeric strings; nulls become 0.
fn normalize_numbers(object: &mut Map<String, Value>) {
    for key in ["usedTrafficBytes", "lifetimeUsedTrafficBytes", "trafficLimitBytes"] {
        if let Some(value) = object.get_mut(key) {
            *value = Value::from(as_i64_lenient(value).unwrap_or(0));
        }
    }
}

/// Integer from a JSON number (truncated) or numeric string.
pub fn as_i64_lenient(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsersListResponse {
    pub users: Vec<UserResponse>,
    pub total: usize,
}

/// Request body for `POST /api/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl UserCreate {
    pub fn into_object(self) -> Map<String, Value> {
        let mut object = self.fields;
        object.insert("username".to_string(), Value::String(self.username));
        object
    }
}

/// Squad references must be UUID strings.
pub fn validate_squads(object: &Map<String, Value>) -> Result<(), ApiError> {
    let squads = match object.get("activeInternalSquads") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ApiError::invalid_field("activeInternalSquads", "must be an array of UUID strings")),
    };

    for squad in squads {
        let valid = squad.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok());
        if !valid {
            return Err(ApiError::invalid_field(
                "activeInternalSquads",
                format!("not a UUID: {}", squad),
            ));
        }
    }
    Ok(())
}
