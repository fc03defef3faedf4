use serde::Serialize;
use serde_json::{Map, Value};

/// Identity decoded from verified init-data. Lives for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Principal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_dev: bool,
    /// Remaining members of the Telegram `user` object.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sentinel id used by the development bypass.
pub const DEV_PRINCIPAL_ID: i64 = 123_456_789;

impl Principal {
    /// Synthetic principal handed out when running in development without init-data.
    pub fn development() -> Self {
        Self {
            id: Some(DEV_PRINCIPAL_ID),
            first_name: Some("Dev User".to_string()),
            is_dev: true,
            ..Self::default()
        }
    }

    /// Split a decoded Telegram `user` object into known fields and extras.
    pub fn from_user_object(mut object: Map<String, Value>) -> Self {
        let mut take_str = |key: &str| match object.remove(key) {
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                object.insert(key.to_string(), other);
                None
            }
            None => None,
        };

        let first_name = take_str("first_name");
        let last_name = take_str("last_name");
        let username = take_str("username");
        let language_code = take_str("language_code");

        // Only the development bypass may mark a principal as dev.
        object.remove("is_dev");

        let id = match object.get("id").and_then(Value::as_i64) {
            Some(id) => {
                object.remove("id");
                Some(id)
            }
            None => None,
        };

        Self {
            id,
            first_name,
            last_name,
            username,
            language_code,
            is_dev: false,
            extra: object,
        }
    }

    /// Label for log lines: the numeric id, or `unknown`.
    pub fn id_label(&self) -> String {
        self.id.map_or_else(|| "unknown".to_string(), |id| id.to_string())
    }
}
