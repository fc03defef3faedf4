//! Telegram WebApp init-data verification.
//!
//! The payload is a query string. Every field except `hash` is sorted by key
//! and joined as `key=value` lines; that string is signed with
//! `HMAC_SHA256(key = HMAC_SHA256(key = "WebAppData", msg = bot_token))`.

use std::collections::BTreeMap;
use std::time::Duration;

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::principal::Principal;

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA: &[u8] = b"WebAppData";
const HASH_FIELD: &str = "hash";
const USER_FIELD: &str = "user";
const AUTH_DATE_FIELD: &str = "auth_date";

/// Why a payload was rejected. Callers outside the verifier collapse all of
/// these into a single "invalid authentication data" outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InitDataError {
    #[error("malformed init data: {0}")]
    MalformedPayload(&'static str),

    #[error("init data signature mismatch")]
    InvalidSignature,

    #[error("user field is not a JSON object")]
    InvalidUserField,

    #[error("init data is older than the allowed maximum age")]
    Expired,
}

/// Verifies signed init-data against a bot token. The secret key is derived
/// once at construction, so a verifier is cheap to share between requests.
#[derive(Clone)]
pub struct InitDataVerifier {
    secret_key: [u8; 32],
    max_age: Option<Duration>,
}

impl std::fmt::Debug for InitDataVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitDataVerifier")
            .field("secret_key", &"[REDACTED]")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl InitDataVerifier {
    pub fn new(bot_token: &str) -> Self {
        Self {
            secret_key: derive_secret_key(bot_token),
            max_age: None,
        }
    }

    /// Reject payloads whose `auth_date` is older than `max_age`.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn verify(&self, init_data: &str) -> Result<Principal, InitDataError> {
        self.verify_at(init_data, chrono::Utc::now().timestamp())
    }

    /// Verify with an explicit "now" (unix seconds) for the freshness check.
    pub fn verify_at(&self, init_data: &str, now: i64) -> Result<Principal, InitDataError> {
        let mut fields = parse_fields(init_data);
        if fields.is_empty() {
            return Err(InitDataError::MalformedPayload("no fields"));
        }

        let received_hash = match fields.remove(HASH_FIELD) {
            Some(hash) if !hash.is_empty() => hash,
            _ => return Err(InitDataError::MalformedPayload("missing hash")),
        };

        let calculated = sign_check_string(&self.secret_key, &check_string(&fields));
        if !bool::from(calculated.as_bytes().ct_eq(received_hash.as_bytes())) {
            return Err(InitDataError::InvalidSignature);
        }

        if let Some(max_age) = self.max_age {
            let auth_date = fields
                .get(AUTH_DATE_FIELD)
                .and_then(|v| v.parse::<i64>().ok())
                .ok_or(InitDataError::MalformedPayload("missing auth_date"))?;
            let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
            if now.saturating_sub(auth_date) > max_age {
                return Err(InitDataError::Expired);
            }
        }

        match fields.remove(USER_FIELD) {
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(object)) => Ok(Principal::from_user_object(object)),
                _ => Err(InitDataError::InvalidUserField),
            },
            None => Ok(Principal::default()),
        }
    }
}

/// Build a signed payload from `pairs`, appending the matching `hash` field.
/// Any `hash` entry already present in `pairs` is ignored.
pub fn sign_init_data(bot_token: &str, pairs: &[(&str, &str)]) -> String {
    let fields: BTreeMap<String, String> = pairs
        .iter()
        .filter(|(k, _)| *k != HASH_FIELD)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let hash = sign_check_string(&derive_secret_key(bot_token), &check_string(&fields));

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs.iter().filter(|(k, _)| *k != HASH_FIELD) {
        serializer.append_pair(key, value);
    }
    serializer.append_pair(HASH_FIELD, &hash);
    serializer.finish()
}

fn derive_secret_key(bot_token: &str) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(WEB_APP_DATA).expect("HMAC accepts keys of any length");
    mac.update(bot_token.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&mac.finalize().into_bytes());
    key
}

fn sign_check_string(secret_key: &[u8; 32], check_string: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret_key).expect("HMAC accepts keys of any length");
    mac.update(check_string.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Decode the query string; a repeated key keeps its last value.
fn parse_fields(init_data: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(init_data.as_bytes())
        .into_owned()
        .collect()
}

/// Keys are already sorted by the map; values are used as decoded.
fn check_string(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}
