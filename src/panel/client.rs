use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use super::{PanelApi, PanelError, PanelResult};
use crate::config::PanelConfig;

/// Authenticated HTTP client for `<panel>/api/...`.
#[derive(Debug, Clone)]
pub struct PanelClient {
    http: reqwest::Client,
    /// `None` when no panel URL is configured (development only); every
    /// call then fails with [`PanelError::InvalidConfig`].
    root: Option<Url>,
}

impl PanelClient {
    pub fn new(config: &PanelConfig) -> Result<Self, PanelError> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        let root = if base_url.is_empty() {
            warn!("No panel URL configured, panel calls will fail");
            None
        } else {
            let root = Url::parse(&format!("{}/", base_url))
                .map_err(|e| PanelError::InvalidConfig(format!("panel URL: {}", e)))?;
            if root.cannot_be_a_base() {
                return Err(PanelError::InvalidConfig("panel URL cannot be a base".to_string()));
            }
            Some(root)
        };

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_token.expose()))
            .map_err(|_| PanelError::InvalidConfig("panel API token is not a valid header value".to_string()))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, root })
    }

    /// URL for `segments` below the panel root. Each segment is percent-encoded,
    /// so identifiers cannot introduce extra path components.
    fn url(&self, segments: &[&str]) -> PanelResult<Url> {
        let mut url = self
            .root
            .clone()
            .ok_or_else(|| PanelError::InvalidConfig("REMNA_PANEL_URL is not set".to_string()))?;
        url.path_segments_mut()
            .map_err(|_| PanelError::InvalidConfig("panel URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Call `/api/<path>` and decode the JSON body. Non-2xx responses become
    /// [`PanelError::Status`] carrying the panel's own error text.
    pub async fn request(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> PanelResult<Value> {
        let mut segments = Vec::with_capacity(path.len() + 1);
        segments.push("api");
        segments.extend_from_slice(path);
        let url = self.url(&segments)?;

        debug!("Making {} request to {}", method, url);
        if let Some(body) = body {
            debug!("Request data: {}", body);
        }

        let mut builder = self.http.request(method, url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(PanelError::Status { status, body: text });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| PanelError::Decode(e.to_string()))
    }

    async fn call(&self, method: Method, path: &[&str], body: Option<&Value>, query: &[(&str, String)]) -> PanelResult<Value> {
        self.request(method, path, body, query).await.map(unwrap_envelope)
    }

    /// Status of a GET on an arbitrary panel path such as `/api/users`.
    pub async fn endpoint_status(&self, path: &str) -> PanelResult<StatusCode> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let url = self.url(&segments)?;
        let response = self.http.get(url).send().await?;
        Ok(response.status())
    }
}

/// The panel wraps most payloads as `{"response": ...}`.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut object) if object.contains_key("response") => {
            object.remove("response").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn array_at(value: Value, key: Option<&str>) -> Vec<Value> {
    let target = match key {
        Some(key) => value.get(key).cloned().unwrap_or(Value::Null),
        None => value,
    };
    match target {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

#[async_trait]
impl PanelApi for PanelClient {
    async fn list_users(&self, offset: u32, limit: u32, status: Option<&str>) -> PanelResult<Value> {
        let mut query = vec![("offset", offset.to_string()), ("limit", limit.to_string())];
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        self.call(Method::GET, &["users"], None, &query).await
    }

    async fn get_user(&self, identifier: &str) -> PanelResult<Value> {
        self.call(Method::GET, &["users", identifier], None, &[]).await
    }

    async fn create_user(&self, body: Map<String, Value>) -> PanelResult<Value> {
        self.call(Method::POST, &["users"], Some(&Value::Object(body)), &[]).await
    }

    async fn update_user(&self, uuid: &str, mut body: Map<String, Value>) -> PanelResult<Value> {
        body.insert("uuid".to_string(), Value::String(uuid.to_string()));
        self.call(Method::PATCH, &["users"], Some(&Value::Object(body)), &[]).await
    }

    async fn delete_user(&self, identifier: &str) -> PanelResult<Value> {
        self.call(Method::DELETE, &["users", identifier], None, &[]).await
    }

    async fn reset_user_traffic(&self, identifier: &str) -> PanelResult<Value> {
        self.call(Method::POST, &["users", identifier, "reset"], None, &[]).await
    }

    async fn revoke_subscription(&self, identifier: &str) -> PanelResult<Value> {
        self.call(Method::POST, &["users", identifier, "revoke"], None, &[]).await
    }

    async fn system_stats(&self) -> PanelResult<Value> {
        self.call(Method::GET, &["system", "stats"], None, &[]).await
    }

    async fn nodes(&self) -> PanelResult<Vec<Value>> {
        let value = self.call(Method::GET, &["nodes"], None, &[]).await?;
        Ok(array_at(value, None))
    }

    async fn internal_squads(&self) -> PanelResult<Vec<Value>> {
        let value = self.call(Method::GET, &["internal-squads"], None, &[]).await?;
        Ok(array_at(value, Some("internalSquads")))
    }

    async fn user_devices(&self, user_uuid: &str) -> PanelResult<Vec<Value>> {
        let query = [("userUuid", user_uuid.to_string())];
        let value = self.call(Method::GET, &["hwid", "devices"], None, &query).await?;
        Ok(array_at(value, Some("devices")))
    }

    async fn delete_device(&self, device_uuid: &str) -> PanelResult<Value> {
        self.call(Method::DELETE, &["hwid", "devices", device_uuid], None, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use serde_json::json;
    use std::time::Duration;

    fn config(base_url: &str) -> PanelConfig {
        PanelConfig {
            base_url: base_url.to_string(),
            api_token: Secret::new("token"),
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn envelope_is_unwrapped_when_present() {
        assert_eq!(unwrap_envelope(json!({"response": {"a": 1}})), json!({"a": 1}));
        assert_eq!(unwrap_envelope(json!({"a": 1})), json!({"a": 1}));
        assert_eq!(unwrap_envelope(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn urls_keep_base_path_and_encode_segments() {
        let client = PanelClient::new(&config("https://panel.example.com/prefix/")).unwrap();
        let url = client.url(&["api", "users", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://panel.example.com/prefix/api/users/a%2Fb%20c");
    }

    #[test]
    fn rejects_unusable_configuration() {
        assert!(matches!(PanelClient::new(&config("not a url")), Err(PanelError::InvalidConfig(_))));

        let mut bad_token = config("https://panel.example.com");
        bad_token.api_token = Secret::new("line\nbreak");
        assert!(matches!(PanelClient::new(&bad_token), Err(PanelError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn missing_panel_url_fails_each_call() {
        let client = PanelClient::new(&config("")).unwrap();

        assert!(matches!(client.url(&["api", "users"]), Err(PanelError::InvalidConfig(_))));
        assert!(matches!(client.system_stats().await, Err(PanelError::InvalidConfig(_))));
        assert!(matches!(client.endpoint_status("/api/users").await, Err(PanelError::InvalidConfig(_))));
    }

    #[test]
    fn array_extraction_tolerates_missing_keys() {
        assert_eq!(array_at(json!({"internalSquads": [{"uuid": "x"}]}), Some("internalSquads")).len(), 1);
        assert!(array_at(json!({"other": []}), Some("internalSquads")).is_empty());
        assert!(array_at(json!({"nodes": 1}), None).is_empty());
    }
}
