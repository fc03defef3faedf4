#![allow(dead_code)]

use std::collections::HashMap;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use remna_miniapp_api::app::{build_router, AppState};
use remna_miniapp_api::auth::{sign_init_data, INIT_DATA_HEADER};
use remna_miniapp_api::config::AppConfig;
use remna_miniapp_api::panel::{PanelApi, PanelError, PanelResult};

pub const BOT_TOKEN: &str = "123456:TEST-bot-token";
pub const ADMIN_ID: i64 = 42;
pub const OTHER_ID: i64 = 777;

pub fn config(environment: &str, admin_ids: &str) -> AppConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("ENVIRONMENT", environment),
        ("TELEGRAM_BOT_TOKEN", BOT_TOKEN),
        ("ADMIN_TELEGRAM_IDS", admin_ids),
        ("REMNA_PANEL_URL", "http://panel.test"),
        ("REMNA_API_TOKEN", "panel-token"),
    ]);
    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).expect("test config")
}

/// Freshly signed init-data for a Telegram user.
pub fn init_data_for(user_id: i64) -> String {
    let auth_date = chrono::Utc::now().timestamp().to_string();
    let user = json!({ "id": user_id, "first_name": "Test", "username": "tester" }).to_string();
    sign_init_data(
        BOT_TOKEN,
        &[("auth_date", auth_date.as_str()), ("query_id", "AAHdF6IQAAAAAN0XohDhrOrc"), ("user", user.as_str())],
    )
}

pub fn sample_users() -> Vec<Value> {
    vec![
        json!({
            "uuid": "uuid-alice",
            "username": "alice",
            "shortUuid": "a1",
            "status": "ACTIVE",
            "usedTrafficBytes": 100,
            "trafficLimitBytes": 1000
        }),
        json!({
            "uuid": "uuid-bob",
            "username": "Bobby",
            "status": "DISABLED",
            "userTraffic": { "usedTrafficBytes": "200" }
        }),
        json!({
            "uuid": "uuid-carol",
            "username": "carol",
            "status": "LIMITED",
            "usedTrafficBytes": 0
        }),
    ]
}

/// In-memory panel that records every call it receives.
#[derive(Default)]
pub struct FakePanel {
    pub users: Vec<Value>,
    /// `None` makes the system stats call fail.
    pub system_stats: Option<Value>,
    pub nodes: Vec<Value>,
    pub squads: Vec<Value>,
    pub devices: Vec<Value>,
    calls: Mutex<Vec<String>>,
    last_body: Mutex<Option<Map<String, Value>>>,
}

impl FakePanel {
    pub fn with_users() -> Self {
        Self::from_users(sample_users())
    }

    pub fn from_users(users: Vec<Value>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Option<Map<String, Value>> {
        self.last_body.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn find(&self, identifier: &str) -> PanelResult<Value> {
        self.users
            .iter()
            .find(|user| user["uuid"] == identifier || user["username"] == identifier)
            .cloned()
            .ok_or_else(|| PanelError::Status {
                status: reqwest::StatusCode::NOT_FOUND,
                body: r#"{"message":"User not found"}"#.to_string(),
            })
    }
}

#[async_trait]
impl PanelApi for FakePanel {
    async fn list_users(&self, offset: u32, limit: u32, status: Option<&str>) -> PanelResult<Value> {
        self.record(format!("list_users {} {} {:?}", offset, limit, status));
        let users: Vec<Value> = self
            .users
            .iter()
            .filter(|user| status.map_or(true, |s| user["status"] == s))
            .cloned()
            .collect();
        Ok(json!({ "users": users, "total": users.len() }))
    }

    async fn get_user(&self, identifier: &str) -> PanelResult<Value> {
        self.record(format!("get_user {}", identifier));
        self.find(identifier)
    }

    async fn create_user(&self, body: Map<String, Value>) -> PanelResult<Value> {
        self.record("create_user".to_string());
        *self.last_body.lock().unwrap() = Some(body.clone());
        let mut created = body;
        created.insert("uuid".to_string(), json!("uuid-new"));
        created.insert("status".to_string(), json!("ACTIVE"));
        Ok(Value::Object(created))
    }

    async fn update_user(&self, uuid: &str, body: Map<String, Value>) -> PanelResult<Value> {
        self.record(format!("update_user {}", uuid));
        *self.last_body.lock().unwrap() = Some(body.clone());
        let mut user = self.find(uuid)?;
        if let Some(object) = user.as_object_mut() {
            object.extend(body);
        }
        Ok(user)
    }

    async fn delete_user(&self, identifier: &str) -> PanelResult<Value> {
        self.record(format!("delete_user {}", identifier));
        self.find(identifier).map(|_| json!({ "isDeleted": true }))
    }

    async fn reset_user_traffic(&self, identifier: &str) -> PanelResult<Value> {
        self.record(format!("reset_user_traffic {}", identifier));
        self.find(identifier)
    }

    async fn revoke_subscription(&self, identifier: &str) -> PanelResult<Value> {
        self.record(format!("revoke_subscription {}", identifier));
        self.find(identifier)
    }

    async fn system_stats(&self) -> PanelResult<Value> {
        self.record("system_stats".to_string());
        self.system_stats.clone().ok_or_else(|| PanelError::Status {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: "stats unavailable".to_string(),
        })
    }

    async fn nodes(&self) -> PanelResult<Vec<Value>> {
        self.record("nodes".to_string());
        Ok(self.nodes.clone())
    }

    async fn internal_squads(&self) -> PanelResult<Vec<Value>> {
        self.record("internal_squads".to_string());
        Ok(self.squads.clone())
    }

    async fn user_devices(&self, user_uuid: &str) -> PanelResult<Vec<Value>> {
        self.record(format!("user_devices {}", user_uuid));
        Ok(self.devices.clone())
    }

    async fn delete_device(&self, device_uuid: &str) -> PanelResult<Value> {
        self.record(format!("delete_device {}", device_uuid));
        Ok(json!({ "isDeleted": true }))
    }
}

pub fn app(environment: &str, admin_ids: &str, panel: Arc<FakePanel>) -> Router {
    build_router(AppState::with_panel(config(environment, admin_ids), panel))
}

/// Production router with `ADMIN_ID` allow-listed.
pub fn admin_app(panel: Arc<FakePanel>) -> Router {
    app("production", &ADMIN_ID.to_string(), panel)
}

pub fn request(method: Method, uri: &str, init_data: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(init_data) = init_data {
        builder = builder.header(INIT_DATA_HEADER, init_data);
    }
    let body = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

/// Request signed as the allow-listed admin.
pub fn admin_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    request(method, uri, Some(&init_data_for(ADMIN_ID)), body)
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

/// The real binary on a free port, killed on drop.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_remna-miniapp-api"))
            .args(["serve", "--port", &port.to_string()])
            .env("ENVIRONMENT", "development")
            .env("TELEGRAM_BOT_TOKEN", BOT_TOKEN)
            .env("ADMIN_TELEGRAM_IDS", ADMIN_ID.to_string())
            .env("REMNA_PANEL_URL", "http://127.0.0.1:9")
            .env("REMNA_API_TOKEN", "panel-token")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
