//! Remna panel REST API access.
//!
//! Handlers only see the [`PanelApi`] trait; [`PanelClient`] is the reqwest
//! implementation used in production.

pub mod client;
pub mod error;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use client::{unwrap_envelope, PanelClient};
pub use error::PanelError;

pub type PanelResult<T> = Result<T, PanelError>;

/// Operations the Mini App backend needs from the panel. Values returned are
/// already unwrapped from the panel's `response` envelope.
#[async_trait]
pub trait PanelApi: Send + Sync {
    async fn list_users(&self, offset: u32, limit: u32, status: Option<&str>) -> PanelResult<Value>;

    async fn get_user(&self, identifier: &str) -> PanelResult<Value>;

    async fn create_user(&self, body: Map<String, Value>) -> PanelResult<Value>;

    /// PATCH `/users` with `uuid` placed into the body.
    async fn update_user(&self, uuid: &str, body: Map<String, Value>) -> PanelResult<Value>;

    async fn delete_user(&self, identifier: &str) -> PanelResult<Value>;

    async fn reset_user_traffic(&self, identifier: &str) -> PanelResult<Value>;

    async fn revoke_subscription(&self, identifier: &str) -> PanelResult<Value>;

    async fn system_stats(&self) -> PanelResult<Value>;

    async fn nodes(&self) -> PanelResult<Vec<Value>>;

    async fn internal_squads(&self) -> PanelResult<Vec<Value>>;

    async fn user_devices(&self, user_uuid: &str) -> PanelResult<Vec<Value>>;

    async fn delete_device(&self, device_uuid: &str) -> PanelResult<Value>;
}
