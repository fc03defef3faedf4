mod common;

use std::time::Duration;

use anyhow::Result;
use serde_json::Value;

use common::TestServer;

#[tokio::test]
async fn health_and_root_served_by_binary() -> Result<()> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;

    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/health", server.base_url)).send().await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());

    let resp = client.get(format!("{}/", server.base_url)).send().await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await?;
    assert!(body["version"].is_string());

    Ok(())
}

#[tokio::test]
async fn development_bypass_reaches_the_panel_client() -> Result<()> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;

    // No init-data in development passes the gate; the configured panel is
    // unreachable, so the request fails upstream rather than at the gate.
    let resp = reqwest::Client::new()
        .get(format!("{}/api/stats/nodes", server.base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], true);
    assert!(body["detail"].as_str().unwrap().starts_with("Failed to fetch nodes"));

    Ok(())
}
