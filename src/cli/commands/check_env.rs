use serde::Serialize;

use crate::cli::utils::{check_line, output_failure, output_report};
use crate::cli::OutputFormat;
use crate::config::{AppConfig, Environment};
use crate::panel::PanelClient;

/// Panel endpoints the Mini App depends on. Panel versions differ in which of
/// them exist, so one answering is enough.
const ENDPOINT_PATHS: &[&str] = &[
    "/api/users",
    "/api/system/stats",
    "/api/core",
    "/api/system",
    "/api/admins/current",
];

#[derive(Debug, Serialize)]
pub struct SettingCheck {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct EndpointCheck {
    pub path: &'static str,
    pub ok: bool,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct EnvReport {
    pub environment: Environment,
    pub panel_url: String,
    pub admin_ids: usize,
    pub settings: Vec<SettingCheck>,
    pub endpoints: Vec<EndpointCheck>,
}

impl EnvReport {
    pub fn from_config(config: &AppConfig) -> Self {
        let presence = |name, missing: bool| SettingCheck {
            name,
            ok: !missing,
            detail: if missing { "not set" } else { "set" }.to_string(),
        };

        let settings = vec![
            SettingCheck {
                name: "ENVIRONMENT",
                ok: true,
                detail: config.environment.to_string(),
            },
            presence("TELEGRAM_BOT_TOKEN", config.telegram.bot_token.is_empty()),
            SettingCheck {
                name: "ADMIN_TELEGRAM_IDS",
                ok: !config.telegram.admin_ids.is_empty(),
                detail: format!("{} id(s)", config.telegram.admin_ids.len()),
            },
            SettingCheck {
                name: "REMNA_PANEL_URL",
                ok: !config.panel.base_url.is_empty(),
                detail: config.panel.base_url.clone(),
            },
            presence("REMNA_API_TOKEN", config.panel.api_token.is_empty()),
        ];

        Self {
            environment: config.environment,
            panel_url: config.panel.base_url.clone(),
            admin_ids: config.telegram.admin_ids.len(),
            settings,
            endpoints: Vec::new(),
        }
    }

    pub async fn check_endpoints(&mut self, client: &PanelClient) {
        for &path in ENDPOINT_PATHS {
            let (ok, status) = match client.endpoint_status(path).await {
                Ok(status) => (status.is_success(), status.to_string()),
                Err(e) => (false, e.to_string()),
            };
            self.endpoints.push(EndpointCheck { path, ok, status });
        }
    }

    /// First checked endpoint that answered 2xx.
    pub fn working_endpoint(&self) -> Option<&'static str> {
        self.endpoints.iter().find(|check| check.ok).map(|check| check.path)
    }

    pub fn text_lines(&self) -> Vec<String> {
        let settings = self.settings.iter().map(|s| check_line(s.ok, s.name, &s.detail));
        let endpoints = self
            .endpoints
            .iter()
            .map(|p| check_line(p.ok, &format!("GET {}", p.path), &p.status));
        settings.chain(endpoints).collect()
    }
}

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            output_failure(&output_format, "CONFIG_ERROR", &format!("Invalid configuration: {}", e), None)?;
            return Err(e.into());
        }
    };

    let mut report = EnvReport::from_config(&config);

    let client = match PanelClient::new(&config.panel) {
        Ok(client) => client,
        Err(e) => {
            let message = format!("Cannot build panel client: {}", e);
            output_failure(&output_format, "PANEL_CONFIG", &message, Some(serde_json::to_value(&report)?))?;
            return Err(e.into());
        }
    };

    report.check_endpoints(&client).await;

    match report.working_endpoint() {
        Some(working) => output_report(&output_format, &report, |report| {
            let mut lines = report.text_lines();
            lines.push(format!("Panel API reachable via {}", working));
            lines
        }),
        None => {
            if let OutputFormat::Text = output_format {
                for line in report.text_lines() {
                    println!("{}", line);
                }
            }
            output_failure(
                &output_format,
                "PANEL_UNREACHABLE",
                "No panel endpoint answered successfully; check REMNA_PANEL_URL and REMNA_API_TOKEN",
                Some(serde_json::to_value(&report)?),
            )?;
            anyhow::bail!("panel API unreachable")
        }
    }
}
