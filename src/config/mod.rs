use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Process-wide configuration, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    pub panel: PanelConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Secret,
    pub admin_ids: AdminAllowList,
    /// Optional freshness bound for `auth_date`; `None` disables the check.
    pub init_data_max_age: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub base_url: String,
    pub api_token: Secret,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
}

/// Immutable set of Telegram ids allowed through the admin gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList(BTreeSet<i64>);

impl AdminAllowList {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self(ids.into_iter().collect())
    }

    /// Parse a comma-separated id list. Blank entries are skipped, anything
    /// else that is not an integer is rejected.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| ConfigError::InvalidAdminId(s.to_string()))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &i64> {
        self.0.iter()
    }
}

/// String wrapper for credentials so they never show up in `Debug` output.
#[derive(Clone, Default)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid ENVIRONMENT value: {0}")]
    InvalidEnvironment(String),

    #[error("Invalid admin Telegram id: {0}")]
    InvalidAdminId(String),

    #[error("Invalid panel URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid value for {var}: {value}")]
    InvalidNumber { var: &'static str, value: String },
}

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_PANEL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Unset means production: the development bypass must be asked for.
        let environment = match get("ENVIRONMENT") {
            Some(raw) => Environment::parse(&raw)?,
            None => Environment::Production,
        };

        let required = |key: &'static str| -> Result<String, ConfigError> {
            match get(key) {
                Some(v) => Ok(v),
                None if environment.is_development() => Ok(String::new()),
                None => Err(ConfigError::Missing(key)),
            }
        };

        let bot_token = required("TELEGRAM_BOT_TOKEN")?;
        let base_url = required("REMNA_PANEL_URL")?;
        let api_token = required("REMNA_API_TOKEN")?;

        if !base_url.is_empty() {
            Url::parse(&base_url).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        }

        let admin_ids = match get("ADMIN_TELEGRAM_IDS") {
            Some(raw) => AdminAllowList::parse(&raw)?,
            None => AdminAllowList::default(),
        };

        let port = parse_number(&get, "PORT")?.unwrap_or(DEFAULT_PORT);
        let timeout_secs = parse_number(&get, "PANEL_TIMEOUT_SECS")?.unwrap_or(DEFAULT_PANEL_TIMEOUT_SECS);
        let max_age_secs: Option<u64> = parse_number(&get, "TELEGRAM_INIT_DATA_MAX_AGE_SECS")?;

        let cors_origins = get("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            environment,
            server: ServerConfig { port },
            telegram: TelegramConfig {
                bot_token: Secret::new(bot_token),
                admin_ids,
                init_data_max_age: max_age_secs.map(Duration::from_secs),
            },
            panel: PanelConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_token: Secret::new(api_token),
                timeout: Duration::from_secs(timeout_secs),
            },
            security: SecurityConfig { cors_origins },
        })
    }
}

fn parse_number<T, G>(get: &G, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
        None => Ok(None),
    }
}
