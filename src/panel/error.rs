use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the Remna panel. None of these are retried.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("panel unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("panel returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid panel response: {0}")]
    Decode(String),

    #[error("invalid panel configuration: {0}")]
    InvalidConfig(String),
}

impl PanelError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            PanelError::Status { status, .. } => Some(*status),
            PanelError::Unavailable(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
