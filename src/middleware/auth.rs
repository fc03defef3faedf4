use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use tracing::warn;

use crate::auth::{AuthorizationResult, Principal, UnauthenticatedReason, INIT_DATA_HEADER};
use crate::error::ApiError;

/// Admin gate middleware. Runs before any protected handler; on success the
/// verified [`Principal`] is injected into request extensions.
pub async fn require_admin(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let outcome = match extract_init_data(request.headers()) {
        InitDataHeader::Absent => state.gate.authorize(None),
        InitDataHeader::Present(raw) => state.gate.authorize(Some(&raw)),
        InitDataHeader::Unreadable => {
            warn!("Rejected request with non UTF-8 Telegram init data");
            AuthorizationResult::Unauthenticated(UnauthenticatedReason::InvalidInitData)
        }
    };

    match outcome {
        AuthorizationResult::Authorized(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        rejected => match ApiError::from_gate(&rejected) {
            Some(api_error) => api_error.into_response(),
            None => ApiError::internal_server_error("Authorization failed").into_response(),
        },
    }
}

/// What a request carries in `X-Telegram-Init-Data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitDataHeader {
    Absent,
    /// Present but not valid UTF-8. Never eligible for the development bypass.
    Unreadable,
    Present(String),
}

impl InitDataHeader {
    /// Readable, non-empty payload.
    pub fn payload(&self) -> Option<&str> {
        match self {
            InitDataHeader::Present(raw) if !raw.is_empty() => Some(raw.as_str()),
            _ => None,
        }
    }

    /// Whether the client sent anything at all; an empty value counts as nothing.
    pub fn is_supplied(&self) -> bool {
        match self {
            InitDataHeader::Absent => false,
            InitDataHeader::Unreadable => true,
            InitDataHeader::Present(raw) => !raw.is_empty(),
        }
    }
}

pub fn extract_init_data(headers: &HeaderMap) -> InitDataHeader {
    match headers.get(INIT_DATA_HEADER) {
        None => InitDataHeader::Absent,
        Some(value) => match value.to_str() {
            Ok(raw) => InitDataHeader::Present(raw.to_string()),
            Err(_) => InitDataHeader::Unreadable,
        },
    }
}

/// Verified Telegram user if the request carries valid init-data, without
/// any allow-list check. Extraction never rejects.
#[derive(Debug, Clone)]
pub struct MaybePrincipal(pub Option<Principal>);

#[async_trait]
impl FromRequestParts<AppState> for MaybePrincipal {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = extract_init_data(&parts.headers);
        Ok(MaybePrincipal(state.gate.optional(header.payload())))
    }
}
