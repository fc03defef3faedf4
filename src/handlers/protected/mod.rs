// handlers/protected/mod.rs - Protected handlers (admin gate required)
//
// Security Level: verified Telegram init-data + admin allow-list
// Route Prefix: /api/users, /api/stats, /api/devices
// Middleware: require_admin, which injects the Principal extension
pub mod devices;
pub mod stats;
pub mod users;

use crate::error::ApiError;

/// Path identifiers are forwarded to the panel as a single path segment.
pub(crate) fn validate_identifier(raw: &str) -> Result<&str, ApiError> {
    let identifier = raw.trim();
    if identifier.is_empty() || identifier == "." || identifier == ".." {
        return Err(ApiError::bad_request(format!("Invalid identifier: '{}'", raw)));
    }
    Ok(identifier)
}
