pub mod auth;

pub use auth::{extract_init_data, require_admin, InitDataHeader, MaybePrincipal};
