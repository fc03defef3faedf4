pub mod gate;
pub mod init_data;
pub mod principal;

pub use gate::{AdminGate, AuthorizationResult, UnauthenticatedReason};
pub use init_data::{sign_init_data, InitDataError, InitDataVerifier};
pub use principal::Principal;

/// Header carrying the Mini App's signed init-data.
pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";
