// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Route Prefix: /, /health, /api (info only), /debug/*
pub mod debug;
pub mod system;

pub use debug::{debug_headers, debug_telegram};
pub use system::{api_root, health, root};
