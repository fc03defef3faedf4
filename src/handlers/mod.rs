// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth): liveness, service info, diagnostics
// Protected (admin gate): panel users, statistics, devices
pub mod protected;
pub mod public;
