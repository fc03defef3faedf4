pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mapping;
pub mod middleware;
pub mod models;
pub mod panel;
