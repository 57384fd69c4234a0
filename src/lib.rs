pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod preflight;
pub mod report;
pub mod validate;
