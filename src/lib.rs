//! A small threaded HTTP/1.x server: URL templates with `:variables`,
//! handlers registered per verb, and an optional static file fallback.

mod server;
pub mod config;
pub mod error;
pub mod logger;

pub use {
    server::*,
    config::Config,
    error::{ConfigError, ServerError},
};
