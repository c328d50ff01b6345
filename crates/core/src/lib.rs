//! `plinth-core` — configuration and shared primitives for Plinth services.
//!
//! This crate has no HTTP or storage dependencies; it resolves the process
//! configuration and defines the vocabulary the other crates share.

pub mod config;
pub mod error;
pub mod method;

pub use config::{
    ApiConfig, AppConfig, Environment, LogFormat, SessionConfig, SwaggerConfig, API_BASE_URL,
    EXTERNAL_NAME, INTERNAL_NAME,
};
pub use error::{ConfigError, ConfigResult};
pub use method::RouteMethod;
