#![forbid(unsafe_code)]

//! HTTP service for internship records: accounts and sessions, the record
//! file, document upload with classification, and keyword verification.

pub mod auth;
pub mod blob;
mod clock;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use config::{BlobBackend, Config, ConfigError};
pub use error::ApiError;
pub use routes::build_router;
pub use state::{AppContext, StartupError};
