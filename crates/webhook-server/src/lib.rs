//! # Webhook Server
//!
//! HTTP front of confstream. The telephony gateway pushes leg callbacks here;
//! each is handed to the [`confstream_leg_core::CallFlowController`].
//!
//! - [`api`]: axum router and handlers
//! - [`config`]: layered TOML and environment configuration
//! - [`logging`]: tracing subscriber setup
//! - [`sweeper`]: housekeeping of leg records

pub mod api;
pub mod config;
pub mod errors;
pub mod logging;
pub mod sweeper;

pub use api::{create_router, AppState};
pub use config::ServerConfig;
pub use errors::{Result, ServerError};
