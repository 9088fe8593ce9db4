//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video generation, session and artifact listing endpoints
//! - File-backed session history with production briefs
//! - Request id, logging, security header and CORS middleware
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod sessions;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use sessions::{build_brief, Session, SessionMessage, SessionStore};
pub use state::AppState;
