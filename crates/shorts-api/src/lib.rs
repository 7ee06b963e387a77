//! Axum HTTP API server for short video generation.
//!
//! This crate provides:
//! - `POST /api/create-short`, running the whole pipeline per request
//! - Liveness and readiness probes
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, ShortsPipeline};
