//! mdt-debtors library interface
//!
//! Exposes the enrichment pipeline and the router for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::PhoneEnricher;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Local database (debtors, phone cache)
    pub db: SqlitePool,
    /// Phone enrichment run on every debtor lookup
    pub enricher: Arc<PhoneEnricher>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, enricher: Arc<PhoneEnricher>) -> Self {
        Self {
            db,
            enricher,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::debtor_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
