//! survey-engine library
//!
//! Bulk ingestion of survey hierarchies, answer collection, response
//! aggregation and the HTTP routes that expose them.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod aggregation;
pub mod answers;
pub mod api;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod orchestrator;
pub mod payload;
pub mod reconcile;
pub mod simulation;
pub mod validator;

use crate::config::IngestionPolicy;
use crate::simulation::{FreeTextSource, TemplateText};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub policy: Arc<IngestionPolicy>,
    /// Free-text answers for simulated deliveries
    pub text_source: Arc<dyn FreeTextSource>,
}

impl AppState {
    pub fn new(db: SqlitePool, policy: IngestionPolicy) -> Self {
        Self {
            db,
            policy: Arc::new(policy),
            text_source: Arc::new(TemplateText),
        }
    }

    pub fn with_text_source(mut self, text_source: Arc<dyn FreeTextSource>) -> Self {
        self.text_source = text_source;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::ingestion_routes())
        .merge(api::delivery_routes())
        .merge(api::simulation_routes())
        .merge(api::command_routes())
        .merge(api::analytics_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
