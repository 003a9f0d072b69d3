//! HTTP API handlers for survey-engine

pub mod analytics;
pub mod commands;
pub mod deliveries;
pub mod health;
pub mod ingestion;
pub mod owner;
pub mod simulation;

pub use analytics::analytics_routes;
pub use commands::command_routes;
pub use deliveries::delivery_routes;
pub use health::health_routes;
pub use ingestion::ingestion_routes;
pub use owner::OwnerId;
pub use simulation::simulation_routes;
