//! Bulk ingestion endpoint

use axum::{extract::State, routing::post, Json, Router};

use crate::error::ApiResult;
use crate::orchestrator::{self, BatchReport};
use crate::payload::IngestionUnit;
use crate::AppState;

/// POST /ingestion/batches
///
/// Always 200 with a per-unit report unless the batch fails systemically.
pub async fn ingest_batch(
    State(state): State<AppState>,
    Json(units): Json<Vec<IngestionUnit>>,
) -> ApiResult<Json<BatchReport>> {
    let report = orchestrator::ingest(&state.db, &state.policy, &units).await?;
    Ok(Json(report))
}

pub fn ingestion_routes() -> Router<AppState> {
    Router::new().route("/ingestion/batches", post(ingest_batch))
}
