//! Simulation endpoints

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use super::OwnerId;
use crate::error::ApiResult;
use crate::simulation::{
    self, rng_from_seed, SimulationBatchReport, SimulationReport, SimulationRequest,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SimulateSurveyRequest {
    pub count: usize,
    /// Fixed seed for reproducible output
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SimulateBatchRequest {
    pub surveys: Vec<SimulationRequest>,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// POST /surveys/:id/simulate
pub async fn simulate_survey(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Path(survey_id): Path<String>,
    Json(request): Json<SimulateSurveyRequest>,
) -> ApiResult<Json<SimulationReport>> {
    let mut rng = rng_from_seed(request.seed);
    let report = simulation::simulate_survey(
        &state.db,
        &owner,
        &survey_id,
        request.count,
        &mut rng,
        state.text_source.as_ref(),
    )
    .await?;

    Ok(Json(report))
}

/// POST /simulations
pub async fn simulate_batch(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Json(request): Json<SimulateBatchRequest>,
) -> Json<SimulationBatchReport> {
    let mut rng = rng_from_seed(request.seed);
    let report = simulation::simulate_batch(
        &state.db,
        &owner,
        &request.surveys,
        &mut rng,
        state.text_source.as_ref(),
    )
    .await;

    Json(report)
}

pub fn simulation_routes() -> Router<AppState> {
    Router::new()
        .route("/surveys/:id/simulate", post(simulate_survey))
        .route("/simulations", post(simulate_batch))
}
