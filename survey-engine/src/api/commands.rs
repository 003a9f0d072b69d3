//! Hierarchy command endpoint

use axum::{extract::State, routing::post, Json, Router};

use super::OwnerId;
use crate::commands::{self, CommandOutcome, HierarchyCommand};
use crate::error::ApiResult;
use crate::AppState;

/// POST /commands
///
/// Body is `{"action": "...", "payload": {...}}`; an unknown action fails
/// body extraction.
pub async fn run_command(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Json(command): Json<HierarchyCommand>,
) -> ApiResult<Json<CommandOutcome>> {
    let outcome = commands::execute(&state.db, &owner, command).await?;
    Ok(Json(outcome))
}

pub fn command_routes() -> Router<AppState> {
    Router::new().route("/commands", post(run_command))
}
