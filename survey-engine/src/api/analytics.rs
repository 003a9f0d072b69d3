//! Analytics endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use survey_common::Error;

use super::OwnerId;
use crate::aggregation::views::{self, DatasetFilter, OwnerDataset, OwnerSummary, SurveyDataset};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnswersQuery {
    #[serde(default)]
    pub survey_id: Option<String>,
    #[serde(default)]
    pub delivery_id: Option<String>,
    #[serde(default)]
    pub exclude_free_text: bool,
}

/// GET /analytics/owners
pub async fn list_owners(State(state): State<AppState>) -> ApiResult<Json<Vec<OwnerSummary>>> {
    Ok(Json(views::owner_summaries(&state.db).await?))
}

/// GET /analytics/answers
///
/// Choice-only datasets of every owner; owners with nothing left are omitted.
pub async fn all_answers(State(state): State<AppState>) -> ApiResult<Json<Vec<OwnerDataset>>> {
    let owners = views::load_all_datasets(&state.db).await?;
    Ok(Json(views::prune_owner_datasets(owners)))
}

/// GET /analytics/owners/:owner_id/answers
///
/// The caller may only read its own data. An empty result is `NotFound`.
pub async fn owner_answers(
    State(state): State<AppState>,
    OwnerId(caller): OwnerId,
    Path(owner_id): Path<String>,
    Query(query): Query<AnswersQuery>,
) -> ApiResult<Json<Vec<SurveyDataset>>> {
    if caller != owner_id {
        return Err(Error::Forbidden(format!("Owner {} not accessible", owner_id)).into());
    }

    let filter = DatasetFilter {
        survey_id: query.survey_id,
        delivery_id: query.delivery_id,
    };
    let mut datasets = views::load_owner_dataset(&state.db, &owner_id, &filter).await?;
    if query.exclude_free_text {
        datasets = views::exclude_free_text(datasets);
    }
    if datasets.is_empty() {
        return Err(Error::NotFound(format!("No survey data for owner {}", owner_id)).into());
    }

    Ok(Json(datasets))
}

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/answers", get(all_answers))
        .route("/analytics/owners", get(list_owners))
        .route("/analytics/owners/:owner_id/answers", get(owner_answers))
}
