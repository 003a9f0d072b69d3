//! Delivery creation and answer submission endpoints

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use survey_common::db::Delivery;

use super::OwnerId;
use crate::answers::{self, AnswerInput, SubmissionReceipt};
use crate::db::recipients::Contact;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /deliveries request; names an existing recipient or supplies contact
/// details to upsert by email
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeliveryRequest {
    pub survey_id: String,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub recipient: Option<Contact>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<AnswerInput>,
}

/// POST /deliveries
pub async fn create_delivery(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Json(request): Json<CreateDeliveryRequest>,
) -> ApiResult<Json<Delivery>> {
    let delivery = match (&request.recipient_id, &request.recipient) {
        (Some(recipient_id), None) => {
            answers::create_delivery(&state.db, &owner, &request.survey_id, recipient_id).await?
        }
        (None, Some(contact)) => {
            answers::create_delivery_for_contact(&state.db, &owner, &request.survey_id, contact)
                .await?
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Exactly one of recipientId or recipient is required".to_string(),
            ))
        }
    };

    Ok(Json(delivery))
}

/// POST /deliveries/:id/answers
pub async fn submit_answers(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Path(delivery_id): Path<String>,
    Json(request): Json<SubmitAnswersRequest>,
) -> ApiResult<Json<SubmissionReceipt>> {
    let receipt = answers::submit_answers(&state.db, &owner, &delivery_id, &request.answers).await?;
    Ok(Json(receipt))
}

pub fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/deliveries", post(create_delivery))
        .route("/deliveries/:id/answers", post(submit_answers))
}
