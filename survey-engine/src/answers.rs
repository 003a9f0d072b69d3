//! Delivery creation and answer submission

use crate::db::recipients::{self, Contact};
use crate::db::{deliveries, questions, responses, surveys};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use survey_common::db::{Delivery, QuestionKind, Response};
use survey_common::{ids, Error, Result};
use tracing::{debug, info};

/// One response row: a selected option or a piece of free text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub question_id: String,
    #[serde(default)]
    pub option_id: Option<String>,
    #[serde(default)]
    pub free_text: Option<String>,
}

impl AnswerInput {
    pub fn option(question_id: &str, option_id: &str) -> Self {
        Self {
            question_id: question_id.to_string(),
            option_id: Some(option_id.to_string()),
            free_text: None,
        }
    }

    pub fn text(question_id: &str, text: &str) -> Self {
        Self {
            question_id: question_id.to_string(),
            option_id: None,
            free_text: Some(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub delivery_id: String,
    pub responses_created: usize,
    pub responded_at: DateTime<Utc>,
}

/// Send `survey_id` to a recipient, resolving the recipient by email
pub async fn create_delivery_for_contact(
    pool: &SqlitePool,
    owner_id: &str,
    survey_id: &str,
    contact: &Contact,
) -> Result<Delivery> {
    let mut conn = pool.acquire().await?;
    if surveys::find_survey_for_owner(&mut conn, owner_id, survey_id)
        .await?
        .is_none()
    {
        return Err(Error::Forbidden(format!("Survey {} not accessible", survey_id)));
    }
    let recipient = recipients::upsert_recipient_by_email(&mut conn, owner_id, contact).await?;
    drop(conn);

    create_delivery(pool, owner_id, survey_id, &recipient.id).await
}

/// Create a delivery; survey and recipient must both belong to `owner_id`
pub async fn create_delivery(
    pool: &SqlitePool,
    owner_id: &str,
    survey_id: &str,
    recipient_id: &str,
) -> Result<Delivery> {
    let mut conn = pool.acquire().await?;

    if surveys::find_survey_for_owner(&mut conn, owner_id, survey_id)
        .await?
        .is_none()
    {
        return Err(Error::Forbidden(format!("Survey {} not accessible", survey_id)));
    }
    if recipients::find_recipient_for_owner(&mut conn, owner_id, recipient_id)
        .await?
        .is_none()
    {
        return Err(Error::Forbidden(format!(
            "Recipient {} not accessible",
            recipient_id
        )));
    }

    let delivery = Delivery {
        id: ids::generate(),
        survey_id: survey_id.to_string(),
        recipient_id: recipient_id.to_string(),
        sent_at: Utc::now(),
        responded_at: None,
    };
    deliveries::insert_delivery(&mut conn, &delivery).await?;
    debug!(delivery_id = %delivery.id, survey_id = %survey_id, "Created delivery");

    Ok(delivery)
}

/// Store the answers of a delivery and mark it completed
///
/// Runs in one transaction: either every response is stored and the delivery
/// is completed, or nothing changes.
pub async fn submit_answers(
    pool: &SqlitePool,
    owner_id: &str,
    delivery_id: &str,
    answers: &[AnswerInput],
) -> Result<SubmissionReceipt> {
    if answers.is_empty() {
        return Err(Error::InvalidInput("At least one answer is required".to_string()));
    }

    let mut tx = pool.begin().await?;

    let delivery = deliveries::find_delivery_for_owner(&mut *tx, owner_id, delivery_id)
        .await?
        .ok_or_else(|| Error::Forbidden(format!("Delivery {} not accessible", delivery_id)))?;

    if delivery.is_completed() {
        return Err(Error::Integrity(format!(
            "Delivery {} already has answers",
            delivery_id
        )));
    }

    let mut kinds: HashMap<&str, QuestionKind> = HashMap::new();
    let mut rows_per_question: HashMap<&str, usize> = HashMap::new();

    for answer in answers {
        let question_id = answer.question_id.as_str();

        let kind = match kinds.get(question_id).copied() {
            Some(kind) => kind,
            None => {
                let (_, kind) =
                    questions::find_question_in_survey(&mut *tx, question_id, &delivery.survey_id)
                        .await?
                        .ok_or_else(|| {
                            Error::Integrity(format!(
                                "Question {} does not belong to survey {}",
                                question_id, delivery.survey_id
                            ))
                        })?;
                kinds.insert(question_id, kind);
                kind
            }
        };

        let count = rows_per_question.entry(question_id).or_insert(0);
        *count += 1;
        if *count > 1 && kind != QuestionKind::MultiSelect {
            return Err(Error::InvalidInput(format!(
                "Question {} accepts a single answer",
                question_id
            )));
        }

        match (kind, &answer.option_id, &answer.free_text) {
            (QuestionKind::FreeText, None, Some(_)) => {}
            (QuestionKind::FreeText, Some(_), _) => {
                return Err(Error::Integrity(format!(
                    "Question {} is free text and has no options",
                    question_id
                )));
            }
            (QuestionKind::FreeText, None, None) => {
                return Err(Error::InvalidInput(format!(
                    "Question {} requires free text",
                    question_id
                )));
            }
            (_, Some(option_id), _) => {
                if !questions::option_belongs_to_question(&mut *tx, option_id, question_id).await? {
                    return Err(Error::Integrity(format!(
                        "Option {} does not belong to question {}",
                        option_id, question_id
                    )));
                }
            }
            (_, None, _) => {
                return Err(Error::InvalidInput(format!(
                    "Question {} requires a selected option",
                    question_id
                )));
            }
        }
    }

    let now = Utc::now();
    for answer in answers {
        responses::insert_response(
            &mut *tx,
            &Response {
                id: ids::generate(),
                delivery_id: delivery.id.clone(),
                question_id: answer.question_id.clone(),
                option_id: answer.option_id.clone(),
                free_text: answer.free_text.clone(),
                received_at: now,
            },
        )
        .await?;
    }

    if !deliveries::mark_responded(&mut *tx, &delivery.id, now).await? {
        return Err(Error::Integrity(format!(
            "Delivery {} already has answers",
            delivery_id
        )));
    }

    tx.commit().await?;

    info!(
        delivery_id = %delivery.id,
        responses = answers.len(),
        "Stored delivery answers"
    );

    Ok(SubmissionReceipt {
        delivery_id: delivery.id,
        responses_created: answers.len(),
        responded_at: now,
    })
}
