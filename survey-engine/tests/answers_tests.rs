//! Delivery creation and answer submission

mod common;

use common::*;
use sqlx::SqlitePool;
use survey_common::db::connect_in_memory;
use survey_common::Error;
use survey_engine::answers::{create_delivery, create_delivery_for_contact, submit_answers, AnswerInput};
use survey_engine::config::IngestionPolicy;
use survey_engine::db::questions::StoredQuestion;
use survey_engine::db::recipients::Contact;
use survey_engine::orchestrator::ingest;

fn contact(name: &str) -> Contact {
    Contact {
        name: name.to_string(),
        phone: format!("+56-{}", name.to_lowercase()),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

/// Ingested "acme" campaign plus the structure of survey S1
async fn setup() -> (SqlitePool, String, Vec<StoredQuestion>) {
    let pool = connect_in_memory().await.unwrap();
    ingest(
        &pool,
        &IngestionPolicy::default(),
        &[standard_unit("acme", "Spring"), standard_unit("other", "Spring")],
    )
    .await
    .unwrap();
    let s1 = survey_id(&pool, "acme", "S1").await;
    let questions = structure(&pool, &s1).await;
    (pool, s1, questions)
}

fn option_id(question: &StoredQuestion, value: &str) -> String {
    question
        .options
        .iter()
        .find(|o| o.value == value)
        .unwrap()
        .id
        .clone()
}

/// One valid answer per question of a standard survey
fn full_answers(questions: &[StoredQuestion]) -> Vec<AnswerInput> {
    vec![
        AnswerInput::option(&questions[0].question.id, &option_id(&questions[0], "a")),
        AnswerInput::option(&questions[0].question.id, &option_id(&questions[0], "c")),
        AnswerInput::text(&questions[1].question.id, "Fine"),
        AnswerInput::option(&questions[2].question.id, &option_id(&questions[2], "y")),
        AnswerInput::text(&questions[3].question.id, "Quick"),
        AnswerInput::text(&questions[4].question.id, "None"),
    ]
}

async fn responded_at(pool: &SqlitePool, delivery_id: &str) -> Option<String> {
    sqlx::query_scalar("SELECT responded_at FROM deliveries WHERE guid = ?")
        .bind(delivery_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_submission_stores_responses_and_completes_delivery() {
    let (pool, s1, questions) = setup().await;
    let delivery = create_delivery_for_contact(&pool, "acme", &s1, &contact("Ana"))
        .await
        .unwrap();
    assert!(delivery.responded_at.is_none());

    let receipt = submit_answers(&pool, "acme", &delivery.id, &full_answers(&questions))
        .await
        .unwrap();

    assert_eq!(receipt.delivery_id, delivery.id);
    assert_eq!(receipt.responses_created, 6);
    assert_eq!(count(&pool, "responses").await, 6);
    assert!(responded_at(&pool, &delivery.id).await.is_some());
}

#[tokio::test]
async fn test_completed_delivery_rejects_second_submission() {
    let (pool, s1, questions) = setup().await;
    let delivery = create_delivery_for_contact(&pool, "acme", &s1, &contact("Ana"))
        .await
        .unwrap();
    submit_answers(&pool, "acme", &delivery.id, &full_answers(&questions))
        .await
        .unwrap();

    let again = submit_answers(&pool, "acme", &delivery.id, &full_answers(&questions)).await;

    assert!(matches!(again, Err(Error::Integrity(_))));
    assert_eq!(count(&pool, "responses").await, 6);
}

#[tokio::test]
async fn test_other_owner_cannot_touch_delivery_or_survey() {
    let (pool, s1, questions) = setup().await;
    let delivery = create_delivery_for_contact(&pool, "acme", &s1, &contact("Ana"))
        .await
        .unwrap();

    let submit = submit_answers(&pool, "other", &delivery.id, &full_answers(&questions)).await;
    assert!(matches!(submit, Err(Error::Forbidden(_))));

    let create = create_delivery_for_contact(&pool, "other", &s1, &contact("Bea")).await;
    assert!(matches!(create, Err(Error::Forbidden(_))));

    // Recipient of acme used with the survey of another owner
    let other_s1 = survey_id(&pool, "other", "S1").await;
    let cross = create_delivery(&pool, "other", &other_s1, &delivery.recipient_id).await;
    assert!(matches!(cross, Err(Error::Forbidden(_))));
}

#[tokio::test]
async fn test_question_from_another_survey_is_integrity_error() {
    let (pool, s1, _) = setup().await;
    let s2 = survey_id(&pool, "acme", "S2").await;
    let foreign = structure(&pool, &s2).await;
    let delivery = create_delivery_for_contact(&pool, "acme", &s1, &contact("Ana"))
        .await
        .unwrap();

    let result = submit_answers(
        &pool,
        "acme",
        &delivery.id,
        &[AnswerInput::text(&foreign[1].question.id, "Wrong survey")],
    )
    .await;

    assert!(matches!(result, Err(Error::Integrity(_))));
    assert!(responded_at(&pool, &delivery.id).await.is_none());
}

#[tokio::test]
async fn test_option_of_another_question_is_integrity_error() {
    let (pool, s1, questions) = setup().await;
    let delivery = create_delivery_for_contact(&pool, "acme", &s1, &contact("Ana"))
        .await
        .unwrap();

    let result = submit_answers(
        &pool,
        "acme",
        &delivery.id,
        &[AnswerInput::option(
            &questions[2].question.id,
            &option_id(&questions[0], "a"),
        )],
    )
    .await;

    assert!(matches!(result, Err(Error::Integrity(_))));
}

#[tokio::test]
async fn test_rejected_submission_leaves_no_rows() {
    let (pool, s1, questions) = setup().await;
    let delivery = create_delivery_for_contact(&pool, "acme", &s1, &contact("Ana"))
        .await
        .unwrap();

    // Valid multi-select rows followed by two rows on a single-select question
    let answers = vec![
        AnswerInput::option(&questions[0].question.id, &option_id(&questions[0], "a")),
        AnswerInput::option(&questions[2].question.id, &option_id(&questions[2], "x")),
        AnswerInput::option(&questions[2].question.id, &option_id(&questions[2], "y")),
    ];
    let result = submit_answers(&pool, "acme", &delivery.id, &answers).await;

    assert!(matches!(result, Err(Error::InvalidInput(_))));
    assert_eq!(count(&pool, "responses").await, 0);
    assert!(responded_at(&pool, &delivery.id).await.is_none());
}

#[tokio::test]
async fn test_answer_shape_must_match_question_kind() {
    let (pool, s1, questions) = setup().await;
    let delivery = create_delivery_for_contact(&pool, "acme", &s1, &contact("Ana"))
        .await
        .unwrap();

    let text_with_option = AnswerInput {
        question_id: questions[1].question.id.clone(),
        option_id: Some(option_id(&questions[0], "a")),
        free_text: Some("text".to_string()),
    };
    let result = submit_answers(&pool, "acme", &delivery.id, &[text_with_option]).await;
    assert!(matches!(result, Err(Error::Integrity(_))));

    let choice_without_option = AnswerInput::text(&questions[0].question.id, "a");
    let result = submit_answers(&pool, "acme", &delivery.id, &[choice_without_option]).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    let empty = submit_answers(&pool, "acme", &delivery.id, &[]).await;
    assert!(matches!(empty, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_recipient_is_upserted_by_email() {
    let (pool, s1, _) = setup().await;

    let first = create_delivery_for_contact(&pool, "acme", &s1, &contact("Ana"))
        .await
        .unwrap();
    let mut renamed = contact("Ana");
    renamed.name = "Ana María".to_string();
    let second = create_delivery_for_contact(&pool, "acme", &s1, &renamed)
        .await
        .unwrap();

    assert_eq!(first.recipient_id, second.recipient_id);
    assert_ne!(first.id, second.id);
    assert_eq!(count(&pool, "recipients").await, 1);
    assert_eq!(count(&pool, "deliveries").await, 2);

    let name: String = sqlx::query_scalar("SELECT name FROM recipients WHERE guid = ?")
        .bind(&first.recipient_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(name, "Ana María");
}

#[tokio::test]
async fn test_phone_taken_by_another_recipient_is_rejected() {
    let (pool, s1, _) = setup().await;
    create_delivery_for_contact(&pool, "acme", &s1, &contact("Ana"))
        .await
        .unwrap();

    let mut clash = contact("Ana");
    clash.email = "someone.else@example.com".to_string();
    let result = create_delivery_for_contact(&pool, "acme", &s1, &clash).await;

    assert!(matches!(result, Err(Error::Integrity(_))));
    assert_eq!(count(&pool, "recipients").await, 1);
}

#[tokio::test]
async fn test_responses_survive_reingestion() {
    let (pool, s1, questions) = setup().await;
    let delivery = create_delivery_for_contact(&pool, "acme", &s1, &contact("Ana"))
        .await
        .unwrap();
    submit_answers(&pool, "acme", &delivery.id, &full_answers(&questions))
        .await
        .unwrap();

    // Option c is dropped from question 1 and the question text changes
    let mut unit = standard_unit("acme", "Spring");
    unit.campaign.surveys[0].questions[0].options = Some(options(&["a", "b", "d"]));
    unit.campaign.surveys[0].questions[0].text = "Reworded".to_string();
    ingest(&pool, &IngestionPolicy::default(), &[unit])
        .await
        .unwrap();

    let orphaned: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM responses WHERE question_id = ? AND option_id IS NULL",
    )
    .bind(&questions[0].question.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(orphaned, 1);
    assert_eq!(count(&pool, "responses").await, 6);

    let after = structure(&pool, &s1).await;
    assert_eq!(after[0].question.id, questions[0].question.id);
}
