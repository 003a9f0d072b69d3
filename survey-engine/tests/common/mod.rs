//! Shared fixtures for survey-engine integration tests
#![allow(dead_code)]

use sqlx::SqlitePool;
use survey_engine::db::questions::{load_questions_with_options, StoredQuestion};
use survey_engine::payload::{
    CampaignPayload, Company, IngestionUnit, OptionPayload, QuestionPayload, SurveyPayload,
};

pub const MULTI: &str = "Opción Múltiple";
pub const SINGLE: &str = "Opción Única";
pub const TEXT: &str = "Completar";

pub fn options(values: &[&str]) -> Vec<OptionPayload> {
    values
        .iter()
        .map(|v| OptionPayload {
            text: format!("Option {}", v.to_uppercase()),
            value: v.to_string(),
        })
        .collect()
}

pub fn choice_question(order: i64, type_name: &str, values: &[&str]) -> QuestionPayload {
    QuestionPayload {
        text: format!("Question {}", order),
        order,
        type_name: type_name.to_string(),
        mandatory: true,
        options: Some(options(values)),
    }
}

pub fn text_question(order: i64) -> QuestionPayload {
    QuestionPayload {
        text: format!("Question {}", order),
        order,
        type_name: TEXT.to_string(),
        mandatory: false,
        options: None,
    }
}

/// Five questions laid out as the default policy expects
pub fn standard_survey(name: &str) -> SurveyPayload {
    SurveyPayload {
        name: name.to_string(),
        description: format!("{} description", name),
        active: true,
        channel: "Ocr".to_string(),
        questions: vec![
            choice_question(1, MULTI, &["a", "b", "c"]),
            text_question(2),
            choice_question(3, SINGLE, &["x", "y", "z"]),
            text_question(4),
            text_question(5),
        ],
    }
}

/// Three standard surveys named S1, S2, S3
pub fn standard_unit(company_id: &str, campaign: &str) -> IngestionUnit {
    IngestionUnit {
        company: Company {
            id: company_id.to_string(),
            name: format!("{} Inc", company_id),
        },
        campaign: CampaignPayload {
            name: campaign.to_string(),
            surveys: vec![
                standard_survey("S1"),
                standard_survey("S2"),
                standard_survey("S3"),
            ],
        },
    }
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn campaigns_of(pool: &SqlitePool, owner_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM campaigns WHERE owner_id = ?")
        .bind(owner_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Stored structure of a survey; the connection is released before returning
pub async fn structure(pool: &SqlitePool, survey_id: &str) -> Vec<StoredQuestion> {
    let mut conn = pool.acquire().await.unwrap();
    load_questions_with_options(&mut conn, survey_id).await.unwrap()
}

pub async fn survey_id(pool: &SqlitePool, owner_id: &str, survey_name: &str) -> String {
    sqlx::query_scalar(
        r#"
        SELECT s.guid FROM surveys s
        JOIN campaigns c ON c.guid = s.campaign_id
        WHERE c.owner_id = ? AND s.name = ?
        "#,
    )
    .bind(owner_id)
    .bind(survey_name)
    .fetch_one(pool)
    .await
    .unwrap()
}
