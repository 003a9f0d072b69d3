//! Read-side queries for analytics views

use crate::aggregation::views::{OwnerSummary, SurveyInfo};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};
use survey_common::Result;

/// A stored response row of one survey
#[derive(Debug, Clone)]
pub struct ResponseRow {
    pub delivery_id: String,
    pub question_id: String,
    pub option_id: Option<String>,
    pub free_text: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Surveys of an owner, optionally narrowed to one survey
pub async fn list_owner_surveys(
    conn: &mut SqliteConnection,
    owner_id: &str,
    survey_id: Option<&str>,
) -> Result<Vec<SurveyInfo>> {
    let rows = sqlx::query(
        r#"
        SELECT s.guid, s.name, s.description, s.active,
               c.name AS campaign_name, ch.name AS channel_name
        FROM surveys s
        JOIN campaigns c ON c.guid = s.campaign_id
        JOIN channels ch ON ch.guid = s.channel_id
        WHERE c.owner_id = ? AND (? IS NULL OR s.guid = ?)
        ORDER BY c.name, s.name
        "#,
    )
    .bind(owner_id)
    .bind(survey_id)
    .bind(survey_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SurveyInfo {
            id: row.get("guid"),
            name: row.get("name"),
            description: row.get("description"),
            campaign_name: row.get("campaign_name"),
            channel_name: row.get("channel_name"),
            active: row.get("active"),
        })
        .collect())
}

/// Owners holding at least one campaign
pub async fn list_owners(conn: &mut SqliteConnection) -> Result<Vec<String>> {
    let owners: Vec<String> = sqlx::query_scalar("SELECT DISTINCT owner_id FROM campaigns ORDER BY owner_id")
        .fetch_all(&mut *conn)
        .await?;
    Ok(owners)
}

/// Responses of a survey grouped by delivery in send order, then by question
/// position and option value
pub async fn load_survey_responses(
    conn: &mut SqliteConnection,
    survey_id: &str,
    delivery_id: Option<&str>,
) -> Result<Vec<ResponseRow>> {
    let rows = sqlx::query(
        r#"
        SELECT r.delivery_id, r.question_id, r.option_id, r.free_text, r.received_at
        FROM responses r
        JOIN deliveries d ON d.guid = r.delivery_id
        JOIN questions q ON q.guid = r.question_id
        LEFT JOIN question_options o ON o.guid = r.option_id
        WHERE d.survey_id = ? AND (? IS NULL OR d.guid = ?)
        ORDER BY d.sent_at, d.guid, q.question_order, o.value, r.received_at, r.guid
        "#,
    )
    .bind(survey_id)
    .bind(delivery_id)
    .bind(delivery_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ResponseRow {
            delivery_id: row.get("delivery_id"),
            question_id: row.get("question_id"),
            option_id: row.get("option_id"),
            free_text: row.get("free_text"),
            received_at: row.get("received_at"),
        })
        .collect())
}

/// Per-owner survey and choice-response totals; owners without choice
/// responses are left out
pub async fn owner_summaries(pool: &SqlitePool) -> Result<Vec<OwnerSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT owner_id, total_surveys, total_responses FROM (
            SELECT c.owner_id AS owner_id,
                   COUNT(DISTINCT s.guid) AS total_surveys,
                   (
                       SELECT COUNT(*)
                       FROM responses r
                       JOIN questions q ON q.guid = r.question_id
                       JOIN question_types t ON t.guid = q.question_type_id
                       JOIN deliveries d ON d.guid = r.delivery_id
                       JOIN surveys s2 ON s2.guid = d.survey_id
                       JOIN campaigns c2 ON c2.guid = s2.campaign_id
                       WHERE c2.owner_id = c.owner_id AND t.kind != 'free_text'
                   ) AS total_responses
            FROM campaigns c
            JOIN surveys s ON s.campaign_id = c.guid
            GROUP BY c.owner_id
        )
        WHERE total_responses > 0
        ORDER BY owner_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| OwnerSummary {
            owner_id: row.get("owner_id"),
            total_surveys: row.get("total_surveys"),
            total_responses: row.get("total_responses"),
        })
        .collect())
}
