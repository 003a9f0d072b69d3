//! Survey persistence

use super::Upserted;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use survey_common::db::Survey;
use survey_common::{ids, Result};

/// Fields written by a survey upsert
#[derive(Debug, Clone)]
pub struct SurveyFields<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub active: bool,
    pub channel_id: &'a str,
}

/// Resolve or create a survey by `(campaign_id, name)`
///
/// On an existing survey only `description` and `active` are overwritten.
pub async fn upsert_survey(
    conn: &mut SqliteConnection,
    campaign_id: &str,
    fields: &SurveyFields<'_>,
) -> Result<Upserted> {
    let candidate = ids::generate();

    let returned: String = sqlx::query_scalar(
        r#"
        INSERT INTO surveys (guid, campaign_id, channel_id, name, description, active)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(campaign_id, name) DO UPDATE SET
            description = excluded.description,
            active = excluded.active,
            updated_at = CURRENT_TIMESTAMP
        RETURNING guid
        "#,
    )
    .bind(&candidate)
    .bind(campaign_id)
    .bind(fields.channel_id)
    .bind(fields.name)
    .bind(fields.description)
    .bind(fields.active)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Upserted::from_returned(candidate, returned))
}

/// Load a survey only if it belongs to `owner_id`
pub async fn find_survey_for_owner(
    conn: &mut SqliteConnection,
    owner_id: &str,
    survey_id: &str,
) -> Result<Option<Survey>> {
    let row = sqlx::query(
        r#"
        SELECT s.guid, s.name, s.description, s.active, s.campaign_id, s.channel_id
        FROM surveys s
        JOIN campaigns c ON c.guid = s.campaign_id
        WHERE s.guid = ? AND c.owner_id = ?
        "#,
    )
    .bind(survey_id)
    .bind(owner_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.as_ref().map(survey_from_row))
}

fn survey_from_row(row: &SqliteRow) -> Survey {
    Survey {
        id: row.get("guid"),
        name: row.get("name"),
        description: row.get("description"),
        active: row.get("active"),
        campaign_id: row.get("campaign_id"),
        channel_id: row.get("channel_id"),
    }
}
