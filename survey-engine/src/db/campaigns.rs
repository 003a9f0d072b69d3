//! Campaign persistence

use super::Upserted;
use sqlx::{Row, SqliteConnection};
use survey_common::db::Campaign;
use survey_common::{ids, Result};

/// Resolve or create a campaign by `(owner_id, name)`
pub async fn upsert_campaign(
    conn: &mut SqliteConnection,
    owner_id: &str,
    name: &str,
) -> Result<Upserted> {
    let candidate = ids::generate();

    let returned: String = sqlx::query_scalar(
        r#"
        INSERT INTO campaigns (guid, owner_id, name)
        VALUES (?, ?, ?)
        ON CONFLICT(owner_id, name) DO UPDATE SET
            updated_at = CURRENT_TIMESTAMP
        RETURNING guid
        "#,
    )
    .bind(&candidate)
    .bind(owner_id)
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Upserted::from_returned(candidate, returned))
}

pub async fn find_campaign_by_name(
    conn: &mut SqliteConnection,
    owner_id: &str,
    name: &str,
) -> Result<Option<Campaign>> {
    let row = sqlx::query("SELECT guid, owner_id, name FROM campaigns WHERE owner_id = ? AND name = ?")
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(|row| Campaign {
        id: row.get("guid"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
    }))
}
