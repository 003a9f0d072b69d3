//! Delivery persistence

use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};
use survey_common::db::Delivery;
use survey_common::Result;

pub async fn insert_delivery(conn: &mut SqliteConnection, delivery: &Delivery) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO deliveries (guid, survey_id, recipient_id, sent_at, responded_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&delivery.id)
    .bind(&delivery.survey_id)
    .bind(&delivery.recipient_id)
    .bind(delivery.sent_at)
    .bind(delivery.responded_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Load a delivery only if its survey belongs to `owner_id`
pub async fn find_delivery_for_owner(
    conn: &mut SqliteConnection,
    owner_id: &str,
    delivery_id: &str,
) -> Result<Option<Delivery>> {
    let row = sqlx::query(
        r#"
        SELECT d.guid, d.survey_id, d.recipient_id, d.sent_at, d.responded_at
        FROM deliveries d
        JOIN surveys s ON s.guid = d.survey_id
        JOIN campaigns c ON c.guid = s.campaign_id
        WHERE d.guid = ? AND c.owner_id = ?
        "#,
    )
    .bind(delivery_id)
    .bind(owner_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|row| Delivery {
        id: row.get("guid"),
        survey_id: row.get("survey_id"),
        recipient_id: row.get("recipient_id"),
        sent_at: row.get("sent_at"),
        responded_at: row.get("responded_at"),
    }))
}

/// Set the completion marker if it is not already set
///
/// Returns false when another submission completed the delivery first.
pub async fn mark_responded(
    conn: &mut SqliteConnection,
    delivery_id: &str,
    responded_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE deliveries SET responded_at = ? WHERE guid = ? AND responded_at IS NULL",
    )
    .bind(responded_at)
    .bind(delivery_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
