//! Response persistence

use sqlx::SqliteConnection;
use survey_common::db::Response;
use survey_common::Result;

pub async fn insert_response(conn: &mut SqliteConnection, response: &Response) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO responses (guid, delivery_id, question_id, option_id, free_text, received_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&response.id)
    .bind(&response.delivery_id)
    .bind(&response.question_id)
    .bind(&response.option_id)
    .bind(&response.free_text)
    .bind(response.received_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
