//! Reference data queries

use crate::catalog::Catalog;
use sqlx::{Row, SqlitePool};
use survey_common::db::{Channel, QuestionKind, QuestionType};
use survey_common::Result;

/// Load every channel and question type
pub async fn load_catalog(pool: &SqlitePool) -> Result<Catalog> {
    let channels = sqlx::query("SELECT guid, name FROM channels")
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| Channel {
            id: row.get("guid"),
            name: row.get("name"),
        })
        .collect();

    let mut question_types = Vec::new();
    for row in sqlx::query("SELECT guid, name, kind FROM question_types")
        .fetch_all(pool)
        .await?
    {
        let kind: String = row.get("kind");
        question_types.push(QuestionType {
            id: row.get("guid"),
            name: row.get("name"),
            kind: kind.parse::<QuestionKind>()?,
        });
    }

    Ok(Catalog::new(channels, question_types))
}
