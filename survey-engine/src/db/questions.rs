//! Question and option persistence

use super::placeholders;
use sqlx::{Row, SqliteConnection};
use survey_common::db::{Question, QuestionKind, QuestionOption};
use survey_common::Result;

/// A persisted question with its type and option catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredQuestion {
    pub question: Question,
    pub type_name: String,
    pub kind: QuestionKind,
    /// Ordered by value
    pub options: Vec<QuestionOption>,
}

/// Load every question of a survey with its options in one query
///
/// Questions come back ordered by position.
pub async fn load_questions_with_options(
    conn: &mut SqliteConnection,
    survey_id: &str,
) -> Result<Vec<StoredQuestion>> {
    let rows = sqlx::query(
        r#"
        SELECT q.guid, q.text, q.mandatory, q.question_order, q.question_type_id,
               t.name AS type_name, t.kind AS type_kind,
               o.guid AS option_id, o.text AS option_text, o.value AS option_value
        FROM questions q
        JOIN question_types t ON t.guid = q.question_type_id
        LEFT JOIN question_options o ON o.question_id = q.guid
        WHERE q.survey_id = ?
        ORDER BY q.question_order, o.value
        "#,
    )
    .bind(survey_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut questions: Vec<StoredQuestion> = Vec::new();
    for row in rows {
        let question_id: String = row.get("guid");

        let is_new = questions
            .last()
            .map_or(true, |last| last.question.id != question_id);
        if is_new {
            let kind: String = row.get("type_kind");
            questions.push(StoredQuestion {
                question: Question {
                    id: question_id.clone(),
                    text: row.get("text"),
                    mandatory: row.get("mandatory"),
                    order: row.get("question_order"),
                    survey_id: survey_id.to_string(),
                    question_type_id: row.get("question_type_id"),
                },
                type_name: row.get("type_name"),
                kind: kind.parse()?,
                options: Vec::new(),
            });
        }

        let option_id: Option<String> = row.get("option_id");
        if let (Some(option_id), Some(current)) = (option_id, questions.last_mut()) {
            current.options.push(QuestionOption {
                id: option_id,
                text: row.get("option_text"),
                value: row.get("option_value"),
                question_id,
            });
        }
    }

    Ok(questions)
}

pub async fn insert_question(conn: &mut SqliteConnection, question: &Question) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO questions (guid, survey_id, question_type_id, text, mandatory, question_order)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&question.id)
    .bind(&question.survey_id)
    .bind(&question.question_type_id)
    .bind(&question.text)
    .bind(question.mandatory)
    .bind(question.order)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Overwrite the mutable fields of a question; id and position are kept
pub async fn update_question(
    conn: &mut SqliteConnection,
    question_id: &str,
    text: &str,
    mandatory: bool,
    question_type_id: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE questions
        SET text = ?, mandatory = ?, question_type_id = ?
        WHERE guid = ?
        "#,
    )
    .bind(text)
    .bind(mandatory)
    .bind(question_type_id)
    .bind(question_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn insert_option(conn: &mut SqliteConnection, option: &QuestionOption) -> Result<()> {
    sqlx::query("INSERT INTO question_options (guid, question_id, text, value) VALUES (?, ?, ?, ?)")
        .bind(&option.id)
        .bind(&option.question_id)
        .bind(&option.text)
        .bind(&option.value)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn update_option_text(conn: &mut SqliteConnection, option_id: &str, text: &str) -> Result<()> {
    sqlx::query("UPDATE question_options SET text = ? WHERE guid = ?")
        .bind(text)
        .bind(option_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Delete options by id in one statement
pub async fn delete_options(conn: &mut SqliteConnection, option_ids: &[&str]) -> Result<u64> {
    if option_ids.is_empty() {
        return Ok(0);
    }

    let sql = format!(
        "DELETE FROM question_options WHERE guid IN ({})",
        placeholders(option_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in option_ids {
        query = query.bind(*id);
    }

    let result = query.execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

/// Resolve a question only if it belongs to `survey_id`
pub async fn find_question_in_survey(
    conn: &mut SqliteConnection,
    question_id: &str,
    survey_id: &str,
) -> Result<Option<(Question, QuestionKind)>> {
    let row = sqlx::query(
        r#"
        SELECT q.guid, q.text, q.mandatory, q.question_order, q.question_type_id, t.kind
        FROM questions q
        JOIN question_types t ON t.guid = q.question_type_id
        WHERE q.guid = ? AND q.survey_id = ?
        "#,
    )
    .bind(question_id)
    .bind(survey_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let kind: String = row.get("kind");
            Ok(Some((
                Question {
                    id: row.get("guid"),
                    text: row.get("text"),
                    mandatory: row.get("mandatory"),
                    order: row.get("question_order"),
                    survey_id: survey_id.to_string(),
                    question_type_id: row.get("question_type_id"),
                },
                kind.parse()?,
            )))
        }
        None => Ok(None),
    }
}

pub async fn option_belongs_to_question(
    conn: &mut SqliteConnection,
    option_id: &str,
    question_id: &str,
) -> Result<bool> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT guid FROM question_options WHERE guid = ? AND question_id = ?")
            .bind(option_id)
            .bind(question_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(found.is_some())
}
