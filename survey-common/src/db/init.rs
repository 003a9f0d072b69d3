//! Database initialization
//!
//! Creates the database file on first run, applies the schema idempotently
//! and seeds the reference catalogs (channels, question types).

use crate::db::models::QuestionKind;
use crate::{ids, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Channels available to surveys
pub const SEED_CHANNELS: &[&str] = &["Ocr", "Email", "WhatsApp"];

/// Question types available to questions, with their answer shape
pub const SEED_QUESTION_TYPES: &[(&str, QuestionKind)] = &[
    ("Opción Múltiple", QuestionKind::MultiSelect),
    ("Opción Única", QuestionKind::SingleSelect),
    ("Completar", QuestionKind::FreeText),
];

/// Open (or create) the database file and bring the schema up to date
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    seed_reference_data(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema and seeded catalogs
///
/// Uses a single long-lived connection so every query sees the same database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    seed_reference_data(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_catalog_tables(pool).await?;
    create_campaigns_table(pool).await?;
    create_surveys_table(pool).await?;
    create_questions_table(pool).await?;
    create_question_options_table(pool).await?;
    create_recipients_table(pool).await?;
    create_deliveries_table(pool).await?;
    create_responses_table(pool).await?;
    Ok(())
}

/// Insert the reference catalogs if they are not already present
pub async fn seed_reference_data(pool: &SqlitePool) -> Result<()> {
    for name in SEED_CHANNELS {
        sqlx::query("INSERT OR IGNORE INTO channels (guid, name) VALUES (?, ?)")
            .bind(ids::generate())
            .bind(name)
            .execute(pool)
            .await?;
    }

    for (name, kind) in SEED_QUESTION_TYPES {
        sqlx::query("INSERT OR IGNORE INTO question_types (guid, name, kind) VALUES (?, ?, ?)")
            .bind(ids::generate())
            .bind(name)
            .bind(kind.as_str())
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn create_catalog_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channels (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS question_types (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL CHECK (kind IN ('multi_select', 'single_select', 'free_text'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_campaigns_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS campaigns (
            guid TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (owner_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_surveys_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS surveys (
            guid TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL REFERENCES campaigns(guid) ON DELETE CASCADE,
            channel_id TEXT NOT NULL REFERENCES channels(guid),
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (campaign_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_questions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            guid TEXT PRIMARY KEY,
            survey_id TEXT NOT NULL REFERENCES surveys(guid) ON DELETE CASCADE,
            question_type_id TEXT NOT NULL REFERENCES question_types(guid),
            text TEXT NOT NULL,
            mandatory INTEGER NOT NULL DEFAULT 0,
            question_order INTEGER NOT NULL CHECK (question_order >= 1),
            UNIQUE (survey_id, question_order)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_question_options_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS question_options (
            guid TEXT PRIMARY KEY,
            question_id TEXT NOT NULL REFERENCES questions(guid) ON DELETE CASCADE,
            text TEXT NOT NULL,
            value TEXT NOT NULL,
            UNIQUE (question_id, value)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_recipients_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipients (
            guid TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (owner_id, email),
            UNIQUE (owner_id, phone)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_deliveries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS deliveries (
            guid TEXT PRIMARY KEY,
            survey_id TEXT NOT NULL REFERENCES surveys(guid) ON DELETE CASCADE,
            recipient_id TEXT NOT NULL REFERENCES recipients(guid) ON DELETE CASCADE,
            sent_at TEXT NOT NULL,
            responded_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_deliveries_survey ON deliveries(survey_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_responses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS responses (
            guid TEXT PRIMARY KEY,
            delivery_id TEXT NOT NULL REFERENCES deliveries(guid) ON DELETE CASCADE,
            question_id TEXT NOT NULL REFERENCES questions(guid) ON DELETE CASCADE,
            option_id TEXT REFERENCES question_options(guid) ON DELETE SET NULL,
            free_text TEXT,
            received_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_responses_delivery ON responses(delivery_id)")
        .execute(pool)
        .await?;

    Ok(())
}
