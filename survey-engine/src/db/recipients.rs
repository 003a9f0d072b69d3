//! Recipient persistence

use super::Upserted;
use chrono::Utc;
use sqlx::{Row, SqliteConnection};
use std::collections::HashSet;
use survey_common::db::Recipient;
use survey_common::{ids, Error, Result};

/// Contact details of a recipient
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Resolve or create a recipient by `(owner_id, email)`
///
/// An existing recipient gets its name and phone refreshed.
pub async fn upsert_recipient_by_email(
    conn: &mut SqliteConnection,
    owner_id: &str,
    contact: &Contact,
) -> Result<Upserted> {
    let candidate = ids::generate();

    let returned: String = sqlx::query_scalar(
        r#"
        INSERT INTO recipients (guid, owner_id, name, phone, email, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(owner_id, email) DO UPDATE SET
            name = excluded.name,
            phone = excluded.phone
        RETURNING guid
        "#,
    )
    .bind(&candidate)
    .bind(owner_id)
    .bind(&contact.name)
    .bind(&contact.phone)
    .bind(&contact.email)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(Error::from)
    .map_err(|e| {
        // The email key matched nothing but the phone belongs to someone else
        if e.is_unique_violation() {
            Error::Integrity(format!(
                "Phone {} already belongs to another recipient",
                contact.phone
            ))
        } else {
            e
        }
    })?;

    Ok(Upserted::from_returned(candidate, returned))
}

pub async fn find_recipient_for_owner(
    conn: &mut SqliteConnection,
    owner_id: &str,
    recipient_id: &str,
) -> Result<Option<Recipient>> {
    let row = sqlx::query(
        r#"
        SELECT guid, owner_id, name, phone, email, created_at
        FROM recipients
        WHERE guid = ? AND owner_id = ?
        "#,
    )
    .bind(recipient_id)
    .bind(owner_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|row| Recipient {
        id: row.get("guid"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        phone: row.get("phone"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }))
}

/// Phones and emails already taken under an owner
pub async fn taken_contacts(
    conn: &mut SqliteConnection,
    owner_id: &str,
) -> Result<(HashSet<String>, HashSet<String>)> {
    let rows = sqlx::query("SELECT phone, email FROM recipients WHERE owner_id = ?")
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;

    let mut phones = HashSet::with_capacity(rows.len());
    let mut emails = HashSet::with_capacity(rows.len());
    for row in rows {
        phones.insert(row.get("phone"));
        emails.insert(row.get("email"));
    }

    Ok((phones, emails))
}
