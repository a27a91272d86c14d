//! Phone cache queries
//!
//! Every save writes a batch of rows sharing one `batch_id`. Reads return
//! only the most recent batch for the key (highest row `id`), so a later
//! enrichment supersedes an earlier one without deleting it.

use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::types::DebtorIdentity;

/// One row of the `phone_records` table
#[derive(Debug, Clone, FromRow)]
pub struct PhoneRecord {
    pub id: i64,
    pub batch_id: String,
    pub client_id: Option<i64>,
    pub phone: Option<String>,
    pub has_number: bool,
    pub checked: bool,
}

/// Latest batch recorded for a remote client ID
pub async fn latest_batch_by_client(
    pool: &SqlitePool,
    client_id: i64,
) -> mdt_common::Result<Vec<PhoneRecord>> {
    let rows = sqlx::query_as::<_, PhoneRecord>(
        r#"
        SELECT id, batch_id, client_id, phone, has_number, checked
        FROM phone_records
        WHERE batch_id = (
            SELECT batch_id FROM phone_records
            WHERE client_id = ?
            ORDER BY id DESC
            LIMIT 1
        )
        ORDER BY id
        "#,
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Latest batch recorded for a (name, identification) pair
pub async fn latest_batch_by_identity(
    pool: &SqlitePool,
    identity: &DebtorIdentity,
) -> mdt_common::Result<Vec<PhoneRecord>> {
    let rows = sqlx::query_as::<_, PhoneRecord>(
        r#"
        SELECT id, batch_id, client_id, phone, has_number, checked
        FROM phone_records
        WHERE batch_id = (
            SELECT batch_id FROM phone_records
            WHERE name = ? AND identification = ?
            ORDER BY id DESC
            LIMIT 1
        )
        ORDER BY id
        "#,
    )
    .bind(identity.name.trim())
    .bind(identity.identification.trim())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Insert one batch in a single transaction
///
/// One row per phone; an empty slice writes a single "checked, no number"
/// row. Every row is marked `checked`. An incomplete identity is rejected
/// before anything is written.
pub async fn insert_batch(
    pool: &SqlitePool,
    client_id: Option<i64>,
    identity: &DebtorIdentity,
    phones: &[String],
) -> mdt_common::Result<Uuid> {
    if !identity.is_complete() {
        return Err(mdt_common::Error::IncompleteIdentity {
            name: identity.name.clone(),
            identification: identity.identification.clone(),
        });
    }

    let batch_id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    let entries: Vec<Option<&str>> = if phones.is_empty() {
        vec![None]
    } else {
        phones.iter().map(|p| Some(p.as_str())).collect()
    };

    for phone in entries {
        sqlx::query(
            r#"
            INSERT INTO phone_records (
                batch_id, client_id, name, identification, phone, has_number, checked, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, 1, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(batch_id.to_string())
        .bind(client_id)
        .bind(identity.name.trim())
        .bind(identity.identification.trim())
        .bind(phone)
        .bind(phone.is_some())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(batch_id)
}
