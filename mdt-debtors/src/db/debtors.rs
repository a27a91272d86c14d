//! Debtor queries (read-only)

use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

use crate::types::DebtorIdentity;

/// Debtor record with balances per debt category
#[derive(Debug, Clone, Serialize)]
pub struct Debtor {
    pub id: i64,
    pub name: String,
    pub identification: String,
    pub debts: BTreeMap<String, f64>,
}

impl Debtor {
    pub fn identity(&self) -> DebtorIdentity {
        DebtorIdentity::new(self.name.clone(), self.identification.clone())
    }
}

/// Load debtor by ID, including debt balances
pub async fn load_debtor(pool: &SqlitePool, id: i64) -> mdt_common::Result<Option<Debtor>> {
    let row = sqlx::query("SELECT id, name, identification FROM debtors WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let debts: Vec<(String, f64)> = sqlx::query_as(
        "SELECT category, amount FROM debtor_debts WHERE debtor_id = ? ORDER BY category",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(Debtor {
        id: row.get("id"),
        name: row.get("name"),
        identification: row.get("identification"),
        debts: debts.into_iter().collect(),
    }))
}
