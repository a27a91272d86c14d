//! Remote identifier resolution
//!
//! Billing imports often carry a truncated or masked tax number. The remote
//! client registry holds the full one; this resolver maps a debtor identity
//! onto a remote client record.

use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use tracing::{debug, warn};

use crate::types::{is_plausible_identifier, DebtorIdentity, RemoteIdentity};

/// Resolves a (possibly partial) identity to a remote client record
///
/// Implementations never fail: errors are logged and reported as
/// unresolved.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, identity: &DebtorIdentity) -> Option<RemoteIdentity>;
}

/// Resolver over the remote `clients(id, name, identification)` table
pub struct SqlIdentityResolver {
    db: Pool<Sqlite>,
}

impl SqlIdentityResolver {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    async fn lookup_by_code(&self, code: &str) -> mdt_common::Result<Option<RemoteIdentity>> {
        let row: Option<(i64, String)> = sqlx::query_as(
            r#"
            SELECT id, CAST(identification AS TEXT)
            FROM clients
            WHERE identification = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|(id, identification)| RemoteIdentity { id, identification }))
    }

    async fn lookup_by_name_suffix(
        &self,
        name: &str,
        suffix: &str,
    ) -> mdt_common::Result<Option<RemoteIdentity>> {
        let row: Option<(i64, String)> = sqlx::query_as(
            r#"
            SELECT id, CAST(identification AS TEXT)
            FROM clients
            WHERE name = ? AND CAST(identification AS TEXT) LIKE ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(format!("%{}", suffix))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|(id, identification)| RemoteIdentity { id, identification }))
    }

    async fn try_resolve(&self, identity: &DebtorIdentity) -> mdt_common::Result<Option<RemoteIdentity>> {
        let mut found = None;
        if let Some(code) = identity.full_code() {
            found = self.lookup_by_code(code).await?;
        }

        // An empty suffix would match every client with this name
        let suffix = identity.identification_suffix();
        if found.is_none() && !suffix.is_empty() {
            found = self
                .lookup_by_name_suffix(identity.name.trim(), suffix)
                .await?;
        }

        Ok(found.and_then(|remote| {
            let identification = remote.identification.trim().to_string();
            if is_plausible_identifier(&identification) {
                Some(RemoteIdentity {
                    id: remote.id,
                    identification,
                })
            } else {
                debug!(
                    client_id = remote.id,
                    "Remote identification is not a usable tax number"
                );
                None
            }
        }))
    }
}

#[async_trait]
impl IdentityResolver for SqlIdentityResolver {
    async fn resolve(&self, identity: &DebtorIdentity) -> Option<RemoteIdentity> {
        match self.try_resolve(identity).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(
                    name = %identity.name,
                    error = %e,
                    "Remote identity lookup failed, treating as unresolved"
                );
                None
            }
        }
    }
}
