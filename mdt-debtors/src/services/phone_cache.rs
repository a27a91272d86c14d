//! Local phone cache
//!
//! Reads return what earlier enrichments found so the registry is only
//! consulted once per identity. Lookup failures are swallowed (fail open
//! toward re-checking). Write failures propagate.

use sqlx::{Pool, Sqlite};
use tracing::{debug, warn};

use crate::db::phone_records::{self, PhoneRecord};
use crate::types::{normalize_phones, DebtorIdentity};

/// Result of a cache lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalLookup {
    /// Phones or a `checked` marker exist: nothing more to do at this layer
    pub found: bool,
    pub phones: Vec<String>,
    pub checked: bool,
}

impl LocalLookup {
    pub fn not_found() -> Self {
        Self::default()
    }

    fn from_records(records: &[PhoneRecord]) -> Self {
        let checked = records.iter().any(|r| r.checked);
        let phones = normalize_phones(
            records
                .iter()
                .filter(|r| r.has_number)
                .filter_map(|r| r.phone.as_deref()),
        );

        Self {
            found: !phones.is_empty() || checked,
            phones,
            checked,
        }
    }
}

/// Counts reported by a save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub saved_phones: usize,
}

/// Phone cache over the local store
#[derive(Clone)]
pub struct PhoneCache {
    db: Pool<Sqlite>,
}

impl PhoneCache {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// Look up cached phones
    ///
    /// With a `client_id`, rows for that client are tried first and the
    /// identity is the fallback when there are none.
    pub async fn lookup(&self, client_id: Option<i64>, identity: &DebtorIdentity) -> LocalLookup {
        match self.try_lookup(client_id, identity).await {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!(
                    client_id,
                    name = %identity.name,
                    error = %e,
                    "Phone cache lookup failed, treating as not found"
                );
                LocalLookup::not_found()
            }
        }
    }

    async fn try_lookup(
        &self,
        client_id: Option<i64>,
        identity: &DebtorIdentity,
    ) -> mdt_common::Result<LocalLookup> {
        if let Some(client_id) = client_id {
            let records = phone_records::latest_batch_by_client(&self.db, client_id).await?;
            if !records.is_empty() {
                debug!(client_id, rows = records.len(), "Phone cache hit by client_id");
                return Ok(LocalLookup::from_records(&records));
            }
        }

        let records = phone_records::latest_batch_by_identity(&self.db, identity).await?;
        debug!(rows = records.len(), "Phone cache lookup by identity");
        Ok(LocalLookup::from_records(&records))
    }

    /// Persist an enrichment result and mark the identity checked
    ///
    /// `None` or an empty list records "checked, no number".
    pub async fn save(
        &self,
        client_id: Option<i64>,
        identity: &DebtorIdentity,
        phones: Option<&[String]>,
    ) -> mdt_common::Result<SaveOutcome> {
        let phones = normalize_phones(phones.unwrap_or_default());
        let batch_id = phone_records::insert_batch(&self.db, client_id, identity, &phones).await?;

        debug!(
            client_id,
            batch_id = %batch_id,
            saved_phones = phones.len(),
            "Phone cache updated"
        );

        Ok(SaveOutcome {
            saved_phones: phones.len(),
        })
    }
}
