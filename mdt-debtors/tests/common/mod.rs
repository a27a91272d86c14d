//! Shared test helpers: in-memory stores and call-counting mocks for the
//! remote resolver and the registry

#![allow(dead_code)]

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mdt_common::config::{InvalidIdentifierPolicy, DEFAULT_REGISTRY_TIMEOUT_MS};
use mdt_debtors::config::EnrichmentConfig;
use mdt_debtors::services::{
    IdentityResolver, PhoneCache, PhoneEnricher, RegistryError, RegistrySource, RegistrySubject,
};
use mdt_debtors::types::{DebtorIdentity, RemoteIdentity};

/// Local store with the service tables, single connection so the in-memory
/// database is shared by every query
pub async fn local_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    mdt_common::db::create_tables(&pool)
        .await
        .expect("Failed to create tables");
    pool
}

/// Resolver returning a fixed answer
pub struct MockResolver {
    answer: Option<RemoteIdentity>,
    pub calls: AtomicUsize,
}

impl MockResolver {
    pub fn resolving(id: i64, identification: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Some(RemoteIdentity {
                id,
                identification: identification.to_string(),
            }),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unresolved() -> Arc<Self> {
        Arc::new(Self {
            answer: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityResolver for MockResolver {
    async fn resolve(&self, _identity: &DebtorIdentity) -> Option<RemoteIdentity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// What the mock registry answers
#[derive(Clone)]
pub enum RegistryBehavior {
    Subject(serde_json::Value),
    NotFound,
    Timeout,
}

/// Registry returning a fixed answer and recording requested codes
pub struct MockRegistry {
    behavior: RegistryBehavior,
    pub calls: AtomicUsize,
    pub codes: std::sync::Mutex<Vec<String>>,
}

impl MockRegistry {
    pub fn new(behavior: RegistryBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            codes: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn with_phones(phones: &[&str]) -> Arc<Self> {
        Self::new(RegistryBehavior::Subject(
            serde_json::json!({ "contacts": { "tel": phones } }),
        ))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistrySource for MockRegistry {
    async fn fetch_subject(&self, code: &str) -> Result<Option<RegistrySubject>, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.codes.lock().unwrap().push(code.to_string());

        match &self.behavior {
            RegistryBehavior::Subject(value) => Ok(Some(
                serde_json::from_value(value.clone()).expect("valid subject fixture"),
            )),
            RegistryBehavior::NotFound => Ok(None),
            RegistryBehavior::Timeout => Err(RegistryError::Timeout(5000)),
        }
    }
}

/// Enrichment switched on, registry address unused by the mocks
pub fn enabled_config() -> EnrichmentConfig {
    EnrichmentConfig {
        remote_db_enabled: true,
        registry_base_url: "http://registry.invalid".to_string(),
        registry_timeout_ms: DEFAULT_REGISTRY_TIMEOUT_MS,
        registry_api_token: None,
        invalid_identifier_policy: InvalidIdentifierPolicy::default(),
    }
}

pub fn config_with_policy(policy: InvalidIdentifierPolicy) -> EnrichmentConfig {
    EnrichmentConfig {
        invalid_identifier_policy: policy,
        ..enabled_config()
    }
}

pub fn enricher(
    config: EnrichmentConfig,
    pool: &SqlitePool,
    resolver: Arc<MockResolver>,
    registry: Arc<MockRegistry>,
) -> PhoneEnricher {
    let resolver: Arc<dyn IdentityResolver> = resolver;
    let registry: Arc<dyn RegistrySource> = registry;
    PhoneEnricher::new(config, PhoneCache::new(pool.clone()), Some(resolver), registry)
}

/// Number of phone_records rows for a client
pub async fn rows_for_client(pool: &SqlitePool, client_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM phone_records WHERE client_id = ?")
        .bind(client_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Total number of phone_records rows
pub async fn total_rows(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM phone_records")
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Number of distinct writer calls (batches)
pub async fn batch_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(DISTINCT batch_id) FROM phone_records")
        .fetch_one(pool)
        .await
        .unwrap()
}
