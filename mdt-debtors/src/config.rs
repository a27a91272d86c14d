//! Enrichment configuration
//!
//! Built once from the bootstrap `TomlConfig` and handed to the
//! orchestrator, so nothing in the pipeline reads the environment directly.

use mdt_common::config::{InvalidIdentifierPolicy, TomlConfig};

/// Settings consumed by `PhoneEnricher`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentConfig {
    /// Remote identity database configured; enrichment is off without it
    pub remote_db_enabled: bool,
    pub registry_base_url: String,
    pub registry_timeout_ms: u64,
    pub registry_api_token: Option<String>,
    pub invalid_identifier_policy: InvalidIdentifierPolicy,
}

impl EnrichmentConfig {
    pub fn from_toml(config: &TomlConfig) -> Self {
        Self {
            remote_db_enabled: config.remote_db_enabled(),
            registry_base_url: config.registry.base_url.clone(),
            registry_timeout_ms: config.registry.timeout_ms,
            registry_api_token: config.registry.api_token.clone(),
            invalid_identifier_policy: config.registry.invalid_identifier_policy,
        }
    }
}
