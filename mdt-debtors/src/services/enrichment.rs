//! Phone enrichment orchestrator
//!
//! Runs the lookup chain for one debtor as an explicit state machine:
//!
//! ```text
//! Validate -> CheckRemoteConfigured -> LookupByIdentity -> ResolveIdentity
//!          -> ValidateResolved -> LookupByClient -> FetchRegistry -> Done
//! ```
//!
//! Every state can exit early to `Done`. Each step runs only after the
//! previous one finished; there is no fan-out and no transaction spanning
//! the read and the final write.
//!
//! Once an identity has been written as `checked`, later runs stop at
//! `LookupByIdentity` and never reach the registry again.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use mdt_common::config::InvalidIdentifierPolicy;

use crate::config::EnrichmentConfig;
use crate::services::identity_resolver::IdentityResolver;
use crate::services::phone_cache::{LocalLookup, PhoneCache};
use crate::services::registry_client::{RegistryError, RegistrySource};
use crate::types::{is_registry_code, DebtorIdentity, PhoneEnrichment, RemoteIdentity};

/// Errors a step can raise; all of them end in `EnrichOutcome::Failed`
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Registry failure: {0}")]
    Registry(#[from] RegistryError),

    #[error("Phone cache write failed: {0}")]
    Storage(#[from] mdt_common::Error),
}

/// Pipeline position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichState {
    Validate,
    CheckRemoteConfigured,
    LookupByIdentity,
    ResolveIdentity,
    ValidateResolved(RemoteIdentity),
    LookupByClient(RemoteIdentity),
    FetchRegistry(RemoteIdentity),
    Done(EnrichOutcome),
}

impl EnrichState {
    pub fn name(&self) -> &'static str {
        match self {
            EnrichState::Validate => "validate",
            EnrichState::CheckRemoteConfigured => "check_remote_configured",
            EnrichState::LookupByIdentity => "lookup_by_identity",
            EnrichState::ResolveIdentity => "resolve_identity",
            EnrichState::ValidateResolved(_) => "validate_resolved",
            EnrichState::LookupByClient(_) => "lookup_by_client",
            EnrichState::FetchRegistry(_) => "fetch_registry",
            EnrichState::Done(_) => "done",
        }
    }
}

/// Terminal result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// Name or identification missing; nothing written
    InvalidInput,
    /// Remote identity database not configured; nothing written
    Disabled,
    /// Phones already in the local cache
    CachedPhones(Vec<String>),
    /// Already checked, no phone known
    CachedNoPhone,
    /// Remote store has no matching client; marked checked
    Unresolved,
    /// Remote identifier is not a registry code; written only under
    /// `InvalidIdentifierPolicy::MarkChecked`
    InvalidResolvedIdentifier { marked_checked: bool },
    /// Registry has no subject; marked checked
    RegistryNotFound,
    /// Registry returned phones; saved
    RegistryPhones(Vec<String>),
    /// Registry subject has no phone; marked checked
    RegistryNoPhone,
    /// A step failed; nothing is reported to the caller
    Failed(String),
}

impl From<&EnrichOutcome> for PhoneEnrichment {
    fn from(outcome: &EnrichOutcome) -> Self {
        match outcome {
            EnrichOutcome::CachedPhones(phones) | EnrichOutcome::RegistryPhones(phones) => {
                PhoneEnrichment::with_phones(phones.clone())
            }
            _ => PhoneEnrichment::none(),
        }
    }
}

/// Phone enrichment orchestrator
pub struct PhoneEnricher {
    config: EnrichmentConfig,
    cache: PhoneCache,
    resolver: Option<Arc<dyn IdentityResolver>>,
    registry: Arc<dyn RegistrySource>,
}

impl PhoneEnricher {
    pub fn new(
        config: EnrichmentConfig,
        cache: PhoneCache,
        resolver: Option<Arc<dyn IdentityResolver>>,
        registry: Arc<dyn RegistrySource>,
    ) -> Self {
        Self {
            config,
            cache,
            resolver,
            registry,
        }
    }

    /// Remote database configured and a resolver available
    pub fn is_enabled(&self) -> bool {
        self.config.remote_db_enabled && self.resolver.is_some()
    }

    /// Enrich one debtor identity
    ///
    /// Never fails. On any error the result is "no phone".
    pub async fn enrich(&self, identity: &DebtorIdentity) -> PhoneEnrichment {
        let outcome = self.run(identity).await;
        PhoneEnrichment::from(&outcome)
    }

    /// Drive the state machine to its terminal outcome
    pub async fn run(&self, identity: &DebtorIdentity) -> EnrichOutcome {
        let mut state = EnrichState::Validate;

        loop {
            let from = state.name();
            state = match state {
                EnrichState::Done(outcome) => return outcome,
                current => match self.step(identity, current).await {
                    Ok(next) => next,
                    Err(e) => {
                        error!(
                            name = %identity.name,
                            state = from,
                            error = %e,
                            "Phone enrichment failed"
                        );
                        EnrichState::Done(EnrichOutcome::Failed(e.to_string()))
                    }
                },
            };
            debug!(from, to = state.name(), "Enrichment transition");
        }
    }

    /// Single transition
    pub async fn step(
        &self,
        identity: &DebtorIdentity,
        state: EnrichState,
    ) -> Result<EnrichState, EnrichError> {
        let next = match state {
            EnrichState::Validate => {
                if identity.is_complete() {
                    EnrichState::CheckRemoteConfigured
                } else {
                    warn!(
                        name = %identity.name,
                        identification = %identity.identification,
                        "Skipping phone enrichment: name or identification missing"
                    );
                    EnrichState::Done(EnrichOutcome::InvalidInput)
                }
            }

            EnrichState::CheckRemoteConfigured => {
                if self.is_enabled() {
                    EnrichState::LookupByIdentity
                } else {
                    debug!("Remote identity database not configured, enrichment disabled");
                    EnrichState::Done(EnrichOutcome::Disabled)
                }
            }

            EnrichState::LookupByIdentity => {
                let lookup = self.cache.lookup(None, identity).await;
                cached_exit(lookup).unwrap_or(EnrichState::ResolveIdentity)
            }

            EnrichState::ResolveIdentity => {
                let Some(resolver) = &self.resolver else {
                    return Ok(EnrichState::Done(EnrichOutcome::Disabled));
                };

                match resolver.resolve(identity).await {
                    Some(remote) => EnrichState::ValidateResolved(remote),
                    None => {
                        self.cache.save(None, identity, None).await?;
                        info!(name = %identity.name, "Identity unresolved, marked checked");
                        EnrichState::Done(EnrichOutcome::Unresolved)
                    }
                }
            }

            EnrichState::ValidateResolved(remote) => {
                if is_registry_code(&remote.identification) {
                    EnrichState::LookupByClient(remote)
                } else {
                    self.invalid_resolved_identifier(identity, &remote).await?
                }
            }

            EnrichState::LookupByClient(remote) => {
                let lookup = self.cache.lookup(Some(remote.id), identity).await;
                cached_exit(lookup).unwrap_or(EnrichState::FetchRegistry(remote))
            }

            EnrichState::FetchRegistry(remote) => self.fetch_registry(identity, &remote).await?,

            done @ EnrichState::Done(_) => done,
        };

        Ok(next)
    }

    async fn invalid_resolved_identifier(
        &self,
        identity: &DebtorIdentity,
        remote: &RemoteIdentity,
    ) -> Result<EnrichState, EnrichError> {
        match self.config.invalid_identifier_policy {
            InvalidIdentifierPolicy::LeaveUnchecked => {
                warn!(
                    client_id = remote.id,
                    "Resolved identifier is not a registry code, leaving unchecked"
                );
                Ok(EnrichState::Done(EnrichOutcome::InvalidResolvedIdentifier {
                    marked_checked: false,
                }))
            }
            InvalidIdentifierPolicy::MarkChecked => {
                self.cache.save(Some(remote.id), identity, None).await?;
                warn!(
                    client_id = remote.id,
                    "Resolved identifier is not a registry code, marked checked"
                );
                Ok(EnrichState::Done(EnrichOutcome::InvalidResolvedIdentifier {
                    marked_checked: true,
                }))
            }
        }
    }

    async fn fetch_registry(
        &self,
        identity: &DebtorIdentity,
        remote: &RemoteIdentity,
    ) -> Result<EnrichState, EnrichError> {
        let Some(subject) = self.registry.fetch_subject(&remote.identification).await? else {
            self.cache.save(Some(remote.id), identity, None).await?;
            return Ok(EnrichState::Done(EnrichOutcome::RegistryNotFound));
        };

        let phones = subject.phones();
        if phones.is_empty() {
            self.cache.save(Some(remote.id), identity, None).await?;
            return Ok(EnrichState::Done(EnrichOutcome::RegistryNoPhone));
        }

        let saved = self.cache.save(Some(remote.id), identity, Some(&phones)).await?;
        info!(
            client_id = remote.id,
            saved_phones = saved.saved_phones,
            "Registry phones saved"
        );

        Ok(EnrichState::Done(EnrichOutcome::RegistryPhones(phones)))
    }
}

/// Terminal state for a cache hit, `None` to keep going
fn cached_exit(lookup: LocalLookup) -> Option<EnrichState> {
    if !lookup.found {
        return None;
    }

    if lookup.phones.is_empty() {
        Some(EnrichState::Done(EnrichOutcome::CachedNoPhone))
    } else {
        Some(EnrichState::Done(EnrichOutcome::CachedPhones(lookup.phones)))
    }
}
