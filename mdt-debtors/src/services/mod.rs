//! Phone enrichment pipeline
//!
//! Leaves first:
//! - `phone_cache`: local lookup and persistence writer
//! - `identity_resolver`: remote full-identifier lookup
//! - `registry_client`: external registry (EDR) HTTP client
//! - `enrichment`: orchestrator state machine over the three above

pub mod enrichment;
pub mod identity_resolver;
pub mod phone_cache;
pub mod registry_client;

pub use enrichment::{EnrichError, EnrichOutcome, EnrichState, PhoneEnricher};
pub use identity_resolver::{IdentityResolver, SqlIdentityResolver};
pub use phone_cache::{LocalLookup, PhoneCache, SaveOutcome};
pub use registry_client::{EdrClient, RegistryError, RegistrySource, RegistrySubject};
