//! Core types shared by the enrichment pipeline and the API
//!
//! Identifier checks live here because both the remote resolver and the
//! registry client apply them, with different strictness.

use serde::{Deserialize, Serialize};

// ============================================================================
// Identity
// ============================================================================

/// Name and tax identification number of a debtor
///
/// The identification may be truncated or masked (e.g. `****567890`) as it
/// arrives from billing imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtorIdentity {
    pub name: String,
    pub identification: String,
}

impl DebtorIdentity {
    pub fn new(name: impl Into<String>, identification: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identification: identification.into(),
        }
    }

    /// Both fields present and non-blank
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.identification.trim().is_empty()
    }

    /// The identification itself when it is an unmasked code long enough to
    /// look up directly
    pub fn full_code(&self) -> Option<&str> {
        let code = self.identification.trim();
        is_plausible_identifier(code).then_some(code)
    }

    /// Trailing run of digits, the only part of a masked code known to be in
    /// place (`12****90` gives `90`)
    pub fn identification_suffix(&self) -> &str {
        let code = self.identification.trim();
        let masked = code.trim_end_matches(|c: char| c.is_ascii_digit());
        &code[masked.len()..]
    }
}

// ============================================================================
// Identifier validation
// ============================================================================

/// Shortest accepted identifier (EDRPOU company code)
pub const MIN_IDENTIFIER_LEN: usize = 8;
/// Longest accepted identifier (RNOKPP personal tax number)
pub const MAX_IDENTIFIER_LEN: usize = 10;

/// Numeric and at least 8 characters: good enough to treat as resolved
pub fn is_plausible_identifier(code: &str) -> bool {
    code.len() >= MIN_IDENTIFIER_LEN && code.chars().all(|c| c.is_ascii_digit())
}

/// 8 to 10 ASCII digits: the format the registry accepts
pub fn is_registry_code(code: &str) -> bool {
    (MIN_IDENTIFIER_LEN..=MAX_IDENTIFIER_LEN).contains(&code.len())
        && code.chars().all(|c| c.is_ascii_digit())
}

// ============================================================================
// Remote identity
// ============================================================================

/// Full identifier resolved from the remote client registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIdentity {
    /// Remote client key, used locally as `client_id`
    pub id: i64,
    pub identification: String,
}

// ============================================================================
// Enrichment result
// ============================================================================

/// Phone data to merge into a debtor response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneEnrichment {
    /// `None` when no phone is known (or enrichment failed)
    pub phone: Option<Vec<String>>,
    pub phone_count: usize,
}

impl PhoneEnrichment {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_phones(phones: Vec<String>) -> Self {
        if phones.is_empty() {
            return Self::none();
        }
        Self {
            phone_count: phones.len(),
            phone: Some(phones),
        }
    }
}

/// Trim, drop blanks and de-duplicate while keeping first-seen order
pub fn normalize_phones<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut phones: Vec<String> = Vec::new();
    for phone in raw {
        let phone = phone.as_ref().trim();
        if !phone.is_empty() && !phones.iter().any(|p| p == phone) {
            phones.push(phone.to_string());
        }
    }
    phones
}
