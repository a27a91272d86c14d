//! External registry (EDR) client
//!
//! Fetches subject contact data by tax number. Unlike the local and remote
//! database lookups, failures here propagate: a registry outage must not be
//! recorded as "checked, no phone".

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::types::{is_registry_code, normalize_phones};

const USER_AGENT: &str = concat!("mdt-debtors/", env!("CARGO_PKG_VERSION"));

/// Registry client errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry request timed out after {0} ms")]
    Timeout(u64),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// A phone field as the registry sends it: one string, a list, or something
/// unusable that is ignored
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PhoneField {
    One(String),
    Many(Vec<String>),
    Other(serde_json::Value),
}

impl PhoneField {
    fn values(&self) -> Vec<&str> {
        match self {
            PhoneField::One(phone) => vec![phone.as_str()],
            PhoneField::Many(phones) => phones.iter().map(String::as_str).collect(),
            PhoneField::Other(_) => Vec::new(),
        }
    }
}

/// `contacts` object of a subject
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryContacts {
    #[serde(default)]
    pub tel: Option<PhoneField>,
}

/// Entry of the alternate `contact` array
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryContactEntry {
    #[serde(default)]
    pub phone: Option<PhoneField>,
    #[serde(default)]
    pub tel: Option<PhoneField>,
}

/// Registry subject (organization or person)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrySubject {
    #[serde(default)]
    pub contacts: Option<RegistryContacts>,
    #[serde(default)]
    pub contact: Option<Vec<RegistryContactEntry>>,
}

impl RegistrySubject {
    /// All phones of the subject, trimmed and de-duplicated
    ///
    /// An empty list means the subject exists but publishes no phone.
    pub fn phones(&self) -> Vec<String> {
        let mut raw: Vec<&str> = Vec::new();

        if let Some(tel) = self.contacts.as_ref().and_then(|c| c.tel.as_ref()) {
            raw.extend(tel.values());
        }

        for entry in self.contact.iter().flatten() {
            for field in [&entry.phone, &entry.tel].into_iter().flatten() {
                raw.extend(field.values());
            }
        }

        normalize_phones(raw)
    }
}

/// Source of registry subjects
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// First subject registered under `code`
    ///
    /// Returns `Ok(None)` without a request when `code` is not 8-10 digits,
    /// and `Ok(None)` when the registry has no such subject.
    async fn fetch_subject(&self, code: &str) -> Result<Option<RegistrySubject>, RegistryError>;
}

/// HTTP client for the registry `GET /subjects?code=&limit=` endpoint
pub struct EdrClient {
    http_client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    timeout_ms: u64,
}

impl EdrClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout_ms: u64,
        api_token: Option<String>,
    ) -> Result<Self, RegistryError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| RegistryError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
            timeout_ms,
        })
    }

    async fn request(&self, code: &str) -> Result<Option<RegistrySubject>, RegistryError> {
        let url = format!("{}/subjects", self.base_url);

        debug!(code = %code, url = %url, "Querying registry");

        let mut request = self
            .http_client
            .get(&url)
            .query(&[("code", code), ("limit", "1")]);

        if let Some(token) = &self.api_token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Token {}", token));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RegistryError::Timeout(self.timeout_ms)
            } else {
                RegistryError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RegistryError::ApiError(status.as_u16(), error_text));
        }

        let subjects: Vec<RegistrySubject> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RegistryError::Timeout(self.timeout_ms)
            } else {
                RegistryError::ParseError(e.to_string())
            }
        })?;

        Ok(subjects.into_iter().next())
    }
}

#[async_trait]
impl RegistrySource for EdrClient {
    async fn fetch_subject(&self, code: &str) -> Result<Option<RegistrySubject>, RegistryError> {
        if !is_registry_code(code) {
            debug!(code = %code, "Not a registry code, skipping request");
            return Ok(None);
        }

        match self.request(code).await {
            Ok(Some(subject)) => {
                info!(code = %code, phones = subject.phones().len(), "Registry subject found");
                Ok(Some(subject))
            }
            Ok(None) => {
                info!(code = %code, "Registry has no subject for code");
                Ok(None)
            }
            Err(e) => {
                error!(code = %code, error = %e, "Registry request failed");
                Err(e)
            }
        }
    }
}
