//! Contact-to-identity resolution.
//!
//! A resolver maps a contact reference (typically a phone number) to the
//! stable conversational identity the transport addresses. Real resolvers sit
//! behind provider APIs and may be rate limited; they report the mandated
//! wait through `ResolveError::RateLimited`.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::error::{ConfigError, ResolveError};

/// Resolves contact references to candidate identities.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, contact_ref: &str) -> Result<String, ResolveError>;
}

/// Resolver backed by a fixed contact map.
#[derive(Debug, Default)]
pub struct StaticResolver {
    contacts: HashMap<String, String>,
}

impl StaticResolver {
    pub fn new(contacts: HashMap<String, String>) -> Self {
        Self { contacts }
    }

    /// Load a contact map from a JSON object file: `{"+1555...": "42", ...}`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let contacts: HashMap<String, String> =
            serde_json::from_str(&text).map_err(|e| ConfigError::InvalidValue {
                key: path.display().to_string(),
                message: format!("contacts file must be a JSON string map: {e}"),
            })?;
        Ok(Self { contacts })
    }

    pub fn insert(&mut self, contact_ref: impl Into<String>, candidate_id: impl Into<String>) {
        self.contacts.insert(contact_ref.into(), candidate_id.into());
    }
}

#[async_trait]
impl IdentityResolver for StaticResolver {
    async fn resolve(&self, contact_ref: &str) -> Result<String, ResolveError> {
        self.contacts
            .get(contact_ref)
            .cloned()
            .ok_or_else(|| ResolveError::Unknown {
                contact: contact_ref.to_string(),
            })
    }
}

/// Resolver that uses the contact reference itself as the identity.
/// Useful for local runs where the transport addresses contacts directly.
#[derive(Debug, Default)]
pub struct PassthroughResolver;

#[async_trait]
impl IdentityResolver for PassthroughResolver {
    async fn resolve(&self, contact_ref: &str) -> Result<String, ResolveError> {
        Ok(contact_ref.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_resolver_maps_known_contacts() {
        let mut resolver = StaticResolver::default();
        resolver.insert("+15551234567", "42");

        assert_eq!(resolver.resolve("+15551234567").await.unwrap(), "42");
        assert!(matches!(
            resolver.resolve("+15550000000").await,
            Err(ResolveError::Unknown { .. })
        ));
    }

    #[tokio::test]
    async fn passthrough_returns_contact_as_identity() {
        let resolver = PassthroughResolver;
        assert_eq!(resolver.resolve("abc").await.unwrap(), "abc");
    }
}
