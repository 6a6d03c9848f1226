//! Identity resolution boundary.
//!
//! Credential issuance and verification live outside this system; the
//! service only consumes the resolved result. The transport extracts
//! whatever credential it carries (a bearer token) and asks the resolver
//! for the caller behind it.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use snag_core::{Caller, Error, Result};

/// Resolves an opaque credential to an authenticated caller.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve a credential. Fails with `Unauthorized` when the
    /// credential is unknown, expired, or malformed.
    async fn resolve(&self, credential: &str) -> Result<Caller>;
}

/// Token-table resolver for development and tests.
///
/// Holds an explicit token-to-caller map; nothing is ever resolved
/// implicitly. Production deployments plug a real verifier in behind
/// [`IdentityResolver`] instead.
#[derive(Debug, Default)]
pub struct StaticTokenResolver {
    tokens: RwLock<HashMap<String, Caller>>,
}

impl StaticTokenResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a caller.
    pub fn insert(&self, token: impl Into<String>, caller: Caller) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), caller);
    }
}

#[async_trait]
impl IdentityResolver for StaticTokenResolver {
    async fn resolve(&self, credential: &str) -> Result<Caller> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(credential)
            .cloned()
            .ok_or_else(|| Error::Unauthorized("unknown credential".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snag_core::{Role, RoleSet, UserId};

    #[tokio::test]
    async fn test_known_token_resolves() {
        let resolver = StaticTokenResolver::new();
        let caller = Caller::new(UserId::new(), RoleSet::new([Role::Engineer]));
        resolver.insert("t-1", caller.clone());

        let resolved = resolver.resolve("t-1").await.unwrap();
        assert_eq!(resolved.id, caller.id);
        assert_eq!(resolved.roles, caller.roles);
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let resolver = StaticTokenResolver::new();
        let err = resolver.resolve("nope").await.unwrap_err();
        assert_eq!(err.kind(), "unauthorized");
    }
}
