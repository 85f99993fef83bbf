use std::sync::Arc;

use chrono::Utc;

use super::token::{TokenGenerator, parse_token};
use crate::error::Result;
use crate::store::Store;

/// The identity provider collaborator: presented with a raw bearer token,
/// it yields the verified email the token was issued for, or `None` when
/// the token does not verify. Implementations must never treat a bad
/// token as an error; `Err` is reserved for provider-side failures.
pub trait IdentityProvider: Send + Sync {
    fn verify(&self, raw_token: &str) -> Result<Option<String>>;
}

/// Identity provider backed by the store's `identity_tokens` collection.
pub struct StoreIdentityProvider {
    store: Arc<dyn Store>,
    generator: TokenGenerator,
}

impl StoreIdentityProvider {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            generator: TokenGenerator::new(),
        }
    }
}

impl IdentityProvider for StoreIdentityProvider {
    fn verify(&self, raw_token: &str) -> Result<Option<String>> {
        let Ok((lookup, _secret)) = parse_token(raw_token) else {
            return Ok(None);
        };

        let Some(token) = self.store.get_identity_token_by_lookup(&lookup)? else {
            return Ok(None);
        };

        if !self.generator.verify(raw_token, &token.token_hash)? {
            return Ok(None);
        }

        if let Some(expires_at) = &token.expires_at {
            if expires_at < &Utc::now() {
                return Ok(None);
            }
        }

        if let Err(e) = self.store.update_identity_token_last_used(&token.id) {
            tracing::warn!("Failed to update token last_used_at: {e}");
        }

        Ok(Some(token.email))
    }
}
