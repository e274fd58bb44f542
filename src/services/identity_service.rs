use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::principal::Principal;

/// Resolves the acting principal for every mutating call. The engine
/// trusts the role this collaborator reports.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, subject: &str) -> Result<Principal>;
}

/// Fixed principal registry for tests and local development.
#[derive(Default)]
pub struct StaticIdentityProvider {
    principals: RwLock<HashMap<String, Principal>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, subject: impl Into<String>, principal: Principal) {
        if let Ok(mut principals) = self.principals.write() {
            principals.insert(subject.into(), principal);
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, subject: &str) -> Result<Principal> {
        self.principals
            .read()
            .map_err(|_| Error::Internal("identity registry lock poisoned".to_string()))?
            .get(subject)
            .cloned()
            .ok_or_else(|| Error::Forbidden(format!("unknown principal '{}'", subject)))
    }
}
