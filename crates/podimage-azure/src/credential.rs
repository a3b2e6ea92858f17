//! Bearer tokens for ARM
//!
//! Discovery, acquisition and caching of tokens are left to
//! `azure_identity`. [`TokenProvider`] is the narrow seam the ARM client
//! calls, so tests can hand it a fixed token.

use crate::error::Result;
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_identity::DefaultAzureCredential;
use std::sync::Arc;

/// OAuth scope for an ARM endpoint, e.g. `https://management.azure.com/.default`
pub fn arm_scope(endpoint: &str) -> String {
    format!("{}/.default", endpoint.trim_end_matches('/'))
}

/// Source of bearer tokens for a given scope
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self, scope: &str) -> Result<String>;
}

/// Token provider backed by an `azure_identity` credential
pub struct IdentityCredential {
    credential: Arc<dyn TokenCredential>,
}

impl IdentityCredential {
    pub fn new(credential: Arc<dyn TokenCredential>) -> Self {
        Self { credential }
    }

    /// The ambient credential chain: environment, workload identity,
    /// managed identity, then the Azure CLI
    pub fn from_default_chain() -> Result<Self> {
        let credential = DefaultAzureCredential::new()?;
        Ok(Self::new(credential))
    }
}

#[async_trait]
impl TokenProvider for IdentityCredential {
    async fn bearer_token(&self, scope: &str) -> Result<String> {
        tracing::debug!("Requesting token for {}", scope);
        let token = self.credential.get_token(&[scope]).await?;
        Ok(token.token.secret().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_follows_endpoint() {
        assert_eq!(
            arm_scope("https://management.azure.com"),
            "https://management.azure.com/.default"
        );
        assert_eq!(
            arm_scope("https://management.usgovcloudapi.net/"),
            "https://management.usgovcloudapi.net/.default"
        );
    }
}
