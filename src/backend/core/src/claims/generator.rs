//! The layered claims generator.
//!
//! A statically-ordered list of claim-extension layers composed at process
//! start. Generation folds the layers in order: each receives the claims
//! accumulated so far and returns an extended object, adding its own keys
//! and never overwriting siblings added by other layers. Ordering is
//! configuration-driven.
//!
//! Layers above the base return the accumulated claims unchanged for super
//! users: permission is granted wholesale elsewhere, and the detail would
//! be unused and expensive to compute.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::claims::payload::AccessClaims;
use crate::error::Result;
use crate::store::UserProfile;

/// One claim-extension layer.
#[async_trait]
pub trait ClaimsLayer: Send + Sync {
    /// Stable layer name, used in configuration and logs.
    fn name(&self) -> &'static str;

    /// Extend the accumulated claims for the user.
    async fn extend(&self, user: &UserProfile, claims: AccessClaims) -> Result<AccessClaims>;
}

/// The ordered claims generation chain. Built once at startup, immutable
/// afterwards; invoked at login and token refresh, never per request.
pub struct ClaimsGenerator {
    layers: Vec<Arc<dyn ClaimsLayer>>,
}

impl ClaimsGenerator {
    pub fn builder() -> ClaimsGeneratorBuilder {
        ClaimsGeneratorBuilder { layers: Vec::new() }
    }

    /// The configured layers, in extension order.
    pub fn layers(&self) -> &[Arc<dyn ClaimsLayer>] {
        &self.layers
    }

    /// Generate the full claims payload for a user.
    ///
    /// Layers run sequentially: each must see its predecessors' output
    /// before extending. Errors propagate — a failed layer fails the login,
    /// it is not retried or skipped.
    pub async fn generate(&self, user: &UserProfile) -> Result<AccessClaims> {
        let mut claims = AccessClaims::for_subject(user.id.as_str(), user.is_super_user);

        for layer in &self.layers {
            claims = layer.extend(user, claims).await?;
            debug!(
                layer = layer.name(),
                user_id = %user.id,
                webservices = claims.webservices.len(),
                "claims layer applied"
            );
        }

        Ok(claims)
    }
}

/// Builder for the claims generator.
pub struct ClaimsGeneratorBuilder {
    layers: Vec<Arc<dyn ClaimsLayer>>,
}

impl ClaimsGeneratorBuilder {
    /// Append a layer. Order of calls is extension order.
    pub fn layer(mut self, layer: Arc<dyn ClaimsLayer>) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn build(self) -> ClaimsGenerator {
        ClaimsGenerator {
            layers: self.layers,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::decision::UserId;
    use crate::claims::payload::WebserviceAccess;
    use crate::registry::webservice::WebserviceId;

    struct GrantLayer(&'static str);

    #[async_trait]
    impl ClaimsLayer for GrantLayer {
        fn name(&self) -> &'static str {
            "grant"
        }

        async fn extend(
            &self,
            _user: &UserProfile,
            mut claims: AccessClaims,
        ) -> Result<AccessClaims> {
            claims
                .webservices
                .insert(WebserviceId::new(self.0), WebserviceAccess::Full);
            Ok(claims)
        }
    }

    fn profile(id: &str, is_super_user: bool) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            login: id.to_string(),
            is_super_user,
            enabled: true,
            client_id: None,
        }
    }

    #[tokio::test]
    async fn test_layers_fold_in_order() {
        let generator = ClaimsGenerator::builder()
            .layer(Arc::new(GrantLayer("a")))
            .layer(Arc::new(GrantLayer("b")))
            .build();

        let claims = generator.generate(&profile("u1", false)).await.unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.webservices.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_generator_produces_minimal_claims() {
        let generator = ClaimsGenerator::builder().build();
        let claims = generator.generate(&profile("u1", true)).await.unwrap();

        assert!(claims.is_super_user);
        assert!(claims.webservices.is_empty());
        assert!(claims.organizations.is_none());
        assert!(claims.subscriptions.is_none());
    }
}
