//! Base claims layer: the webservices any connected user can reach.
//!
//! Derived entirely from the webservice registry:
//! - open public webservices -> full access
//! - CONNECTED access level -> full access
//! - OWNER access level (without CONNECTED) -> owner-filtered access
//!
//! Runs for every user, super users included; this is the floor the other
//! layers build on.

use async_trait::async_trait;
use std::sync::Arc;

use crate::claims::generator::ClaimsLayer;
use crate::claims::payload::{AccessClaims, WebserviceAccess};
use crate::error::Result;
use crate::registry::webservice::{AccessLevel, PublicType, WebserviceRegistry};
use crate::store::UserProfile;

pub struct BaseClaimsLayer {
    registry: Arc<WebserviceRegistry>,
}

impl BaseClaimsLayer {
    pub fn new(registry: Arc<WebserviceRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ClaimsLayer for BaseClaimsLayer {
    fn name(&self) -> &'static str {
        "base"
    }

    async fn extend(&self, _user: &UserProfile, mut claims: AccessClaims) -> Result<AccessClaims> {
        for webservice in self.registry.iter() {
            if !webservice.enabled {
                continue;
            }

            let access = if webservice.public_type == Some(PublicType::Open) {
                Some(WebserviceAccess::Full)
            } else if webservice.has_level(AccessLevel::Connected) {
                Some(WebserviceAccess::Full)
            } else if webservice.has_level(AccessLevel::Owner) {
                Some(WebserviceAccess::Owner)
            } else {
                None
            };

            if let Some(access) = access {
                claims.webservices.insert(webservice.id.clone(), access);
            }
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::decision::UserId;
    use crate::registry::webservice::{WebserviceDescriptor, WebserviceId};

    fn profile() -> UserProfile {
        UserProfile {
            id: UserId::new("u1"),
            login: "alice".into(),
            is_super_user: false,
            enabled: true,
            client_id: None,
        }
    }

    fn registry() -> Arc<WebserviceRegistry> {
        WebserviceRegistry::builder()
            .register(WebserviceDescriptor::new("signup").public(PublicType::Open))
            .register(WebserviceDescriptor::new("login").public(PublicType::DisconnectedOnly))
            .register(WebserviceDescriptor::new("me").access_level(AccessLevel::Connected))
            .register(WebserviceDescriptor::new("notes").access_level(AccessLevel::Owner))
            .register(
                WebserviceDescriptor::new("both")
                    .access_level(AccessLevel::Connected)
                    .access_level(AccessLevel::Owner),
            )
            .register(WebserviceDescriptor::new("org_only").access_level(AccessLevel::OrganizationRole))
            .register(WebserviceDescriptor::new("off").access_level(AccessLevel::Connected).disabled())
            .finalize()
    }

    #[tokio::test]
    async fn test_base_webservice_access_types() {
        let layer = BaseClaimsLayer::new(registry());
        let claims = layer
            .extend(&profile(), AccessClaims::for_subject("u1", false))
            .await
            .unwrap();

        assert_eq!(
            claims.webservice_access(&WebserviceId::new("signup")),
            Some(WebserviceAccess::Full)
        );
        assert_eq!(
            claims.webservice_access(&WebserviceId::new("me")),
            Some(WebserviceAccess::Full)
        );
        assert_eq!(
            claims.webservice_access(&WebserviceId::new("notes")),
            Some(WebserviceAccess::Owner)
        );
        // CONNECTED beats OWNER when both are declared.
        assert_eq!(
            claims.webservice_access(&WebserviceId::new("both")),
            Some(WebserviceAccess::Full)
        );
    }

    #[tokio::test]
    async fn test_excluded_webservices() {
        let layer = BaseClaimsLayer::new(registry());
        let claims = layer
            .extend(&profile(), AccessClaims::for_subject("u1", false))
            .await
            .unwrap();

        // Disconnected-only public endpoints are not usable while connected.
        assert!(claims.webservice_access(&WebserviceId::new("login")).is_none());
        // Organization-level webservices come from the organization layer.
        assert!(claims.webservice_access(&WebserviceId::new("org_only")).is_none());
        // Disabled webservices never appear.
        assert!(claims.webservice_access(&WebserviceId::new("off")).is_none());
    }
}
