//! Organization claims layer: the per-organization webservice map.
//!
//! Two membership sources are unioned per organization:
//! - **ownership**: owners receive every enabled webservice declaring the
//!   ORGANIZATION_ROLE access level, unconditionally;
//! - **role assignment**: non-owner members receive only the webservices
//!   reachable through their assigned roles.
//!
//! When a user is both an owner and a role holder of the same organization,
//! the owner's broader set wins; role data never narrows what ownership
//! already grants.
//!
//! With a license gate installed, licensed webservices are filtered on both
//! branches: owners need their client to hold a subscription, members need
//! a seat on it.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::access::decision::{ClientId, OrgKind};
use crate::claims::generator::ClaimsLayer;
use crate::claims::layers::licensing::LicenseGate;
use crate::claims::payload::{AccessClaims, OrganizationClaim};
use crate::error::Result;
use crate::registry::webservice::{AccessLevel, WebserviceId, WebserviceRegistry};
use crate::store::{OrganizationStore, UserProfile};

pub struct OrganizationClaimsLayer {
    organizations: Arc<dyn OrganizationStore>,
    registry: Arc<WebserviceRegistry>,
    license_gate: Option<Arc<LicenseGate>>,
}

impl OrganizationClaimsLayer {
    pub fn new(
        organizations: Arc<dyn OrganizationStore>,
        registry: Arc<WebserviceRegistry>,
    ) -> Self {
        Self {
            organizations,
            registry,
            license_gate: None,
        }
    }

    /// Install the license gate: licensed webservices become conditional on
    /// subscription state.
    pub fn with_license_gate(mut self, gate: Arc<LicenseGate>) -> Self {
        self.license_gate = Some(gate);
        self
    }

    /// Webservices owners receive: every enabled ORGANIZATION_ROLE
    /// webservice, licensed ones only when the client holds a subscription.
    async fn owner_webservices(
        &self,
        client_id: &ClientId,
        subscribed: &BTreeSet<ClientId>,
    ) -> BTreeSet<WebserviceId> {
        self.registry
            .with_level(AccessLevel::OrganizationRole)
            .into_iter()
            .filter(|ws| {
                if !ws.is_licensed {
                    return true;
                }
                match &self.license_gate {
                    Some(_) => subscribed.contains(client_id),
                    None => true,
                }
            })
            .map(|ws| ws.id.clone())
            .collect()
    }

    /// Filter a member's role webservices: licensed ones require a seat.
    fn member_webservices(
        &self,
        role_webservices: BTreeSet<WebserviceId>,
        has_seat: bool,
    ) -> BTreeSet<WebserviceId> {
        role_webservices
            .into_iter()
            .filter(|id| match self.registry.get(id) {
                Some(ws) if ws.enabled => {
                    !ws.is_licensed || self.license_gate.is_none() || has_seat
                }
                _ => false,
            })
            .collect()
    }
}

#[async_trait]
impl ClaimsLayer for OrganizationClaimsLayer {
    fn name(&self) -> &'static str {
        "organization"
    }

    async fn extend(&self, user: &UserProfile, mut claims: AccessClaims) -> Result<AccessClaims> {
        // Super users: organization detail is never computed.
        if user.is_super_user {
            return Ok(claims);
        }

        let subscribed = match &self.license_gate {
            Some(gate) => gate.clients_with_subscription().await?,
            None => BTreeSet::new(),
        };

        let mut organizations: BTreeMap<ClientId, OrganizationClaim> = BTreeMap::new();

        // Ownership branch.
        for client_id in self.organizations.owned_clients(&user.id).await? {
            let webservices = self.owner_webservices(&client_id, &subscribed).await;
            if !webservices.is_empty() {
                organizations.insert(
                    client_id,
                    OrganizationClaim {
                        level: OrgKind::Client,
                        webservices,
                    },
                );
            }
        }

        // Role-assignment branch.
        let has_seat = match &self.license_gate {
            Some(gate) => gate.user_has_seat(&user.id).await?,
            None => true,
        };

        for (client_id, role_webservices) in
            self.organizations.client_role_webservices(&user.id).await?
        {
            // Owner already holds the broader set for this organization.
            if organizations.contains_key(&client_id) {
                continue;
            }

            let webservices = self.member_webservices(role_webservices, has_seat);
            if !webservices.is_empty() {
                organizations.insert(
                    client_id,
                    OrganizationClaim {
                        level: OrgKind::Client,
                        webservices,
                    },
                );
            }
        }

        for (client_id, claim) in organizations {
            claims.put_organization(client_id, claim);
        }

        Ok(claims)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::decision::UserId;
    use crate::claims::layers::licensing::LicenseGate;
    use crate::claims::payload::RuleValue;
    use crate::registry::webservice::WebserviceDescriptor;
    use crate::store::{SubscriptionRecord, SubscriptionStore};

    struct FakeOrgs {
        owned: BTreeSet<ClientId>,
        member_roles: BTreeMap<ClientId, BTreeSet<WebserviceId>>,
    }

    #[async_trait]
    impl OrganizationStore for FakeOrgs {
        async fn owned_clients(&self, _user_id: &UserId) -> Result<BTreeSet<ClientId>> {
            Ok(self.owned.clone())
        }

        async fn client_role_webservices(
            &self,
            _user_id: &UserId,
        ) -> Result<BTreeMap<ClientId, BTreeSet<WebserviceId>>> {
            Ok(self.member_roles.clone())
        }
    }

    struct FakeSubs {
        subscribed: BTreeSet<ClientId>,
        seated: bool,
    }

    #[async_trait]
    impl SubscriptionStore for FakeSubs {
        async fn client_subscription(
            &self,
            client_id: &ClientId,
        ) -> Result<Option<SubscriptionRecord>> {
            Ok(self.subscribed.contains(client_id).then(|| SubscriptionRecord {
                client_id: client_id.clone(),
                plan_id: "FREE".into(),
                plan_version_id: "v1".into(),
                provider_customer_id: None,
                provider_subscription_id: None,
            }))
        }

        async fn plan_rules(&self, _plan_version_id: &str) -> Result<BTreeMap<String, RuleValue>> {
            Ok(BTreeMap::new())
        }

        async fn clients_with_subscription(&self) -> Result<BTreeSet<ClientId>> {
            Ok(self.subscribed.clone())
        }

        async fn user_has_seat(&self, _user_id: &UserId) -> Result<bool> {
            Ok(self.seated)
        }
    }

    fn registry() -> Arc<WebserviceRegistry> {
        WebserviceRegistry::builder()
            .register(WebserviceDescriptor::new("user_list").access_level(AccessLevel::OrganizationRole))
            .register(
                WebserviceDescriptor::new("billing")
                    .access_level(AccessLevel::OrganizationRole)
                    .licensed(),
            )
            .finalize()
    }

    fn profile() -> UserProfile {
        UserProfile {
            id: UserId::new("u1"),
            login: "alice".into(),
            is_super_user: false,
            enabled: true,
            client_id: Some(ClientId::new("c-member")),
        }
    }

    fn ws_set(ids: &[&str]) -> BTreeSet<WebserviceId> {
        ids.iter().map(|id| WebserviceId::new(*id)).collect()
    }

    #[tokio::test]
    async fn test_owner_gets_all_org_webservices() {
        let layer = OrganizationClaimsLayer::new(
            Arc::new(FakeOrgs {
                owned: BTreeSet::from([ClientId::new("c1")]),
                member_roles: BTreeMap::new(),
            }),
            registry(),
        );

        let claims = layer
            .extend(&profile(), AccessClaims::for_subject("u1", false))
            .await
            .unwrap();

        let orgs = claims.organizations.unwrap();
        let claim = orgs.get(&ClientId::new("c1")).unwrap();
        assert_eq!(claim.level, OrgKind::Client);
        assert_eq!(claim.webservices, ws_set(&["billing", "user_list"]));
    }

    #[tokio::test]
    async fn test_member_gets_role_webservices_only() {
        let layer = OrganizationClaimsLayer::new(
            Arc::new(FakeOrgs {
                owned: BTreeSet::new(),
                member_roles: BTreeMap::from([(ClientId::new("c1"), ws_set(&["user_list"]))]),
            }),
            registry(),
        );

        let claims = layer
            .extend(&profile(), AccessClaims::for_subject("u1", false))
            .await
            .unwrap();

        let orgs = claims.organizations.unwrap();
        assert_eq!(
            orgs.get(&ClientId::new("c1")).unwrap().webservices,
            ws_set(&["user_list"])
        );
    }

    #[tokio::test]
    async fn test_owner_wins_over_role_assignment() {
        // Owner of c1 who also holds a narrower role there: the role data
        // must not shrink the owner's set.
        let layer = OrganizationClaimsLayer::new(
            Arc::new(FakeOrgs {
                owned: BTreeSet::from([ClientId::new("c1")]),
                member_roles: BTreeMap::from([(ClientId::new("c1"), ws_set(&["user_list"]))]),
            }),
            registry(),
        );

        let claims = layer
            .extend(&profile(), AccessClaims::for_subject("u1", false))
            .await
            .unwrap();

        let orgs = claims.organizations.unwrap();
        assert_eq!(
            orgs.get(&ClientId::new("c1")).unwrap().webservices,
            ws_set(&["billing", "user_list"])
        );
    }

    #[tokio::test]
    async fn test_no_organizations_key_omitted() {
        let layer = OrganizationClaimsLayer::new(
            Arc::new(FakeOrgs {
                owned: BTreeSet::new(),
                member_roles: BTreeMap::new(),
            }),
            registry(),
        );

        let claims = layer
            .extend(&profile(), AccessClaims::for_subject("u1", false))
            .await
            .unwrap();
        assert!(claims.organizations.is_none());
    }

    #[tokio::test]
    async fn test_super_user_unchanged() {
        let layer = OrganizationClaimsLayer::new(
            Arc::new(FakeOrgs {
                owned: BTreeSet::from([ClientId::new("c1")]),
                member_roles: BTreeMap::new(),
            }),
            registry(),
        );

        let mut user = profile();
        user.is_super_user = true;

        let claims = layer
            .extend(&user, AccessClaims::for_subject("root", true))
            .await
            .unwrap();
        assert!(claims.organizations.is_none());
    }

    #[tokio::test]
    async fn test_license_gate_filters_owner_branch() {
        // c1 subscribed, c2 not: c2's owner loses only the licensed
        // webservice.
        let layer = OrganizationClaimsLayer::new(
            Arc::new(FakeOrgs {
                owned: BTreeSet::from([ClientId::new("c1"), ClientId::new("c2")]),
                member_roles: BTreeMap::new(),
            }),
            registry(),
        )
        .with_license_gate(Arc::new(LicenseGate::new(Arc::new(FakeSubs {
            subscribed: BTreeSet::from([ClientId::new("c1")]),
            seated: false,
        }))));

        let claims = layer
            .extend(&profile(), AccessClaims::for_subject("u1", false))
            .await
            .unwrap();

        let orgs = claims.organizations.unwrap();
        assert_eq!(
            orgs.get(&ClientId::new("c1")).unwrap().webservices,
            ws_set(&["billing", "user_list"])
        );
        assert_eq!(
            orgs.get(&ClientId::new("c2")).unwrap().webservices,
            ws_set(&["user_list"])
        );
    }

    #[tokio::test]
    async fn test_license_gate_filters_member_branch_by_seat() {
        let orgs_store = || {
            Arc::new(FakeOrgs {
                owned: BTreeSet::new(),
                member_roles: BTreeMap::from([(
                    ClientId::new("c1"),
                    ws_set(&["user_list", "billing"]),
                )]),
            })
        };

        let seated_layer = OrganizationClaimsLayer::new(orgs_store(), registry())
            .with_license_gate(Arc::new(LicenseGate::new(Arc::new(FakeSubs {
                subscribed: BTreeSet::from([ClientId::new("c1")]),
                seated: true,
            }))));
        let unseated_layer = OrganizationClaimsLayer::new(orgs_store(), registry())
            .with_license_gate(Arc::new(LicenseGate::new(Arc::new(FakeSubs {
                subscribed: BTreeSet::from([ClientId::new("c1")]),
                seated: false,
            }))));

        let seated = seated_layer
            .extend(&profile(), AccessClaims::for_subject("u1", false))
            .await
            .unwrap();
        let unseated = unseated_layer
            .extend(&profile(), AccessClaims::for_subject("u1", false))
            .await
            .unwrap();

        assert_eq!(
            seated.organizations.unwrap()[&ClientId::new("c1")].webservices,
            ws_set(&["billing", "user_list"])
        );
        assert_eq!(
            unseated.organizations.unwrap()[&ClientId::new("c1")].webservices,
            ws_set(&["user_list"])
        );
    }
}
