//! Shared fixtures: in-memory stores and a standard chain/registry setup.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use palisade_core::access::chain::PermissionChain;
use palisade_core::access::decision::{ClientId, UserId};
use palisade_core::access::module::PermissionModule;
use palisade_core::access::modules::{
    AnonymousModule, ClaimsModule, InternalServiceModule, LicensedOrganizationModule, RoleModule,
};
use palisade_core::claims::payload::RuleValue;
use palisade_core::error::Result;
use palisade_core::registry::webservice::{
    AccessLevel, PublicType, WebserviceDescriptor, WebserviceId, WebserviceRegistry,
};
use palisade_core::store::{
    OrganizationStore, RoleStore, SubscriptionRecord, SubscriptionStore, UserProfile,
};

// ============================================================================
// In-Memory Stores
// ============================================================================

#[derive(Default, Clone)]
pub struct MemoryRoleStore {
    pub grants: BTreeMap<UserId, BTreeSet<WebserviceId>>,
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn role_webservices(&self, user_id: &UserId) -> Result<BTreeSet<WebserviceId>> {
        Ok(self.grants.get(user_id).cloned().unwrap_or_default())
    }

    async fn has_role_grant(
        &self,
        user_id: &UserId,
        webservice_id: &WebserviceId,
    ) -> Result<bool> {
        Ok(self
            .grants
            .get(user_id)
            .is_some_and(|webservices| webservices.contains(webservice_id)))
    }
}

#[derive(Default, Clone)]
pub struct MemoryOrganizationStore {
    pub owned: BTreeMap<UserId, BTreeSet<ClientId>>,
    pub member_roles: BTreeMap<UserId, BTreeMap<ClientId, BTreeSet<WebserviceId>>>,
}

#[async_trait]
impl OrganizationStore for MemoryOrganizationStore {
    async fn owned_clients(&self, user_id: &UserId) -> Result<BTreeSet<ClientId>> {
        Ok(self.owned.get(user_id).cloned().unwrap_or_default())
    }

    async fn client_role_webservices(
        &self,
        user_id: &UserId,
    ) -> Result<BTreeMap<ClientId, BTreeSet<WebserviceId>>> {
        Ok(self.member_roles.get(user_id).cloned().unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub struct MemorySubscriptionStore {
    pub records: BTreeMap<ClientId, SubscriptionRecord>,
    pub rules: BTreeMap<String, BTreeMap<String, RuleValue>>,
    pub seated: BTreeSet<UserId>,
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn client_subscription(
        &self,
        client_id: &ClientId,
    ) -> Result<Option<SubscriptionRecord>> {
        Ok(self.records.get(client_id).cloned())
    }

    async fn plan_rules(&self, plan_version_id: &str) -> Result<BTreeMap<String, RuleValue>> {
        Ok(self.rules.get(plan_version_id).cloned().unwrap_or_default())
    }

    async fn clients_with_subscription(&self) -> Result<BTreeSet<ClientId>> {
        Ok(self.records.keys().cloned().collect())
    }

    async fn user_has_seat(&self, user_id: &UserId) -> Result<bool> {
        Ok(self.seated.contains(user_id))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn profile(id: &str, is_super_user: bool) -> UserProfile {
    UserProfile {
        id: UserId::new(id),
        login: id.to_string(),
        is_super_user,
        enabled: true,
        client_id: None,
    }
}

pub fn ws_set(ids: &[&str]) -> BTreeSet<WebserviceId> {
    ids.iter().map(|id| WebserviceId::new(*id)).collect()
}

/// Registry mirroring a small deployment: a public login, a connected-only
/// echo endpoint, an owner-filtered listing, and a licensed
/// organization-scoped listing.
pub fn standard_registry() -> Arc<WebserviceRegistry> {
    WebserviceRegistry::builder()
        .register(WebserviceDescriptor::new("login").public(PublicType::DisconnectedOnly))
        .register(WebserviceDescriptor::new("signup").public(PublicType::Open))
        .register(WebserviceDescriptor::new("me").access_level(AccessLevel::Connected))
        .register(WebserviceDescriptor::new("notes").access_level(AccessLevel::Owner))
        .register(
            WebserviceDescriptor::new("user_list")
                .access_level(AccessLevel::Owner)
                .access_level(AccessLevel::OrganizationRole)
                .licensed(),
        )
        .register(WebserviceDescriptor::new("reports").access_level(AccessLevel::Role))
        .register(WebserviceDescriptor::new("sync").access_level(AccessLevel::InternalService))
        .register(WebserviceDescriptor::new("legacy").disabled())
        .finalize()
}

/// The default production chain over the standard registry.
pub fn standard_chain(roles: Arc<dyn RoleStore>) -> PermissionChain {
    let modules: Vec<Arc<dyn PermissionModule>> = vec![
        Arc::new(InternalServiceModule),
        Arc::new(AnonymousModule),
        Arc::new(ClaimsModule),
        Arc::new(RoleModule::new(roles)),
        Arc::new(LicensedOrganizationModule),
    ];
    PermissionChain::new(standard_registry(), modules)
}
