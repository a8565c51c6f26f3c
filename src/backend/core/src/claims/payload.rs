//! The claims payload: the pre-computed, cached authorization summary
//! embedded in a caller's signed access token.
//!
//! Created once at login/refresh by the claims generator chain, immutable
//! for the token's lifetime, re-derived on every refresh — never patched in
//! place. The `organizations` and `subscriptions` keys are omitted entirely
//! when empty; consumers must treat an absent key and an empty map the same
//! way, and the generator always omits on empty.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::access::decision::{ClientId, OrgKind, OrgScope};
use crate::licensing::SubscriptionStatus;
use crate::registry::webservice::WebserviceId;

// ═══════════════════════════════════════════════════════════════════════════════
// Claim Fragments
// ═══════════════════════════════════════════════════════════════════════════════

/// Access granted for one webservice in the claims map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebserviceAccess {
    /// Full access to all rows.
    Full,
    /// Access only to rows owned by the caller.
    Owner,
}

/// Per-organization authorization data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationClaim {
    /// The organization kind this id belongs to.
    pub level: OrgKind,

    /// Webservices reachable within this organization.
    pub webservices: BTreeSet<WebserviceId>,
}

/// One plan rule value: a feature toggle or a quota limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    /// Feature toggle; presence means enabled.
    Feature(bool),
    /// Quota limit.
    Quota(i64),
}

/// Per-client subscription summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionClaim {
    pub plan_id: String,
    pub plan_version_id: String,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub rules: BTreeMap<String, RuleValue>,
}

impl SubscriptionClaim {
    /// Whether this subscription currently grants access.
    pub fn is_usable(&self) -> bool {
        self.status.is_usable()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Access Claims
// ═══════════════════════════════════════════════════════════════════════════════

/// The full claims payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the user id.
    pub sub: String,

    /// Super users bypass webservice-level checks entirely.
    #[serde(default)]
    pub is_super_user: bool,

    /// Webservices reachable by this user, with their access type.
    #[serde(default)]
    pub webservices: BTreeMap<WebserviceId, WebserviceAccess>,

    /// Per-organization authorization data. Omitted when the user has no
    /// organization-scoped access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizations: Option<BTreeMap<ClientId, OrganizationClaim>>,

    /// Per-client subscription data. Omitted when no client the user can
    /// reach has a subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriptions: Option<BTreeMap<ClientId, SubscriptionClaim>>,

    /// Expiry timestamp (seconds since epoch). Set at token issue time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Anti-CSRF token carried alongside the claims. Token transport
    /// concern; opaque here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xsrf_token: Option<String>,
}

impl AccessClaims {
    /// Minimal claims for a subject; the generator layers extend this.
    pub fn for_subject(sub: impl Into<String>, is_super_user: bool) -> Self {
        Self {
            sub: sub.into(),
            is_super_user,
            webservices: BTreeMap::new(),
            organizations: None,
            subscriptions: None,
            exp: None,
            xsrf_token: None,
        }
    }

    /// Access type recorded for a webservice, if any.
    pub fn webservice_access(&self, id: &WebserviceId) -> Option<WebserviceAccess> {
        self.webservices.get(id).copied()
    }

    /// Organizations whose claim lists the given webservice, as an
    /// organization scope usable for row filtering.
    pub fn organizations_granting(&self, id: &WebserviceId) -> OrgScope {
        let mut scope = OrgScope::new();
        if let Some(organizations) = &self.organizations {
            for (org_id, claim) in organizations {
                if claim.webservices.contains(id) {
                    scope.insert(claim.level, org_id.clone());
                }
            }
        }
        scope
    }

    /// Subscription claim for a client, treating an absent `subscriptions`
    /// key and a missing entry identically.
    pub fn subscription(&self, client_id: &ClientId) -> Option<&SubscriptionClaim> {
        self.subscriptions
            .as_ref()
            .and_then(|subscriptions| subscriptions.get(client_id))
    }

    /// Record an organization claim, materializing the map on first use.
    pub fn put_organization(&mut self, client_id: ClientId, claim: OrganizationClaim) {
        self.organizations
            .get_or_insert_with(BTreeMap::new)
            .insert(client_id, claim);
    }

    /// Record a subscription claim, materializing the map on first use.
    pub fn put_subscription(&mut self, client_id: ClientId, claim: SubscriptionClaim) {
        self.subscriptions
            .get_or_insert_with(BTreeMap::new)
            .insert(client_id, claim);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
