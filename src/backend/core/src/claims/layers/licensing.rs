//! Subscription claims layer and the license gate.
//!
//! The subscriptions layer summarizes each reachable client's subscription
//! (plan, rules, live status) into the claims. Status verification for paid
//! plans goes to the payment provider exactly once per client per
//! generation; a provider failure or an unconfigured provider reports
//! `active` — fail-open for availability — while real provider states pass
//! through verbatim.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

use crate::access::decision::{ClientId, UserId};
use crate::claims::generator::ClaimsLayer;
use crate::claims::payload::{AccessClaims, SubscriptionClaim};
use crate::error::Result;
use crate::licensing::{SubscriptionProvider, SubscriptionStatus};
use crate::store::{OrganizationStore, SubscriptionRecord, SubscriptionStore, UserProfile};

// ═══════════════════════════════════════════════════════════════════════════════
// License Gate
// ═══════════════════════════════════════════════════════════════════════════════

/// Subscription-presence checks consumed by the organization layer when
/// licensing is installed.
pub struct LicenseGate {
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl LicenseGate {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self { subscriptions }
    }

    /// Clients holding any subscription.
    pub async fn clients_with_subscription(&self) -> Result<BTreeSet<ClientId>> {
        self.subscriptions.clients_with_subscription().await
    }

    /// Whether the user occupies a seat on their client's subscription.
    pub async fn user_has_seat(&self, user_id: &UserId) -> Result<bool> {
        self.subscriptions.user_has_seat(user_id).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Subscriptions Layer
// ═══════════════════════════════════════════════════════════════════════════════

pub struct SubscriptionsLayer {
    organizations: Arc<dyn OrganizationStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    provider: Arc<dyn SubscriptionProvider>,
}

impl SubscriptionsLayer {
    pub fn new(
        organizations: Arc<dyn OrganizationStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        provider: Arc<dyn SubscriptionProvider>,
    ) -> Self {
        Self {
            organizations,
            subscriptions,
            provider,
        }
    }

    /// Live status for one subscription record. Free plans are active by
    /// definition; paid plans are re-checked with the provider.
    async fn verify_status(&self, record: &SubscriptionRecord) -> SubscriptionStatus {
        let (Some(customer_id), Some(subscription_id)) = (
            record.provider_customer_id.as_deref(),
            record.provider_subscription_id.as_deref(),
        ) else {
            return SubscriptionStatus::Active;
        };

        if !self.provider.is_configured() {
            warn!(
                client_id = %record.client_id,
                "subscription provider not configured, assuming active status"
            );
            return SubscriptionStatus::Active;
        }

        match self
            .provider
            .subscription_status(customer_id, subscription_id)
            .await
        {
            Ok(status) => status,
            Err(error) => {
                // Fail open: a provider outage must not lock the platform.
                warn!(
                    client_id = %record.client_id,
                    error = %error,
                    "subscription status verification failed, assuming active status"
                );
                SubscriptionStatus::Active
            }
        }
    }

    async fn subscription_claim(
        &self,
        client_id: &ClientId,
    ) -> Result<Option<SubscriptionClaim>> {
        let Some(record) = self.subscriptions.client_subscription(client_id).await? else {
            return Ok(None);
        };

        let rules = self.subscriptions.plan_rules(&record.plan_version_id).await?;
        let status = self.verify_status(&record).await;

        Ok(Some(SubscriptionClaim {
            plan_id: record.plan_id,
            plan_version_id: record.plan_version_id,
            status,
            rules,
        }))
    }
}

#[async_trait]
impl ClaimsLayer for SubscriptionsLayer {
    fn name(&self) -> &'static str {
        "subscriptions"
    }

    async fn extend(&self, user: &UserProfile, mut claims: AccessClaims) -> Result<AccessClaims> {
        // Super users: subscription detail is never computed.
        if user.is_super_user {
            return Ok(claims);
        }

        // Owned clients plus the client the user belongs to.
        let mut client_ids = self.organizations.owned_clients(&user.id).await?;
        if let Some(member_client) = &user.client_id {
            client_ids.insert(member_client.clone());
        }

        for client_id in client_ids {
            if let Some(claim) = self.subscription_claim(&client_id).await? {
                claims.put_subscription(client_id, claim);
            }
        }

        Ok(claims)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
