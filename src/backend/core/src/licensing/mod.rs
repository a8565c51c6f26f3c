//! Licensing collaborator: real-time subscription status verification and
//! claims-based rule checking.
//!
//! Subscription status is never trusted from a cached "active" flag: when a
//! paid subscription is summarized into claims, one provider call re-checks
//! the live status. A provider outage or an unconfigured provider reports
//! `active` — fail-open, trading strict billing enforcement for platform
//! availability — while explicit cancellation/suspension states pass through
//! verbatim.

pub mod checker;

use async_trait::async_trait;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::error::{ErrorCode, PalisadeError, Result};

pub use checker::{LicenseChecker, QuotaCheck, RuleLimit};

// ═══════════════════════════════════════════════════════════════════════════════
// Subscription Status
// ═══════════════════════════════════════════════════════════════════════════════

/// Subscription status as reported by the payment provider.
///
/// The known set is closed, but a provider can always invent a new state;
/// unknown states are carried verbatim rather than coerced, so downstream
/// logs show exactly what the provider said.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionStatus {
    Active,
    Pending,
    Canceled,
    Suspended,
    Completed,
    PastDue,
    Other(String),
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Canceled => "canceled",
            Self::Suspended => "suspended",
            Self::Completed => "completed",
            Self::PastDue => "past_due",
            Self::Other(s) => s,
        }
    }

    /// Whether this status currently grants access.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Active | Self::Pending)
    }
}

impl From<&str> for SubscriptionStatus {
    fn from(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "pending" => Self::Pending,
            "canceled" => Self::Canceled,
            "suspended" => Self::Suspended,
            "completed" => Self::Completed,
            "past_due" => Self::PastDue,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubscriptionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubscriptionStatus {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        struct StatusVisitor;

        impl Visitor<'_> for StatusVisitor {
            type Value = SubscriptionStatus;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a subscription status string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                Ok(SubscriptionStatus::from(v))
            }
        }

        deserializer.deserialize_str(StatusVisitor)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Subscription Provider
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-only view of the payment provider, consumed at claims-generation
/// time.
#[async_trait]
pub trait SubscriptionProvider: Send + Sync {
    /// Whether the provider has usable credentials. An unconfigured
    /// provider makes status verification fail open.
    fn is_configured(&self) -> bool {
        true
    }

    /// Fetch the live status of one subscription.
    async fn subscription_status(
        &self,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<SubscriptionStatus>;
}

/// HTTP payment-provider client.
pub struct HttpSubscriptionProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderSubscription {
    status: SubscriptionStatus,
}

impl HttpSubscriptionProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl SubscriptionProvider for HttpSubscriptionProvider {
    async fn subscription_status(
        &self,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<SubscriptionStatus> {
        let url = format!(
            "{}/customers/{}/subscriptions/{}",
            self.base_url, customer_id, subscription_id
        );

        let mut request = self.client.get(&url);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(PalisadeError::with_internal(
                ErrorCode::ProviderError,
                "External service returned an error",
                format!(
                    "provider returned {} for subscription '{}'",
                    response.status(),
                    subscription_id
                ),
            ));
        }

        let subscription: ProviderSubscription = response.json().await?;
        Ok(subscription.status)
    }
}

/// Stand-in used when no provider is configured. Every verification goes
/// through the fail-open path.
pub struct UnconfiguredProvider;

#[async_trait]
impl SubscriptionProvider for UnconfiguredProvider {
    fn is_configured(&self) -> bool {
        false
    }

    async fn subscription_status(
        &self,
        _customer_id: &str,
        _subscription_id: &str,
    ) -> Result<SubscriptionStatus> {
        Err(PalisadeError::with_internal(
            ErrorCode::ProviderError,
            "External service returned an error",
            "no subscription provider configured",
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for s in ["active", "pending", "canceled", "suspended", "completed", "past_due"] {
            let status = SubscriptionStatus::from(s);
            assert_eq!(status.as_str(), s);
            let json = serde_json::to_string(&status).unwrap();
            let back: SubscriptionStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_unknown_status_verbatim() {
        let status = SubscriptionStatus::from("charging_moonbeams");
        assert_eq!(status, SubscriptionStatus::Other("charging_moonbeams".into()));
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            "\"charging_moonbeams\""
        );
        assert!(!status.is_usable());
    }

    #[test]
    fn test_usable_statuses() {
        assert!(SubscriptionStatus::Active.is_usable());
        assert!(SubscriptionStatus::Pending.is_usable());
        assert!(!SubscriptionStatus::Canceled.is_usable());
        assert!(!SubscriptionStatus::Suspended.is_usable());
        assert!(!SubscriptionStatus::PastDue.is_usable());
    }

    #[tokio::test]
    async fn test_unconfigured_provider_errors() {
        let provider = UnconfiguredProvider;
        assert!(!provider.is_configured());
        let err = provider.subscription_status("c", "s").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProviderError);
    }
}
