//! Claims-based license rule checking.
//!
//! All checks here run against the subscription summary already cached in
//! the caller's claims: no database or provider round-trips on the request
//! path. The `check_*` functions report, the `enforce_*` functions raise.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::access::decision::ClientId;
use crate::claims::payload::{AccessClaims, RuleValue, SubscriptionClaim};
use crate::error::{PalisadeError, Result};

/// Result of a quota check. `limit == None` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaCheck {
    pub valid: bool,
    pub current: i64,
    pub limit: Option<i64>,
}

/// One rule limit as exposed to callers of `limits_from_claims`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleLimit {
    Feature { enabled: bool },
    Quota { limit: i64 },
}

/// Stateless license rule checker.
pub struct LicenseChecker;

impl LicenseChecker {
    /// Subscription summary for a client. Absent `subscriptions` key and
    /// missing entry are identical: no subscription.
    pub fn subscription_from_claims<'a>(
        claims: &'a AccessClaims,
        client_id: &ClientId,
    ) -> Option<&'a SubscriptionClaim> {
        claims.subscription(client_id)
    }

    /// Check a quota rule. The caller supplies the current usage count.
    ///
    /// A rule absent from the plan is unlimited; a feature toggle under a
    /// quota check is also unlimited (it is not a quota).
    pub fn check_quota(
        claims: &AccessClaims,
        client_id: &ClientId,
        rule_id: &str,
        current: i64,
    ) -> QuotaCheck {
        let Some(subscription) = claims.subscription(client_id) else {
            return QuotaCheck {
                valid: false,
                current,
                limit: Some(0),
            };
        };

        match subscription.rules.get(rule_id) {
            None | Some(RuleValue::Feature(_)) => QuotaCheck {
                valid: true,
                current,
                limit: None,
            },
            Some(RuleValue::Quota(limit)) => QuotaCheck {
                valid: current < *limit,
                current,
                limit: Some(*limit),
            },
        }
    }

    /// Enforce a quota rule: error when the client has no usable
    /// subscription or the quota is exhausted.
    pub fn enforce_quota(
        claims: &AccessClaims,
        client_id: &ClientId,
        rule_id: &str,
        current: i64,
    ) -> Result<()> {
        let subscription = claims
            .subscription(client_id)
            .ok_or_else(|| PalisadeError::no_active_subscription(client_id.as_str()))?;

        if !subscription.is_usable() {
            return Err(PalisadeError::subscription_inactive(
                subscription.status.as_str(),
            ));
        }

        let check = Self::check_quota(claims, client_id, rule_id, current);
        if !check.valid {
            return Err(PalisadeError::quota_exceeded(
                rule_id,
                check.current,
                check.limit.unwrap_or(0),
            ));
        }

        Ok(())
    }

    /// Whether a feature rule is present in the client's plan.
    pub fn check_feature(claims: &AccessClaims, client_id: &ClientId, rule_id: &str) -> bool {
        claims
            .subscription(client_id)
            .is_some_and(|subscription| subscription.rules.contains_key(rule_id))
    }

    /// Enforce a feature rule: error when the client has no usable
    /// subscription or the plan does not include the feature.
    pub fn enforce_feature(
        claims: &AccessClaims,
        client_id: &ClientId,
        rule_id: &str,
    ) -> Result<()> {
        let subscription = claims
            .subscription(client_id)
            .ok_or_else(|| PalisadeError::no_active_subscription(client_id.as_str()))?;

        if !subscription.is_usable() {
            return Err(PalisadeError::subscription_inactive(
                subscription.status.as_str(),
            ));
        }

        if !Self::check_feature(claims, client_id, rule_id) {
            return Err(PalisadeError::feature_not_available(rule_id));
        }

        Ok(())
    }

    /// All rule limits for a client, typed by rule kind.
    pub fn limits_from_claims(
        claims: &AccessClaims,
        client_id: &ClientId,
    ) -> BTreeMap<String, RuleLimit> {
        let Some(subscription) = claims.subscription(client_id) else {
            return BTreeMap::new();
        };

        subscription
            .rules
            .iter()
            .map(|(rule_id, value)| {
                let limit = match value {
                    RuleValue::Feature(enabled) => RuleLimit::Feature { enabled: *enabled },
                    RuleValue::Quota(limit) => RuleLimit::Quota { limit: *limit },
                };
                (rule_id.clone(), limit)
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::licensing::SubscriptionStatus;

    fn claims_with_subscription(status: SubscriptionStatus) -> AccessClaims {
        let mut claims = AccessClaims::for_subject("u1", false);
        claims.put_subscription(
            ClientId::new("c1"),
            SubscriptionClaim {
                plan_id: "FREE".into(),
                plan_version_id: "v1".into(),
                status,
                rules: BTreeMap::from([
                    ("MAX_USERS".to_string(), RuleValue::Quota(5)),
                    ("EXPORTS".to_string(), RuleValue::Feature(true)),
                ]),
            },
        );
        claims
    }

    #[test]
    fn test_quota_within_limit() {
        let claims = claims_with_subscription(SubscriptionStatus::Active);
        let check = LicenseChecker::check_quota(&claims, &ClientId::new("c1"), "MAX_USERS", 4);
        assert!(check.valid);
        assert_eq!(check.limit, Some(5));
    }

    #[test]
    fn test_quota_exhausted() {
        let claims = claims_with_subscription(SubscriptionStatus::Active);
        let check = LicenseChecker::check_quota(&claims, &ClientId::new("c1"), "MAX_USERS", 5);
        assert!(!check.valid);

        let err = LicenseChecker::enforce_quota(&claims, &ClientId::new("c1"), "MAX_USERS", 5)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::QuotaExceeded);
    }

    #[test]
    fn test_absent_rule_is_unlimited() {
        let claims = claims_with_subscription(SubscriptionStatus::Active);
        let check = LicenseChecker::check_quota(&claims, &ClientId::new("c1"), "MAX_WIDGETS", 999);
        assert!(check.valid);
        assert_eq!(check.limit, None);
    }

    #[test]
    fn test_no_subscription_fails_closed() {
        let claims = AccessClaims::for_subject("u1", false);
        let check = LicenseChecker::check_quota(&claims, &ClientId::new("c1"), "MAX_USERS", 0);
        assert!(!check.valid);

        let err = LicenseChecker::enforce_quota(&claims, &ClientId::new("c1"), "MAX_USERS", 0)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoActiveSubscription);
    }

    #[test]
    fn test_inactive_subscription_rejected() {
        let claims = claims_with_subscription(SubscriptionStatus::Canceled);
        let err = LicenseChecker::enforce_quota(&claims, &ClientId::new("c1"), "MAX_USERS", 0)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SubscriptionInactive);
    }

    #[test]
    fn test_feature_checks() {
        let claims = claims_with_subscription(SubscriptionStatus::Active);
        assert!(LicenseChecker::check_feature(
            &claims,
            &ClientId::new("c1"),
            "EXPORTS"
        ));
        assert!(!LicenseChecker::check_feature(
            &claims,
            &ClientId::new("c1"),
            "TELEPORT"
        ));

        let err =
            LicenseChecker::enforce_feature(&claims, &ClientId::new("c1"), "TELEPORT").unwrap_err();
        assert_eq!(err.code(), ErrorCode::FeatureNotAvailable);
    }

    #[test]
    fn test_limits_typed_by_kind() {
        let claims = claims_with_subscription(SubscriptionStatus::Active);
        let limits = LicenseChecker::limits_from_claims(&claims, &ClientId::new("c1"));

        assert_eq!(limits.get("MAX_USERS"), Some(&RuleLimit::Quota { limit: 5 }));
        assert_eq!(
            limits.get("EXPORTS"),
            Some(&RuleLimit::Feature { enabled: true })
        );
        assert!(LicenseChecker::limits_from_claims(&claims, &ClientId::new("c9")).is_empty());
    }
}
