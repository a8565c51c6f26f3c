//! Per-request context threaded through the permission chain.

use uuid::Uuid;

use crate::access::decision::{AccessDecision, UserId};
use crate::claims::payload::AccessClaims;

/// Identity of a service-to-service caller, decoded from a service token.
/// Mutually exclusive with a connected user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCaller {
    /// Name of the calling service.
    pub service: String,
}

/// Request-scoped authorization state.
///
/// Built once per inbound call; the chain executor writes the final decision
/// into `access`, where the constraint builder and object-level checks read
/// it back. Never shared across requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Decoded caller claims, or `None` for anonymous callers.
    pub connected_user: Option<AccessClaims>,

    /// Service-to-service identity, exclusive with `connected_user`.
    pub service_caller: Option<ServiceCaller>,

    /// The decision computed by the chain executor for this call.
    pub access: AccessDecision,

    /// Correlation id for logs.
    pub request_id: String,
}

impl RequestContext {
    /// Context for an anonymous caller.
    pub fn anonymous() -> Self {
        Self {
            connected_user: None,
            service_caller: None,
            access: AccessDecision::Denied,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    /// Context for a connected user.
    pub fn for_user(claims: AccessClaims) -> Self {
        Self {
            connected_user: Some(claims),
            ..Self::anonymous()
        }
    }

    /// Context for an internal service caller.
    pub fn for_service(caller: ServiceCaller) -> Self {
        Self {
            service_caller: Some(caller),
            ..Self::anonymous()
        }
    }

    /// Override the request id (e.g., from an `X-Request-ID` header).
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// The connected user's id, if any.
    pub fn user_id(&self) -> Option<UserId> {
        self.connected_user
            .as_ref()
            .map(|claims| UserId::new(claims.sub.clone()))
    }

    pub fn is_connected(&self) -> bool {
        self.connected_user.is_some()
    }

    pub fn is_super_user(&self) -> bool {
        self.connected_user
            .as_ref()
            .is_some_and(|claims| claims.is_super_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_context() {
        let ctx = RequestContext::anonymous();
        assert!(!ctx.is_connected());
        assert!(!ctx.is_super_user());
        assert!(ctx.user_id().is_none());
        assert_eq!(ctx.access, AccessDecision::Denied);
    }

    #[test]
    fn test_user_context() {
        let ctx = RequestContext::for_user(AccessClaims::for_subject("u1", false));
        assert!(ctx.is_connected());
        assert_eq!(ctx.user_id(), Some(UserId::new("u1")));
        assert!(ctx.service_caller.is_none());
    }

    #[test]
    fn test_service_context() {
        let ctx = RequestContext::for_service(ServiceCaller {
            service: "billing".to_string(),
        });
        assert!(!ctx.is_connected());
        assert!(ctx.service_caller.is_some());
    }
}
