//! Claim-based access: the stateless fast path.
//!
//! For a connected caller, the decision comes entirely from the
//! pre-computed `webservices` map in the token claims — O(1), no database.
//! Super users always get full access; the claims generator deliberately
//! never computes detail for them.

use async_trait::async_trait;

use crate::access::constraints::ConstraintSet;
use crate::access::context::RequestContext;
use crate::access::module::{PermissionModule, Verdict};
use crate::access::decision::ScopeMap;
use crate::claims::payload::WebserviceAccess;
use crate::error::{PalisadeError, Result};
use crate::registry::entity::EntityDescriptor;
use crate::registry::webservice::WebserviceDescriptor;

pub struct ClaimsModule;

#[async_trait]
impl PermissionModule for ClaimsModule {
    fn name(&self) -> &'static str {
        "claims"
    }

    async fn check_webservice(
        &self,
        webservice: &WebserviceDescriptor,
        context: &RequestContext,
    ) -> Result<Verdict> {
        let Some(claims) = &context.connected_user else {
            return Ok(Verdict::Abstain);
        };

        if claims.is_super_user {
            return Ok(Verdict::Full);
        }

        match claims.webservice_access(&webservice.id) {
            Some(WebserviceAccess::Full) => Ok(Verdict::Full),
            Some(WebserviceAccess::Owner) => Ok(Verdict::Scoped(ScopeMap::owner())),
            None => Ok(Verdict::Abstain),
        }
    }

    async fn constrain_statement(
        &self,
        constraints: &mut ConstraintSet,
        context: &RequestContext,
        entity: Option<&EntityDescriptor>,
    ) -> Result<()> {
        let owner_scoped = context
            .access
            .scoped()
            .is_some_and(|scope| scope.owner);

        if !owner_scoped {
            return Ok(());
        }

        let Some(user_id) = context.user_id() else {
            return Ok(());
        };

        let entity = entity.ok_or_else(PalisadeError::entity_required)?;
        constraints.extend(entity.user_access_filters(&user_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::decision::AccessDecision;
    use crate::claims::payload::AccessClaims;
    use crate::error::ErrorCode;
    use crate::registry::webservice::WebserviceId;

    fn ctx_with_grant(webservice: &str, access: WebserviceAccess) -> RequestContext {
        let mut claims = AccessClaims::for_subject("u1", false);
        claims
            .webservices
            .insert(WebserviceId::new(webservice), access);
        RequestContext::for_user(claims)
    }

    #[tokio::test]
    async fn test_full_grant_from_claims() {
        let module = ClaimsModule;
        let ws = WebserviceDescriptor::new("me");
        let ctx = ctx_with_grant("me", WebserviceAccess::Full);

        assert_eq!(module.check_webservice(&ws, &ctx).await.unwrap(), Verdict::Full);
    }

    #[tokio::test]
    async fn test_owner_grant_from_claims() {
        let module = ClaimsModule;
        let ws = WebserviceDescriptor::new("notes");
        let ctx = ctx_with_grant("notes", WebserviceAccess::Owner);

        assert_eq!(
            module.check_webservice(&ws, &ctx).await.unwrap(),
            Verdict::Scoped(ScopeMap::owner())
        );
    }

    #[tokio::test]
    async fn test_unlisted_webservice_abstains() {
        let module = ClaimsModule;
        let ws = WebserviceDescriptor::new("billing");
        let ctx = ctx_with_grant("me", WebserviceAccess::Full);

        assert_eq!(
            module.check_webservice(&ws, &ctx).await.unwrap(),
            Verdict::Abstain
        );
    }

    #[tokio::test]
    async fn test_super_user_always_full() {
        let module = ClaimsModule;
        let ws = WebserviceDescriptor::new("anything");
        let ctx = RequestContext::for_user(AccessClaims::for_subject("root", true));

        assert_eq!(module.check_webservice(&ws, &ctx).await.unwrap(), Verdict::Full);
    }

    #[tokio::test]
    async fn test_disconnected_abstains() {
        let module = ClaimsModule;
        let ws = WebserviceDescriptor::new("me");

        assert_eq!(
            module
                .check_webservice(&ws, &RequestContext::anonymous())
                .await
                .unwrap(),
            Verdict::Abstain
        );
    }

    #[tokio::test]
    async fn test_owner_constraint_requires_entity() {
        let module = ClaimsModule;
        let mut ctx = ctx_with_grant("notes", WebserviceAccess::Owner);
        ctx.access = AccessDecision::Scoped(ScopeMap::owner());

        let mut constraints = ConstraintSet::new();
        let err = module
            .constrain_statement(&mut constraints, &ctx, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::EntityRequired);
    }

    #[tokio::test]
    async fn test_no_owner_scope_is_noop() {
        let module = ClaimsModule;
        let mut ctx = ctx_with_grant("notes", WebserviceAccess::Owner);
        ctx.access = AccessDecision::Scoped(ScopeMap::role());

        let mut constraints = ConstraintSet::new();
        module
            .constrain_statement(&mut constraints, &ctx, None)
            .await
            .unwrap();
        assert!(constraints.is_empty());
    }
}
