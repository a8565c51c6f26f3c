//! Role-based access.
//!
//! Users assigned a global role gain access to the webservices that role
//! lists. All-or-nothing: a role grant means every row, so the statement
//! constraint contributed here is an unconditional TRUE.

use async_trait::async_trait;
use std::sync::Arc;

use crate::access::constraints::ConstraintSet;
use crate::access::context::RequestContext;
use crate::access::decision::ScopeMap;
use crate::access::module::{PermissionModule, Verdict};
use crate::error::Result;
use crate::registry::entity::EntityDescriptor;
use crate::registry::webservice::{AccessLevel, WebserviceDescriptor};
use crate::store::RoleStore;

pub struct RoleModule {
    roles: Arc<dyn RoleStore>,
}

impl RoleModule {
    pub fn new(roles: Arc<dyn RoleStore>) -> Self {
        Self { roles }
    }
}

#[async_trait]
impl PermissionModule for RoleModule {
    fn name(&self) -> &'static str {
        "role"
    }

    async fn check_webservice(
        &self,
        webservice: &WebserviceDescriptor,
        context: &RequestContext,
    ) -> Result<Verdict> {
        let Some(user_id) = context.user_id() else {
            return Ok(Verdict::Abstain);
        };

        if !webservice.has_level(AccessLevel::Role) {
            return Ok(Verdict::Abstain);
        }

        if self.roles.has_role_grant(&user_id, &webservice.id).await? {
            return Ok(Verdict::Scoped(ScopeMap::role()));
        }

        Ok(Verdict::Abstain)
    }

    async fn constrain_statement(
        &self,
        constraints: &mut ConstraintSet,
        context: &RequestContext,
        _entity: Option<&EntityDescriptor>,
    ) -> Result<()> {
        if context.access.scoped().is_some_and(|scope| scope.role) {
            constraints.push_always_true();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::decision::{AccessDecision, UserId};
    use crate::claims::payload::AccessClaims;
    use crate::registry::webservice::WebserviceId;
    use std::collections::BTreeSet;

    struct FakeRoles {
        granted: BTreeSet<(UserId, WebserviceId)>,
    }

    #[async_trait]
    impl RoleStore for FakeRoles {
        async fn role_webservices(&self, user_id: &UserId) -> Result<BTreeSet<WebserviceId>> {
            Ok(self
                .granted
                .iter()
                .filter(|(uid, _)| uid == user_id)
                .map(|(_, ws)| ws.clone())
                .collect())
        }

        async fn has_role_grant(
            &self,
            user_id: &UserId,
            webservice_id: &WebserviceId,
        ) -> Result<bool> {
            Ok(self
                .granted
                .contains(&(user_id.clone(), webservice_id.clone())))
        }
    }

    fn module_with_grant(user: &str, webservice: &str) -> RoleModule {
        RoleModule::new(Arc::new(FakeRoles {
            granted: BTreeSet::from([(UserId::new(user), WebserviceId::new(webservice))]),
        }))
    }

    fn connected_ctx() -> RequestContext {
        RequestContext::for_user(AccessClaims::for_subject("u1", false))
    }

    #[tokio::test]
    async fn test_role_grant_is_scoped_role() {
        let module = module_with_grant("u1", "reports");
        let ws = WebserviceDescriptor::new("reports").access_level(AccessLevel::Role);

        let verdict = module.check_webservice(&ws, &connected_ctx()).await.unwrap();
        assert_eq!(verdict, Verdict::Scoped(ScopeMap::role()));
    }

    #[tokio::test]
    async fn test_no_grant_abstains() {
        let module = module_with_grant("u2", "reports");
        let ws = WebserviceDescriptor::new("reports").access_level(AccessLevel::Role);

        let verdict = module.check_webservice(&ws, &connected_ctx()).await.unwrap();
        assert_eq!(verdict, Verdict::Abstain);
    }

    #[tokio::test]
    async fn test_non_role_webservice_abstains() {
        let module = module_with_grant("u1", "reports");
        let ws = WebserviceDescriptor::new("reports").access_level(AccessLevel::Connected);

        let verdict = module.check_webservice(&ws, &connected_ctx()).await.unwrap();
        assert_eq!(verdict, Verdict::Abstain);
    }

    #[tokio::test]
    async fn test_role_scope_constrains_to_true() {
        let module = module_with_grant("u1", "reports");
        let mut ctx = connected_ctx();
        ctx.access = AccessDecision::Scoped(ScopeMap::role());

        let mut constraints = ConstraintSet::new();
        module
            .constrain_statement(&mut constraints, &ctx, None)
            .await
            .unwrap();
        assert!(!constraints.is_empty());
    }
}
