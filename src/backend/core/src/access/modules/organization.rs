//! Organization-role access.
//!
//! Scope comes from the `organizations` claim: each organization listing
//! the target webservice contributes its id under its kind. Row filtering
//! is delegated to the target entity's organization filter hook; the
//! tenant-filter safety net fires there if the entity forgot to implement
//! it.

use async_trait::async_trait;

use crate::access::constraints::ConstraintSet;
use crate::access::context::RequestContext;
use crate::access::decision::ScopeMap;
use crate::access::module::{PermissionModule, Verdict};
use crate::error::{PalisadeError, Result};
use crate::registry::entity::EntityDescriptor;
use crate::registry::webservice::WebserviceDescriptor;

pub struct OrganizationModule;

/// Shared constraint logic for the `organization_role` access kind, used by
/// both the plain and the license-verified module.
pub(crate) fn organization_constraints(
    constraints: &mut ConstraintSet,
    context: &RequestContext,
    entity: Option<&EntityDescriptor>,
) -> Result<()> {
    let Some(scope) = context.access.scoped() else {
        return Ok(());
    };

    if scope.organizations.is_empty() {
        return Ok(());
    }

    let entity = entity.ok_or_else(PalisadeError::entity_required)?;
    constraints.extend(entity.organization_access_filters(&scope.organizations)?);
    Ok(())
}

#[async_trait]
impl PermissionModule for OrganizationModule {
    fn name(&self) -> &'static str {
        "organization"
    }

    async fn check_webservice(
        &self,
        webservice: &WebserviceDescriptor,
        context: &RequestContext,
    ) -> Result<Verdict> {
        let Some(claims) = &context.connected_user else {
            return Ok(Verdict::Abstain);
        };

        let scope = claims.organizations_granting(&webservice.id);
        if scope.is_empty() {
            return Ok(Verdict::Abstain);
        }

        Ok(Verdict::Scoped(ScopeMap::organizations(scope)))
    }

    async fn constrain_statement(
        &self,
        constraints: &mut ConstraintSet,
        context: &RequestContext,
        entity: Option<&EntityDescriptor>,
    ) -> Result<()> {
        organization_constraints(constraints, context, entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::decision::{AccessDecision, ClientId, OrgKind, OrgScope};
    use crate::claims::payload::{AccessClaims, OrganizationClaim};
    use crate::error::ErrorCode;
    use crate::registry::webservice::WebserviceId;
    use std::collections::BTreeSet;

    fn ctx_with_org(client: &str, webservice: &str) -> RequestContext {
        let mut claims = AccessClaims::for_subject("u1", false);
        claims.put_organization(
            ClientId::new(client),
            OrganizationClaim {
                level: OrgKind::Client,
                webservices: BTreeSet::from([WebserviceId::new(webservice)]),
            },
        );
        RequestContext::for_user(claims)
    }

    #[tokio::test]
    async fn test_granting_org_produces_scope() {
        let module = OrganizationModule;
        let ws = WebserviceDescriptor::new("user_list");
        let ctx = ctx_with_org("c1", "user_list");

        let verdict = module.check_webservice(&ws, &ctx).await.unwrap();
        let Verdict::Scoped(scope) = verdict else {
            panic!("expected scoped verdict");
        };
        assert!(scope
            .organizations
            .ids(OrgKind::Client)
            .unwrap()
            .contains(&ClientId::new("c1")));
    }

    #[tokio::test]
    async fn test_no_matching_org_abstains() {
        let module = OrganizationModule;
        let ws = WebserviceDescriptor::new("billing");
        let ctx = ctx_with_org("c1", "user_list");

        assert_eq!(
            module.check_webservice(&ws, &ctx).await.unwrap(),
            Verdict::Abstain
        );
    }

    #[tokio::test]
    async fn test_anonymous_abstains() {
        let module = OrganizationModule;
        let ws = WebserviceDescriptor::new("user_list");

        assert_eq!(
            module
                .check_webservice(&ws, &RequestContext::anonymous())
                .await
                .unwrap(),
            Verdict::Abstain
        );
    }

    #[tokio::test]
    async fn test_constraint_requires_entity() {
        let module = OrganizationModule;
        let mut ctx = ctx_with_org("c1", "user_list");
        ctx.access = AccessDecision::Scoped(ScopeMap::organizations(OrgScope::of(
            OrgKind::Client,
            [ClientId::new("c1")],
        )));

        let mut constraints = ConstraintSet::new();
        let err = module
            .constrain_statement(&mut constraints, &ctx, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::EntityRequired);
    }

    #[tokio::test]
    async fn test_constraint_noop_without_org_scope() {
        let module = OrganizationModule;
        let mut ctx = ctx_with_org("c1", "user_list");
        ctx.access = AccessDecision::Scoped(ScopeMap::owner());

        let mut constraints = ConstraintSet::new();
        module
            .constrain_statement(&mut constraints, &ctx, None)
            .await
            .unwrap();
        assert!(constraints.is_empty());
    }
}
