//! License-verified organization-role access.
//!
//! The licensing deployment's replacement for the plain organization
//! module. Scope construction applies the license gate per organization:
//! a licensed webservice is reachable only through organizations whose
//! subscription claim is currently usable, so revoking a license narrows
//! previously-granted organization access and can never widen it.
//! Non-licensed webservices behave exactly as in the plain module.

use async_trait::async_trait;
use tracing::debug;

use crate::access::constraints::ConstraintSet;
use crate::access::context::RequestContext;
use crate::access::decision::{OrgScope, ScopeMap};
use crate::access::module::{PermissionModule, Verdict};
use crate::access::modules::organization::organization_constraints;
use crate::error::Result;
use crate::registry::entity::EntityDescriptor;
use crate::registry::webservice::WebserviceDescriptor;

pub struct LicensedOrganizationModule;

#[async_trait]
impl PermissionModule for LicensedOrganizationModule {
    fn name(&self) -> &'static str {
        "licensed_organization"
    }

    async fn check_webservice(
        &self,
        webservice: &WebserviceDescriptor,
        context: &RequestContext,
    ) -> Result<Verdict> {
        let Some(claims) = &context.connected_user else {
            return Ok(Verdict::Abstain);
        };

        let granted = claims.organizations_granting(&webservice.id);
        if granted.is_empty() {
            return Ok(Verdict::Abstain);
        }

        // (not licensed) OR (licensed AND active subscription), evaluated
        // per organization branch.
        let scope = if webservice.is_licensed {
            let mut licensed = OrgScope::new();
            for (kind, ids) in granted.iter() {
                for id in ids {
                    let usable = claims
                        .subscription(id)
                        .is_some_and(|subscription| subscription.is_usable());
                    if usable {
                        licensed.insert(*kind, id.clone());
                    } else {
                        debug!(
                            webservice = %webservice.id,
                            organization = %id,
                            "licensed webservice filtered out for organization without usable subscription"
                        );
                    }
                }
            }
            licensed
        } else {
            granted
        };

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
