//! Service-to-service access.
//!
//! Grants full access when the caller carries a service identity and the
//! target webservice declares the INTERNAL_SERVICE access level. Never
//! denies: an ordinary user calling an internal webservice is someone else's
//! decision.

use async_trait::async_trait;

use crate::access::context::RequestContext;
use crate::access::module::{PermissionModule, Verdict};
use crate::error::Result;
use crate::registry::webservice::{AccessLevel, WebserviceDescriptor};

pub struct InternalServiceModule;

#[async_trait]
impl PermissionModule for InternalServiceModule {
    fn name(&self) -> &'static str {
        "internal_service"
    }

    async fn check_webservice(
        &self,
        webservice: &WebserviceDescriptor,
        context: &RequestContext,
    ) -> Result<Verdict> {
        // No service caller: let other modules handle it.
        if context.service_caller.is_none() {
            return Ok(Verdict::Abstain);
        }

        if !webservice.has_level(AccessLevel::InternalService) {
            return Ok(Verdict::Abstain);
        }

        Ok(Verdict::Full)
    }
}
