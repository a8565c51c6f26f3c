//! Anonymous access.
//!
//! Handles every caller without a user identity: public webservices are
//! granted, everything else is denied outright. Connected callers are
//! deferred to the claim-based modules, except on disconnected-only public
//! webservices (login, password reset), which reject live sessions.

use async_trait::async_trait;

use crate::access::context::RequestContext;
use crate::access::module::{PermissionModule, Verdict};
use crate::error::{ErrorCode, Result};
use crate::registry::webservice::{PublicType, WebserviceDescriptor};

pub struct AnonymousModule;

#[async_trait]
impl PermissionModule for AnonymousModule {
    fn name(&self) -> &'static str {
        "anonymous"
    }

    async fn check_webservice(
        &self,
        webservice: &WebserviceDescriptor,
        context: &RequestContext,
    ) -> Result<Verdict> {
        if context.is_connected() {
            if webservice.public_type == Some(PublicType::DisconnectedOnly) {
                return Ok(Verdict::Denied(ErrorCode::AlreadyConnected));
            }
            // Connected caller on an ordinary webservice: defer to the
            // claim-based modules.
            return Ok(Verdict::Abstain);
        }

        if webservice.is_public() {
            return Ok(Verdict::Full);
        }

        // Not public, not connected.
        Ok(Verdict::Denied(ErrorCode::PermissionDenied))
    }
}
