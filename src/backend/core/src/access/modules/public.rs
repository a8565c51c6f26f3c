//! Allow-all module: a no-auth escape hatch for deployments whose entire
//! surface is trivially public. Use it alone, never in front of real
//! policy modules.

use async_trait::async_trait;

use crate::access::context::RequestContext;
use crate::access::module::{PermissionModule, Verdict};
use crate::error::Result;
use crate::registry::webservice::WebserviceDescriptor;

pub struct PublicAccessModule;

#[async_trait]
impl PermissionModule for PublicAccessModule {
    fn name(&self) -> &'static str {
        "public"
    }

    async fn check_webservice(
        &self,
        _webservice: &WebserviceDescriptor,
        _context: &RequestContext,
    ) -> Result<Verdict> {
        Ok(Verdict::Full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_grants() {
        let module = PublicAccessModule;
        let ws = WebserviceDescriptor::new("anything");
        let ctx = RequestContext::anonymous();

        assert_eq!(module.check_webservice(&ws, &ctx).await.unwrap(), Verdict::Full);
    }
}
