//! The pluggable permission module interface.
//!
//! A module is one policy unit in the chain: it inspects the target
//! webservice and the request context and produces a [`Verdict`]. Modules
//! must be safe to call with no connected user and must return
//! [`Verdict::Abstain`] for ordinary "not applicable" cases instead of
//! failing; an `Err` from a module is an internal fault, which the chain
//! executor logs and treats as an abstention.

use async_trait::async_trait;

use crate::access::constraints::ConstraintSet;
use crate::access::context::RequestContext;
use crate::access::decision::ScopeMap;
use crate::error::{ErrorCode, Result};
use crate::registry::entity::EntityDescriptor;
use crate::registry::webservice::WebserviceDescriptor;

/// One module's answer for one webservice call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Not applicable; let the rest of the chain decide.
    Abstain,
    /// Unconditional grant. Decisive: the chain stops here.
    Full,
    /// Explicit denial with its error code. Decisive: the chain stops here.
    Denied(ErrorCode),
    /// Conditional grant; merged into the accumulated scope and the chain
    /// continues.
    Scoped(ScopeMap),
}

/// A pluggable policy unit. Implementations are registered in
/// configuration-defined order and evaluated sequentially.
#[async_trait]
pub trait PermissionModule: Send + Sync {
    /// Stable module name, used in configuration and logs.
    fn name(&self) -> &'static str;

    /// Decide whether the caller may invoke the webservice.
    async fn check_webservice(
        &self,
        webservice: &WebserviceDescriptor,
        context: &RequestContext,
    ) -> Result<Verdict>;

    /// Contribute row-level predicates for a scoped query.
    ///
    /// Called only when the request's decision is `Scoped`. A module reacts
    /// to the access kinds it owns and ignores the rest; modules never need
    /// to know about each other's keys. Unlike `check_webservice`, errors
    /// here propagate: a failure while building a WHERE clause must abort
    /// the query, not widen it.
    async fn constrain_statement(
        &self,
        constraints: &mut ConstraintSet,
        context: &RequestContext,
        entity: Option<&EntityDescriptor>,
    ) -> Result<()> {
        let _ = (constraints, context, entity);
        Ok(())
    }
}
