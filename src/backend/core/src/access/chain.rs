//! The permission chain executor.
//!
//! Iterates the configured modules in order and merges their verdicts into
//! one access decision. The registry lookup happens before any module runs
//! and no module can override it. The first decisive verdict (`Full` or
//! `Denied`) wins; `Scoped` verdicts accumulate by key union until a
//! decisive verdict appears or the chain is exhausted. A chain exhausted
//! with an empty accumulator denies.
//!
//! A module that fails is logged with its identity and treated as
//! abstaining: a buggy extension module must not take down authorization
//! entirely, but abstention defaults toward denial — it can never grant.

use metrics::counter;
use std::sync::Arc;
use tracing::{debug, warn};

use sqlx::{Postgres, QueryBuilder};

use crate::access::constraints::apply_access_constraints;
use crate::access::context::RequestContext;
use crate::access::decision::{AccessDecision, ScopeMap};
use crate::access::module::{PermissionModule, Verdict};
use crate::error::{ErrorCode, PalisadeError, Result};
use crate::registry::entity::EntityDescriptor;
use crate::registry::webservice::{WebserviceId, WebserviceRegistry};

/// The chain's answer for one call: the decision plus the error code to
/// surface when the decision is a denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutcome {
    pub decision: AccessDecision,
    pub error: Option<ErrorCode>,
}

impl ChainOutcome {
    fn granted(decision: AccessDecision) -> Self {
        Self {
            decision,
            error: None,
        }
    }

    fn denied(error: ErrorCode) -> Self {
        Self {
            decision: AccessDecision::Denied,
            error: Some(error),
        }
    }
}

/// The permission chain: a webservice registry plus the ordered modules.
pub struct PermissionChain {
    registry: Arc<WebserviceRegistry>,
    modules: Vec<Arc<dyn PermissionModule>>,
}

impl PermissionChain {
    pub fn new(registry: Arc<WebserviceRegistry>, modules: Vec<Arc<dyn PermissionModule>>) -> Self {
        Self { registry, modules }
    }

    /// The configured modules, in evaluation order.
    pub fn modules(&self) -> &[Arc<dyn PermissionModule>] {
        &self.modules
    }

    /// The webservice registry backing this chain.
    pub fn registry(&self) -> &Arc<WebserviceRegistry> {
        &self.registry
    }

    /// Compute the access decision for one webservice call.
    ///
    /// The final decision is written into `context.access` for the
    /// constraint builder and object-level checks; the outcome's error code
    /// is only meaningful when the decision is `Denied`.
    pub async fn evaluate(
        &self,
        webservice_id: &WebserviceId,
        context: &mut RequestContext,
    ) -> ChainOutcome {
        let outcome = self.evaluate_inner(webservice_id, context).await;
        context.access = outcome.decision.clone();

        let result_label = match &outcome.decision {
            AccessDecision::Denied => "denied",
            AccessDecision::Full => "full",
            AccessDecision::Scoped(_) => "scoped",
        };
        counter!(
            "palisade_authorization_total",
            "outcome" => result_label,
        )
        .increment(1);

        outcome
    }

    async fn evaluate_inner(
        &self,
        webservice_id: &WebserviceId,
        context: &RequestContext,
    ) -> ChainOutcome {
        // Registry precheck: unknown and disabled webservices are
        // inaccessible before any module runs, and no module can override
        // this.
        let webservice = match self.registry.get(webservice_id) {
            Some(ws) if ws.enabled => ws,
            _ => {
                debug!(
                    webservice = %webservice_id,
                    request_id = %context.request_id,
                    "webservice unknown or disabled"
                );
                return ChainOutcome::denied(ErrorCode::UnknownWebservice);
            }
        };

        let mut accumulated: Option<ScopeMap> = None;

        for module in &self.modules {
            match module.check_webservice(webservice, context).await {
                Ok(Verdict::Abstain) => {}
                Ok(Verdict::Full) => {
                    debug!(
                        webservice = %webservice_id,
                        module = module.name(),
                        request_id = %context.request_id,
                        "full access granted"
                    );
                    return ChainOutcome::granted(AccessDecision::Full);
                }
                Ok(Verdict::Denied(error)) => {
                    debug!(
                        webservice = %webservice_id,
                        module = module.name(),
                        error_code = %error,
                        request_id = %context.request_id,
                        "access denied"
                    );
                    return ChainOutcome::denied(error);
                }
                Ok(Verdict::Scoped(scope)) => {
                    accumulated
                        .get_or_insert_with(ScopeMap::new)
                        .merge(scope);
                }
                Err(error) => {
                    // Treated as abstention: the chain degrades gracefully
                    // but an erroring module can never grant.
                    warn!(
                        webservice = %webservice_id,
                        module = module.name(),
                        request_id = %context.request_id,
                        error = %error,
                        "permission module failed, treating as abstention"
                    );
                    counter!(
                        "palisade_permission_module_failures_total",
                        "module" => module.name(),
                    )
                    .increment(1);
                }
            }
        }

        match accumulated {
            Some(scope) if !scope.is_empty() => {
                ChainOutcome::granted(AccessDecision::Scoped(scope))
            }
            _ => ChainOutcome::denied(ErrorCode::PermissionDenied),
        }
    }

    /// Evaluate and convert to a pass/fail gate: `Ok(())` when granted,
    /// the generic denial error otherwise.
    pub async fn authorize(
        &self,
        webservice_id: &WebserviceId,
        context: &mut RequestContext,
    ) -> Result<()> {
        let outcome = self.evaluate(webservice_id, context).await;

        if outcome.decision.is_granted() {
            return Ok(());
        }

        Err(match outcome.error.unwrap_or(ErrorCode::PermissionDenied) {
            ErrorCode::UnknownWebservice => {
                PalisadeError::unknown_webservice(webservice_id.as_str())
            }
            ErrorCode::AlreadyConnected => PalisadeError::already_connected(),
            _ => PalisadeError::permission_denied(format!(
                "chain denied webservice '{}'",
                webservice_id
            )),
        })
    }

    /// Add access conditions to a statement according to the decision
    /// previously written into the context. See the constraint builder for
    /// the exact semantics.
    pub async fn constrain<'a>(
        &self,
        builder: &mut QueryBuilder<'a, Postgres>,
        context: &RequestContext,
        entity: Option<&EntityDescriptor>,
    ) -> Result<()> {
        apply_access_constraints(&self.modules, builder, context, entity).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
