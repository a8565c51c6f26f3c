//! The authorization core: the access decision model, the pluggable
//! permission chain, and the statement constraint builder.
//!
//! Control flow per inbound call: the chain executor resolves the target
//! webservice, asks every configured module for a verdict, and merges the
//! verdicts into one [`decision::AccessDecision`] written into the request
//! context. When the decision is scoped, queries executed under the call go
//! through the constraint builder, which asks the same modules for
//! row-level predicates and applies them as one WHERE clause.

pub mod chain;
pub mod constraints;
pub mod context;
pub mod decision;
pub mod module;
pub mod modules;

pub use chain::{ChainOutcome, PermissionChain};
pub use constraints::{
    apply_access_constraints, BindValue, ConstraintSet, Predicate, StatementFilter,
};
pub use context::{RequestContext, ServiceCaller};
pub use decision::{AccessDecision, ClientId, OrgKind, OrgScope, ScopeMap, UserId};
pub use module::{PermissionModule, Verdict};
