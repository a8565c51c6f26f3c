//! # Palisade Core
//!
//! Multi-tenant authorization and access control engine.
//!
//! ## Architecture
//!
//! - **Access decisions**: tri-state verdicts (`Denied | Full | Scoped`)
//!   with additive scope merging
//! - **Permission chain**: pluggable policy modules evaluated in
//!   configuration-defined order, resilient to module failure
//! - **Statement constraints**: scoped decisions become row-level WHERE
//!   clauses through per-entity capability hooks, with a loud safety net
//!   for tenant-scoped entities that forget theirs
//! - **Claims generation**: a layered chain pre-computing the cached
//!   authorization payload sealed into each access token
//! - **Licensing**: provider-verified subscription claims and claims-based
//!   quota/feature rule checks
//! - **Registries**: the webservice catalogue and the typed entity registry,
//!   immutable after startup

pub mod access;
pub mod api;
pub mod auth;
pub mod claims;
pub mod config;
pub mod error;
pub mod licensing;
pub mod registry;
pub mod store;
pub mod telemetry;

pub use error::{ErrorCode, ErrorContext, ErrorSeverity, PalisadeError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::access::{
        AccessDecision, ChainOutcome, ClientId, OrgKind, OrgScope, PermissionChain,
        PermissionModule, RequestContext, ScopeMap, ServiceCaller, UserId, Verdict,
    };
    pub use crate::auth::{AuthService, LockoutPolicy, LoginOutcome, TokenService};
    pub use crate::claims::{
        AccessClaims, ClaimsGenerator, ClaimsLayer, OrganizationClaim, SubscriptionClaim,
        WebserviceAccess,
    };
    pub use crate::error::{ErrorCode, ErrorContext, PalisadeError, Result};
    pub use crate::licensing::{LicenseChecker, SubscriptionProvider, SubscriptionStatus};
    pub use crate::registry::{
        AccessLevel, EntityDescriptor, EntityRegistry, PublicType, WebserviceDescriptor,
        WebserviceId, WebserviceRegistry,
    };
}
