//! Claims generation: the layered chain producing the cached authorization
//! payload attached to each access token.

pub mod generator;
pub mod layers;
pub mod payload;

pub use generator::{ClaimsGenerator, ClaimsGeneratorBuilder, ClaimsLayer};
pub use layers::{
    BaseClaimsLayer, LicenseGate, OrganizationClaimsLayer, RoleClaimsLayer, SubscriptionsLayer,
};
pub use payload::{
    AccessClaims, OrganizationClaim, RuleValue, SubscriptionClaim, WebserviceAccess,
};
