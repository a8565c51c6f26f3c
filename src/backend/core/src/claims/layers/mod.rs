//! The shipped claims layers, one per installed policy concern.

pub mod base;
pub mod licensing;
pub mod organization;
pub mod role;

pub use base::BaseClaimsLayer;
pub use licensing::{LicenseGate, SubscriptionsLayer};
pub use organization::OrganizationClaimsLayer;
pub use role::RoleClaimsLayer;
