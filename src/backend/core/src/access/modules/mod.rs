//! Permission module variants.
//!
//! Each module is independently toggleable in configuration; deployments
//! compose them by listing module names in chain order. A licensing
//! deployment swaps `organization` for `licensed_organization` — the
//! license-verified variant subsumes the plain one.

pub mod anonymous;
pub mod claims;
pub mod internal;
pub mod license;
pub mod organization;
pub mod public;
pub mod role;

pub use anonymous::AnonymousModule;
pub use claims::ClaimsModule;
pub use internal::InternalServiceModule;
pub use license::LicensedOrganizationModule;
pub use organization::OrganizationModule;
pub use public::PublicAccessModule;
pub use role::RoleModule;
