//! Authentication: login, lockout, and token sealing for the claims
//! payload produced by the generator chain.

pub mod service;
pub mod token;

pub use service::{AuthService, LockoutPolicy, LoginOutcome};
pub use token::TokenService;
