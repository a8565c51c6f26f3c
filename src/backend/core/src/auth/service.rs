//! Login flow: credential verification, progressive lockout, claims
//! generation, token issuance.
//!
//! Every failure path returns the same invalid-credentials error, and a
//! dummy hash is verified when the account does not exist or has no
//! password, so response timing does not reveal which accounts are real.

use argon2::password_hash::PasswordHash;
use argon2::{Argon2, PasswordVerifier};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::claims::generator::ClaimsGenerator;
use crate::claims::payload::AccessClaims;
use crate::config::AuthConfig;
use crate::error::{PalisadeError, Result};
use crate::store::UserStore;

use super::token::TokenService;

// Pre-computed hash of a throwaway password. Verified whenever no real hash
// is available, so unknown and passwordless accounts cost the same as a
// wrong password.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$aG9uZXN0bHlqdXN0c2FsdA$TTqSnPOB1qSLCqB0EDVV8BM1OXc9Mw7Mlpn0yFv0bXk";

// ═══════════════════════════════════════════════════════════════════════════════
// Lockout
// ═══════════════════════════════════════════════════════════════════════════════

/// Progressive lockout policy: duration escalates with the failure count.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    pub enabled: bool,
    /// Lockout seconds keyed by failure-count threshold.
    pub thresholds: BTreeMap<u32, u64>,
}

impl LockoutPolicy {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            enabled: config.lockout_enabled,
            thresholds: config.lockout_thresholds.clone(),
        }
    }

    /// Lockout duration for a failure count: the highest threshold reached.
    pub fn duration_seconds(&self, failures: u32) -> u64 {
        self.thresholds
            .iter()
            .rev()
            .find(|(threshold, _)| failures >= **threshold)
            .map(|(_, seconds)| *seconds)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
struct AttemptState {
    failures: u32,
    blocked_until: Option<DateTime<Utc>>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Auth Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub claims: AccessClaims,
}

/// Authentication service issuing claims-bearing access tokens.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    generator: Arc<ClaimsGenerator>,
    tokens: Arc<TokenService>,
    attempts: DashMap<String, AttemptState>,
    lockout: LockoutPolicy,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        generator: Arc<ClaimsGenerator>,
        tokens: Arc<TokenService>,
        lockout: LockoutPolicy,
    ) -> Self {
        Self {
            users,
            generator,
            tokens,
            attempts: DashMap::new(),
            lockout,
        }
    }

    /// Authenticate a user and issue their access token.
    pub async fn login(&self, login: &str, password: &str) -> Result<LoginOutcome> {
        let Some(credentials) = self.users.find_by_login(login).await? else {
            // Unknown account: burn a hash check to equalize timing.
            verify_password(DUMMY_HASH, password);
            return Err(PalisadeError::invalid_credentials(format!(
                "unknown user with login '{}'",
                login
            )));
        };

        // Lockout check comes before any account state is revealed.
        self.check_lockout(login)?;

        let Some(password_hash) = &credentials.password_hash else {
            // SSO-only account: same timing, same error.
            verify_password(DUMMY_HASH, password);
            return Err(PalisadeError::invalid_credentials(format!(
                "user '{}' has no password credential",
                login
            )));
        };

        if !verify_password(password_hash, password) {
            let (failures, lockout_seconds) = self.record_failure(login);
            warn!(
                login = login,
                failures = failures,
                lockout_seconds = lockout_seconds,
                "failed login attempt"
            );
            return Err(PalisadeError::invalid_credentials(format!(
                "wrong password for user '{}'",
                login
            )));
        }

        // Account status is checked after password validation so that a
        // blocked account cannot be distinguished from a wrong password.
        if !credentials.profile.enabled {
            return Err(PalisadeError::invalid_credentials(format!(
                "user '{}' is disabled",
                login
            )));
        }

        self.attempts.remove(login);

        let claims = self.generator.generate(&credentials.profile).await?;
        let (token, claims) = self.tokens.issue(claims)?;

        info!(login = login, user_id = %credentials.profile.id, "successful login");

        Ok(LoginOutcome { token, claims })
    }

    fn check_lockout(&self, login: &str) -> Result<()> {
        if !self.lockout.enabled {
            return Ok(());
        }

        if let Some(state) = self.attempts.get(login) {
            if let Some(blocked_until) = state.blocked_until {
                let now = Utc::now();
                if now < blocked_until {
                    let remaining = (blocked_until - now).num_seconds().max(1);
                    return Err(PalisadeError::rate_limited(remaining));
                }
            }
        }

        Ok(())
    }

    fn record_failure(&self, login: &str) -> (u32, u64) {
        let mut state = self.attempts.entry(login.to_string()).or_default();
        state.failures += 1;

        let mut lockout_seconds = 0;
        if self.lockout.enabled {
            lockout_seconds = self.lockout.duration_seconds(state.failures);
            if lockout_seconds > 0 {
                state.blocked_until = Some(Utc::now() + Duration::seconds(lockout_seconds as i64));
            }
        }

        (state.failures, lockout_seconds)
    }
}

fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
