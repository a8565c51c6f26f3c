//! Signed access tokens carrying the claims payload.
//!
//! HS256 over the serialized claims; the claims themselves are computed by
//! the generator chain, this service only seals and unseals them. Service
//! tokens are a separate, audience-bound shape for service-to-service
//! calls.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use uuid::Uuid;

use crate::access::context::ServiceCaller;
use crate::claims::payload::AccessClaims;
use crate::config::AuthConfig;
use crate::error::{ErrorCode, PalisadeError, Result};

/// Audience value marking service-to-service tokens.
const SERVICE_AUDIENCE: &str = "palisade-internal";

/// Claims shape of a service token.
#[derive(Debug, Serialize, Deserialize)]
struct ServiceTokenClaims {
    sub: String,
    aud: String,
    exp: i64,
}

/// Issues and verifies signed tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    service_validation: Validation,
    token_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("validation", &self.validation)
            .field("service_validation", &self.service_validation)
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let secret = config.jwt_secret.as_ref().ok_or_else(|| {
            PalisadeError::new(
                ErrorCode::MissingConfiguration,
                "JWT secret is required to issue or verify tokens",
            )
        })?;

        let validation = Validation::new(Algorithm::HS256);

        let mut service_validation = Validation::new(Algorithm::HS256);
        service_validation.set_audience(&[SERVICE_AUDIENCE]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            service_validation,
            token_ttl: config.token_ttl,
        })
    }

    /// Seal a claims payload into a signed token. Stamps `exp` and a fresh
    /// `xsrf_token`; returns the token together with the final claims.
    pub fn issue(&self, mut claims: AccessClaims) -> Result<(String, AccessClaims)> {
        claims.exp = Some(self.expiry_timestamp());
        claims.xsrf_token = Some(generate_xsrf_token());

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok((token, claims))
    }

    fn expiry_timestamp(&self) -> i64 {
        (Utc::now() + chrono::Duration::seconds(self.token_ttl.as_secs() as i64)).timestamp()
    }

    /// Unseal and validate a user token.
    pub fn decode(&self, token: &str) -> Result<AccessClaims> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Issue a service-to-service token.
    pub fn issue_service_token(&self, service: &str) -> Result<String> {
        let claims = ServiceTokenClaims {
            sub: service.to_string(),
            aud: SERVICE_AUDIENCE.to_string(),
            exp: self.expiry_timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Unseal and validate a service token.
    pub fn decode_service_token(&self, token: &str) -> Result<ServiceCaller> {
        let data =
            decode::<ServiceTokenClaims>(token, &self.decoding_key, &self.service_validation)?;
        Ok(ServiceCaller {
            service: data.claims.sub,
        })
    }
}

/// Random anti-CSRF token, hex-encoded.
fn generate_xsrf_token() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    hasher.update(Uuid::new_v4().as_bytes());
    hex::encode(hasher.finalize())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
