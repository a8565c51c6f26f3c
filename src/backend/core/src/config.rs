//! Configuration management.
//!
//! The permission chain order and the claims layer order are configuration
//! data, not code: deployments compose the installed modules by listing their
//! names here.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Permission chain configuration
    #[serde(default)]
    pub permissions: PermissionsConfig,

    /// Licensing configuration
    #[serde(default)]
    pub licensing: LicensingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT signing secret (HS256). Required to issue or verify tokens.
    pub jwt_secret: Option<String>,

    /// Access token lifetime
    #[serde(with = "humantime_serde", default = "default_token_ttl")]
    pub token_ttl: Duration,

    /// Enable progressive login lockout
    #[serde(default = "default_lockout_enabled")]
    pub lockout_enabled: bool,

    /// Lockout durations in seconds keyed by failed attempt count.
    /// The highest matching threshold wins.
    #[serde(default = "default_lockout_thresholds")]
    pub lockout_thresholds: BTreeMap<u32, u64>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl: default_token_ttl(),
            lockout_enabled: default_lockout_enabled(),
            lockout_thresholds: default_lockout_thresholds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionsConfig {
    /// Ordered permission module names. Order matters: the first decisive
    /// verdict wins, so decisive modules placed early short-circuit.
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,

    /// Ordered claims layer names. Each layer extends the claims produced by
    /// the layers before it.
    #[serde(default = "default_claims_layers")]
    pub claims_layers: Vec<String>,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            modules: default_modules(),
            claims_layers: default_claims_layers(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LicensingConfig {
    /// Enable subscription verification against the payment provider.
    #[serde(default)]
    pub enabled: bool,

    /// Payment provider API base URL.
    pub provider_base_url: Option<String>,

    /// Payment provider API key.
    pub provider_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty, compact)
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format for production/structured logging
    #[default]
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact single-line format
    Compact,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_token_ttl() -> Duration {
    Duration::from_secs(15 * 60)
}
fn default_lockout_enabled() -> bool {
    true
}
fn default_lockout_thresholds() -> BTreeMap<u32, u64> {
    BTreeMap::from([(3, 60), (5, 900)])
}
fn default_modules() -> Vec<String> {
    vec![
        "internal_service".to_string(),
        "anonymous".to_string(),
        "claims".to_string(),
        "role".to_string(),
        "organization".to_string(),
    ]
}
fn default_claims_layers() -> Vec<String> {
    vec![
        "base".to_string(),
        "role".to_string(),
        "organization".to_string(),
    ]
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("PALISADE").separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }

    /// Load from a specific file path, with environment overrides.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("PALISADE").separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_module_order() {
        let permissions = PermissionsConfig::default();
        assert_eq!(
            permissions.modules,
            vec![
                "internal_service",
                "anonymous",
                "claims",
                "role",
                "organization"
            ]
        );
    }

    #[test]
    fn test_default_lockout_thresholds() {
        let auth = AuthConfig::default();
        assert!(auth.lockout_enabled);
        assert_eq!(auth.lockout_thresholds.get(&3), Some(&60));
        assert_eq!(auth.lockout_thresholds.get(&5), Some(&900));
    }

    #[test]
    fn test_licensing_disabled_by_default() {
        let licensing = LicensingConfig::default();
        assert!(!licensing.enabled);
        assert!(licensing.provider_base_url.is_none());
    }
}
