//! Error handling for Palisade Core.
//!
//! This module provides:
//! - Machine-readable error codes for API responses
//! - HTTP status code mapping
//! - A strict split between user-facing and internal messages, so that
//!   authorization denials never disclose tenant or role structure
//! - Error logging with tracing integration
//! - Metrics integration for error tracking
//!
//! # Usage
//!
//! ```rust,ignore
//! use palisade_core::error::{PalisadeError, Result, ErrorContext};
//!
//! fn my_function() -> Result<()> {
//!     some_operation().context("Failed to perform operation")?;
//!     Ok(())
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

// ═══════════════════════════════════════════════════════════════════════════════
// Result Type Alias
// ═══════════════════════════════════════════════════════════════════════════════

/// A specialized Result type for Palisade operations.
pub type Result<T> = std::result::Result<T, PalisadeError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes for API responses.
///
/// These codes are stable and can be used by clients for programmatic error
/// handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authorization (4000-4099)
    UnknownWebservice,
    PermissionDenied,
    AlreadyConnected,
    Unauthorized,
    InvalidToken,
    TokenExpired,
    InvalidCredentials,
    RateLimited,

    // Licensing (4200-4299)
    NoActiveSubscription,
    SubscriptionInactive,
    QuotaExceeded,
    FeatureNotAvailable,

    // Database (2000-2099)
    DatabaseError,
    DatabaseConnectionFailed,
    DatabaseQueryFailed,
    RecordNotFound,
    DuplicateRecord,

    // Serialization (2200-2299)
    SerializationError,
    DeserializationError,

    // External services (3000-3099)
    ProviderError,
    NetworkError,

    // Configuration / deployment defects (5000-5099)
    ConfigurationError,
    MissingConfiguration,
    InvalidConfiguration,
    EntityNotRegistered,
    EntityRequired,
    MissingTenantFilter,

    // Internal (9000-9099)
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            // Authorization
            Self::UnknownWebservice => 4000,
            Self::PermissionDenied => 4001,
            Self::AlreadyConnected => 4002,
            Self::Unauthorized => 4003,
            Self::InvalidToken => 4004,
            Self::TokenExpired => 4005,
            Self::InvalidCredentials => 4006,
            Self::RateLimited => 4007,

            // Licensing
            Self::NoActiveSubscription => 4200,
            Self::SubscriptionInactive => 4201,
            Self::QuotaExceeded => 4202,
            Self::FeatureNotAvailable => 4203,

            // Database
            Self::DatabaseError => 2000,
            Self::DatabaseConnectionFailed => 2001,
            Self::DatabaseQueryFailed => 2002,
            Self::RecordNotFound => 2003,
            Self::DuplicateRecord => 2004,

            // Serialization
            Self::SerializationError => 2200,
            Self::DeserializationError => 2201,

            // External services
            Self::ProviderError => 3000,
            Self::NetworkError => 3001,

            // Configuration
            Self::ConfigurationError => 5000,
            Self::MissingConfiguration => 5001,
            Self::InvalidConfiguration => 5002,
            Self::EntityNotRegistered => 5003,
            Self::EntityRequired => 5004,
            Self::MissingTenantFilter => 5005,

            // Internal
            Self::InternalError => 9000,
        }
    }

    /// Get the HTTP status code for this error.
    pub const fn http_status(&self) -> StatusCode {
        match self {
            // Not Found (404): an unknown webservice is indistinguishable
            // from a disabled one on purpose.
            Self::UnknownWebservice | Self::RecordNotFound => StatusCode::NOT_FOUND,

            // Unauthorized (401)
            Self::Unauthorized
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,

            // Forbidden (403)
            Self::PermissionDenied
            | Self::AlreadyConnected
            | Self::NoActiveSubscription
            | Self::SubscriptionInactive
            | Self::FeatureNotAvailable => StatusCode::FORBIDDEN,

            // Too Many Requests (429)
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            // Payment Required (402)
            Self::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,

            // Conflict (409)
            Self::DuplicateRecord => StatusCode::CONFLICT,

            // Service Unavailable (503)
            Self::DatabaseConnectionFailed | Self::ProviderError => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // Bad Gateway (502)
            Self::NetworkError => StatusCode::BAD_GATEWAY,

            // Internal Server Error (500)
            Self::DatabaseError
            | Self::DatabaseQueryFailed
            | Self::SerializationError
            | Self::DeserializationError
            | Self::ConfigurationError
            | Self::MissingConfiguration
            | Self::InvalidConfiguration
            | Self::EntityNotRegistered
            | Self::EntityRequired
            | Self::MissingTenantFilter
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error is retryable.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseConnectionFailed
                | Self::DatabaseQueryFailed
                | Self::ProviderError
                | Self::NetworkError
                | Self::RateLimited
        )
    }

    /// Get the error category for grouping.
    pub const fn category(&self) -> &'static str {
        match self.numeric_code() {
            2000..=2099 => "database",
            2200..=2299 => "serialization",
            3000..=3099 => "external_service",
            4000..=4099 => "authorization",
            4200..=4299 => "licensing",
            5000..=5099 => "configuration",
            9000..=9099 => "internal",
            _ => "unknown",
        }
    }

    /// Configuration errors signal a programming or deployment defect and
    /// must never be downgraded to an authorization denial.
    pub const fn is_misconfiguration(&self) -> bool {
        matches!(self.numeric_code(), 5000..=5099)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Severity
// ═══════════════════════════════════════════════════════════════════════════════

/// Severity level for errors (affects logging and alerting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// User errors (denied access, bad credentials)
    Low,
    /// Operational issues (rate limits, provider hiccups)
    Medium,
    /// System errors (database failures)
    High,
    /// Deployment defects requiring immediate attention
    Critical,
}

impl ErrorSeverity {
    /// Get severity based on error code.
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            // Low severity - ordinary denials and user errors
            ErrorCode::UnknownWebservice
            | ErrorCode::PermissionDenied
            | ErrorCode::AlreadyConnected
            | ErrorCode::Unauthorized
            | ErrorCode::InvalidToken
            | ErrorCode::TokenExpired
            | ErrorCode::InvalidCredentials
            | ErrorCode::RecordNotFound
            | ErrorCode::DuplicateRecord => Self::Low,

            // Medium severity - operational
            ErrorCode::RateLimited
            | ErrorCode::NoActiveSubscription
            | ErrorCode::SubscriptionInactive
            | ErrorCode::QuotaExceeded
            | ErrorCode::FeatureNotAvailable
            | ErrorCode::ProviderError
            | ErrorCode::NetworkError => Self::Medium,

            // High severity - system errors
            ErrorCode::DatabaseError
            | ErrorCode::DatabaseQueryFailed
            | ErrorCode::SerializationError
            | ErrorCode::DeserializationError
            | ErrorCode::InternalError => Self::High,

            // Critical - the process is misconfigured or the database is gone
            ErrorCode::DatabaseConnectionFailed
            | ErrorCode::ConfigurationError
            | ErrorCode::MissingConfiguration
            | ErrorCode::InvalidConfiguration
            | ErrorCode::EntityNotRegistered
            | ErrorCode::EntityRequired
            | ErrorCode::MissingTenantFilter => Self::Critical,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The main error type for Palisade Core.
///
/// The user-facing message is generic by design: callers only ever observe
/// "allowed" or a denial. Which module denied, or which scoped keys were
/// missing, is visible only in server-side logs via the internal message.
#[derive(Error, Debug)]
pub struct PalisadeError {
    /// Machine-readable error code
    code: ErrorCode,

    /// User-friendly error message (safe to expose to clients)
    user_message: Cow<'static, str>,

    /// Detailed internal message (for logging only)
    internal_message: Option<String>,

    /// Additional structured context (logging only)
    context: HashMap<String, serde_json::Value>,

    /// The source error that caused this error
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for PalisadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)?;
        if let Some(ref internal) = self.internal_message {
            write!(f, " (internal: {})", internal)?;
        }
        Ok(())
    }
}

impl PalisadeError {
    // ─────────────────────────────────────────────────────────────────────────
    // Constructors
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new error with code and user message.
    pub fn new(code: ErrorCode, user_message: impl Into<Cow<'static, str>>) -> Self {
        let error = Self {
            code,
            user_message: user_message.into(),
            internal_message: None,
            context: HashMap::new(),
            source: None,
        };
        error.record_metrics();
        error
    }

    /// Create an error with both user and internal messages.
    pub fn with_internal(
        code: ErrorCode,
        user_message: impl Into<Cow<'static, str>>,
        internal_message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(code, user_message);
        error.internal_message = Some(internal_message.into());
        error
    }

    /// Create an internal error (500).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::InternalError,
            "An internal error occurred",
            message,
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization errors
    // ─────────────────────────────────────────────────────────────────────────

    /// The requested webservice does not exist or is disabled. Both cases
    /// produce the same code so that probing cannot distinguish them.
    pub fn unknown_webservice(webservice_id: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::UnknownWebservice,
            "Unknown webservice",
            format!("webservice '{}' missing or disabled", webservice_id.into()),
        )
    }

    /// Generic denial. The internal reason stays server-side.
    pub fn permission_denied(internal_reason: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::PermissionDenied,
            "You do not have permission to perform this action",
            internal_reason,
        )
    }

    /// A disconnected-only public webservice was called with a live session.
    pub fn already_connected() -> Self {
        Self::new(
            ErrorCode::AlreadyConnected,
            "This operation is only available to disconnected users",
        )
    }

    /// Uniform credential failure. Every failed login path returns this
    /// exact error so that accounts cannot be enumerated.
    pub fn invalid_credentials(internal_reason: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::InvalidCredentials,
            "Invalid login or password",
            internal_reason,
        )
    }

    /// Too many failed login attempts.
    pub fn rate_limited(remaining_seconds: i64) -> Self {
        Self::new(
            ErrorCode::RateLimited,
            "Too many failed attempts, try again later",
        )
        .with_context("remaining_seconds", remaining_seconds)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Licensing errors
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a no-active-subscription error.
    pub fn no_active_subscription(client_id: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::NoActiveSubscription,
            "No active subscription",
            format!("client '{}' has no active subscription", client_id.into()),
        )
    }

    /// Create a subscription-inactive error.
    pub fn subscription_inactive(status: impl Into<String>) -> Self {
        let status = status.into();
        Self::new(
            ErrorCode::SubscriptionInactive,
            "Your subscription is not active",
        )
        .with_context("status", status)
    }

    /// Create a quota exceeded error.
    pub fn quota_exceeded(rule_id: impl Into<String>, current: i64, limit: i64) -> Self {
        Self::new(
            ErrorCode::QuotaExceeded,
            format!(
                "Quota exceeded for {}: {}/{}",
                rule_id.into(),
                current,
                limit
            ),
        )
        .with_context("current", current)
        .with_context("limit", limit)
    }

    /// Create a feature-not-available error.
    pub fn feature_not_available(rule_id: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::FeatureNotAvailable,
            format!("Feature {} is not available in your plan", rule_id.into()),
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration errors
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::ConfigurationError,
            "Server configuration error",
            message,
        )
    }

    /// An entity descriptor was requested that was never registered.
    pub fn entity_not_registered(type_name: &'static str) -> Self {
        Self::with_internal(
            ErrorCode::EntityNotRegistered,
            "Server configuration error",
            format!("entity type '{}' is not registered", type_name),
        )
    }

    /// Row-level filtering was requested without supplying an entity
    /// descriptor to filter with.
    pub fn entity_required() -> Self {
        Self::with_internal(
            ErrorCode::EntityRequired,
            "Server configuration error",
            "an entity descriptor is required for scoped access filtering",
        )
    }

    /// A tenant-scoped entity reached organization filtering without
    /// overriding its organization access filters.
    pub fn missing_tenant_filter(table: &str, tenant_column: &str) -> Self {
        Self::with_internal(
            ErrorCode::MissingTenantFilter,
            "Server configuration error",
            format!(
                "entity '{}' carries tenant column '{}' but does not override \
                 organization access filters and is not marked tenant-exempt",
                table, tenant_column
            ),
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Add internal message.
    pub fn with_internal_message(mut self, message: impl Into<String>) -> Self {
        self.internal_message = Some(message.into());
        self
    }

    /// Add structured context (logging only, never serialized to clients).
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the user-friendly message.
    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    /// Get the internal message (if any).
    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Logging
    // ─────────────────────────────────────────────────────────────────────────

    /// Log this error with appropriate severity.
    pub fn log(&self) {
        let code = self.code.to_string();
        let category = self.code.category();
        let status = self.http_status().as_u16();

        match self.severity() {
            ErrorSeverity::Critical => {
                error!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    context = ?self.context,
                    source = ?self.source,
                    "CRITICAL ERROR"
                );
            }
            ErrorSeverity::High => {
                error!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    "High severity error"
                );
            }
            ErrorSeverity::Medium => {
                warn!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    "Medium severity error"
                );
            }
            ErrorSeverity::Low => {
                tracing::debug!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    "Low severity error"
                );
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Metrics
    // ─────────────────────────────────────────────────────────────────────────

    /// Record error metrics.
    fn record_metrics(&self) {
        counter!(
            "palisade_errors_total",
            "code" => self.code.to_string(),
            "category" => self.code.category().to_string(),
            "retryable" => self.is_retryable().to_string(),
        )
        .increment(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API Response
// ═══════════════════════════════════════════════════════════════════════════════

/// Error response for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Whether the request was successful (always false for errors)
    pub success: bool,

    /// Error information
    pub error: ErrorInfo,
}

/// Error information for API responses. Deliberately sparse: no internal
/// message, no context, no module identity.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Numeric error code
    pub numeric_code: u32,

    /// User-friendly error message
    pub message: String,

    /// Timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<&PalisadeError> for ErrorResponse {
    fn from(error: &PalisadeError) -> Self {
        Self {
            success: false,
            error: ErrorInfo {
                code: error.code,
                numeric_code: error.code.numeric_code(),
                message: error.user_message.to_string(),
                timestamp: chrono::Utc::now(),
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Axum Integration
// ═══════════════════════════════════════════════════════════════════════════════

impl IntoResponse for PalisadeError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.http_status();
        let response = ErrorResponse::from(&self);

        (status, Json(response)).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Context Extension Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with error code.
    fn with_error_code(self, code: ErrorCode) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| PalisadeError::internal(message.into()).with_source(e))
    }

    fn with_error_code(self, code: ErrorCode) -> Result<T> {
        self.map_err(|e| PalisadeError::new(code, e.to_string()).with_source(e))
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| PalisadeError::new(ErrorCode::RecordNotFound, message.into()))
    }

    fn with_error_code(self, code: ErrorCode) -> Result<T> {
        self.ok_or_else(|| PalisadeError::new(code, "Resource not found"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// From Implementations for Common Error Types
// ═══════════════════════════════════════════════════════════════════════════════

impl From<sqlx::Error> for PalisadeError {
    fn from(error: sqlx::Error) -> Self {
        let (code, user_msg) = match &error {
            sqlx::Error::RowNotFound => (
                ErrorCode::RecordNotFound,
                "The requested record was not found",
            ),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("unique") || constraint.contains("pkey") {
                        return Self::with_internal(
                            ErrorCode::DuplicateRecord,
                            "A record with this identifier already exists",
                            format!("Constraint violation: {}", constraint),
                        )
                        .with_source(error);
                    }
                }
                (ErrorCode::DatabaseQueryFailed, "A database error occurred")
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => (
                ErrorCode::DatabaseConnectionFailed,
                "Unable to connect to the database",
            ),
            _ => (ErrorCode::DatabaseError, "A database error occurred"),
        };

        Self::with_internal(code, user_msg, error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for PalisadeError {
    fn from(error: serde_json::Error) -> Self {
        let code = if error.is_syntax() || error.is_data() || error.is_eof() {
            ErrorCode::DeserializationError
        } else {
            ErrorCode::SerializationError
        };

        Self::with_internal(code, "Failed to process JSON data", error.to_string())
            .with_source(error)
    }
}

impl From<reqwest::Error> for PalisadeError {
    fn from(error: reqwest::Error) -> Self {
        let (code, user_msg) = if error.is_timeout() || error.is_connect() {
            (
                ErrorCode::NetworkError,
                "Failed to reach external service",
            )
        } else {
            (
                ErrorCode::ProviderError,
                "External service returned an error",
            )
        };

        Self::with_internal(code, user_msg, error.to_string()).with_source(error)
    }
}

impl From<jsonwebtoken::errors::Error> for PalisadeError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        let code = match error.kind() {
            ErrorKind::ExpiredSignature => ErrorCode::TokenExpired,
            ErrorKind::InvalidToken | ErrorKind::InvalidSignature => ErrorCode::InvalidToken,
            _ => ErrorCode::InvalidToken,
        };

        Self::with_internal(code, "Invalid authentication token", error.to_string())
            .with_source(error)
    }
}

impl From<config::ConfigError> for PalisadeError {
    fn from(error: config::ConfigError) -> Self {
        let (code, user_msg) = match &error {
            config::ConfigError::NotFound(_) => (
                ErrorCode::MissingConfiguration,
                "Required configuration not found",
            ),
            config::ConfigError::PathParse(_) | config::ConfigError::FileParse { .. } => (
                ErrorCode::InvalidConfiguration,
                "Configuration file is invalid",
            ),
            _ => (
                ErrorCode::ConfigurationError,
                "Configuration error occurred",
            ),
        };

        Self::with_internal(code, user_msg, error.to_string())
    }
}

impl From<anyhow::Error> for PalisadeError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<PalisadeError>() {
            Ok(palisade_error) => palisade_error,
            Err(error) => Self::with_internal(
                ErrorCode::InternalError,
                "An internal error occurred",
                error.to_string(),
            ),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
