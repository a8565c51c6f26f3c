//! Persistence layer.
//!
//! Permission modules and claims layers read supplementary relationship data
//! (roles, memberships, subscriptions) through the narrow traits defined
//! here, so policy code never touches SQL directly and tests can substitute
//! in-memory fakes. The Postgres implementations live in [`postgres`].

pub mod entities;
pub mod postgres;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::collections::{BTreeMap, BTreeSet};

use crate::access::decision::{ClientId, UserId};
use crate::claims::payload::RuleValue;
use crate::error::Result;
use crate::registry::webservice::WebserviceId;

pub use entities::{register_entities, RoleEntity, UserEntity, UserRow};
pub use postgres::{PgOrganizationStore, PgRoleStore, PgSubscriptionStore, PgUserStore};

// ═══════════════════════════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════════════════════════

/// A user as the authorization engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub login: String,
    pub is_super_user: bool,
    pub enabled: bool,
    /// Client the user is a member of, if any.
    pub client_id: Option<ClientId>,
}

/// A user plus the credential material needed at login time.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub profile: UserProfile,
    /// PHC-formatted password hash; `None` for SSO-only accounts.
    pub password_hash: Option<String>,
}

/// A client's subscription row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub client_id: ClientId,
    pub plan_id: String,
    pub plan_version_id: String,
    /// Payment provider ids; both `None` for free plans.
    pub provider_customer_id: Option<String>,
    pub provider_subscription_id: Option<String>,
}

impl SubscriptionRecord {
    /// Free-plan subscriptions have no provider-side counterpart.
    pub fn is_free(&self) -> bool {
        self.provider_subscription_id.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Store Traits
// ═══════════════════════════════════════════════════════════════════════════════

/// User lookups.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserCredentials>>;

    async fn profile(&self, user_id: &UserId) -> Result<Option<UserProfile>>;
}

/// Global role relationships.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Webservices reachable through the user's enabled roles.
    async fn role_webservices(&self, user_id: &UserId) -> Result<BTreeSet<WebserviceId>>;

    /// Whether any enabled role of the user lists the webservice.
    async fn has_role_grant(&self, user_id: &UserId, webservice_id: &WebserviceId)
        -> Result<bool>;
}

/// Organization membership relationships.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Clients owned by the user.
    async fn owned_clients(&self, user_id: &UserId) -> Result<BTreeSet<ClientId>>;

    /// Per-client webservices granted through the user's organization role
    /// assignments.
    async fn client_role_webservices(
        &self,
        user_id: &UserId,
    ) -> Result<BTreeMap<ClientId, BTreeSet<WebserviceId>>>;
}

/// Subscription and plan-rule relationships.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// The client's subscription, if one exists.
    async fn client_subscription(&self, client_id: &ClientId)
        -> Result<Option<SubscriptionRecord>>;

    /// Rules attached to a plan version.
    async fn plan_rules(&self, plan_version_id: &str) -> Result<BTreeMap<String, RuleValue>>;

    /// Clients holding any subscription.
    async fn clients_with_subscription(&self) -> Result<BTreeSet<ClientId>>;

    /// Whether the user occupies a seat on their client's subscription.
    async fn user_has_seat(&self, user_id: &UserId) -> Result<bool>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Database
// ═══════════════════════════════════════════════════════════════════════════════

/// Database connection pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new connection pool.
    pub async fn new(database_url: &str, max_connections: u32, min_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| crate::error::PalisadeError::from(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
