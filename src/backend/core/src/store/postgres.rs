//! Postgres implementations of the store traits.
//!
//! Queries are deliberately narrow: each returns exactly the relationship
//! data one permission module or claims layer consumes. All ids are stored
//! as text UUIDs.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::{BTreeMap, BTreeSet};

use crate::access::decision::{ClientId, UserId};
use crate::claims::payload::RuleValue;
use crate::error::Result;
use crate::registry::webservice::WebserviceId;
use crate::store::{
    OrganizationStore, RoleStore, SubscriptionRecord, SubscriptionStore, UserCredentials,
    UserProfile, UserStore,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Users
// ═══════════════════════════════════════════════════════════════════════════════

/// User lookups backed by the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn profile_from_row(row: &sqlx::postgres::PgRow) -> UserProfile {
        UserProfile {
            id: UserId::new(row.get::<String, _>("id")),
            login: row.get("login"),
            is_super_user: row.get("is_super_user"),
            enabled: row.get("enabled"),
            client_id: row
                .get::<Option<String>, _>("client_id")
                .map(ClientId::new),
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserCredentials>> {
        let row = sqlx::query(
            r#"
            SELECT id, login, password_hash, is_super_user, enabled, client_id
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserCredentials {
            profile: Self::profile_from_row(&row),
            password_hash: row.get("password_hash"),
        }))
    }

    async fn profile(&self, user_id: &UserId) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            r#"
            SELECT id, login, is_super_user, enabled, client_id
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Self::profile_from_row(&row)))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Roles
// ═══════════════════════════════════════════════════════════════════════════════

/// Global role relationships backed by `roles`, `user_roles`, and
/// `role_webservices`.
#[derive(Clone)]
pub struct PgRoleStore {
    pool: PgPool,
}

impl PgRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn role_webservices(&self, user_id: &UserId) -> Result<BTreeSet<WebserviceId>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT rw.webservice_id
            FROM role_webservices rw
            JOIN roles r ON r.id = rw.role_id
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1 AND r.enabled
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| WebserviceId::new(row.get::<String, _>("webservice_id")))
            .collect())
    }

    async fn has_role_grant(
        &self,
        user_id: &UserId,
        webservice_id: &WebserviceId,
    ) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_webservices rw
                JOIN roles r ON r.id = rw.role_id
                JOIN user_roles ur ON ur.role_id = r.id
                WHERE ur.user_id = $1 AND r.enabled AND rw.webservice_id = $2
            ) AS granted
            "#,
        )
        .bind(user_id.as_str())
        .bind(webservice_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("granted"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Organizations
// ═══════════════════════════════════════════════════════════════════════════════

/// Organization membership backed by `clients`, `client_users`, and
/// `client_user_roles`.
#[derive(Clone)]
pub struct PgOrganizationStore {
    pool: PgPool,
}

impl PgOrganizationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationStore for PgOrganizationStore {
    async fn owned_clients(&self, user_id: &UserId) -> Result<BTreeSet<ClientId>> {
        let rows = sqlx::query("SELECT id FROM clients WHERE owner_id = $1")
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| ClientId::new(row.get::<String, _>("id")))
            .collect())
    }

    async fn client_role_webservices(
        &self,
        user_id: &UserId,
    ) -> Result<BTreeMap<ClientId, BTreeSet<WebserviceId>>> {
        let rows = sqlx::query(
            r#"
            SELECT cu.client_id, rw.webservice_id
            FROM client_users cu
            JOIN client_user_roles cur
                ON cur.user_id = cu.user_id AND cur.client_id = cu.client_id
            JOIN roles r ON r.id = cur.role_id
            JOIN role_webservices rw ON rw.role_id = r.id
            WHERE cu.user_id = $1 AND r.enabled
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut map: BTreeMap<ClientId, BTreeSet<WebserviceId>> = BTreeMap::new();
        for row in rows {
            map.entry(ClientId::new(row.get::<String, _>("client_id")))
                .or_default()
                .insert(WebserviceId::new(row.get::<String, _>("webservice_id")));
        }
        Ok(map)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ═══════════════════════════════════════════════════════════════════════════════

/// Subscription data backed by `subscriptions`, `plan_version_rules`, and
/// `subscription_seats`.
#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn client_subscription(
        &self,
        client_id: &ClientId,
    ) -> Result<Option<SubscriptionRecord>> {
        let row = sqlx::query(
            r#"
            SELECT client_id, plan_id, plan_version_id,
                   provider_customer_id, provider_subscription_id
            FROM subscriptions
            WHERE client_id = $1
            "#,
        )
        .bind(client_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| SubscriptionRecord {
            client_id: ClientId::new(row.get::<String, _>("client_id")),
            plan_id: row.get("plan_id"),
            plan_version_id: row.get("plan_version_id"),
            provider_customer_id: row.get("provider_customer_id"),
            provider_subscription_id: row.get("provider_subscription_id"),
        }))
    }

    async fn plan_rules(&self, plan_version_id: &str) -> Result<BTreeMap<String, RuleValue>> {
        let rows = sqlx::query(
            r#"
            SELECT rule_id, limit_value
            FROM plan_version_rules
            WHERE plan_version_id = $1
            "#,
        )
        .bind(plan_version_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let rule_id: String = row.get("rule_id");
                let value = match row.get::<Option<i64>, _>("limit_value") {
                    // Quota rule
                    Some(limit) => RuleValue::Quota(limit),
                    // Feature toggle (presence = enabled)
                    None => RuleValue::Feature(true),
                };
                (rule_id, value)
            })
            .collect())
    }

    async fn clients_with_subscription(&self) -> Result<BTreeSet<ClientId>> {
        let rows = sqlx::query("SELECT DISTINCT client_id FROM subscriptions")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| ClientId::new(row.get::<String, _>("client_id")))
            .collect())
    }

    async fn user_has_seat(&self, user_id: &UserId) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM subscription_seats WHERE user_id = $1) AS seated",
        )
        .bind(user_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("seated"))
    }
}
