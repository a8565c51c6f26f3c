//! Concrete entity descriptors shipped with the engine.
//!
//! `users` is the canonical tenant-scoped entity: rows belong to a client
//! through `client_id` and to themselves through `id`, so it overrides both
//! filter hooks. `roles` is global reference data with no tenant shape.

use serde::Serialize;
use sqlx::FromRow;

use crate::access::constraints::{Predicate, StatementFilter};
use crate::access::decision::{ClientId, OrgKind, OrgScope, UserId};
use crate::registry::entity::{EntityAccessors, EntityDescriptor, EntityRegistry};

/// Marker type for the `users` table.
pub struct UserEntity;

/// Marker type for the `roles` table.
pub struct RoleEntity;

/// One row of the `users` listing surface.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserRow {
    pub id: String,
    pub login: String,
    pub client_id: Option<String>,
}

impl EntityAccessors for UserRow {
    fn accessing_users(&self) -> Vec<UserId> {
        vec![UserId::new(self.id.clone())]
    }

    fn accessing_organizations(&self) -> OrgScope {
        match &self.client_id {
            Some(client_id) => OrgScope::of(OrgKind::Client, [ClientId::new(client_id.clone())]),
            None => OrgScope::new(),
        }
    }
}

/// Organization filter for `users`: rows whose `client_id` is inside the
/// granted client scope.
fn user_organization_filters(scope: &OrgScope) -> StatementFilter {
    let ids: Vec<String> = scope
        .ids(OrgKind::Client)
        .map(|ids| ids.iter().map(|id| id.0.clone()).collect())
        .unwrap_or_default();

    if ids.is_empty() {
        return StatementFilter::empty();
    }

    StatementFilter::predicate(Predicate::any_text("users.client_id", ids))
}

/// Owner filter for `users`: a user owns their own row.
fn user_owner_filters(user_id: &UserId) -> StatementFilter {
    StatementFilter::predicate(Predicate::eq_text("users.id", user_id.as_str()))
}

/// Register the built-in entity descriptors.
pub fn register_entities(registry: &mut EntityRegistry) {
    registry.register::<UserEntity>(
        EntityDescriptor::new("users")
            .with_tenant_column("client_id")
            .user_filters(user_owner_filters)
            .organization_filters(user_organization_filters),
    );

    registry.register::<RoleEntity>(EntityDescriptor::new("roles"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
