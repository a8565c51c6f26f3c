//! Entity capability registry: the per-entity filtering hooks consumed by
//! the statement constraint builder, resolved through a typed registry
//! instead of string-keyed reflection.
//!
//! A persisted entity participates in row-level access control through its
//! [`EntityDescriptor`]: owner filtering via `user_filters`, tenant filtering
//! via `organization_filters`. The default for both is "no filtering" — safe
//! for global data, catastrophic for tenant-scoped data. That is why a
//! descriptor that declares a tenant column but leaves organization filters
//! at the default is a fatal misconfiguration, caught at registry validation
//! and again the first time organization-scoped access is evaluated.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::access::constraints::StatementFilter;
use crate::access::decision::{OrgScope, UserId};
use crate::error::{PalisadeError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// Instance Accessors
// ═══════════════════════════════════════════════════════════════════════════════

/// Instance-level access hooks, used by the in-memory permission check on a
/// single already-loaded row.
pub trait EntityAccessors {
    /// Users who own this row.
    fn accessing_users(&self) -> Vec<UserId> {
        Vec::new()
    }

    /// Organizations this row belongs to, by kind.
    fn accessing_organizations(&self) -> OrgScope {
        OrgScope::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Descriptor
// ═══════════════════════════════════════════════════════════════════════════════

/// Query-filter hook computing the owner predicates for a user.
pub type UserFilterFn = dyn Fn(&UserId) -> StatementFilter + Send + Sync;

/// Query-filter hook computing the tenant predicates for an organization
/// scope.
pub type OrgFilterFn = dyn Fn(&OrgScope) -> StatementFilter + Send + Sync;

/// Describes one persisted entity's access-filtering capabilities.
pub struct EntityDescriptor {
    table: &'static str,
    tenant_column: Option<&'static str>,
    tenant_exempt: bool,
    user_filters: Option<Arc<UserFilterFn>>,
    organization_filters: Option<Arc<OrgFilterFn>>,
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("table", &self.table)
            .field("tenant_column", &self.tenant_column)
            .field("tenant_exempt", &self.tenant_exempt)
            .field("user_filters", &self.user_filters.is_some())
            .field("organization_filters", &self.organization_filters.is_some())
            .finish()
    }
}

impl EntityDescriptor {
    /// Create a descriptor for the given table with default (no-op) filters.
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            tenant_column: None,
            tenant_exempt: false,
            user_filters: None,
            organization_filters: None,
        }
    }

    /// Declare the entity's tenant-scoping column.
    pub fn with_tenant_column(mut self, column: &'static str) -> Self {
        self.tenant_column = Some(column);
        self
    }

    /// Mark the entity as global reference/configuration data, exempt from
    /// the tenant-filter safety net even if it carries a tenant-shaped
    /// column.
    pub fn tenant_exempt(mut self) -> Self {
        self.tenant_exempt = true;
        self
    }

    /// Override the owner filtering hook.
    pub fn user_filters<F>(mut self, f: F) -> Self
    where
        F: Fn(&UserId) -> StatementFilter + Send + Sync + 'static,
    {
        self.user_filters = Some(Arc::new(f));
        self
    }

    /// Override the organization filtering hook.
    pub fn organization_filters<F>(mut self, f: F) -> Self
    where
        F: Fn(&OrgScope) -> StatementFilter + Send + Sync + 'static,
    {
        self.organization_filters = Some(Arc::new(f));
        self
    }

    /// The entity's table name.
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// The declared tenant column, if any.
    pub fn tenant_column(&self) -> Option<&'static str> {
        self.tenant_column
    }

    /// Whether organization filtering was overridden from the default.
    pub fn overrides_organization_filters(&self) -> bool {
        self.organization_filters.is_some()
    }

    /// Whether this descriptor violates the tenant-filter invariant.
    pub fn is_missing_tenant_filter(&self) -> bool {
        self.tenant_column.is_some() && self.organization_filters.is_none() && !self.tenant_exempt
    }

    /// Owner filter predicates for the given user. The default is no
    /// filtering (an empty filter contributes nothing to the OR set).
    pub fn user_access_filters(&self, user_id: &UserId) -> StatementFilter {
        match &self.user_filters {
            Some(f) => f(user_id),
            None => StatementFilter::empty(),
        }
    }

    /// Tenant filter predicates for the given organization scope.
    ///
    /// Fails loudly when the entity declares a tenant column without
    /// overriding this hook: returning no filter here would silently leak
    /// rows across organizations.
    pub fn organization_access_filters(&self, scope: &OrgScope) -> Result<StatementFilter> {
        if self.is_missing_tenant_filter() {
            return Err(PalisadeError::missing_tenant_filter(
                self.table,
                self.tenant_column.unwrap_or_default(),
            ));
        }

        Ok(match &self.organization_filters {
            Some(f) => f(scope),
            None => StatementFilter::empty(),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Typed entity registry, populated at startup and validated before serving.
///
/// Entities are keyed by a marker type, so a lookup is a compile-time-checked
/// `descriptor::<UserEntity>()` instead of a string that may or may not
/// resolve.
#[derive(Default)]
pub struct EntityRegistry {
    entries: HashMap<TypeId, (&'static str, Arc<EntityDescriptor>)>,
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables: Vec<&str> = self.entries.values().map(|(_, d)| d.table()).collect();
        f.debug_struct("EntityRegistry")
            .field("tables", &tables)
            .finish()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its marker type.
    pub fn register<E: Any>(&mut self, descriptor: EntityDescriptor) {
        self.entries
            .insert(TypeId::of::<E>(), (type_name::<E>(), Arc::new(descriptor)));
    }

    /// Resolve a descriptor by marker type.
    pub fn descriptor<E: Any>(&self) -> Result<Arc<EntityDescriptor>> {
        self.entries
            .get(&TypeId::of::<E>())
            .map(|(_, d)| Arc::clone(d))
            .ok_or_else(|| PalisadeError::entity_not_registered(type_name::<E>()))
    }

    /// Validate every registered descriptor. Run once at startup, after all
    /// extension crates have registered their entities: a tenant-scoped
    /// entity without an organization-filter override fails here instead of
    /// on its first scoped query.
    pub fn validate(&self) -> Result<()> {
        for (_, descriptor) in self.entries.values() {
            if descriptor.is_missing_tenant_filter() {
                return Err(PalisadeError::missing_tenant_filter(
                    descriptor.table(),
                    descriptor.tenant_column().unwrap_or_default(),
                ));
            }
        }
        Ok(())
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
