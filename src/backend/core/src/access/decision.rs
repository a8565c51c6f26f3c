//! The access decision model shared by every permission module.
//!
//! A decision is a tagged union, not a boolean: `Denied` and `Full` are
//! terminal, while `Scoped` carries the per-kind grants that later drive
//! row-level query filtering. Scoped grants from different modules are merged
//! by key union; later modules augment, never erase, earlier grants within
//! the same request.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::registry::entity::EntityAccessors;

// ═══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════════

/// Strongly-typed user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Strongly-typed client (organization) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Organization Scope
// ═══════════════════════════════════════════════════════════════════════════════

/// Kinds of organization an entity row can belong to.
///
/// New kinds are rare; a closed enum with exhaustive matching beats a
/// string-keyed map discovered at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgKind {
    Client,
    Department,
}

impl OrgKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Department => "department",
        }
    }
}

impl fmt::Display for OrgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payload of an `organization_role` grant: for each organization kind,
/// the set of organization ids the caller may reach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgScope(pub BTreeMap<OrgKind, BTreeSet<ClientId>>);

impl OrgScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scope over a single kind.
    pub fn of(kind: OrgKind, ids: impl IntoIterator<Item = ClientId>) -> Self {
        let mut scope = Self::new();
        for id in ids {
            scope.insert(kind, id);
        }
        scope
    }

    pub fn insert(&mut self, kind: OrgKind, id: ClientId) {
        self.0.entry(kind).or_default().insert(id);
    }

    pub fn ids(&self, kind: OrgKind) -> Option<&BTreeSet<ClientId>> {
        self.0.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OrgKind, &BTreeSet<ClientId>)> {
        self.0.iter()
    }

    /// Union another scope into this one.
    pub fn merge(&mut self, other: OrgScope) {
        for (kind, ids) in other.0 {
            self.0.entry(kind).or_default().extend(ids);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Scope Map
// ═══════════════════════════════════════════════════════════════════════════════

/// The accumulated scoped grants of one request, keyed by access kind.
///
/// Merging is additive on every kind: a `true` flag never reverts to `false`
/// and organization id sets only grow. Narrowing a grant is impossible here
/// on purpose; modules that need to narrow do so while constructing their
/// own scope, before it enters the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeMap {
    /// Rows owned by the caller are reachable.
    #[serde(default)]
    pub owner: bool,

    /// A global role grants unfiltered access.
    #[serde(default)]
    pub role: bool,

    /// Rows belonging to these organizations are reachable.
    #[serde(default)]
    pub organizations: OrgScope,
}

impl ScopeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope granting owner-filtered access.
    pub fn owner() -> Self {
        Self {
            owner: true,
            ..Self::default()
        }
    }

    /// A scope granting role-based (unfiltered) access.
    pub fn role() -> Self {
        Self {
            role: true,
            ..Self::default()
        }
    }

    /// A scope granting organization-filtered access.
    pub fn organizations(scope: OrgScope) -> Self {
        Self {
            organizations: scope,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.owner && !self.role && self.organizations.is_empty()
    }

    /// Key-union merge: kinds present in `other` are added to `self`,
    /// shared kinds are unioned, nothing is removed.
    pub fn merge(&mut self, other: ScopeMap) {
        self.owner |= other.owner;
        self.role |= other.role;
        self.organizations.merge(other.organizations);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Access Decision
// ═══════════════════════════════════════════════════════════════════════════════

/// The tri-state result of the permission chain.
///
/// Process-local: this value is never serialized across a service boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AccessDecision {
    /// No access. Short-circuits with an error code.
    #[default]
    Denied,
    /// Unconditional access; no row filtering applied.
    Full,
    /// Access conditioned on data; queries must be filtered.
    Scoped(ScopeMap),
}

impl AccessDecision {
    /// The pass/fail gate surfaced to callers.
    pub fn is_granted(&self) -> bool {
        !matches!(self, Self::Denied)
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// The scope map, when the decision is conditional.
    pub fn scoped(&self) -> Option<&ScopeMap> {
        match self {
            Self::Scoped(scope) => Some(scope),
            _ => None,
        }
    }

    /// Object-level check against a single already-loaded entity instance.
    ///
    /// Used when a webservice operates on one row fetched outside the
    /// constraint builder path: the decision is re-applied in memory via the
    /// entity's accessor hooks.
    pub fn permits_instance(
        &self,
        user_id: Option<&UserId>,
        instance: &dyn EntityAccessors,
    ) -> bool {
        let scope = match self {
            Self::Denied => return false,
            Self::Full => return true,
            Self::Scoped(scope) => scope,
        };

        // Role access passed the webservice gate already; no row condition.
        if scope.role {
            return true;
        }

        if scope.owner {
            if let Some(user_id) = user_id {
                if instance.accessing_users().contains(user_id) {
                    return true;
                }
            }
        }

        if !scope.organizations.is_empty() {
            let instance_orgs = instance.accessing_organizations();
            for (kind, granted_ids) in scope.organizations.iter() {
                if let Some(instance_ids) = instance_orgs.ids(*kind) {
                    if granted_ids.intersection(instance_ids).next().is_some() {
                        return true;
                    }
                }
            }
        }

        false
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeInstance {
        owners: Vec<UserId>,
        orgs: OrgScope,
    }

    impl EntityAccessors for FakeInstance {
        fn accessing_users(&self) -> Vec<UserId> {
            self.owners.clone()
        }

        fn accessing_organizations(&self) -> OrgScope {
            self.orgs.clone()
        }
    }

    fn client_scope(ids: &[&str]) -> OrgScope {
        OrgScope::of(OrgKind::Client, ids.iter().map(|id| ClientId::new(*id)))
    }

    #[test]
    fn test_merge_is_key_union() {
        let mut scope = ScopeMap::owner();
        scope.merge(ScopeMap::organizations(client_scope(&["c1"])));
        scope.merge(ScopeMap::organizations(client_scope(&["c2"])));

        assert!(scope.owner);
        assert!(!scope.role);
        let ids = scope.organizations.ids(OrgKind::Client).unwrap();
        assert!(ids.contains(&ClientId::new("c1")));
        assert!(ids.contains(&ClientId::new("c2")));
    }

    #[test]
    fn test_merge_never_erases() {
        let mut scope = ScopeMap::owner();
        scope.merge(ScopeMap::new());
        assert!(scope.owner);

        let mut scope = ScopeMap::organizations(client_scope(&["c1"]));
        scope.merge(ScopeMap::role());
        assert!(scope.role);
        assert!(scope.organizations.ids(OrgKind::Client).is_some());
    }

    #[test]
    fn test_empty_scope() {
        assert!(ScopeMap::new().is_empty());
        assert!(!ScopeMap::owner().is_empty());
        assert!(!ScopeMap::organizations(client_scope(&["c1"])).is_empty());
    }

    #[test]
    fn test_decision_gate() {
        assert!(!AccessDecision::Denied.is_granted());
        assert!(AccessDecision::Full.is_granted());
        assert!(AccessDecision::Scoped(ScopeMap::owner()).is_granted());
    }

    #[test]
    fn test_permits_instance_owner() {
        let instance = FakeInstance {
            owners: vec![UserId::new("u1")],
            orgs: OrgScope::new(),
        };
        let decision = AccessDecision::Scoped(ScopeMap::owner());

        assert!(decision.permits_instance(Some(&UserId::new("u1")), &instance));
        assert!(!decision.permits_instance(Some(&UserId::new("u2")), &instance));
        assert!(!decision.permits_instance(None, &instance));
    }

    #[test]
    fn test_permits_instance_role_skips_row_checks() {
        let instance = FakeInstance {
            owners: vec![],
            orgs: OrgScope::new(),
        };
        let decision = AccessDecision::Scoped(ScopeMap::role());
        assert!(decision.permits_instance(None, &instance));
    }

    #[test]
    fn test_permits_instance_organization_intersection() {
        let instance = FakeInstance {
            owners: vec![],
            orgs: client_scope(&["c1"]),
        };

        let granted = AccessDecision::Scoped(ScopeMap::organizations(client_scope(&["c1", "c9"])));
        let denied = AccessDecision::Scoped(ScopeMap::organizations(client_scope(&["c9"])));

        assert!(granted.permits_instance(None, &instance));
        assert!(!denied.permits_instance(None, &instance));
    }

    #[test]
    fn test_permits_instance_terminal_decisions() {
        let instance = FakeInstance {
            owners: vec![],
            orgs: OrgScope::new(),
        };
        assert!(AccessDecision::Full.permits_instance(None, &instance));
        assert!(!AccessDecision::Denied.permits_instance(None, &instance));
    }
}
