//! Webservice registry: the named, independently access-controlled units of
//! API surface and the access levels they declare.
//!
//! The registry is built once at process start and never mutated after
//! finalization; every inbound call resolves its target descriptor here
//! before any permission module runs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════════

/// Strongly-typed webservice identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WebserviceId(pub String);

impl WebserviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebserviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WebserviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WebserviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Access Levels
// ═══════════════════════════════════════════════════════════════════════════════

/// Named requirement categories a webservice can declare.
///
/// The set is closed: adding an access level means adding a permission module
/// (or claims layer) that understands it, so an enum is the honest shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    /// Any authenticated user.
    Connected,
    /// Only rows owned by the caller.
    Owner,
    /// Users holding a global role that lists the webservice.
    Role,
    /// Users with a role (or ownership) inside an organization.
    OrganizationRole,
    /// Service-to-service callers only.
    InternalService,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "CONNECTED",
            Self::Owner => "OWNER",
            Self::Role => "ROLE",
            Self::OrganizationRole => "ORGANIZATION_ROLE",
            Self::InternalService => "INTERNAL_SERVICE",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a public webservice is public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicType {
    /// Reachable by anyone, connected or not.
    Open,
    /// Reachable only by callers without a session (login, password reset).
    DisconnectedOnly,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Descriptor
// ═══════════════════════════════════════════════════════════════════════════════

/// Registry entry for one webservice. Immutable after registry finalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebserviceDescriptor {
    /// Unique webservice identifier (also its business name).
    pub id: WebserviceId,

    /// Disabled webservices are indistinguishable from unknown ones.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Present when the webservice is public; says how.
    #[serde(default)]
    pub public_type: Option<PublicType>,

    /// Licensed webservices additionally require an active subscription.
    #[serde(default)]
    pub is_licensed: bool,

    /// Access levels this webservice declares.
    #[serde(default)]
    pub access_levels: BTreeSet<AccessLevel>,
}

fn default_enabled() -> bool {
    true
}

impl WebserviceDescriptor {
    /// Create an enabled, private descriptor with no access levels.
    pub fn new(id: impl Into<WebserviceId>) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            public_type: None,
            is_licensed: false,
            access_levels: BTreeSet::new(),
        }
    }

    /// Mark the webservice public.
    pub fn public(mut self, public_type: PublicType) -> Self {
        self.public_type = Some(public_type);
        self
    }

    /// Declare an access level.
    pub fn access_level(mut self, level: AccessLevel) -> Self {
        self.access_levels.insert(level);
        self
    }

    /// Mark the webservice as requiring an active subscription.
    pub fn licensed(mut self) -> Self {
        self.is_licensed = true;
        self
    }

    /// Disable the webservice.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether the webservice is public in any form.
    pub fn is_public(&self) -> bool {
        self.public_type.is_some()
    }

    /// Whether the webservice declares the given access level.
    pub fn has_level(&self, level: AccessLevel) -> bool {
        self.access_levels.contains(&level)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// The finalized, read-only webservice registry.
///
/// Shared across all request tasks without locking: it is the only piece of
/// authorization state that outlives a request, and it never changes after
/// [`WebserviceRegistryBuilder::finalize`].
#[derive(Debug)]
pub struct WebserviceRegistry {
    entries: HashMap<WebserviceId, WebserviceDescriptor>,
}

impl WebserviceRegistry {
    /// Start building a registry.
    pub fn builder() -> WebserviceRegistryBuilder {
        WebserviceRegistryBuilder {
            entries: HashMap::new(),
        }
    }

    /// Look up a descriptor by id.
    pub fn get(&self, id: &WebserviceId) -> Option<&WebserviceDescriptor> {
        self.entries.get(id)
    }

    /// Iterate over all descriptors.
    pub fn iter(&self) -> impl Iterator<Item = &WebserviceDescriptor> {
        self.entries.values()
    }

    /// All enabled descriptors declaring the given access level.
    pub fn with_level(&self, level: AccessLevel) -> Vec<&WebserviceDescriptor> {
        self.entries
            .values()
            .filter(|ws| ws.enabled && ws.has_level(level))
            .collect()
    }

    /// Number of registered webservices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for the webservice registry.
pub struct WebserviceRegistryBuilder {
    entries: HashMap<WebserviceId, WebserviceDescriptor>,
}

impl WebserviceRegistryBuilder {
    /// Register a descriptor. Re-registering an id replaces the previous
    /// entry; last registration wins, matching app layering order.
    pub fn register(mut self, descriptor: WebserviceDescriptor) -> Self {
        self.entries.insert(descriptor.id.clone(), descriptor);
        self
    }

    /// Register many descriptors (e.g., deserialized from configuration).
    pub fn register_all(mut self, descriptors: Vec<WebserviceDescriptor>) -> Self {
        for descriptor in descriptors {
            self.entries.insert(descriptor.id.clone(), descriptor);
        }
        self
    }

    /// Finalize into the immutable registry.
    pub fn finalize(self) -> Arc<WebserviceRegistry> {
        Arc::new(WebserviceRegistry {
            entries: self.entries,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
