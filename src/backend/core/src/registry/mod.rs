//! Startup-built registries: the webservice catalogue and the typed entity
//! capability registry. Both are immutable once the process starts serving.

pub mod entity;
pub mod webservice;

pub use entity::{EntityAccessors, EntityDescriptor, EntityRegistry};
pub use webservice::{
    AccessLevel, PublicType, WebserviceDescriptor, WebserviceId, WebserviceRegistry,
    WebserviceRegistryBuilder,
};
