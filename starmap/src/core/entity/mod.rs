//! System entities and the registry that owns them
//!
//! Systems live in a `hecs` world owned by [`SystemRegistry`]. Everything
//! outside the registry holds [`SystemRef`] handles, which carry the registry
//! generation they were issued in and go stale when the set is replaced.

pub mod components;
pub mod registry;

pub use components::{
    distance_to_sol, Categories, EntityKind, Pickability, Position, SystemInfo, SystemRecord,
    SystemSnapshot,
};
pub use registry::{CategoryPolicy, RegistryError, SystemRef, SystemRegistry};

// Re-export hecs types that users will need
pub use hecs::Entity;
