//! Pointer-to-system picking
//!
//! A pointer position in normalized device coordinates is turned into a world
//! ray by the camera. A [`Raycaster`] intersects it with the registry's
//! systems, and the [`Picker`] resolves the hits into hover and selection
//! transitions.

pub mod picker;
pub mod ray;

pub use picker::{PickContext, PickEvent, Picker};
pub use ray::{resolve_nearest, sort_hits, PickHit, PointCloudRaycaster, Ray, Raycaster};
