//! Scale-driven level of detail
//!
//! The camera-to-target distance sets the map scale. Crossing the far-view
//! threshold switches between the near view (individual systems) and the far
//! view (galaxy overview).

pub mod controller;

pub use controller::{LodController, LodTransition, LodUpdate, ViewMode};
