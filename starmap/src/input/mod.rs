//! Pointer input tracking

pub mod pointer;

pub use pointer::{PointerEvent, PointerState};
