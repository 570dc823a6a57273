//! Time-based value animation
//!
//! [`TweenPool`] runs at most one tween per [`TweenChannel`]; starting a new
//! one supersedes whatever was running there. [`CameraTransitions`] builds the
//! camera flights on top of it.

pub mod camera;
pub mod tween;

pub use camera::{CameraTransitions, TransitionError};
pub use tween::{
    Easing, Interpolate, Tween, TweenChannel, TweenError, TweenFrame, TweenOwner, TweenPool,
    TweenToken,
};
