//! Animated camera flights

use super::tween::{Easing, TweenChannel, TweenError, TweenOwner, TweenPool, TweenToken};
use crate::config::CameraConfig;
use crate::core::camera::{CameraPose, OrbitCamera, OrbitControls};
use glam::DVec3;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("invalid camera transform: {0}")]
    InvalidTransform(String),
}

impl From<TweenError> for TransitionError {
    fn from(err: TweenError) -> Self {
        TransitionError::InvalidTransform(err.to_string())
    }
}

/// Drives the camera pose through tweened flights
///
/// User orbit controls are switched off while a flight runs and switched
/// back on when it completes.
#[derive(Debug, Clone)]
pub struct CameraTransitions {
    pool: TweenPool<CameraPose>,
    fly_duration: Duration,
    easing: Easing,
}

impl Default for CameraTransitions {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

impl CameraTransitions {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            pool: TweenPool::new(),
            fly_duration: config.fly_duration(),
            easing: config.easing,
        }
    }

    pub fn configure(&mut self, config: &CameraConfig) {
        self.fly_duration = config.fly_duration();
        self.easing = config.easing;
    }

    pub fn fly_duration(&self) -> Duration {
        self.fly_duration
    }

    /// Token of the flight in progress
    pub fn active(&self) -> Option<TweenToken> {
        self.pool
            .active_on(TweenChannel::CameraMove)
            .map(|t| t.token())
    }

    pub fn is_animating(&self) -> bool {
        self.active().is_some()
    }

    /// Pose the running flight ends in
    pub fn destination(&self) -> Option<CameraPose> {
        self.pool
            .active_on(TweenChannel::CameraMove)
            .map(|t| t.destination())
    }

    /// Pose that frames `target` from `view_distance` above and in front
    pub fn framing_pose(target: DVec3, view_distance: f64) -> CameraPose {
        CameraPose::new(target + DVec3::new(0.0, view_distance, view_distance), target)
    }

    /// Fly the camera to look at `target` from `view_distance`
    ///
    /// Returns the flight token, or `None` when the pose was applied at once.
    pub fn fly_to(
        &mut self,
        camera: &mut OrbitCamera,
        controls: &mut OrbitControls,
        target: DVec3,
        view_distance: f64,
        animate: bool,
        now: Duration,
    ) -> Result<Option<TweenToken>, TransitionError> {
        if !target.is_finite() || !view_distance.is_finite() {
            warn!(target = ?target, view_distance, "Rejected fly-to");
            return Err(TransitionError::InvalidTransform(format!(
                "target {target} at view distance {view_distance}"
            )));
        }
        let destination = Self::framing_pose(target, view_distance);
        let duration = self.fly_duration;
        self.move_to(camera, controls, destination, duration, animate, now)
    }

    /// Move the camera to `destination`, over `duration` when animated
    pub fn move_to(
        &mut self,
        camera: &mut OrbitCamera,
        controls: &mut OrbitControls,
        destination: CameraPose,
        duration: Duration,
        animate: bool,
        now: Duration,
    ) -> Result<Option<TweenToken>, TransitionError> {
        if !destination.is_finite() {
            return Err(TransitionError::InvalidTransform(format!(
                "destination {destination:?}"
            )));
        }

        if animate && !duration.is_zero() {
            let token = self.pool.start(
                TweenChannel::CameraMove,
                TweenOwner::CameraTransitions,
                camera.pose(),
                destination,
                duration,
                self.easing,
                now,
            )?;
            controls.enabled = false;
            debug!(token = ?token, to = ?destination.target, "Camera flight started");
            Ok(Some(token))
        } else {
            if let Some(superseded) = self.pool.cancel_channel(TweenChannel::CameraMove) {
                debug!(token = ?superseded, "Camera flight cancelled by snap");
            }
            camera.set_pose(destination);
            controls.enabled = true;
            Ok(None)
        }
    }

    /// Advance the running flight; returns true if the camera moved
    pub fn update(
        &mut self,
        camera: &mut OrbitCamera,
        controls: &mut OrbitControls,
        now: Duration,
    ) -> bool {
        let mut moved = false;
        for frame in self.pool.update(now) {
            camera.set_pose(frame.value);
            moved = true;
            if frame.finished {
                controls.enabled = true;
                debug!(token = ?frame.token, "Camera flight finished");
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_fly_to_disables_controls_until_done() {
        let mut transitions = CameraTransitions::default();
        let mut camera = OrbitCamera::default();
        let mut controls = OrbitControls::default();
        let target = DVec3::new(10.0, 20.0, -30.0);

        let token = transitions
            .fly_to(&mut camera, &mut controls, target, 15.0, true, ms(0))
            .unwrap();
        assert!(token.is_some());
        assert!(!controls.enabled);

        assert!(transitions.update(&mut camera, &mut controls, ms(400)));
        assert!(!controls.enabled);

        assert!(transitions.update(&mut camera, &mut controls, ms(800)));
        assert!(controls.enabled);
        assert_eq!(camera.target, target);
        assert_eq!(camera.position, DVec3::new(10.0, 35.0, -15.0));
        assert!(!transitions.is_animating());
        assert!(!transitions.update(&mut camera, &mut controls, ms(900)));
    }

    #[test]
    fn test_second_flight_supersedes_first() {
        let mut transitions = CameraTransitions::default();
        let mut camera = OrbitCamera::default();
        let mut controls = OrbitControls::default();
        let a = DVec3::new(100.0, 0.0, 0.0);
        let b = DVec3::new(-100.0, 0.0, 0.0);

        let first = transitions
            .fly_to(&mut camera, &mut controls, a, 15.0, true, ms(0))
            .unwrap();
        transitions.update(&mut camera, &mut controls, ms(200));
        let second = transitions
            .fly_to(&mut camera, &mut controls, b, 15.0, true, ms(200))
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(transitions.active(), second);

        for t in (300..=1_200).step_by(100) {
            transitions.update(&mut camera, &mut controls, ms(t));
        }
        assert_eq!(camera.target, b);
        assert!(controls.enabled);
    }

    #[test]
    fn test_non_finite_target_rejected_untouched() {
        let mut transitions = CameraTransitions::default();
        let mut camera = OrbitCamera::default();
        let mut controls = OrbitControls::default();
        let before = camera.pose();

        let result = transitions.fly_to(
            &mut camera,
            &mut controls,
            DVec3::new(f64::INFINITY, 0.0, 0.0),
            15.0,
            true,
            ms(0),
        );
        assert!(matches!(result, Err(TransitionError::InvalidTransform(_))));
        assert!(transitions
            .fly_to(&mut camera, &mut controls, DVec3::ZERO, f64::NAN, true, ms(0))
            .is_err());
        assert_eq!(camera.pose(), before);
        assert!(controls.enabled);
        assert!(!transitions.is_animating());
    }

    #[test]
    fn test_snap_applies_immediately_and_cancels_flight() {
        let mut transitions = CameraTransitions::default();
        let mut camera = OrbitCamera::default();
        let mut controls = OrbitControls::default();

        transitions
            .fly_to(&mut camera, &mut controls, DVec3::ONE, 15.0, true, ms(0))
            .unwrap();
        let token = transitions
            .fly_to(&mut camera, &mut controls, DVec3::ZERO, 15.0, false, ms(100))
            .unwrap();
        assert!(token.is_none());
        assert_eq!(camera.position, DVec3::new(0.0, 15.0, 15.0));
        assert!(controls.enabled);
        assert!(!transitions.is_animating());
    }
}
