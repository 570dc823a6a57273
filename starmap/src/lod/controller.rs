//! Near/far view state machine

use crate::config::LodConfig;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Near,
    Far,
}

/// An edge between view modes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LodTransition {
    EnterFar { scale: f64, with_animation: bool },
    ExitFar { scale: f64, with_animation: bool },
}

/// Result of observing one scale value
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LodUpdate {
    pub scale: f64,
    /// Scale differs from the previous observation
    pub scale_changed: bool,
    pub transition: Option<LodTransition>,
}

#[derive(Debug, Clone)]
pub struct LodController {
    mode: ViewMode,
    previous_scale: Option<f64>,
    scale_divisor: f64,
    far_threshold: f64,
    near_threshold: f64,
    /// Transitions are held while the camera is flown programmatically
    locked: bool,
}

impl Default for LodController {
    fn default() -> Self {
        Self::new(&LodConfig::default())
    }
}

impl LodController {
    pub fn new(config: &LodConfig) -> Self {
        Self {
            mode: ViewMode::Near,
            previous_scale: None,
            scale_divisor: config.scale_divisor,
            far_threshold: config.far_view_threshold,
            near_threshold: config.near_view_threshold.min(config.far_view_threshold),
            locked: false,
        }
    }

    pub fn configure(&mut self, config: &LodConfig) {
        self.scale_divisor = config.scale_divisor;
        self.far_threshold = config.far_view_threshold;
        self.near_threshold = config.near_view_threshold.min(config.far_view_threshold);
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_far(&self) -> bool {
        self.mode == ViewMode::Far
    }

    pub fn previous_scale(&self) -> Option<f64> {
        self.previous_scale
    }

    pub fn far_threshold(&self) -> f64 {
        self.far_threshold
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn scale_for(&self, camera: DVec3, target: DVec3) -> f64 {
        camera.distance(target) / self.scale_divisor
    }

    /// Compute the scale from a camera pose and observe it
    pub fn update(&mut self, camera: DVec3, target: DVec3, with_animation: bool) -> LodUpdate {
        let scale = self.scale_for(camera, target);
        self.observe_scale(scale, with_animation)
    }

    /// Feed one scale value through the state machine
    ///
    /// Transitions fire only on the frame a threshold is crossed.
    pub fn observe_scale(&mut self, scale: f64, with_animation: bool) -> LodUpdate {
        if !scale.is_finite() {
            warn!(scale, "Ignoring non-finite scale");
            return LodUpdate {
                scale: self.previous_scale.unwrap_or_default(),
                ..Default::default()
            };
        }

        let scale_changed = self.previous_scale != Some(scale);
        self.previous_scale = Some(scale);

        let transition = if self.locked {
            None
        } else {
            match self.mode {
                ViewMode::Near if scale >= self.far_threshold => {
                    self.mode = ViewMode::Far;
                    info!(scale, with_animation, "Entering far view");
                    Some(LodTransition::EnterFar {
                        scale,
                        with_animation,
                    })
                }
                ViewMode::Far if scale < self.near_threshold => {
                    self.mode = ViewMode::Near;
                    info!(scale, with_animation, "Leaving far view");
                    Some(LodTransition::ExitFar {
                        scale,
                        with_animation,
                    })
                }
                _ => None,
            }
        };

        LodUpdate {
            scale,
            scale_changed,
            transition,
        }
    }

    /// Snap to near view without animation; `scale` is reported with the exit
    pub fn force_near(&mut self, scale: f64) -> Option<LodTransition> {
        if self.mode == ViewMode::Near {
            return None;
        }
        self.mode = ViewMode::Near;
        info!(scale, "Forced near view");
        Some(LodTransition::ExitFar {
            scale,
            with_animation: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_from_distance() {
        let lod = LodController::default();
        assert_eq!(lod.scale_for(DVec3::new(0.0, 0.0, 1000.0), DVec3::ZERO), 5.0);
    }

    #[test]
    fn test_threshold_is_inclusive_for_entry() {
        let mut lod = LodController::default();
        let update = lod.observe_scale(25.0, true);
        assert!(matches!(
            update.transition,
            Some(LodTransition::EnterFar { scale, with_animation: true }) if scale == 25.0
        ));
    }

    #[test]
    fn test_hysteresis_band() {
        let config = LodConfig {
            near_view_threshold: 20.0,
            ..Default::default()
        };
        let mut lod = LodController::new(&config);

        assert!(lod.observe_scale(26.0, true).transition.is_some());
        assert!(lod.observe_scale(22.0, true).transition.is_none());
        assert!(lod.is_far());
        assert!(lod.observe_scale(19.0, true).transition.is_some());
        assert!(lod.observe_scale(24.0, true).transition.is_none());
        assert_eq!(lod.mode(), ViewMode::Near);
    }

    #[test]
    fn test_locked_holds_mode_but_tracks_scale() {
        let mut lod = LodController::default();
        lod.set_locked(true);
        let update = lod.observe_scale(40.0, true);
        assert!(update.scale_changed);
        assert!(update.transition.is_none());
        assert_eq!(lod.previous_scale(), Some(40.0));

        lod.set_locked(false);
        assert!(lod.observe_scale(40.0, true).transition.is_some());
    }

    #[test]
    fn test_force_near() {
        let mut lod = LodController::default();
        assert_eq!(lod.force_near(25.0), None);
        lod.observe_scale(30.0, true);
        assert_eq!(
            lod.force_near(25.0),
            Some(LodTransition::ExitFar {
                scale: 25.0,
                with_animation: false
            })
        );
        assert_eq!(lod.mode(), ViewMode::Near);
    }

    #[test]
    fn test_non_finite_scale_ignored() {
        let mut lod = LodController::default();
        lod.observe_scale(10.0, true);
        let update = lod.observe_scale(f64::NAN, true);
        assert!(!update.scale_changed);
        assert_eq!(lod.previous_scale(), Some(10.0));
    }
}
