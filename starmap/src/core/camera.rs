//! Orbit camera and user orbit controls
//!
//! The camera always looks at an orbit target. Its projection and view
//! matrices are used to turn normalized device coordinates back into world
//! space rays for picking.

use crate::picking::Ray;
use glam::{DMat4, DVec2, DVec3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Camera position together with the point it orbits
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraPose {
    pub position: DVec3,
    pub target: DVec3,
}

impl CameraPose {
    pub fn new(position: DVec3, target: DVec3) -> Self {
        Self { position, target }
    }

    /// Distance between camera and orbit target
    pub fn distance(&self) -> f64 {
        self.position.distance(self.target)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.target.is_finite()
    }
}

/// Perspective camera orbiting a target point
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OrbitCamera {
    /// Vertical field of view in radians
    pub fov_y_radians: f64,
    /// Aspect ratio (width / height)
    pub aspect_ratio: f64,
    /// Near clipping plane distance
    pub z_near: f64,
    /// Far clipping plane distance
    pub z_far: f64,
    pub position: DVec3,
    /// Orbit target
    pub target: DVec3,
    pub up: DVec3,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::perspective(45.0, 16.0 / 9.0, 1.0, 100_000.0).looking_at(
            DVec3::new(500.0, 800.0, 1300.0),
            DVec3::ZERO,
        )
    }
}

impl OrbitCamera {
    /// Create a perspective camera at the origin looking down -Z
    ///
    /// # Arguments
    /// * `fov_y_degrees` - Vertical field of view in degrees
    /// * `aspect_ratio` - Width divided by height
    /// * `z_near` - Near clipping plane distance
    /// * `z_far` - Far clipping plane distance
    pub fn perspective(fov_y_degrees: f64, aspect_ratio: f64, z_near: f64, z_far: f64) -> Self {
        Self {
            fov_y_radians: fov_y_degrees.to_radians(),
            aspect_ratio,
            z_near,
            z_far,
            position: DVec3::ZERO,
            target: DVec3::NEG_Z,
            up: DVec3::Y,
        }
    }

    pub fn looking_at(mut self, position: DVec3, target: DVec3) -> Self {
        self.position = position;
        self.target = target;
        self
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose::new(self.position, self.target)
    }

    pub fn set_pose(&mut self, pose: CameraPose) {
        self.position = pose.position;
        self.target = pose.target;
    }

    pub fn distance_to_target(&self) -> f64 {
        self.position.distance(self.target)
    }

    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh(self.fov_y_radians, self.aspect_ratio, self.z_near, self.z_far)
    }

    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_projection_matrix(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio (useful when window resizes)
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f64) {
        if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            self.aspect_ratio = aspect_ratio;
        }
    }

    /// World-space ray from the camera through a point in normalized device
    /// coordinates
    ///
    /// Returns `None` when the camera orientation is degenerate (camera on its
    /// target, looking along `up`, or non-finite values).
    pub fn ray_from_ndc(&self, ndc: DVec2) -> Option<Ray> {
        if !ndc.is_finite() {
            return None;
        }
        let forward = self.target - self.position;
        if !forward.is_finite() || forward.cross(self.up).length_squared() <= f64::EPSILON {
            return None;
        }

        let inverse = self.view_projection_matrix().inverse();
        let far_point = inverse.project_point3(DVec3::new(ndc.x, ndc.y, 1.0));
        let direction = (far_point - self.position).try_normalize()?;
        Some(Ray::new(self.position, direction))
    }
}

/// User orbit controls (rotate around the target, zoom along the view axis)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrbitControls {
    /// Disabled while the camera is animated or the pointer is over the HUD
    pub enabled: bool,
    pub rotate_speed: f64,
    /// Zoom factor exponent per wheel step
    pub zoom_speed: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            enabled: true,
            rotate_speed: 0.6,
            zoom_speed: 2.0,
            min_distance: 1.0,
            max_distance: 60_000.0,
        }
    }
}

impl OrbitControls {
    /// Orbit the camera by a pointer drag of `delta` pixels
    ///
    /// Returns true if the camera moved.
    pub fn rotate(&self, camera: &mut OrbitCamera, delta: DVec2, viewport_height: f64) -> bool {
        if !self.enabled || delta == DVec2::ZERO || viewport_height <= 0.0 {
            return false;
        }
        let offset = camera.position - camera.target;
        let radius = offset.length();
        if radius <= f64::EPSILON {
            return false;
        }

        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        theta -= 2.0 * PI * delta.x / viewport_height * self.rotate_speed;
        phi -= 2.0 * PI * delta.y / viewport_height * self.rotate_speed;

        // Keep away from the poles so `up` never lines up with the view axis
        let epsilon = 1e-4;
        phi = phi.clamp(epsilon, PI - epsilon);

        camera.position = camera.target
            + radius * DVec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos());
        true
    }

    /// Dolly towards (positive steps) or away from the target
    ///
    /// Returns true if the camera moved.
    pub fn zoom(&self, camera: &mut OrbitCamera, steps: f64) -> bool {
        if !self.enabled || steps == 0.0 || !steps.is_finite() {
            return false;
        }
        let offset = camera.position - camera.target;
        let Some(direction) = offset.try_normalize() else {
            return false;
        };
        let scale = 0.95_f64.powf(self.zoom_speed * steps);
        let radius = (offset.length() * scale).clamp(self.min_distance, self.max_distance);
        let position = camera.target + direction * radius;
        if position == camera.position {
            return false;
        }
        camera.position = position;
        true
    }
}
