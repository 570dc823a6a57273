//! Configuration types for the star map
//!
//! Every section deserializes with defaults, so a config file only needs to
//! name the values it changes.

use crate::animation::Easing;
use crate::core::entity::CategoryPolicy;
use crate::scene::ParticleStyle;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level map configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub lod: LodConfig,
    pub picking: PickingConfig,
    pub camera: CameraConfig,
    pub categories: CategoryConfig,
    pub data: DataConfig,
    /// Show galaxy arm and region labels
    pub show_galaxy_infos: bool,
    /// Galaxy center marker in data coordinates; `None` leaves it out
    pub galaxy_center: Option<DVec3>,
    /// Log filter used when `RUST_LOG` is unset
    pub log_filter: Option<String>,
}

/// Level-of-detail tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Camera-to-target distance per unit of scale
    pub scale_divisor: f64,
    /// Scale at or above which the map switches to far view
    pub far_view_threshold: f64,
    /// Scale below which the map returns to near view (≤ far threshold)
    pub near_view_threshold: f64,
    pub near_fog_density: f64,
    pub far_fog_density: f64,
    pub near_cursor_scale: f64,
    pub far_cursor_scale: f64,
    pub near_particles: ParticleStyle,
    pub far_particles: ParticleStyle,
    /// Duration of the animated galaxy particle restyle
    pub transition_ms: u64,
    /// Systems cannot be picked while in far view
    pub suppress_picking_in_far_view: bool,
    /// System point size per unit of scale
    pub system_size_per_scale: f64,
    /// Smallest and largest system point size
    pub system_size_range: [f64; 2],
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            scale_divisor: 200.0,
            far_view_threshold: 25.0,
            near_view_threshold: 25.0,
            near_fog_density: 0.000128,
            far_fog_density: 0.000009,
            near_cursor_scale: 1.0,
            far_cursor_scale: 40.0,
            near_particles: ParticleStyle {
                size: 25.0,
                large_size: 25.0,
                opacity: 0.5,
            },
            far_particles: ParticleStyle {
                size: 400.0,
                large_size: 1600.0,
                opacity: 1.0,
            },
            transition_ms: 500,
            suppress_picking_in_far_view: true,
            system_size_per_scale: 20.0,
            system_size_range: [10.0, 800.0],
        }
    }
}

impl LodConfig {
    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

/// Pointer picking tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PickingConfig {
    /// Longest press that still counts as a click
    pub click_threshold_ms: u64,
    /// Ray distances closer than this are treated as equal
    pub tie_tolerance: f64,
    pub min_pick_radius: f64,
    /// Pick radius growth per unit of scale
    pub pick_radius_per_scale: f64,
    /// Pointer travel before a held button becomes a drag
    pub drag_threshold_px: f64,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            click_threshold_ms: 200,
            tie_tolerance: 1e-6,
            min_pick_radius: 2.0,
            pick_radius_per_scale: 1.0,
            drag_threshold_px: 3.0,
        }
    }
}

impl PickingConfig {
    pub fn click_threshold(&self) -> Duration {
        Duration::from_millis(self.click_threshold_ms)
    }

    /// World-space pick radius for the given scale
    pub fn pick_radius(&self, scale: f64) -> f64 {
        let grown = (scale * self.pick_radius_per_scale).round();
        if grown.is_finite() {
            grown.max(self.min_pick_radius)
        } else {
            self.min_pick_radius
        }
    }
}

/// Camera, orbit controls and transition tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f64,
    pub z_near: f64,
    pub z_far: f64,
    /// Camera position before the first positioning
    pub initial_position: DVec3,
    /// Point the home pose looks at (the player position)
    pub home_target: DVec3,
    /// Camera offset from `home_target` in the home pose
    pub home_offset: DVec3,
    /// Fixed home camera position in data coordinates; overrides `home_offset`
    pub home_position: Option<DVec3>,
    pub fly_duration_ms: u64,
    pub home_duration_ms: u64,
    /// Animate into the home pose on startup over this many milliseconds
    pub start_animation_ms: Option<u64>,
    /// Height and depth offset of the camera after flying to a system
    pub view_distance: f64,
    pub easing: Easing,
    pub rotate_speed: f64,
    pub zoom_speed: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            z_near: 1.0,
            z_far: 100_000.0,
            initial_position: DVec3::new(500.0, 800.0, 1300.0),
            home_target: DVec3::ZERO,
            home_offset: DVec3::new(0.0, 500.0, 500.0),
            home_position: None,
            fly_duration_ms: 800,
            home_duration_ms: 800,
            start_animation_ms: Some(4000),
            view_distance: 15.0,
            easing: Easing::default(),
            rotate_speed: 0.6,
            zoom_speed: 2.0,
            min_distance: 1.0,
            max_distance: 60_000.0,
        }
    }
}

impl CameraConfig {
    pub fn fly_duration(&self) -> Duration {
        Duration::from_millis(self.fly_duration_ms)
    }

    pub fn home_duration(&self) -> Duration {
        Duration::from_millis(self.home_duration_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CategoryConfig {
    pub policy: CategoryPolicy,
}

/// Where system data comes from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub systems_path: Option<PathBuf>,
    /// Reload the systems file when it changes on disk
    pub watch: bool,
    pub debounce_ms: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            systems_path: None,
            watch: false,
            debounce_ms: 300,
        }
    }
}

impl MapConfig {
    /// Load and validate a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        debug!(path = ?path, "Loaded map config");
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check values the map relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lod = &self.lod;
        if !(lod.scale_divisor.is_finite() && lod.scale_divisor > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "lod.scale_divisor must be positive, got {}",
                lod.scale_divisor
            )));
        }
        if !lod.far_view_threshold.is_finite() || !lod.near_view_threshold.is_finite() {
            return Err(ConfigError::Invalid(
                "lod thresholds must be finite".to_string(),
            ));
        }
        if lod.near_view_threshold > lod.far_view_threshold {
            return Err(ConfigError::Invalid(format!(
                "lod.near_view_threshold ({}) exceeds lod.far_view_threshold ({})",
                lod.near_view_threshold, lod.far_view_threshold
            )));
        }
        let [min_size, max_size] = lod.system_size_range;
        if !(min_size.is_finite() && max_size.is_finite() && 0.0 < min_size && min_size <= max_size)
        {
            return Err(ConfigError::Invalid(format!(
                "lod.system_size_range is invalid: [{min_size}, {max_size}]"
            )));
        }
        if let Some(position) = self.camera.home_position {
            if !position.is_finite() {
                return Err(ConfigError::Invalid(
                    "camera.home_position must be finite".to_string(),
                ));
            }
        }
        if !(self.picking.tie_tolerance.is_finite() && self.picking.tie_tolerance >= 0.0) {
            return Err(ConfigError::Invalid(
                "picking.tie_tolerance must be a non-negative number".to_string(),
            ));
        }
        let camera = &self.camera;
        if !(camera.view_distance.is_finite() && camera.view_distance >= 0.0) {
            return Err(ConfigError::Invalid(
                "camera.view_distance must be a non-negative number".to_string(),
            ));
        }
        if !(camera.z_near > 0.0 && camera.z_far > camera.z_near) {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes are invalid: near {} far {}",
                camera.z_near, camera.z_far
            )));
        }
        if !(camera.min_distance > 0.0 && camera.max_distance >= camera.min_distance) {
            return Err(ConfigError::Invalid(format!(
                "camera distance limits are invalid: min {} max {}",
                camera.min_distance, camera.max_distance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MapConfig::default();
        assert_eq!(config.lod.scale_divisor, 200.0);
        assert_eq!(config.lod.far_view_threshold, 25.0);
        assert_eq!(config.lod.near_view_threshold, 25.0);
        assert_eq!(config.lod.near_particles.large_size, 25.0);
        assert_eq!(config.lod.far_particles.large_size, 1600.0);
        assert_eq!(config.camera.home_position, None);
        assert_eq!(config.picking.click_threshold(), Duration::from_millis(200));
        assert_eq!(config.camera.fly_duration(), Duration::from_millis(800));
        assert_eq!(config.categories.policy, CategoryPolicy::Hide);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            MapConfig::from_json_str(r#"{ "lod": { "near_view_threshold": 20.0 } }"#).unwrap();
        assert_eq!(config.lod.near_view_threshold, 20.0);
        assert_eq!(config.lod.far_view_threshold, 25.0);
        assert_eq!(config.picking, PickingConfig::default());
    }

    #[test]
    fn test_inverted_hysteresis_rejected() {
        let result = MapConfig::from_json_str(r#"{ "lod": { "near_view_threshold": 30.0 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_inverted_system_size_range_rejected() {
        let result =
            MapConfig::from_json_str(r#"{ "lod": { "system_size_range": [500.0, 20.0] } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_pick_radius_grows_with_scale() {
        let picking = PickingConfig::default();
        assert_eq!(picking.pick_radius(0.3), 2.0);
        assert_eq!(picking.pick_radius(7.6), 8.0);
        assert_eq!(picking.pick_radius(f64::NAN), 2.0);
    }

    #[test]
    fn test_config_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        let mut config = MapConfig::default();
        config.categories.policy = CategoryPolicy::Recolor;
        config.galaxy_center = Some(DVec3::new(25.0, -21.0, 25900.0));
        std::fs::write(&path, config.to_json_string().unwrap()).unwrap();

        let loaded = MapConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
