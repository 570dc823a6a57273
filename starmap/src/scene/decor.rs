//! Scene decoration state: grids, starfield, fog, cursors and the galaxy
//!
//! The renderer reads these values each frame. They change only through the
//! LOD and picking reactions wired up by the map.

use crate::animation::{Easing, Interpolate, TweenChannel, TweenOwner, TweenPool};
use crate::config::{LodConfig, MapConfig};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Point sizes and opacity of the galaxy particle cloud
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ParticleStyle {
    /// Size of the small points
    pub size: f64,
    /// Size of the large points
    pub large_size: f64,
    pub opacity: f64,
}

impl Interpolate for ParticleStyle {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        Self {
            size: self.size.interpolate(&to.size, t),
            large_size: self.large_size.interpolate(&to.large_size, t),
            opacity: self.opacity.interpolate(&to.opacity, t),
        }
    }

    fn is_finite(&self) -> bool {
        self.size.is_finite() && self.large_size.is_finite() && self.opacity.is_finite()
    }
}

/// Opacity of the flat galaxy overlay in far view
///
/// Fades in from the far-view threshold and reaches 0.4 at twice that scale.
pub fn galaxy_overlay_opacity(scale: f64, far_threshold: f64) -> f64 {
    if scale < far_threshold {
        0.0
    } else if scale < 2.0 * far_threshold {
        (scale - far_threshold) / far_threshold * 0.4
    } else {
        0.4
    }
}

/// Point size of the system cloud at `scale`, clamped to `[min, max]`
pub fn system_point_size(scale: f64, per_scale: f64, [min, max]: [f64; 2]) -> f64 {
    (scale * per_scale).clamp(min, max)
}

/// Grid origin snapped under `target`: 1000-unit cells on x/z, whole units on y
pub fn grid_origin_for(target: DVec3) -> DVec3 {
    DVec3::new(
        (target.x / 1000.0).floor() * 1000.0,
        target.y.floor(),
        (target.z / 1000.0).floor() * 1000.0,
    )
}

/// Opacity of regular and reverted galaxy labels at `scale`
pub fn galaxy_label_opacity(scale: f64) -> (f64, f64) {
    let opacity = (((scale - 70.0) / 10.0).round() / 10.0).clamp(0.0, 0.8);
    let reverted = 1.1 - opacity;
    let reverted = if reverted <= 0.4 { 0.2 } else { reverted };
    (opacity, reverted)
}

#[derive(Debug, Clone)]
struct GalaxyParticles {
    style: ParticleStyle,
    tweens: TweenPool<ParticleStyle>,
}

#[derive(Debug, Clone)]
pub struct SceneDecor {
    pub fine_grid_visible: bool,
    pub coarse_grid_visible: bool,
    pub starfield_visible: bool,
    pub galaxy_overlay_visible: bool,
    pub galaxy_overlay_opacity: f64,
    pub galaxy_labels_visible: bool,
    pub label_opacity: f64,
    pub reverted_label_opacity: f64,
    pub fog_density: f64,
    pub cursor_scale: f64,
    pub system_point_size: f64,
    /// Where the near-view grids are centered
    pub grid_origin: DVec3,
    pub hover_cursor: Option<DVec3>,
    pub selection_cursor: Option<DVec3>,
    saved_fog_density: Option<f64>,
    /// Present once the galaxy assets are loaded
    particles: Option<GalaxyParticles>,
    lod: LodConfig,
    show_galaxy_infos: bool,
}

impl SceneDecor {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            fine_grid_visible: true,
            coarse_grid_visible: false,
            starfield_visible: true,
            galaxy_overlay_visible: false,
            galaxy_overlay_opacity: 0.0,
            galaxy_labels_visible: false,
            label_opacity: 0.0,
            reverted_label_opacity: 1.1,
            fog_density: config.lod.near_fog_density,
            cursor_scale: config.lod.near_cursor_scale,
            system_point_size: config.lod.system_size_range[0],
            grid_origin: DVec3::ZERO,
            hover_cursor: None,
            selection_cursor: None,
            saved_fog_density: None,
            particles: None,
            lod: config.lod.clone(),
            show_galaxy_infos: config.show_galaxy_infos,
        }
    }

    pub fn configure(&mut self, config: &MapConfig) {
        self.lod = config.lod.clone();
        self.show_galaxy_infos = config.show_galaxy_infos;
        if !self.show_galaxy_infos {
            self.galaxy_labels_visible = false;
        }
    }

    pub fn assets_ready(&self) -> bool {
        self.particles.is_some()
    }

    pub fn particle_style(&self) -> Option<ParticleStyle> {
        self.particles.as_ref().map(|p| p.style)
    }

    /// Galaxy assets finished loading; style the particles for `far`
    pub fn attach_galaxy_particles(&mut self, far: bool) {
        let style = if far {
            self.lod.far_particles
        } else {
            self.lod.near_particles
        };
        self.particles = Some(GalaxyParticles {
            style,
            tweens: TweenPool::new(),
        });
        self.galaxy_overlay_visible = far;
        self.galaxy_labels_visible = far && self.show_galaxy_infos;
        debug!(far, "Galaxy particles attached");
    }

    pub fn enter_far_view(&mut self, with_animation: bool, now: Duration) {
        self.fine_grid_visible = false;
        self.coarse_grid_visible = true;
        self.starfield_visible = false;
        self.saved_fog_density = Some(self.fog_density);
        self.fog_density = self.lod.far_fog_density;
        self.cursor_scale = self.lod.far_cursor_scale;

        let (from, to) = (self.lod.near_particles, self.lod.far_particles);
        if self.restyle_particles(from, to, with_animation, now) {
            self.galaxy_overlay_visible = true;
            self.galaxy_labels_visible = self.show_galaxy_infos;
        }
    }

    pub fn exit_far_view(&mut self, with_animation: bool, now: Duration) {
        self.fine_grid_visible = true;
        self.coarse_grid_visible = false;
        self.starfield_visible = true;
        self.fog_density = self
            .saved_fog_density
            .take()
            .unwrap_or(self.lod.near_fog_density);
        self.cursor_scale = self.lod.near_cursor_scale;
        self.galaxy_overlay_visible = false;
        self.galaxy_labels_visible = false;

        let (from, to) = (self.lod.far_particles, self.lod.near_particles);
        self.restyle_particles(from, to, with_animation, now);
    }

    /// Returns false when there are no particles to restyle yet
    fn restyle_particles(
        &mut self,
        from: ParticleStyle,
        to: ParticleStyle,
        with_animation: bool,
        now: Duration,
    ) -> bool {
        let duration = self.lod.transition_duration();
        let Some(particles) = self.particles.as_mut() else {
            return false;
        };
        if !with_animation {
            particles.tweens.cancel_channel(TweenChannel::GalaxyParticles);
            particles.style = to;
            return true;
        }
        particles.style = from;
        if let Err(err) = particles.tweens.start(
            TweenChannel::GalaxyParticles,
            TweenOwner::SceneDecor,
            from,
            to,
            duration,
            Easing::Linear,
            now,
        ) {
            warn!(error = %err, "Galaxy particle restyle rejected");
            particles.style = to;
        }
        true
    }

    /// Scale-dependent sizes and opacities
    pub fn scale_changed(&mut self, scale: f64, far: bool) {
        if scale > 0.0 {
            self.system_point_size = system_point_size(
                scale,
                self.lod.system_size_per_scale,
                self.lod.system_size_range,
            );
        }
        if self.show_galaxy_infos && self.assets_ready() {
            let (opacity, reverted) = galaxy_label_opacity(scale);
            self.label_opacity = opacity;
            self.reverted_label_opacity = reverted;
        }
        if far && self.assets_ready() {
            self.galaxy_overlay_opacity =
                galaxy_overlay_opacity(scale, self.lod.far_view_threshold);
        }
    }

    /// Recenter the grids under a system the camera flies to
    pub fn move_grid_to(&mut self, target: DVec3) {
        self.grid_origin = grid_origin_for(target);
        debug!(origin = ?self.grid_origin, "Grid moved");
    }

    pub fn set_hover_cursor(&mut self, position: Option<DVec3>) {
        self.hover_cursor = position;
    }

    pub fn set_selection_cursor(&mut self, position: Option<DVec3>) {
        self.selection_cursor = position;
    }

    /// Advance decor animations; returns true if anything changed
    pub fn update(&mut self, now: Duration) -> bool {
        let Some(particles) = self.particles.as_mut() else {
            return false;
        };
        let frames = particles.tweens.update(now);
        let changed = !frames.is_empty();
        if let Some(frame) = frames.last() {
            particles.style = frame.value;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_overlay_opacity_curve() {
        assert_eq!(galaxy_overlay_opacity(10.0, 25.0), 0.0);
        assert_eq!(galaxy_overlay_opacity(25.0, 25.0), 0.0);
        assert!((galaxy_overlay_opacity(37.5, 25.0) - 0.2).abs() < 1e-12);
        assert_eq!(galaxy_overlay_opacity(50.0, 25.0), 0.4);
        assert_eq!(galaxy_overlay_opacity(500.0, 25.0), 0.4);
    }

    #[test]
    fn test_overlay_opacity_follows_threshold() {
        assert_eq!(galaxy_overlay_opacity(30.0, 40.0), 0.0);
        assert!((galaxy_overlay_opacity(60.0, 40.0) - 0.2).abs() < 1e-12);
        assert_eq!(galaxy_overlay_opacity(80.0, 40.0), 0.4);
    }

    #[test]
    fn test_system_point_size_clamped() {
        let config = MapConfig::default();
        let mut decor = SceneDecor::new(&config);
        assert_eq!(decor.system_point_size, 10.0);

        decor.scale_changed(0.2, false);
        assert_eq!(decor.system_point_size, 10.0);
        decor.scale_changed(3.0, false);
        assert_eq!(decor.system_point_size, 60.0);
        decor.scale_changed(100.0, true);
        assert_eq!(decor.system_point_size, 800.0);

        // Non-positive scales leave the size alone
        decor.scale_changed(0.0, false);
        assert_eq!(decor.system_point_size, 800.0);
    }

    #[test]
    fn test_grid_snaps_to_thousands() {
        let mut decor = SceneDecor::new(&MapConfig::default());
        decor.move_grid_to(DVec3::new(1_234.5, -58.9, -354.8));
        assert_eq!(decor.grid_origin, DVec3::new(1_000.0, -59.0, -1_000.0));
    }

    #[test]
    fn test_label_opacity_curve() {
        assert_eq!(galaxy_label_opacity(30.0), (0.0, 1.1));
        let (opacity, reverted) = galaxy_label_opacity(100.0);
        assert!((opacity - 0.3).abs() < 1e-12);
        assert!((reverted - 0.8).abs() < 1e-12);
        assert_eq!(galaxy_label_opacity(1_000.0), (0.8, 0.2));
    }

    #[test]
    fn test_far_view_round_trip_restores_fog() {
        let config = MapConfig::default();
        let mut decor = SceneDecor::new(&config);
        decor.fog_density = 0.0002;

        decor.enter_far_view(false, ms(0));
        assert!(!decor.fine_grid_visible);
        assert!(decor.coarse_grid_visible);
        assert!(!decor.starfield_visible);
        assert_eq!(decor.fog_density, config.lod.far_fog_density);
        assert_eq!(decor.cursor_scale, 40.0);

        decor.exit_far_view(false, ms(10));
        assert!(decor.fine_grid_visible);
        assert!(decor.starfield_visible);
        assert_eq!(decor.fog_density, 0.0002);
        assert_eq!(decor.cursor_scale, 1.0);
    }

    #[test]
    fn test_particles_skipped_until_assets_ready() {
        let config = MapConfig::default();
        let mut decor = SceneDecor::new(&config);

        decor.enter_far_view(true, ms(0));
        assert!(decor.particle_style().is_none());
        assert!(!decor.galaxy_overlay_visible);
        assert!(!decor.update(ms(100)));

        decor.attach_galaxy_particles(true);
        assert_eq!(decor.particle_style(), Some(config.lod.far_particles));
        assert!(decor.galaxy_overlay_visible);
    }

    #[test]
    fn test_animated_restyle() {
        let config = MapConfig::default();
        let mut decor = SceneDecor::new(&config);
        decor.attach_galaxy_particles(false);

        decor.enter_far_view(true, ms(1_000));
        assert_eq!(decor.particle_style(), Some(config.lod.near_particles));

        assert!(decor.update(ms(1_250)));
        let halfway = decor.particle_style().unwrap();
        assert!((halfway.size - 212.5).abs() < 1e-9);
        assert!((halfway.large_size - 812.5).abs() < 1e-9);
        assert!((halfway.opacity - 0.75).abs() < 1e-9);

        assert!(decor.update(ms(1_500)));
        assert_eq!(decor.particle_style(), Some(config.lod.far_particles));
        assert!(!decor.update(ms(1_600)));
    }

    #[test]
    fn test_overlay_opacity_only_in_far_view() {
        let config = MapConfig::default();
        let mut decor = SceneDecor::new(&config);
        decor.attach_galaxy_particles(false);

        decor.scale_changed(40.0, false);
        assert_eq!(decor.galaxy_overlay_opacity, 0.0);
        decor.scale_changed(40.0, true);
        assert!(decor.galaxy_overlay_opacity > 0.0);
    }
}
