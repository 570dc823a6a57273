//! Rays and point-cloud intersection

use crate::core::camera::OrbitCamera;
use crate::core::entity::{SystemRef, SystemRegistry};
use glam::{DVec2, DVec3};
use std::cmp::Ordering;

/// Half-line in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    /// Unit length
    pub direction: DVec3,
}

impl Ray {
    /// Create a ray, normalizing `direction`
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t` along the ray
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }

    /// Ray parameter of the closest approach to `point` and the perpendicular
    /// distance there; `None` for points behind the origin
    pub fn closest_approach(&self, point: DVec3) -> Option<(f64, f64)> {
        let t = (point - self.origin).dot(self.direction);
        if !t.is_finite() || t < 0.0 {
            return None;
        }
        Some((t, point.distance(self.at(t))))
    }
}

/// A system within pick radius of a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub system: SystemRef,
    /// Distance along the ray to the closest approach
    pub ray_distance: f64,
    /// Distance from the system to the ray
    pub perpendicular_distance: f64,
}

/// Finds the systems a ray passes near
///
/// Implemented by the renderer when it has its own acceleration structure;
/// [`PointCloudRaycaster`] is the plain CPU version.
pub trait Raycaster {
    /// Hits within `radius` of the ray through `ndc`, ordered by ray distance
    fn cast_ray(
        &self,
        ndc: DVec2,
        camera: &OrbitCamera,
        registry: &SystemRegistry,
        radius: f64,
    ) -> Vec<PickHit>;
}

/// Brute-force ray test against every candidate system
#[derive(Debug, Clone, Copy, Default)]
pub struct PointCloudRaycaster;

impl Raycaster for PointCloudRaycaster {
    fn cast_ray(
        &self,
        ndc: DVec2,
        camera: &OrbitCamera,
        registry: &SystemRegistry,
        radius: f64,
    ) -> Vec<PickHit> {
        let Some(ray) = camera.ray_from_ndc(ndc) else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        registry.for_each_candidate(|system, position| {
            if let Some((ray_distance, perpendicular_distance)) = ray.closest_approach(position) {
                if perpendicular_distance <= radius {
                    hits.push(PickHit {
                        system,
                        ray_distance,
                        perpendicular_distance,
                    });
                }
            }
        });
        sort_hits(&mut hits);
        hits
    }
}

/// Order hits by ray distance, then perpendicular distance
pub fn sort_hits(hits: &mut [PickHit]) {
    hits.sort_by(|a, b| {
        a.ray_distance
            .total_cmp(&b.ray_distance)
            .then_with(|| a.perpendicular_distance.total_cmp(&b.perpendicular_distance))
    });
}

/// Pick the nearest accepted hit
///
/// The smallest ray distance wins. Hits whose ray distance lies within
/// `tolerance` of that minimum count as tied and the smallest perpendicular
/// distance among them is chosen. Input order does not matter.
pub fn resolve_nearest(
    hits: &[PickHit],
    tolerance: f64,
    accept: impl Fn(SystemRef) -> bool,
) -> Option<PickHit> {
    let accepted: Vec<&PickHit> = hits
        .iter()
        .filter(|h| h.ray_distance.is_finite() && accept(h.system))
        .collect();

    let nearest = accepted
        .iter()
        .map(|h| h.ray_distance)
        .min_by(|a, b| a.total_cmp(b))?;

    accepted
        .into_iter()
        .filter(|h| h.ray_distance <= nearest + tolerance)
        .min_by(|a, b| {
            match a.perpendicular_distance.total_cmp(&b.perpendicular_distance) {
                Ordering::Equal => a.ray_distance.total_cmp(&b.ray_distance),
                other => other,
            }
        })
        .copied()
}
