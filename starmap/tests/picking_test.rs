//! Hit resolution through a renderer-provided raycaster

use starmap::prelude::*;
use std::time::Duration;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Returns fixed hits by system name, whatever the ray
struct ScriptedRaycaster {
    hits: Vec<(&'static str, f64, f64)>,
}

impl Raycaster for ScriptedRaycaster {
    fn cast_ray(
        &self,
        _ndc: DVec2,
        _camera: &OrbitCamera,
        registry: &SystemRegistry,
        _radius: f64,
    ) -> Vec<PickHit> {
        let mut hits: Vec<PickHit> = self
            .hits
            .iter()
            .filter_map(|(name, ray_distance, perpendicular_distance)| {
                Some(PickHit {
                    system: registry.find_by_name(name, true, false)?,
                    ray_distance: *ray_distance,
                    perpendicular_distance: *perpendicular_distance,
                })
            })
            .collect();
        starmap::picking::sort_hits(&mut hits);
        hits
    }
}

const DATA: &str = r#"{ "systems": [
    { "name": "Sol", "coordinates": { "x": 0, "y": 0, "z": 0 }, "categories": ["20"] },
    { "name": "Alpha Centauri", "coordinates": { "x": 40, "y": 0, "z": 0 } },
    { "name": "Barnard's Star", "coordinates": { "x": -40, "y": 0, "z": 0 } }
] }"#;

fn hovered_after_move(hits: Vec<(&'static str, f64, f64)>, disable: Option<&str>) -> Option<String> {
    let mut config = MapConfig::default();
    config.camera.start_animation_ms = None;
    let mut map = StarMap::with_raycaster(config, Box::new(ScriptedRaycaster { hits }));
    map.set_viewport(800.0, 600.0);
    map.init(ms(0)).unwrap();
    map.load_systems(&MapData::from_json_str(DATA).unwrap())
        .unwrap();
    if let Some(category) = disable {
        map.set_category_enabled(category, false);
    }

    map.pointer_mut().handle_cursor_moved(400.0, 300.0, ms(10));
    map.tick(ms(10));
    map.hover()
        .and_then(|system| map.registry().get(system))
        .map(|snapshot| snapshot.name)
}

#[test]
fn test_nearest_hit_wins() {
    let hovered = hovered_after_move(
        vec![("Alpha Centauri", 12.0, 0.1), ("Sol", 10.0, 1.5)],
        None,
    );
    assert_eq!(hovered.as_deref(), Some("Sol"));
}

#[test]
fn test_ties_prefer_the_hit_closest_to_the_ray() {
    let hovered = hovered_after_move(
        vec![("Sol", 10.0, 1.5), ("Alpha Centauri", 10.0, 0.5)],
        None,
    );
    assert_eq!(hovered.as_deref(), Some("Alpha Centauri"));
}

#[test]
fn test_ties_within_tolerance() {
    let hovered = hovered_after_move(
        vec![("Sol", 10.0, 1.5), ("Barnard's Star", 10.0 + 1e-9, 0.2)],
        None,
    );
    assert_eq!(hovered.as_deref(), Some("Barnard's Star"));
}

#[test]
fn test_filtered_nearest_hit_is_skipped() {
    let hovered = hovered_after_move(
        vec![("Sol", 10.0, 0.0), ("Alpha Centauri", 30.0, 1.0)],
        Some("20"),
    );
    assert_eq!(hovered.as_deref(), Some("Alpha Centauri"));
}

#[test]
fn test_no_hits_no_hover() {
    assert_eq!(hovered_after_move(Vec::new(), None), None);
}

#[test]
fn test_point_cloud_ray_through_screen_center() {
    let mut registry = SystemRegistry::default();
    let sol = registry
        .register(SystemRecord::new("Sol", DVec3::ZERO))
        .unwrap();
    registry
        .register(SystemRecord::new("Alpha", DVec3::new(40.0, 0.0, 0.0)))
        .unwrap();
    let camera = OrbitCamera::default().looking_at(DVec3::new(0.0, 0.0, 100.0), DVec3::ZERO);
    let raycaster = starmap::picking::PointCloudRaycaster;

    let hits = raycaster.cast_ray(DVec2::ZERO, &camera, &registry, 2.0);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].system, sol);
    assert!((hits[0].ray_distance - 100.0).abs() < 1e-6);

    let hits = raycaster.cast_ray(DVec2::new(0.0, 0.9), &camera, &registry, 2.0);
    assert!(hits.is_empty());
}
