//! Camera flights started from the map

use starmap::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn map() -> StarMap {
    let mut config = MapConfig::default();
    config.camera.start_animation_ms = None;
    let mut map = StarMap::new(config);
    map.init(ms(0)).unwrap();
    let data = MapData::from_json_str(
        r#"{ "systems": [
            { "name": "Sol", "coordinates": { "x": 0, "y": 0, "z": 0 } },
            { "name": "Alpha Centauri", "coordinates": { "x": 40, "y": 0, "z": 0 } }
        ] }"#,
    )
    .unwrap();
    map.load_systems(&data).unwrap();
    map.tick(ms(0));
    map
}

fn assert_near(actual: DVec3, expected: DVec3) {
    assert!(
        actual.distance(expected) < 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_flight_ends_framing_the_target() {
    let mut map = map();
    map.fly_to(DVec3::new(100.0, 0.0, 0.0), 15.0, true, ms(100))
        .unwrap();
    assert!(map.is_camera_animating());

    let report = map.tick(ms(500));
    assert!(report.camera_moved);
    assert!(map.camera().position.distance(DVec3::new(100.0, 15.0, 15.0)) > 1.0);

    map.tick(ms(900));
    assert!(!map.is_camera_animating());
    assert_near(map.camera().position, DVec3::new(100.0, 15.0, 15.0));
    assert_near(map.camera().target, DVec3::new(100.0, 0.0, 0.0));
}

#[test]
fn test_second_selection_supersedes_flight() {
    let mut map = map();
    map.search("Sol", ms(0)).unwrap();
    map.tick(ms(400));

    map.search("Alpha Centauri", ms(400)).unwrap();
    map.tick(ms(800));
    assert!(map.is_camera_animating());

    // The first flight would have ended at 800 ms; only the second runs
    map.tick(ms(1_200));
    assert!(!map.is_camera_animating());
    assert_near(map.camera().target, DVec3::new(40.0, 0.0, 0.0));
    assert_near(map.camera().position, DVec3::new(40.0, 15.0, 15.0));
}

#[test]
fn test_invalid_target_is_rejected() {
    let mut map = map();
    let before = map.camera().pose();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    map.subscribe_all(move |event| sink.borrow_mut().push(event.clone()));

    let result = map.fly_to(DVec3::new(f64::NAN, 0.0, 0.0), 15.0, true, ms(10));
    assert!(matches!(result, Err(MapError::Transition(_))));
    let result = map.fly_to(DVec3::ZERO, f64::INFINITY, true, ms(10));
    assert!(matches!(result, Err(MapError::Transition(_))));

    assert!(!map.is_camera_animating());
    assert_eq!(map.camera().pose(), before);
    assert!(map.controls().enabled);
    assert!(!map.tick(ms(20)).camera_moved);
    assert!(events.borrow().is_empty());
}

#[test]
fn test_snap_cancels_running_flight() {
    let mut map = map();
    map.fly_to(DVec3::new(100.0, 0.0, 0.0), 15.0, true, ms(0))
        .unwrap();
    map.tick(ms(200));

    map.fly_to(DVec3::new(-50.0, 0.0, 0.0), 15.0, false, ms(250))
        .unwrap();
    assert!(!map.is_camera_animating());
    assert!(map.controls().enabled);
    assert_near(map.camera().position, DVec3::new(-50.0, 15.0, 15.0));

    assert!(!map.tick(ms(900)).camera_moved);
    assert_near(map.camera().position, DVec3::new(-50.0, 15.0, 15.0));
}

#[test]
fn test_start_animation_flies_home() {
    let mut config = MapConfig::default();
    config.camera.start_animation_ms = Some(4_000);
    let mut map = StarMap::new(config);
    map.init(ms(0)).unwrap();
    assert!(map.is_camera_animating());
    assert!(!map.controls().enabled);

    map.tick(ms(2_000));
    assert!(map.is_camera_animating());
    map.tick(ms(4_000));
    assert!(!map.is_camera_animating());
    assert_near(map.camera().position, DVec3::new(0.0, 500.0, 500.0));
}

#[test]
fn test_home_flight() {
    let mut map = map();
    map.fly_to(DVec3::new(100.0, 0.0, 0.0), 15.0, false, ms(0))
        .unwrap();

    map.move_to_initial_position(true, ms(100)).unwrap();
    map.tick(ms(900));
    assert_near(map.camera().position, DVec3::new(0.0, 500.0, 500.0));
    assert_near(map.camera().target, DVec3::ZERO);
}
