//! The `validate_map_data` command line

use std::process::Command;

fn validate_map_data() -> Command {
    Command::new(env!("CARGO_BIN_EXE_validate_map_data"))
}

#[test]
fn test_missing_path_prints_usage() {
    let output = validate_map_data().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: validate_map_data <systems.json>"));
}

#[test]
fn test_valid_file_passes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("systems.json");
    std::fs::write(
        &path,
        r#"{ "systems": [ { "name": "Sol", "coordinates": { "x": 0, "y": 0, "z": 0 } } ] }"#,
    )
    .unwrap();

    let output = validate_map_data().arg(&path).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Systems: 1"));
}

#[test]
fn test_unreadable_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = validate_map_data()
        .arg(dir.path().join("missing.json"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}
