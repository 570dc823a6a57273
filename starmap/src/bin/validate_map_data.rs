//! Quick systems data validation utility

use starmap::io::MapData;
use starmap::map::StarMap;
use starmap::config::MapConfig;
use std::{env, path::Path, process};

fn main() {
    let args: Vec<String> = env::args().collect();
    let Some(data_path) = args.get(1) else {
        eprintln!("Usage: validate_map_data <systems.json>");
        process::exit(2);
    };

    let path = Path::new(data_path);
    println!("Validating systems data: {}", path.display());

    let data = match MapData::load_from_file(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("✗ Failed to load systems data: {e}");
            process::exit(1);
        }
    };
    println!("✓ Systems data loaded successfully!");
    println!("  Systems: {}", data.systems.len());
    if let Some(position) = data.player_position() {
        println!("  Player position: {position}");
    }

    let mut map = StarMap::new(MapConfig::default());
    match map.load_systems(&data) {
        Ok(generation) => {
            println!("✓ Systems registered (generation {generation})");
            for category in map.categories() {
                println!(
                    "  [{}] {} ({}): {} systems",
                    category.group, category.name, category.id, category.count
                );
            }
        }
        Err(e) => {
            eprintln!("✗ Failed to register systems: {e}");
            process::exit(1);
        }
    }
}
