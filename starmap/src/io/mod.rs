//! Loading and watching star map data files

pub mod hot_reload;
mod map_data;

pub use hot_reload::{SystemsWatcher, WatchError, WatcherConfig};
pub use map_data::{CategoryDefinition, Coordinates, LoadError, MapData, SystemEntry};
