//! Star map data file format
//!
//! ```json
//! {
//!   "categories": { "States": { "20": { "name": "Alert", "color": "f1c232" } } },
//!   "systems": [
//!     { "name": "Sol", "coordinates": { "x": 0, "y": 0, "z": 0 }, "categories": ["20"] }
//!   ],
//!   "position": { "x": 0, "y": 0, "z": 0 }
//! }
//! ```
//!
//! Data coordinates use the galaxy's handedness; the scene flips the z axis.

use crate::core::entity::SystemRecord;
use glam::DVec3;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinates {
    /// Scene-space position (z reversed)
    pub fn to_scene(self) -> DVec3 {
        DVec3::new(self.x, self.y, -self.z)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub coordinates: Coordinates,
    /// Category ids; data files use strings or bare numbers
    #[serde(default, deserialize_with = "category_ids")]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Contents of a map data file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MapData {
    /// Category definitions by group, then by id
    #[serde(default)]
    pub categories: BTreeMap<String, BTreeMap<String, CategoryDefinition>>,
    #[serde(default)]
    pub systems: Vec<SystemEntry>,
    /// Player position the home camera pose looks at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Coordinates>,
}

fn category_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    let ids = Option::<Vec<Id>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(ids
        .into_iter()
        .map(|id| match id {
            Id::Text(text) => text,
            Id::Number(number) => number.to_string(),
        })
        .collect())
}

impl MapData {
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let data = Self::from_json_str(&json)?;
        info!(path = ?path, systems = data.systems.len(), "Loaded map data");
        Ok(data)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LoadError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Registry records in file order, positions in scene space
    pub fn to_records(&self) -> Vec<SystemRecord> {
        self.systems
            .iter()
            .map(|entry| SystemRecord {
                name: entry.name.clone(),
                description: entry.description.clone(),
                position: entry.coordinates.to_scene(),
                categories: entry.categories.clone(),
            })
            .collect()
    }

    /// Category id → (group, definition)
    pub fn category_definitions(&self) -> impl Iterator<Item = (&str, &str, &CategoryDefinition)> {
        self.categories.iter().flat_map(|(group, ids)| {
            ids.iter()
                .map(move |(id, definition)| (id.as_str(), group.as_str(), definition))
        })
    }

    /// Player position in scene space
    pub fn player_position(&self) -> Option<DVec3> {
        self.position.map(Coordinates::to_scene)
    }
}
