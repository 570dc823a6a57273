//! Components attached to system entities

use super::registry::SystemRef;
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Position of an entity in scene space
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position(pub DVec3);

/// Display data of a system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemInfo {
    pub name: String,
    pub description: Option<String>,
}

/// Category tags in the order they were declared
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Categories(pub Vec<String>);

impl Categories {
    pub fn contains(&self, category: &str) -> bool {
        self.0.iter().any(|c| c == category)
    }
}

/// Distinguishes pickable systems from scene decorations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntityKind {
    System,
    /// Markers such as the galaxy center; drawn but never picked
    Decoration,
}

/// Flags deciding whether the picker may consider an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pickability {
    /// At least one of the entity's categories is disabled
    pub filtered: bool,
    /// Picking is switched off while the map is in far view
    pub lod_suppressed: bool,
    /// Entity is drawn
    pub visible: bool,
}

impl Default for Pickability {
    fn default() -> Self {
        Self {
            filtered: false,
            lod_suppressed: false,
            visible: true,
        }
    }
}

impl Pickability {
    /// True unless filtered out or suppressed by LOD
    pub fn pickable(&self) -> bool {
        !self.filtered && !self.lod_suppressed
    }

    /// Pickable and drawn
    pub fn is_candidate(&self) -> bool {
        self.pickable() && self.visible
    }
}

/// A system as handed to the registry by the loader
#[derive(Debug, Clone, PartialEq)]
pub struct SystemRecord {
    pub name: String,
    pub description: Option<String>,
    /// Scene-space position (loader has already applied the z reversal)
    pub position: DVec3,
    pub categories: Vec<String>,
}

impl SystemRecord {
    pub fn new(name: impl Into<String>, position: DVec3) -> Self {
        Self {
            name: name.into(),
            description: None,
            position,
            categories: Vec::new(),
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Owned copy of a system's data, used as event payload so subscribers never
/// need to reach into the registry
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSnapshot {
    pub system: SystemRef,
    pub name: String,
    pub description: Option<String>,
    pub position: DVec3,
    pub categories: Vec<String>,
    pub kind: EntityKind,
    /// Rounded distance from Sol in light years
    pub distance_to_sol: f64,
}

/// Rounded distance of a scene position from Sol, which sits at the origin
pub fn distance_to_sol(position: DVec3) -> f64 {
    position.length().round()
}
