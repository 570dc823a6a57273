//! Star map view-state core
//!
//! This crate owns the state behind an interactive 3D star map: the registry
//! of star systems, pointer picking, near/far level of detail, animated
//! camera flights and the event bus that tells HUD and renderer
//! collaborators what changed. Rendering itself lives elsewhere.

pub mod animation;
pub mod config;
pub mod core;
pub mod events;
pub mod input;
pub mod io;
pub mod lod;
pub mod map;
pub mod picking;
pub mod scene;

pub use map::{CategoryInfo, FrameReport, MapError, StarMap};

// Re-export commonly used types
pub mod prelude {
    // Entity types
    pub use crate::core::entity::{
        CategoryPolicy, EntityKind, SystemRecord, SystemRef, SystemRegistry, SystemSnapshot,
    };

    // Camera types
    pub use crate::core::camera::{CameraPose, OrbitCamera, OrbitControls};

    // Math types
    pub use glam::{DMat4, DVec2, DVec3};

    // Map types
    pub use crate::map::{CategoryInfo, FrameReport, MapError, StarMap};
    pub use crate::config::MapConfig;
    pub use crate::events::{EventKind, MapEvent, SubscriptionId};
    pub use crate::lod::ViewMode;
    pub use crate::picking::{PickHit, Ray, Raycaster};

    // IO types
    pub use crate::io::{LoadError, MapData, SystemsWatcher, WatcherConfig};
}

const DEFAULT_LOG_FILTER: &str = "info,starmap=debug";

/// Initialize logging for the star map
pub fn init_logging() {
    init_logging_with(None);
}

/// Initialize logging, falling back to `filter` when `RUST_LOG` is unset
pub fn init_logging_with(filter: Option<&str>) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fallback = filter.unwrap_or(DEFAULT_LOG_FILTER).to_string();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
