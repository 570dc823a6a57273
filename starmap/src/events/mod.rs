//! Typed map events and the synchronous bus that delivers them

pub mod bus;

pub use bus::{EventBus, EventHandler, SubscriptionId};

use crate::core::entity::SystemSnapshot;

/// Event categories, used to filter subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Init,
    Render,
    ScaleChanged,
    EnableFarView,
    DisableFarView,
    SystemHoverChanged,
    SystemSelectionChanged,
    ToggleCategoryFilter,
    SystemsLoaded,
    ConfigChanged,
}

impl EventKind {
    /// Wire name shared with HUD and renderer collaborators
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Init => "init",
            EventKind::Render => "render",
            EventKind::ScaleChanged => "scaleChanged",
            EventKind::EnableFarView => "enableFarView",
            EventKind::DisableFarView => "disableFarView",
            EventKind::SystemHoverChanged => "systemHoverChanged",
            EventKind::SystemSelectionChanged => "systemSelectionChanged",
            EventKind::ToggleCategoryFilter => "toggleCategoryFilter",
            EventKind::SystemsLoaded => "systemsLoaded",
            EventKind::ConfigChanged => "configChanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    Init,
    /// Something visible changed this frame
    Render,
    ScaleChanged {
        scale: f64,
    },
    EnableFarView {
        scale: f64,
        with_animation: bool,
    },
    DisableFarView {
        scale: f64,
        with_animation: bool,
    },
    SystemHoverChanged(Option<SystemSnapshot>),
    SystemSelectionChanged(Option<SystemSnapshot>),
    ToggleCategoryFilter {
        category: String,
        enabled: bool,
    },
    SystemsLoaded {
        generation: u64,
        count: usize,
    },
    ConfigChanged,
}

impl MapEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MapEvent::Init => EventKind::Init,
            MapEvent::Render => EventKind::Render,
            MapEvent::ScaleChanged { .. } => EventKind::ScaleChanged,
            MapEvent::EnableFarView { .. } => EventKind::EnableFarView,
            MapEvent::DisableFarView { .. } => EventKind::DisableFarView,
            MapEvent::SystemHoverChanged(_) => EventKind::SystemHoverChanged,
            MapEvent::SystemSelectionChanged(_) => EventKind::SystemSelectionChanged,
            MapEvent::ToggleCategoryFilter { .. } => EventKind::ToggleCategoryFilter,
            MapEvent::SystemsLoaded { .. } => EventKind::SystemsLoaded,
            MapEvent::ConfigChanged => EventKind::ConfigChanged,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}
