//! Hover and selection state machines

use super::ray::{resolve_nearest, Raycaster};
use crate::config::PickingConfig;
use crate::core::camera::OrbitCamera;
use crate::core::entity::{SystemRef, SystemRegistry};
use glam::DVec2;
use std::time::Duration;
use tracing::{debug, trace};

/// Everything a pointer move needs to resolve a hover
pub struct PickContext<'a> {
    pub registry: &'a SystemRegistry,
    pub camera: &'a OrbitCamera,
    pub raycaster: &'a dyn Raycaster,
    pub pick_radius: f64,
    /// Orbit controls are enabled (disabled during camera flights)
    pub controls_enabled: bool,
    /// A camera drag is in progress
    pub dragging: bool,
}

/// A hover or selection transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickEvent {
    HoverChanged(Option<SystemRef>),
    SelectionChanged(Option<SystemRef>),
}

/// Tracks which system is hovered and which is selected
#[derive(Debug, Clone)]
pub struct Picker {
    hover: Option<SystemRef>,
    selection: Option<SystemRef>,
    pointer_down_at: Option<Duration>,
    click_threshold: Duration,
    tie_tolerance: f64,
}

impl Default for Picker {
    fn default() -> Self {
        Self::new(&PickingConfig::default())
    }
}

impl Picker {
    pub fn new(config: &PickingConfig) -> Self {
        Self {
            hover: None,
            selection: None,
            pointer_down_at: None,
            click_threshold: config.click_threshold(),
            tie_tolerance: config.tie_tolerance,
        }
    }

    /// Apply new tuning without touching hover or selection
    pub fn configure(&mut self, config: &PickingConfig) {
        self.click_threshold = config.click_threshold();
        self.tie_tolerance = config.tie_tolerance;
    }

    pub fn hover(&self) -> Option<SystemRef> {
        self.hover
    }

    pub fn selection(&self) -> Option<SystemRef> {
        self.selection
    }

    /// Resolve the system under the pointer
    pub fn on_pointer_move(&mut self, ctx: &PickContext<'_>, ndc: DVec2) -> Option<PickEvent> {
        if !ctx.controls_enabled || ctx.dragging {
            trace!(
                controls_enabled = ctx.controls_enabled,
                dragging = ctx.dragging,
                "Pointer move ignored"
            );
            return None;
        }

        let hits = ctx
            .raycaster
            .cast_ray(ndc, ctx.camera, ctx.registry, ctx.pick_radius);
        let nearest = resolve_nearest(&hits, self.tie_tolerance, |system| {
            ctx.registry.is_pickable(system)
        });

        match nearest {
            Some(hit) if self.hover == Some(hit.system) => None,
            Some(hit) => {
                debug!(system = ?hit.system, distance = hit.ray_distance, "Hover changed");
                self.hover = Some(hit.system);
                Some(PickEvent::HoverChanged(self.hover))
            }
            None => self.clear_hover(),
        }
    }

    /// Remember when the button went down
    pub fn on_pointer_down(&mut self, at: Duration) {
        self.pointer_down_at = Some(at);
    }

    /// Forget the pending press (it turned into a drag)
    pub fn cancel_press(&mut self) {
        self.pointer_down_at = None;
    }

    /// Confirm a click: a short press over a hovered system selects it
    pub fn on_pointer_up(
        &mut self,
        at: Duration,
        registry: &SystemRegistry,
        controls_enabled: bool,
    ) -> Option<PickEvent> {
        let down = self.pointer_down_at.take()?;
        let held = at.saturating_sub(down);
        if held > self.click_threshold {
            trace!(held_ms = held.as_millis() as u64, "Long press, no selection");
            return None;
        }
        if !controls_enabled {
            return None;
        }
        let hover = self.hover.filter(|h| registry.is_pickable(*h))?;
        self.select(hover)
    }

    /// Select a system programmatically; no event if it is already selected
    pub fn select(&mut self, system: SystemRef) -> Option<PickEvent> {
        if self.selection == Some(system) {
            return None;
        }
        debug!(system = ?system, "Selection changed");
        self.selection = Some(system);
        Some(PickEvent::SelectionChanged(self.selection))
    }

    pub fn clear_hover(&mut self) -> Option<PickEvent> {
        self.hover
            .take()
            .map(|_| PickEvent::HoverChanged(None))
    }

    pub fn clear_selection(&mut self) -> Option<PickEvent> {
        self.selection.take().map(|_| {
            debug!("Selection cleared");
            PickEvent::SelectionChanged(None)
        })
    }

    /// Drop state that no longer holds after a registry change
    ///
    /// A hover whose system became unpickable is cleared. A selection is only
    /// dropped once its reference went stale.
    pub fn revalidate(&mut self, registry: &SystemRegistry) -> Vec<PickEvent> {
        let mut events = Vec::new();
        if matches!(self.hover, Some(h) if !registry.is_pickable(h)) {
            events.extend(self.clear_hover());
        }
        if matches!(self.selection, Some(s) if !registry.contains(s)) {
            events.extend(self.clear_selection());
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::SystemRecord;
    use crate::picking::PointCloudRaycaster;
    use glam::DVec3;

    struct Fixture {
        registry: SystemRegistry,
        camera: OrbitCamera,
        sol: SystemRef,
        alpha: SystemRef,
    }

    fn fixture() -> Fixture {
        let mut registry = SystemRegistry::default();
        let sol = registry
            .register(SystemRecord::new("Sol", DVec3::ZERO).with_categories(["10"]))
            .unwrap();
        let alpha = registry
            .register(SystemRecord::new("Alpha", DVec3::new(40.0, 0.0, 0.0)))
            .unwrap();
        let camera = OrbitCamera::default().looking_at(DVec3::new(0.0, 0.0, 100.0), DVec3::ZERO);
        Fixture {
            registry,
            camera,
            sol,
            alpha,
        }
    }

    fn ctx(f: &Fixture) -> PickContext<'_> {
        PickContext {
            registry: &f.registry,
            camera: &f.camera,
            raycaster: &PointCloudRaycaster,
            pick_radius: 2.0,
            controls_enabled: true,
            dragging: false,
        }
    }

    #[test]
    fn test_hover_enter_and_leave() {
        let f = fixture();
        let mut picker = Picker::default();

        let event = picker.on_pointer_move(&ctx(&f), DVec2::ZERO);
        assert_eq!(event, Some(PickEvent::HoverChanged(Some(f.sol))));
        assert_eq!(picker.on_pointer_move(&ctx(&f), DVec2::ZERO), None);

        let event = picker.on_pointer_move(&ctx(&f), DVec2::new(0.0, 0.9));
        assert_eq!(event, Some(PickEvent::HoverChanged(None)));
        assert_eq!(picker.on_pointer_move(&ctx(&f), DVec2::new(0.0, 0.9)), None);
        assert_ne!(picker.hover(), Some(f.alpha));
    }

    #[test]
    fn test_move_ignored_while_dragging_or_disabled() {
        let f = fixture();
        let mut picker = Picker::default();

        let mut context = ctx(&f);
        context.dragging = true;
        assert_eq!(picker.on_pointer_move(&context, DVec2::ZERO), None);
        context.dragging = false;
        context.controls_enabled = false;
        assert_eq!(picker.on_pointer_move(&context, DVec2::ZERO), None);
        assert_eq!(picker.hover(), None);
    }

    #[test]
    fn test_filtered_system_is_not_hovered() {
        let mut f = fixture();
        f.registry.set_category_pickable("10", false);
        let mut picker = Picker::default();
        assert_eq!(picker.on_pointer_move(&ctx(&f), DVec2::ZERO), None);
        assert_eq!(picker.hover(), None);
    }

    #[test]
    fn test_short_click_selects() {
        let f = fixture();
        let mut picker = Picker::default();
        picker.on_pointer_move(&ctx(&f), DVec2::ZERO);

        picker.on_pointer_down(Duration::from_millis(1_000));
        let event = picker.on_pointer_up(Duration::from_millis(1_150), &f.registry, true);
        assert_eq!(event, Some(PickEvent::SelectionChanged(Some(f.sol))));

        // Clicking the selected system again is not a change
        picker.on_pointer_down(Duration::from_millis(2_000));
        assert_eq!(
            picker.on_pointer_up(Duration::from_millis(2_050), &f.registry, true),
            None
        );
    }

    #[test]
    fn test_long_press_does_not_select() {
        let f = fixture();
        let mut picker = Picker::default();
        picker.on_pointer_move(&ctx(&f), DVec2::ZERO);

        picker.on_pointer_down(Duration::from_millis(1_000));
        assert_eq!(
            picker.on_pointer_up(Duration::from_millis(1_201), &f.registry, true),
            None
        );
        assert_eq!(picker.selection(), None);
    }

    #[test]
    fn test_click_threshold_is_inclusive() {
        let f = fixture();
        let mut picker = Picker::default();
        picker.on_pointer_move(&ctx(&f), DVec2::ZERO);

        picker.on_pointer_down(Duration::from_millis(0));
        assert!(picker
            .on_pointer_up(Duration::from_millis(200), &f.registry, true)
            .is_some());
    }

    #[test]
    fn test_pointer_up_without_down_is_ignored() {
        let f = fixture();
        let mut picker = Picker::default();
        picker.on_pointer_move(&ctx(&f), DVec2::ZERO);
        assert_eq!(
            picker.on_pointer_up(Duration::from_millis(10), &f.registry, true),
            None
        );
    }

    #[test]
    fn test_clear_only_reports_when_set() {
        let f = fixture();
        let mut picker = Picker::default();
        assert_eq!(picker.clear_hover(), None);
        assert_eq!(picker.clear_selection(), None);

        picker.select(f.alpha);
        assert_eq!(
            picker.clear_selection(),
            Some(PickEvent::SelectionChanged(None))
        );
    }

    #[test]
    fn test_revalidate_drops_unpickable_hover_keeps_selection() {
        let mut f = fixture();
        let mut picker = Picker::default();
        picker.on_pointer_move(&ctx(&f), DVec2::ZERO);
        picker.select(f.sol);

        f.registry.set_category_pickable("10", false);
        let events = picker.revalidate(&f.registry);
        assert_eq!(events, vec![PickEvent::HoverChanged(None)]);
        assert_eq!(picker.selection(), Some(f.sol));

        f.registry.replace_all(Vec::new()).unwrap();
        let events = picker.revalidate(&f.registry);
        assert_eq!(events, vec![PickEvent::SelectionChanged(None)]);
    }
}
