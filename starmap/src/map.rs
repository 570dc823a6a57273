//! The star map: per-frame orchestration of LOD, camera flights, picking and
//! scene decor
//!
//! Each [`StarMap::tick`] runs, in order:
//! 1. LOD scale recompute and view-mode transitions,
//! 2. camera and decor tweens,
//! 3. queued pointer events (orbit drag, hover, click-to-select, zoom),
//! 4. a `render` event if anything visible changed.

use crate::animation::{CameraTransitions, TransitionError};
use crate::config::{ConfigError, MapConfig};
use crate::core::camera::{CameraPose, OrbitCamera, OrbitControls};
use crate::core::entity::{
    distance_to_sol, EntityKind, RegistryError, SystemRef, SystemRegistry, SystemSnapshot,
};
use crate::events::{EventBus, EventKind, MapEvent, SubscriptionId};
use crate::input::{PointerEvent, PointerState};
use crate::io::{LoadError, MapData, SystemsWatcher};
use crate::lod::{LodController, LodTransition, ViewMode};
use crate::picking::{PickContext, PickEvent, Picker, PointCloudRaycaster, Raycaster};
use crate::scene::SceneDecor;
use glam::DVec3;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the galaxy center marker
pub const GALAXY_CENTER_NAME: &str = "Sagittarius A*";

#[derive(Debug, Error)]
pub enum MapError {
    #[error("no visible system named '{0}'")]
    SystemNotFound(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// A `render` event was emitted
    pub rendered: bool,
    pub scale: f64,
    pub view_mode: ViewMode,
    /// A camera flight moved the camera
    pub camera_moved: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct CategoryEntry {
    group: String,
    name: String,
    color: Option<String>,
}

/// A category as listed in the HUD filter panel
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryInfo {
    pub id: String,
    pub group: String,
    pub name: String,
    pub color: Option<String>,
    pub enabled: bool,
    /// Systems tagged with this category
    pub count: usize,
}

pub struct StarMap {
    config: MapConfig,
    registry: SystemRegistry,
    bus: EventBus,
    picker: Picker,
    lod: LodController,
    camera: OrbitCamera,
    controls: OrbitControls,
    transitions: CameraTransitions,
    decor: SceneDecor,
    pointer: PointerState,
    raycaster: Box<dyn Raycaster>,
    categories: BTreeMap<String, CategoryEntry>,
    galaxy_center: Option<SystemRef>,
    home_target: DVec3,
    initialized: bool,
    /// Next LOD evaluation applies without animation
    snap_lod: bool,
    dirty: bool,
}

fn controls_from(config: &MapConfig) -> OrbitControls {
    OrbitControls {
        enabled: true,
        rotate_speed: config.camera.rotate_speed,
        zoom_speed: config.camera.zoom_speed,
        min_distance: config.camera.min_distance,
        max_distance: config.camera.max_distance,
    }
}

impl StarMap {
    pub fn new(config: MapConfig) -> Self {
        Self::with_raycaster(config, Box::new(PointCloudRaycaster))
    }

    /// Create a map whose picking goes through a renderer-provided raycaster
    pub fn with_raycaster(config: MapConfig, raycaster: Box<dyn Raycaster>) -> Self {
        let camera = OrbitCamera::perspective(
            config.camera.fov_y_degrees,
            16.0 / 9.0,
            config.camera.z_near,
            config.camera.z_far,
        )
        .looking_at(config.camera.initial_position, config.camera.home_target);

        let mut pointer = PointerState::new(config.picking.drag_threshold_px);
        pointer.set_viewport(1280.0, 720.0);

        Self {
            registry: SystemRegistry::new(config.categories.policy),
            bus: EventBus::new(),
            picker: Picker::new(&config.picking),
            lod: LodController::new(&config.lod),
            camera,
            controls: controls_from(&config),
            transitions: CameraTransitions::new(&config.camera),
            decor: SceneDecor::new(&config),
            pointer,
            raycaster,
            categories: BTreeMap::new(),
            galaxy_center: None,
            home_target: config.camera.home_target,
            initialized: false,
            snap_lod: true,
            dirty: true,
            config,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// Direct camera access; the next tick picks up the new pose
    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        self.dirty = true;
        &mut self.camera
    }

    /// Rounded distance from Sol to the point the camera orbits
    pub fn distance_to_sol(&self) -> f64 {
        distance_to_sol(self.camera.target)
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn decor(&self) -> &SceneDecor {
        &self.decor
    }

    pub fn view_mode(&self) -> ViewMode {
        self.lod.mode()
    }

    /// Scale observed by the last tick
    pub fn scale(&self) -> Option<f64> {
        self.lod.previous_scale()
    }

    pub fn hover(&self) -> Option<SystemRef> {
        self.picker.hover()
    }

    pub fn selection(&self) -> Option<SystemRef> {
        self.picker.selection()
    }

    pub fn galaxy_center(&self) -> Option<SystemRef> {
        self.galaxy_center
    }

    pub fn is_camera_animating(&self) -> bool {
        self.transitions.is_animating()
    }

    /// Pointer input sink; queued events are applied by the next tick
    pub fn pointer_mut(&mut self) -> &mut PointerState {
        &mut self.pointer
    }

    pub fn subscribe(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&MapEvent) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(kind, handler)
    }

    pub fn subscribe_all(&mut self, handler: impl FnMut(&MapEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe_all(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn emit(&mut self, event: MapEvent) {
        self.bus.emit(&event);
    }

    /// Emit `init` and put the camera in its home pose
    pub fn init(&mut self, now: Duration) -> Result<(), MapError> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;
        info!("Initializing star map");
        self.emit(MapEvent::Init);

        match self.config.camera.start_animation_ms {
            Some(ms) if ms > 0 => {
                self.move_home(Duration::from_millis(ms), true, now)?;
            }
            _ => self.move_home(Duration::ZERO, false, now)?,
        }
        self.snap_lod = true;
        self.dirty = true;
        Ok(())
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.pointer.set_viewport(width, height);
        if height > 0.0 {
            self.camera.set_aspect_ratio(width / height);
        }
        self.dirty = true;
    }

    /// Switch user orbit controls (e.g. off while the pointer is over the HUD)
    pub fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls.enabled = enabled;
    }

    /// Replace the system set with `data`
    ///
    /// Hover and selection refer to the old set and are cleared. Disabled
    /// categories stay disabled.
    pub fn load_systems(&mut self, data: &MapData) -> Result<u64, MapError> {
        let generation = self.registry.replace_all(data.to_records())?;

        // Data coordinates have z reversed relative to the scene
        let center = self.config.galaxy_center;
        self.galaxy_center = center.map(|c| {
            self.registry
                .add_decoration(GALAXY_CENTER_NAME, DVec3::new(c.x, c.y, -c.z))
        });
        self.categories = data
            .category_definitions()
            .map(|(id, group, definition)| {
                (
                    id.to_string(),
                    CategoryEntry {
                        group: group.to_string(),
                        name: definition.name.clone(),
                        color: definition.color.clone(),
                    },
                )
            })
            .collect();
        if let Some(player) = data.player_position() {
            self.home_target = player;
        }
        if self.lod.is_far() && self.config.lod.suppress_picking_in_far_view {
            self.registry.set_lod_suppressed(true);
        }

        if let Some(event) = self.picker.clear_hover() {
            self.dispatch_pick(event);
        }
        if let Some(event) = self.picker.clear_selection() {
            self.dispatch_pick(event);
        }

        info!(generation, systems = data.systems.len(), "Systems loaded");
        self.emit(MapEvent::SystemsLoaded {
            generation,
            count: data.systems.len(),
        });
        self.dirty = true;
        Ok(generation)
    }

    /// Apply a pending hot reload; returns true if the system set changed
    pub fn poll_reload(&mut self, watcher: &SystemsWatcher) -> Result<bool, MapError> {
        match watcher.try_recv() {
            None => Ok(false),
            Some(result) => {
                let data = result?;
                self.load_systems(&data)?;
                Ok(true)
            }
        }
    }

    /// Galaxy assets are loaded; particle styling starts now
    pub fn mark_assets_ready(&mut self) {
        let far = self.lod.is_far();
        self.decor.attach_galaxy_particles(far);
        if let Some(scale) = self.lod.previous_scale() {
            self.decor.scale_changed(scale, far);
        }
        self.dirty = true;
    }

    pub fn set_config(&mut self, config: MapConfig) -> Result<(), MapError> {
        config.validate()?;

        self.picker.configure(&config.picking);
        self.lod.configure(&config.lod);
        self.transitions.configure(&config.camera);
        self.decor.configure(&config);
        self.registry.set_policy(config.categories.policy);
        self.pointer
            .set_drag_threshold(config.picking.drag_threshold_px);

        let enabled = self.controls.enabled;
        self.controls = controls_from(&config);
        self.controls.enabled = enabled;
        self.camera.fov_y_radians = config.camera.fov_y_degrees.to_radians();
        self.camera.z_near = config.camera.z_near;
        self.camera.z_far = config.camera.z_far;

        self.registry
            .set_lod_suppressed(self.lod.is_far() && config.lod.suppress_picking_in_far_view);
        self.config = config;
        self.revalidate_picker();

        debug!("Map config changed");
        self.emit(MapEvent::ConfigChanged);
        self.dirty = true;
        Ok(())
    }

    /// Advance one frame
    pub fn tick(&mut self, now: Duration) -> FrameReport {
        // LOD
        self.lod.set_locked(self.transitions.is_animating());
        let with_animation = !std::mem::take(&mut self.snap_lod);
        let update = self
            .lod
            .update(self.camera.position, self.camera.target, with_animation);
        if update.scale_changed {
            self.decor.scale_changed(update.scale, self.lod.is_far());
            self.emit(MapEvent::ScaleChanged {
                scale: update.scale,
            });
            self.dirty = true;
        }
        if let Some(transition) = update.transition {
            self.apply_transition(transition, now);
        }

        // Tweens
        let camera_moved = self
            .transitions
            .update(&mut self.camera, &mut self.controls, now);
        let decor_changed = self.decor.update(now);
        if camera_moved || decor_changed {
            self.dirty = true;
        }
        self.lod.set_locked(self.transitions.is_animating());

        // Pointer
        for event in self.pointer.drain() {
            self.handle_pointer_event(event, now);
        }

        let rendered = std::mem::take(&mut self.dirty);
        if rendered {
            self.emit(MapEvent::Render);
        }
        FrameReport {
            rendered,
            scale: update.scale,
            view_mode: self.lod.mode(),
            camera_moved,
        }
    }

    fn apply_transition(&mut self, transition: LodTransition, now: Duration) {
        match transition {
            LodTransition::EnterFar {
                scale,
                with_animation,
            } => {
                self.decor.enter_far_view(with_animation, now);
                if self.config.lod.suppress_picking_in_far_view {
                    self.registry.set_lod_suppressed(true);
                    self.revalidate_picker();
                }
                self.emit(MapEvent::EnableFarView {
                    scale,
                    with_animation,
                });
            }
            LodTransition::ExitFar {
                scale,
                with_animation,
            } => {
                self.decor.exit_far_view(with_animation, now);
                self.registry.set_lod_suppressed(false);
                self.emit(MapEvent::DisableFarView {
                    scale,
                    with_animation,
                });
            }
        }
        self.dirty = true;
    }

    fn pick_radius(&self) -> f64 {
        let scale = self.lod.previous_scale().unwrap_or_default();
        self.config.picking.pick_radius(scale)
    }

    fn handle_pointer_event(&mut self, event: PointerEvent, now: Duration) {
        match event {
            PointerEvent::Move {
                ndc,
                delta,
                dragging,
                ..
            } => {
                if dragging {
                    if self
                        .controls
                        .rotate(&mut self.camera, delta, self.pointer.viewport.y)
                    {
                        self.dirty = true;
                    }
                    return;
                }
                let pick_radius = self.pick_radius();
                let ctx = PickContext {
                    registry: &self.registry,
                    camera: &self.camera,
                    raycaster: &*self.raycaster,
                    pick_radius,
                    controls_enabled: self.controls.enabled,
                    dragging,
                };
                if let Some(event) = self.picker.on_pointer_move(&ctx, ndc) {
                    self.dispatch_pick(event);
                }
            }
            PointerEvent::Down { at } => self.picker.on_pointer_down(at),
            PointerEvent::Up { at, dragged } => {
                if dragged {
                    self.picker.cancel_press();
                    return;
                }
                let event = self
                    .picker
                    .on_pointer_up(at, &self.registry, self.controls.enabled);
                if let Some(event) = event {
                    self.dispatch_pick(event);
                    if let PickEvent::SelectionChanged(Some(system)) = event {
                        if let Err(e) = self.fly_to_system(system, now) {
                            warn!(error = %e, "Could not fly to clicked system");
                        }
                    }
                }
            }
            PointerEvent::Leave => {
                if let Some(event) = self.picker.clear_hover() {
                    self.dispatch_pick(event);
                }
            }
            PointerEvent::Wheel { steps } => {
                if self.controls.zoom(&mut self.camera, steps) {
                    self.dirty = true;
                }
            }
        }
    }

    fn dispatch_pick(&mut self, event: PickEvent) {
        match event {
            PickEvent::HoverChanged(system) => {
                let snapshot = system.and_then(|s| self.registry.get(s));
                self.decor
                    .set_hover_cursor(snapshot.as_ref().map(|s| s.position));
                self.emit(MapEvent::SystemHoverChanged(snapshot));
            }
            PickEvent::SelectionChanged(system) => {
                let snapshot = system.and_then(|s| self.registry.get(s));
                self.decor
                    .set_selection_cursor(snapshot.as_ref().map(|s| s.position));
                self.emit(MapEvent::SystemSelectionChanged(snapshot));
            }
        }
        self.dirty = true;
    }

    fn revalidate_picker(&mut self) {
        for event in self.picker.revalidate(&self.registry) {
            self.dispatch_pick(event);
        }
    }

    /// Leave far view without animation before a programmatic camera move
    fn snap_to_near(&mut self, now: Duration) {
        if let Some(transition) = self.lod.force_near(self.lod.far_threshold()) {
            self.apply_transition(transition, now);
        }
    }

    /// Fly the camera to look at `target` from `view_distance`
    pub fn fly_to(
        &mut self,
        target: DVec3,
        view_distance: f64,
        animate: bool,
        now: Duration,
    ) -> Result<(), MapError> {
        if !target.is_finite() || !view_distance.is_finite() {
            return Err(TransitionError::InvalidTransform(format!(
                "target {target} at view distance {view_distance}"
            ))
            .into());
        }
        self.snap_to_near(now);
        self.transitions.fly_to(
            &mut self.camera,
            &mut self.controls,
            target,
            view_distance,
            animate,
            now,
        )?;
        self.lod.set_locked(self.transitions.is_animating());
        self.dirty = true;
        Ok(())
    }

    fn fly_to_system(&mut self, system: SystemRef, now: Duration) -> Result<(), MapError> {
        let Some(position) = self.registry.position(system) else {
            debug!(system = ?system, "Ignoring fly-to for stale system");
            return Ok(());
        };
        let view_distance = self.config.camera.view_distance;
        self.fly_to(position, view_distance, true, now)?;
        self.decor.move_grid_to(position);
        Ok(())
    }

    /// Drop the selection and bring the camera back to the home pose
    pub fn move_to_initial_position(&mut self, animate: bool, now: Duration) -> Result<(), MapError> {
        self.clear_selection();
        let duration = self.config.camera.home_duration();
        self.move_home(duration, animate, now)
    }

    fn move_home(&mut self, duration: Duration, animate: bool, now: Duration) -> Result<(), MapError> {
        let position = match self.config.camera.home_position {
            Some(p) => DVec3::new(p.x, p.y, -p.z),
            None => self.home_target + self.config.camera.home_offset,
        };
        let home = CameraPose::new(position, self.home_target);
        self.snap_to_near(now);
        self.transitions.move_to(
            &mut self.camera,
            &mut self.controls,
            home,
            duration,
            animate,
            now,
        )?;
        self.lod.set_locked(self.transitions.is_animating());
        self.dirty = true;
        Ok(())
    }

    /// Select a system and fly to it
    ///
    /// Returns false (and leaves the camera alone) when the system is already
    /// selected, stale or hidden.
    pub fn select(&mut self, system: SystemRef, now: Duration) -> Result<bool, MapError> {
        let selectable = self
            .registry
            .get(system)
            .is_some_and(|s| s.kind == EntityKind::System)
            && self.registry.pickability(system).is_some_and(|p| p.visible);
        if !selectable {
            debug!(system = ?system, "Ignoring selection of unselectable system");
            return Ok(false);
        }
        let Some(event) = self.picker.select(system) else {
            return Ok(false);
        };
        self.dispatch_pick(event);
        self.fly_to_system(system, now)?;
        Ok(true)
    }

    /// Clear the selection without moving the camera
    pub fn clear_selection(&mut self) -> bool {
        match self.picker.clear_selection() {
            Some(event) => {
                self.dispatch_pick(event);
                true
            }
            None => false,
        }
    }

    /// Find a visible system by name (case-insensitive) and select it
    pub fn search(&mut self, name: &str, now: Duration) -> Result<SystemSnapshot, MapError> {
        let system = self
            .registry
            .find_by_name(name, false, true)
            .ok_or_else(|| MapError::SystemNotFound(name.trim().to_string()))?;
        self.select(system, now)?;
        self.registry
            .get(system)
            .ok_or_else(|| MapError::SystemNotFound(name.trim().to_string()))
    }

    pub fn select_next(&mut self, now: Duration) -> Result<Option<SystemRef>, MapError> {
        self.step_selection(true, now)
    }

    pub fn select_previous(&mut self, now: Duration) -> Result<Option<SystemRef>, MapError> {
        self.step_selection(false, now)
    }

    fn step_selection(&mut self, forward: bool, now: Duration) -> Result<Option<SystemRef>, MapError> {
        let Some(next) = self.registry.step_visible(self.picker.selection(), forward) else {
            return Ok(None);
        };
        self.select(next, now)?;
        Ok(Some(next))
    }

    /// Flip a category filter; returns whether the category is now enabled
    pub fn toggle_category(&mut self, category: &str) -> bool {
        let enabled = !self.registry.is_category_enabled(category);
        self.set_category_enabled(category, enabled);
        enabled
    }

    pub fn set_category_enabled(&mut self, category: &str, enabled: bool) {
        self.registry.set_category_pickable(category, enabled);
        self.revalidate_picker();
        self.emit(MapEvent::ToggleCategoryFilter {
            category: category.to_string(),
            enabled,
        });
        self.dirty = true;
    }

    /// Categories of the loaded data with their filter state and counts
    pub fn categories(&self) -> Vec<CategoryInfo> {
        self.categories
            .iter()
            .map(|(id, entry)| CategoryInfo {
                id: id.clone(),
                group: entry.group.clone(),
                name: entry.name.clone(),
                color: entry.color.clone(),
                enabled: self.registry.is_category_enabled(id),
                count: self.registry.category_count(id),
            })
            .collect()
    }
}
