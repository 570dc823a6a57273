//! Pointer state and the queue of pointer events applied each frame

use glam::DVec2;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tracing::trace;
use winit::event::{ElementState, MouseButton};

/// Device-independent pointer event, consumed by the map on its next tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move {
        /// Normalized device coordinates
        ndc: DVec2,
        /// Movement since the previous position, in pixels
        delta: DVec2,
        dragging: bool,
        at: Duration,
    },
    Down {
        at: Duration,
    },
    Up {
        at: Duration,
        /// The press turned into a drag before release
        dragged: bool,
    },
    /// Pointer left the viewport
    Leave,
    Wheel {
        /// Positive zooms in
        steps: f64,
    },
}

/// Tracks the pointer and queues events for the map
#[derive(Debug, Clone)]
pub struct PointerState {
    /// Cursor position in window pixels
    pub position: Option<DVec2>,
    /// Viewport size in pixels
    pub viewport: DVec2,
    pub buttons_pressed: HashSet<MouseButton>,
    press_origin: Option<DVec2>,
    dragging: bool,
    drag_threshold_px: f64,
    inside: bool,
    queue: VecDeque<PointerEvent>,
}

impl Default for PointerState {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl PointerState {
    pub fn new(drag_threshold_px: f64) -> Self {
        Self {
            position: None,
            viewport: DVec2::ZERO,
            buttons_pressed: HashSet::new(),
            press_origin: None,
            dragging: false,
            drag_threshold_px,
            inside: false,
            queue: VecDeque::new(),
        }
    }

    pub fn set_drag_threshold(&mut self, drag_threshold_px: f64) {
        self.drag_threshold_px = drag_threshold_px;
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = DVec2::new(width.max(0.0), height.max(0.0));
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    /// Normalized device coordinates of a window position, `None` outside
    /// the viewport
    pub fn to_ndc(&self, position: DVec2) -> Option<DVec2> {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 || !position.is_finite() {
            return None;
        }
        if position.x < 0.0
            || position.y < 0.0
            || position.x > self.viewport.x
            || position.y > self.viewport.y
        {
            return None;
        }
        Some(DVec2::new(
            position.x / self.viewport.x * 2.0 - 1.0,
            -(position.y / self.viewport.y) * 2.0 + 1.0,
        ))
    }

    pub fn handle_cursor_moved(&mut self, x: f64, y: f64, at: Duration) {
        let position = DVec2::new(x, y);
        let delta = self
            .position
            .map_or(DVec2::ZERO, |previous| position - previous);
        self.position = Some(position);

        let Some(ndc) = self.to_ndc(position) else {
            self.handle_cursor_left();
            return;
        };
        self.inside = true;

        if let Some(origin) = self.press_origin {
            if !self.dragging && origin.distance(position) > self.drag_threshold_px {
                self.dragging = true;
                trace!("Drag started");
            }
        }

        self.queue.push_back(PointerEvent::Move {
            ndc,
            delta,
            dragging: self.dragging,
            at,
        });
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState, at: Duration) {
        match state {
            ElementState::Pressed => {
                self.buttons_pressed.insert(button);
                trace!("Mouse button pressed: {:?}", button);
            }
            ElementState::Released => {
                self.buttons_pressed.remove(&button);
                trace!("Mouse button released: {:?}", button);
            }
        }
        if button != MouseButton::Left {
            return;
        }

        match state {
            ElementState::Pressed => {
                if !self.inside {
                    return;
                }
                self.press_origin = self.position;
                self.dragging = false;
                self.queue.push_back(PointerEvent::Down { at });
            }
            ElementState::Released => {
                if self.press_origin.take().is_none() {
                    return;
                }
                let dragged = std::mem::take(&mut self.dragging);
                self.queue.push_back(PointerEvent::Up { at, dragged });
            }
        }
    }

    pub fn handle_wheel(&mut self, steps: f64) {
        if steps != 0.0 && steps.is_finite() {
            self.queue.push_back(PointerEvent::Wheel { steps });
        }
    }

    pub fn handle_cursor_left(&mut self) {
        if std::mem::take(&mut self.inside) {
            self.queue.push_back(PointerEvent::Leave);
        }
    }

    /// Take every queued event in arrival order
    pub fn drain(&mut self) -> Vec<PointerEvent> {
        self.queue.drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }
}
