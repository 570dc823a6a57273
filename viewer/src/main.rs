//! Star map viewer: drives the map from a winit window
//!
//! Usage: `viewer <systems.json> [map-config.json]`
//!
//! There is no renderer here. The window feeds pointer and keyboard input
//! into the map and its title shows the hovered and selected systems.

use starmap::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes, WindowId},
};

const WINDOW_TITLE: &str = "Star Map";

struct ViewerApp {
    map: StarMap,
    window: Option<Arc<Window>>,
    watcher: Option<SystemsWatcher>,
    started: Instant,
    title: String,
}

impl ViewerApp {
    fn new(map: StarMap, watcher: Option<SystemsWatcher>) -> Self {
        Self {
            map,
            window: None,
            watcher,
            started: Instant::now(),
            title: WINDOW_TITLE.to_string(),
        }
    }

    fn now(&self) -> Duration {
        self.started.elapsed()
    }

    fn frame(&mut self) {
        if let Some(watcher) = &self.watcher {
            if let Err(e) = self.map.poll_reload(watcher) {
                warn!(error = %e, "Systems reload failed, keeping current set");
            }
        }

        let report = self.map.tick(self.now());
        if report.rendered {
            self.update_title();
        }
    }

    fn update_title(&mut self) {
        let name_of = |system: Option<SystemRef>| {
            system
                .and_then(|s| self.map.registry().get(s))
                .map(|s| s.name)
        };
        let title = match (name_of(self.map.selection()), name_of(self.map.hover())) {
            (Some(selected), Some(hovered)) if selected != hovered => {
                format!("{WINDOW_TITLE} - {selected} (hover: {hovered})")
            }
            (Some(selected), _) => format!("{WINDOW_TITLE} - {selected}"),
            (None, Some(hovered)) => format!("{WINDOW_TITLE} - {hovered}"),
            (None, None) => WINDOW_TITLE.to_string(),
        };
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }
    }

    fn handle_key(&mut self, key: Key) {
        let now = self.now();
        let result = match key.as_ref() {
            Key::Named(NamedKey::Escape) => {
                self.map.clear_selection();
                Ok(())
            }
            Key::Named(NamedKey::Home) => self.map.move_to_initial_position(true, now),
            Key::Character("n") => self.map.select_next(now).map(|_| ()),
            Key::Character("p") => self.map.select_previous(now).map(|_| ()),
            Key::Character(digit) => match digit.parse::<usize>() {
                Ok(index) => {
                    let category = self.map.categories().get(index).map(|c| c.id.clone());
                    if let Some(category) = category {
                        let enabled = self.map.toggle_category(&category);
                        info!(category = %category, enabled, "Category filter toggled");
                    }
                    Ok(())
                }
                Err(_) => Ok(()),
            },
            _ => Ok(()),
        };
        if let Err(e) = result {
            warn!(error = %e, "Key action failed");
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::PhysicalSize::new(1280, 720));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!(error = %e, "Failed to create window");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.map
            .set_viewport(size.width as f64, size.height as f64);
        if let Err(e) = self.map.init(self.now()) {
            error!(error = %e, "Map initialization failed");
        }
        // Stands in for the renderer reporting its galaxy assets loaded
        self.map.mark_assets_ready();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let now = self.now();
        match event {
            WindowEvent::CloseRequested => {
                info!("Window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                debug!(width = size.width, height = size.height, "Window resized");
                self.map.set_viewport(size.width as f64, size.height as f64);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.map
                    .pointer_mut()
                    .handle_cursor_moved(position.x, position.y, now);
            }
            WindowEvent::CursorLeft { .. } => {
                self.map.pointer_mut().handle_cursor_left();
            }
            WindowEvent::MouseInput { button, state, .. } => {
                self.map.pointer_mut().handle_mouse_button(button, state, now);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y as f64,
                    MouseScrollDelta::PixelDelta(position) => position.y / 100.0,
                };
                self.map.pointer_mut().handle_wheel(steps);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                self.handle_key(event.logical_key);
            }
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let config = match args.get(2) {
        Some(path) => match MapConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("✗ Failed to load map config {path}: {e}");
                std::process::exit(1);
            }
        },
        None => MapConfig::default(),
    };
    starmap::init_logging_with(config.log_filter.as_deref());
    info!("Starting star map viewer");

    let data_path = args
        .get(1)
        .cloned()
        .or_else(|| {
            config
                .data
                .systems_path
                .as_ref()
                .map(|p| p.display().to_string())
        });
    let Some(data_path) = data_path else {
        eprintln!("Usage: viewer <systems.json> [map-config.json]");
        std::process::exit(2);
    };

    let data = match MapData::load_from_file(&data_path) {
        Ok(data) => data,
        Err(e) => {
            error!(path = %data_path, error = %e, "Failed to load systems data");
            std::process::exit(1);
        }
    };

    let watcher = if config.data.watch {
        let watcher_config = WatcherConfig {
            debounce_duration: Duration::from_millis(config.data.debounce_ms),
        };
        match SystemsWatcher::new(&data_path, watcher_config) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!(error = %e, "Hot reload disabled");
                None
            }
        }
    } else {
        None
    };

    let mut map = StarMap::new(config);
    map.subscribe(EventKind::SystemSelectionChanged, |event| {
        if let MapEvent::SystemSelectionChanged(Some(system)) = event {
            info!(name = %system.name, position = %system.position, "Selected system");
        }
    });
    if let Err(e) = map.load_systems(&data) {
        error!(error = %e, "Failed to register systems");
        std::process::exit(1);
    }

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!(error = %e, "Failed to create event loop");
            std::process::exit(1);
        }
    };
    let mut app = ViewerApp::new(map, watcher);
    if let Err(e) = event_loop.run_app(&mut app) {
        error!(error = %e, "Event loop error");
    }
    if let Some(watcher) = app.watcher.take() {
        if let Err(e) = watcher.stop() {
            warn!(error = %e, "Failed to stop systems watcher");
        }
    }
}
