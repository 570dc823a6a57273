//! Hot reload of the systems data file
//!
//! A background thread watches the file, parses it after a debounced change
//! and hands the result to the frame thread through a channel. The map state
//! itself is only touched by whoever polls [`SystemsWatcher::try_recv`].

use super::map_data::{LoadError, MapData};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("failed to join watcher thread")]
    ThreadJoin,
}

/// Configuration for the systems watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce duration to avoid multiple reloads for rapid file changes
    pub debounce_duration: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(300),
        }
    }
}

/// Control handle for managing the watcher thread
struct WatcherControlHandle {
    stop_sender: Sender<()>,
    thread_handle: thread::JoinHandle<()>,
}

/// Watches a systems file and delivers freshly parsed data
pub struct SystemsWatcher {
    _watcher: RecommendedWatcher,
    data_path: PathBuf,
    reload_rx: Receiver<Result<MapData, LoadError>>,
    control_handle: Option<WatcherControlHandle>,
}

impl SystemsWatcher {
    pub fn new<P: AsRef<Path>>(data_path: P, config: WatcherConfig) -> Result<Self, WatchError> {
        let data_path = data_path.as_ref().to_path_buf();
        info!(path = ?data_path, "Creating systems watcher");

        let (event_tx, event_rx) = mpsc::channel::<Event>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (reload_tx, reload_rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| match res {
                Ok(event) => {
                    if let Err(e) = event_tx.send(event) {
                        error!(error = %e, "Failed to send file event");
                    }
                }
                Err(e) => error!(error = %e, "File watcher error"),
            },
            Config::default(),
        )?;

        // Watch the parent directory so editors that replace the file are seen
        let watch_path = if data_path.is_file() {
            data_path.parent().unwrap_or(&data_path)
        } else {
            &data_path
        };
        watcher.watch(watch_path, RecursiveMode::NonRecursive)?;
        debug!(watch_path = ?watch_path, "Started watching for file changes");

        let thread_path = data_path.clone();
        let thread_handle = thread::spawn(move || {
            Self::event_loop(thread_path, config, event_rx, stop_rx, reload_tx);
        });

        Ok(Self {
            _watcher: watcher,
            data_path,
            reload_rx,
            control_handle: Some(WatcherControlHandle {
                stop_sender: stop_tx,
                thread_handle,
            }),
        })
    }

    fn event_loop(
        data_path: PathBuf,
        config: WatcherConfig,
        event_rx: Receiver<Event>,
        stop_rx: Receiver<()>,
        reload_tx: Sender<Result<MapData, LoadError>>,
    ) {
        let mut last_reload: Option<Instant> = None;

        loop {
            if stop_rx.try_recv().is_ok() {
                debug!("Systems watcher received stop signal");
                break;
            }

            match event_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(event) => {
                    let concerns_data = event.paths.iter().any(|path| {
                        path == &data_path || path.file_name() == data_path.file_name()
                    });
                    if !concerns_data || !(event.kind.is_modify() || event.kind.is_create()) {
                        continue;
                    }

                    let now = Instant::now();
                    if last_reload.is_some_and(|t| now.duration_since(t) < config.debounce_duration)
                    {
                        debug!("Debouncing rapid file changes");
                        continue;
                    }
                    last_reload = Some(now);

                    debug!(event_kind = ?event.kind, "Systems file changed, reloading");
                    let result = MapData::load_from_file(&data_path);
                    if let Err(e) = &result {
                        warn!(error = %e, "Systems file reload failed");
                    }
                    if reload_tx.send(result).is_err() {
                        debug!("Reload receiver dropped, stopping watcher");
                        break;
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    debug!("Event channel disconnected, stopping watcher");
                    break;
                }
            }
        }

        info!("Systems watcher event loop stopped");
    }

    /// Most recent reload result since the last call, if any
    pub fn try_recv(&self) -> Option<Result<MapData, LoadError>> {
        self.reload_rx.try_iter().last()
    }

    /// Block until a reload arrives or `timeout` passes
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Result<MapData, LoadError>> {
        self.reload_rx.recv_timeout(timeout).ok()
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Stop the watcher and clean up resources
    pub fn stop(mut self) -> Result<(), WatchError> {
        if let Some(control) = self.control_handle.take() {
            info!(path = ?self.data_path, "Stopping systems watcher");

            if let Err(e) = control.stop_sender.send(()) {
                warn!(error = %e, "Failed to send stop signal to watcher thread");
            }
            if control.thread_handle.join().is_err() {
                error!("Error joining watcher thread");
                return Err(WatchError::ThreadJoin);
            }
        }
        Ok(())
    }
}

impl Drop for SystemsWatcher {
    fn drop(&mut self) {
        if let Some(control) = self.control_handle.take() {
            warn!("SystemsWatcher dropped without calling stop() - forcing stop");
            let _ = control.stop_sender.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_watcher_config_default() {
        let config = WatcherConfig::default();
        assert_eq!(config.debounce_duration, Duration::from_millis(300));
    }

    #[test]
    fn test_watcher_creation_and_stop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("systems.json");
        fs::write(&path, r#"{"systems": []}"#).unwrap();

        let watcher = SystemsWatcher::new(&path, WatcherConfig::default()).unwrap();
        assert_eq!(watcher.data_path().file_name().unwrap(), "systems.json");
        assert!(watcher.try_recv().is_none());
        watcher.stop().unwrap();
    }
}
