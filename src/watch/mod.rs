//! File watch registry.
//!
//! Owns the OS watcher and the set of attached directories, and turns raw
//! notify events into absolute paths for the reload engine.
//!
//! ```text
//! notify callback → std channel → bridge thread → tokio channel → Live::run
//! ```
//!
//! The watcher is created lazily on the first `watch` call and dropped by
//! `clear`, which closes every OS descriptor at once.

mod event;
mod roots;

pub use event::{ChangeKind, changed_paths};

use std::path::{Path, PathBuf};

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use crate::error::{LiveError, Result};
use roots::WatchRoots;

/// Capacity of the event channel between the bridge thread and the engine.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct FileWatchRegistry {
    /// Watcher handle (must be kept alive)
    watcher: Option<RecommendedWatcher>,
    roots: WatchRoots,
    /// Where bridged events go
    events_tx: mpsc::Sender<notify::Event>,
}

impl FileWatchRegistry {
    pub fn new(events_tx: mpsc::Sender<notify::Event>) -> Self {
        Self {
            watcher: None,
            roots: WatchRoots::default(),
            events_tx,
        }
    }

    /// Watch `dir` recursively. Returns `Ok(false)` if it was already watched.
    pub fn watch(&mut self, dir: &Path) -> Result<bool> {
        let dir = dir.canonicalize().map_err(|e| watch_error(dir, e))?;
        if !dir.is_dir() {
            return Err(LiveError::Watch {
                path: dir,
                message: "not a directory".into(),
            });
        }

        let watcher = match &mut self.watcher {
            Some(watcher) => watcher,
            slot => {
                let watcher =
                    spawn_watcher(self.events_tx.clone()).map_err(|e| watch_error(&dir, e))?;
                slot.insert(watcher)
            }
        };

        let attached = self
            .roots
            .attach(watcher, &dir)
            .map_err(|e| watch_error(&dir, e))?;
        if attached {
            crate::log!("watch"; "watching {}", dir.display());
        }
        Ok(attached)
    }

    /// Absolute paths touched by a raw event.
    pub fn route(&self, event: &notify::Event) -> Vec<(PathBuf, ChangeKind)> {
        changed_paths(event, self.roots.single())
    }

    /// Number of attached directories.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.len() == 0
    }

    /// Drop the OS watcher and forget every attached directory.
    pub fn clear(&mut self) {
        self.watcher = None;
        self.roots.clear();
    }
}

fn watch_error(path: &Path, err: impl std::fmt::Display) -> LiveError {
    LiveError::Watch {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Create a notify watcher whose events are bridged into `events_tx`.
///
/// The bridge thread ends when the watcher (and with it the std sender) is
/// dropped, or when the engine side of the channel is gone.
fn spawn_watcher(events_tx: mpsc::Sender<notify::Event>) -> notify::Result<RecommendedWatcher> {
    // notify doesn't support async
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();

    let watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })?;

    std::thread::spawn(move || {
        while let Ok(result) = notify_rx.recv() {
            match result {
                Ok(event) => {
                    if events_tx.blocking_send(event).is_err() {
                        break; // Receiver dropped
                    }
                }
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            }
        }
    });

    Ok(watcher)
}
