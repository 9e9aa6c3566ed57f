//! Mutable engine state.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use super::deps::DependencyGraph;
use super::once::OnceCache;
use super::origin::OriginTracker;
use super::queue::ReloadQueue;
use super::tracked::TrackedFile;
use crate::watch::FileWatchRegistry;

/// Everything that changes at runtime, behind one `RefCell`.
///
/// Borrows are short and never held across callbacks, Lua calls or awaits.
pub(crate) struct Registry {
    pub files: FxHashMap<PathBuf, TrackedFile>,
    pub origins: OriginTracker,
    pub deps: DependencyGraph,
    pub once: OnceCache,
    pub queue: ReloadQueue,
    pub watches: FileWatchRegistry,
    /// Bumped by `clear`; work started under an older generation is dropped.
    pub generation: u64,
    next_id: u64,
}

impl Registry {
    pub fn new(events_tx: mpsc::Sender<notify::Event>) -> Self {
        Self {
            files: FxHashMap::default(),
            origins: OriginTracker::default(),
            deps: DependencyGraph::default(),
            once: OnceCache::default(),
            queue: ReloadQueue::default(),
            watches: FileWatchRegistry::new(events_tx),
            generation: 0,
            next_id: 0,
        }
    }

    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Remove every entry registered by `origin`, across all files.
    ///
    /// Returns the number of entries removed.
    pub fn purge_origin(&mut self, origin: &Path) -> usize {
        if self.origins.take(origin) == 0 {
            return 0;
        }
        let mut removed = 0;
        for file in self.files.values_mut() {
            let before = file.callbacks.len();
            file.callbacks
                .retain(|entry| entry.origin.as_deref() != Some(origin));
            removed += before - file.callbacks.len();
        }
        removed
    }

    /// Whether callback `id` is still registered on `path`.
    pub fn is_registered(&self, path: &Path, id: u64) -> bool {
        self.files.get(path).is_some_and(|f| f.has_entry(id))
    }

    /// Forget everything and invalidate in-flight work.
    pub fn clear(&mut self) {
        self.files.clear();
        self.origins.clear();
        self.deps.clear();
        self.once.clear();
        self.queue.clear();
        self.watches.clear();
        self.generation += 1;
    }
}
