//! Reload queue.
//!
//! Paths waiting to be processed, in arrival order, with one slot per path.
//! A path that is already queued absorbs later triggers instead of being
//! queued twice, which serializes work per path: a burst of events for the
//! same file turns into a single read.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

/// Why a path was queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    /// First subscriber to a file whose content was never read.
    Load,
    /// Filesystem event (or explicit `notify_changed`).
    Changed,
    /// A statically imported file changed.
    Reevaluate,
}

/// Everything accumulated for one path while it waited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Pending {
    pub load: bool,
    pub changed: bool,
    pub reevaluate: bool,
}

impl Pending {
    fn add(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::Load => self.load = true,
            Trigger::Changed => self.changed = true,
            Trigger::Reevaluate => self.reevaluate = true,
        }
    }

    /// Content must be (re-)read.
    pub fn needs_read(&self) -> bool {
        self.load || self.changed
    }
}

#[derive(Debug, Default)]
pub(crate) struct ReloadQueue {
    order: VecDeque<PathBuf>,
    pending: FxHashMap<PathBuf, Pending>,
}

impl ReloadQueue {
    /// Queue `path`. Returns `true` if it was not queued yet.
    pub fn push(&mut self, path: &Path, trigger: Trigger) -> bool {
        if let Some(pending) = self.pending.get_mut(path) {
            pending.add(trigger);
            return false;
        }
        let mut pending = Pending::default();
        pending.add(trigger);
        self.pending.insert(path.to_path_buf(), pending);
        self.order.push_back(path.to_path_buf());
        true
    }

    /// Oldest queued path with its merged triggers.
    pub fn pop(&mut self) -> Option<(PathBuf, Pending)> {
        let path = self.order.pop_front()?;
        let pending = self.pending.remove(&path).unwrap_or_default();
        Some((path, pending))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.pending.clear();
    }
}
