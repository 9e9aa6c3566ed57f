//! Callback origins.
//!
//! While a script evaluates, every subscription it makes is tagged with the
//! script's path. Before the same script evaluates again, all entries
//! carrying that tag are purged, so reloading never accumulates duplicate
//! callbacks. Evaluations nest through static imports, hence a stack: the
//! innermost evaluating file owns new registrations.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::registry::Registry;

#[derive(Debug, Default)]
pub(crate) struct OriginTracker {
    stack: Vec<PathBuf>,
    /// Live entries per origin, to skip the sweep when there are none.
    counts: FxHashMap<PathBuf, usize>,
}

impl OriginTracker {
    /// File currently evaluating, if any.
    pub fn current(&self) -> Option<&PathBuf> {
        self.stack.last()
    }

    pub fn is_evaluating(&self, path: &Path) -> bool {
        self.stack.iter().any(|p| p == path)
    }

    /// Account for one new entry tagged with `origin`.
    pub fn record(&mut self, origin: &Path) {
        *self.counts.entry(origin.to_path_buf()).or_default() += 1;
    }

    /// Take the entry count of `origin` (zero if it has none).
    pub fn take(&mut self, origin: &Path) -> usize {
        self.counts.remove(origin).unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.counts.clear();
    }

    fn push(&mut self, path: PathBuf) {
        self.stack.push(path);
    }

    fn pop(&mut self) {
        self.stack.pop();
    }
}

/// Keeps `path` on the origin stack for the guard's lifetime.
///
/// Popping happens in `Drop`, so an evaluation that errors (or a callback
/// that panics) can't leave a stale origin behind.
pub(crate) struct OriginGuard<'a> {
    state: &'a RefCell<Registry>,
}

impl<'a> OriginGuard<'a> {
    pub fn enter(state: &'a RefCell<Registry>, path: &Path) -> Self {
        state.borrow_mut().origins.push(path.to_path_buf());
        Self { state }
    }
}

impl Drop for OriginGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.origins.pop();
        }
    }
}
