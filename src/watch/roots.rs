use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Attached watch directories.
///
/// One recursive OS watch per canonical directory; attaching twice is a no-op.
#[derive(Default)]
pub(super) struct WatchRoots {
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    /// Returns `Ok(true)` when the directory was newly attached.
    pub(super) fn attach(
        &mut self,
        watcher: &mut RecommendedWatcher,
        dir: &Path,
    ) -> notify::Result<bool> {
        if self.attached.contains(dir) {
            return Ok(false);
        }
        watcher.watch(dir, RecursiveMode::Recursive)?;
        self.attached.insert(dir.to_path_buf());
        Ok(true)
    }

    /// The only attached root, used to anchor relative event paths.
    pub(super) fn single(&self) -> Option<&Path> {
        match self.attached.len() {
            1 => self.attached.iter().next().map(PathBuf::as_path),
            _ => None,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.attached.len()
    }

    pub(super) fn clear(&mut self) {
        self.attached.clear();
    }
}
