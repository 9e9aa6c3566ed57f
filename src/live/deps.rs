//! Static import graph.
//!
//! Edges are recorded while a script evaluates (every `require(...)` it
//! performs) and dropped right before that script evaluates again, so the
//! graph always reflects each importer's latest evaluation.

use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};

type PathSet = FxHashSet<PathBuf>;
type PathSetMap = FxHashMap<PathBuf, PathSet>;

/// Bidirectional import graph.
///
/// # Invariants
/// - Forward and reverse mappings are always consistent
/// - Self-imports are excluded
#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    /// Forward: importer → files it imported
    forward: PathSetMap,
    /// Reverse: imported file → importers
    reverse: PathSetMap,
}

impl DependencyGraph {
    /// Record that `importer` statically imported `dependency`.
    pub fn add(&mut self, importer: &Path, dependency: &Path) {
        if importer == dependency {
            return;
        }
        self.forward
            .entry(importer.to_path_buf())
            .or_default()
            .insert(dependency.to_path_buf());
        self.reverse
            .entry(dependency.to_path_buf())
            .or_default()
            .insert(importer.to_path_buf());
    }

    /// Importers of `file`, in no particular order.
    pub fn used_by(&self, file: &Path) -> Vec<PathBuf> {
        self.reverse
            .get(file)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Files `importer` imported during its last evaluation.
    #[cfg(test)]
    pub fn uses(&self, importer: &Path) -> Option<&PathSet> {
        self.forward.get(importer)
    }

    /// Drop every edge going out of `importer`.
    pub fn forget(&mut self, importer: &Path) {
        let Some(old_deps) = self.forward.remove(importer) else {
            return;
        };

        for dep in old_deps {
            if let Some(importers) = self.reverse.get_mut(&dep) {
                importers.remove(importer);
                if importers.is_empty() {
                    self.reverse.remove(&dep);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn test_add_both_directions() {
        let mut graph = DependencyGraph::default();
        graph.add(&path("/scene.lua"), &path("/lib/math.lua"));

        assert_eq!(graph.used_by(&path("/lib/math.lua")), [path("/scene.lua")]);
        assert!(graph.uses(&path("/scene.lua")).unwrap().contains(&path("/lib/math.lua")));
    }

    #[test]
    fn test_self_import_excluded() {
        let mut graph = DependencyGraph::default();
        graph.add(&path("/a.lua"), &path("/a.lua"));

        assert!(graph.used_by(&path("/a.lua")).is_empty());
        assert!(graph.uses(&path("/a.lua")).is_none());
    }

    #[test]
    fn test_forget_cleans_reverse() {
        let mut graph = DependencyGraph::default();
        graph.add(&path("/a.lua"), &path("/shared.lua"));
        graph.add(&path("/b.lua"), &path("/shared.lua"));

        graph.forget(&path("/a.lua"));

        assert_eq!(graph.used_by(&path("/shared.lua")), [path("/b.lua")]);
        graph.forget(&path("/b.lua"));
        assert!(graph.used_by(&path("/shared.lua")).is_empty());
        assert!(graph.reverse.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut graph = DependencyGraph::default();
        graph.add(&path("/a.lua"), &path("/b.lua"));
        graph.clear();
        assert!(graph.used_by(&path("/b.lua")).is_empty());
    }
}
