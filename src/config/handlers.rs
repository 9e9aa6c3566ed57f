//! Extension → evaluation strategy table.
//!
//! Built once from `[[handlers]]` and never mutated afterwards. Declaration
//! order matters: the resolver probes extensions in that order.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a file's content becomes a delivered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Run as Lua in the sandbox; the value is what the chunk exports.
    Script,
    /// Pass the text through unchanged (shaders, plain text).
    Text,
}

/// One `[[handlers]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerEntry {
    pub extension: String,
    pub strategy: Strategy,
}

impl HandlerEntry {
    pub fn new(extension: &str, strategy: Strategy) -> Self {
        Self {
            extension: extension.to_string(),
            strategy,
        }
    }
}

/// Immutable, ordered handler table.
#[derive(Debug, Clone)]
pub struct HandlerTable {
    entries: Vec<HandlerEntry>,
}

impl HandlerTable {
    pub(crate) fn new(entries: Vec<HandlerEntry>) -> Self {
        Self { entries }
    }

    /// Recognized extensions in declaration order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.extension.as_str())
    }

    pub fn get(&self, extension: &str) -> Option<Strategy> {
        self.entries
            .iter()
            .find(|e| e.extension == extension)
            .map(|e| e.strategy)
    }

    /// Strategy for a path, by its extension.
    pub fn for_path(&self, path: &Path) -> Option<Strategy> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        self.get(ext)
    }
}

/// Default table: Lua code plus pass-through text formats.
pub(crate) fn default_handlers() -> Vec<HandlerEntry> {
    vec![
        HandlerEntry::new("lua", Strategy::Script),
        HandlerEntry::new("txt", Strategy::Text),
        HandlerEntry::new("frag", Strategy::Text),
        HandlerEntry::new("vert", Strategy::Text),
        HandlerEntry::new("glsl", Strategy::Text),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_path() {
        let table = HandlerTable::new(default_handlers());
        assert_eq!(table.for_path(Path::new("/a/b.lua")), Some(Strategy::Script));
        assert_eq!(table.for_path(Path::new("/a/b.frag")), Some(Strategy::Text));
        assert_eq!(table.for_path(Path::new("/a/b.js")), None);
        assert_eq!(table.for_path(Path::new("/a/Makefile")), None);
    }

    #[test]
    fn test_extension_order_preserved() {
        let table = HandlerTable::new(vec![
            HandlerEntry::new("vert", Strategy::Text),
            HandlerEntry::new("lua", Strategy::Script),
        ]);
        let exts: Vec<_> = table.extensions().collect();
        assert_eq!(exts, ["vert", "lua"]);
    }
}
