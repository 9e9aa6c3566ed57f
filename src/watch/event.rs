//! Raw notify event classification.

use std::path::{Path, PathBuf};

use notify::EventKind;
use notify::event::ModifyKind;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }

    /// Map a notify event kind; `None` for events that never change content.
    pub fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Remove(_) => Some(Self::Removed),
            // Metadata-only changes (mtime/atime/chmod) would loop on our own reads
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Modified),
            _ => None,
        }
    }
}

/// Absolute, normalized paths touched by an event.
///
/// Relative paths are joined onto `root`. Editor temp files are dropped.
pub fn changed_paths(event: &notify::Event, root: Option<&Path>) -> Vec<(PathBuf, ChangeKind)> {
    let Some(kind) = ChangeKind::from_event(&event.kind) else {
        return Vec::new();
    };

    event
        .paths
        .iter()
        .filter(|path| !is_temp_file(path))
        .map(|path| match root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.clone(),
        })
        .map(|path| (normalize_event_path(&path), kind))
        .collect()
}

/// Canonicalize, falling back to the canonical parent for removed files.
fn normalize_event_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_event(paths: Vec<PathBuf>, kind: EventKind) -> notify::Event {
        notify::Event {
            kind,
            paths,
            attrs: Default::default(),
        }
    }

    fn modify_kind() -> EventKind {
        EventKind::Modify(ModifyKind::Data(notify::event::DataChange::Any))
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(ChangeKind::from_event(&modify_kind()), Some(ChangeKind::Modified));
        assert_eq!(
            ChangeKind::from_event(&EventKind::Create(notify::event::CreateKind::File)),
            Some(ChangeKind::Created)
        );
        assert_eq!(
            ChangeKind::from_event(&EventKind::Modify(ModifyKind::Metadata(
                notify::event::MetadataKind::Any
            ))),
            None
        );
        assert_eq!(
            ChangeKind::from_event(&EventKind::Access(notify::event::AccessKind::Any)),
            None
        );
    }

    #[test]
    fn test_relative_paths_joined_and_canonicalized() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("foo.lua"), "").unwrap();

        let event = make_event(vec![PathBuf::from("foo.lua")], modify_kind());
        let paths = changed_paths(&event, Some(&root));
        assert_eq!(paths, vec![(root.join("foo.lua"), ChangeKind::Modified)]);
    }

    #[test]
    fn test_removed_file_keeps_canonical_parent() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();

        let event = make_event(
            vec![root.join("gone.lua")],
            EventKind::Remove(notify::event::RemoveKind::File),
        );
        let paths = changed_paths(&event, None);
        assert_eq!(paths, vec![(root.join("gone.lua"), ChangeKind::Removed)]);
    }

    #[test]
    fn test_temp_files_ignored() {
        let event = make_event(
            vec![
                PathBuf::from("/tmp/.scene.lua.swp"),
                PathBuf::from("/tmp/scene.lua~"),
                PathBuf::from("/tmp/scene.bak"),
            ],
            modify_kind(),
        );
        assert!(changed_paths(&event, None).is_empty());
    }
}
