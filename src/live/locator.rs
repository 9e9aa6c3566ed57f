//! Caller location.
//!
//! Relative requests made from host code resolve against the directory of
//! the calling source file. `#[track_caller]` gives us the file name as the
//! compiler saw it, which is usually relative to the package root; a
//! locator turns it into a real path.

use std::panic::Location;
use std::path::{Path, PathBuf};

pub trait CallerLocator {
    /// Path of the source file containing `site`.
    fn locate(&self, site: &Location<'_>) -> PathBuf;
}

/// Source files live under `root` (typically `env!("CARGO_MANIFEST_DIR")`).
#[derive(Debug, Clone)]
pub struct SourceRoot {
    root: PathBuf,
}

impl SourceRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl CallerLocator for SourceRoot {
    fn locate(&self, site: &Location<'_>) -> PathBuf {
        let file = Path::new(site.file());
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.root.join(file)
        }
    }
}

/// Every caller is treated as living in one file (CLI and embedding hosts
/// without meaningful source locations).
#[derive(Debug, Clone)]
pub struct FixedLocation {
    file: PathBuf,
}

impl FixedLocation {
    /// `file` need not exist; only its parent directory matters for
    /// resolution.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    /// A pseudo file inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("<host>"))
    }
}

impl CallerLocator for FixedLocation {
    fn locate(&self, _site: &Location<'_>) -> PathBuf {
        self.file.clone()
    }
}

impl<F> CallerLocator for F
where
    F: Fn(&Location<'_>) -> PathBuf,
{
    fn locate(&self, site: &Location<'_>) -> PathBuf {
        self(site)
    }
}
