//! Request → absolute file path resolution.
//!
//! Resolution order (first match wins):
//!
//! ```text
//! base            exact file (skipped when the request ends with `/`)
//! base.<ext>      for each recognized extension, in table order
//! base/index      exact file
//! base/index.<ext>
//! ```
//!
//! Only `./`, `../` and absolute requests are accepted; there is no search
//! path and no package lookup.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{LiveError, Result};

/// Directory-index file stem.
const INDEX: &str = "index";

/// How a request string is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Absolute,
    Relative,
}

impl Anchor {
    fn classify(request: &str) -> Result<Self> {
        if request.starts_with('/') || Path::new(request).is_absolute() {
            return Ok(Self::Absolute);
        }
        let relative = matches!(request, "." | "..")
            || request.starts_with("./")
            || request.starts_with("../")
            || (cfg!(windows) && (request.starts_with(".\\") || request.starts_with("..\\")));
        if relative {
            Ok(Self::Relative)
        } else {
            Err(LiveError::UnsupportedRequest(request.to_string()))
        }
    }
}

/// Resolve `request` against `base_dir` into a canonical file path.
///
/// `extensions` are probed in order when the request does not name an
/// existing file directly.
pub fn resolve(request: &str, base_dir: &Path, extensions: &[&str]) -> Result<PathBuf> {
    let base = match Anchor::classify(request)? {
        Anchor::Absolute => PathBuf::from(request),
        Anchor::Relative => base_dir.join(request),
    };

    if !names_directory(request)
        && let Some(found) = probe(&base, extensions)
    {
        return Ok(found);
    }

    probe(&base.join(INDEX), extensions).ok_or_else(|| LiveError::PathNotFound {
        request: request.to_string(),
        base: base_dir.to_path_buf(),
    })
}

/// Extension of the request's last component, if it has one.
///
/// Used to reject unsupported types before touching the filesystem.
pub fn request_extension(request: &str) -> Option<&str> {
    if names_directory(request) {
        return None;
    }
    let name = request.rsplit(['/', '\\']).next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then_some(ext)
}

/// A trailing separator (or a bare `.`/`..` component) forces index lookup.
fn names_directory(request: &str) -> bool {
    request.ends_with('/')
        || request.ends_with(std::path::MAIN_SEPARATOR)
        || matches!(request, "." | "..")
        || request.ends_with("/.")
        || request.ends_with("/..")
}

/// Exact file first, then each extension suffix.
fn probe(base: &Path, extensions: &[&str]) -> Option<PathBuf> {
    if base.is_file() {
        return base.canonicalize().ok();
    }
    extensions
        .iter()
        .map(|ext| with_suffix(base, ext))
        .find(|candidate| candidate.is_file())
        .and_then(|found| found.canonicalize().ok())
}

/// `foo` + `lua` → `foo.lua` (appends, never replaces an existing extension).
fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const EXTS: &[&str] = &["lua", "txt"];

    fn setup() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        (temp, root)
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_direct_file() {
        let (_temp, root) = setup();
        touch(&root.join("foo.txt"));

        let found = resolve("./foo.txt", &root, EXTS).unwrap();
        assert_eq!(found, root.join("foo.txt"));
    }

    #[test]
    fn test_extension_probe_order() {
        let (_temp, root) = setup();
        touch(&root.join("foo.txt"));
        touch(&root.join("foo.lua"));

        // table order: lua before txt
        assert_eq!(resolve("./foo", &root, EXTS).unwrap(), root.join("foo.lua"));
        assert_eq!(
            resolve("./foo", &root, &["txt", "lua"]).unwrap(),
            root.join("foo.txt")
        );
    }

    #[test]
    fn test_exact_file_beats_extension() {
        let (_temp, root) = setup();
        touch(&root.join("foo"));
        touch(&root.join("foo.lua"));

        assert_eq!(resolve("./foo", &root, EXTS).unwrap(), root.join("foo"));
    }

    #[test]
    fn test_directory_index() {
        let (_temp, root) = setup();
        touch(&root.join("scene/index.lua"));

        assert_eq!(
            resolve("./scene", &root, EXTS).unwrap(),
            root.join("scene/index.lua")
        );
    }

    #[test]
    fn test_trailing_separator_skips_direct_match() {
        let (_temp, root) = setup();
        touch(&root.join("lib.lua"));
        touch(&root.join("lib/index.lua"));

        assert_eq!(resolve("./lib", &root, EXTS).unwrap(), root.join("lib.lua"));
        assert_eq!(
            resolve("./lib/", &root, EXTS).unwrap(),
            root.join("lib/index.lua")
        );
    }

    #[test]
    fn test_parent_relative() {
        let (_temp, root) = setup();
        touch(&root.join("shared.lua"));
        fs::create_dir_all(root.join("nested")).unwrap();

        assert_eq!(
            resolve("../shared", &root.join("nested"), EXTS).unwrap(),
            root.join("shared.lua")
        );
    }

    #[test]
    fn test_absolute_ignores_base() {
        let (_temp, root) = setup();
        touch(&root.join("abs.lua"));
        let request = root.join("abs").to_string_lossy().into_owned();

        let found = resolve(&request, Path::new("/definitely/not/here"), EXTS).unwrap();
        assert_eq!(found, root.join("abs.lua"));
    }

    #[test]
    fn test_bare_request_rejected() {
        let (_temp, root) = setup();
        touch(&root.join("foo.lua"));

        let err = resolve("foo", &root, EXTS).unwrap_err();
        assert!(matches!(err, LiveError::UnsupportedRequest(_)));
        let err = resolve("", &root, EXTS).unwrap_err();
        assert!(matches!(err, LiveError::UnsupportedRequest(_)));
    }

    #[test]
    fn test_not_found() {
        let (_temp, root) = setup();
        let err = resolve("./missing", &root, EXTS).unwrap_err();
        assert!(matches!(err, LiveError::PathNotFound { .. }));
    }

    #[test]
    fn test_directory_without_index_not_found() {
        let (_temp, root) = setup();
        fs::create_dir_all(root.join("empty")).unwrap();
        let err = resolve("./empty", &root, EXTS).unwrap_err();
        assert!(matches!(err, LiveError::PathNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_canonicalized() {
        let (_temp, root) = setup();
        touch(&root.join("real.lua"));
        std::os::unix::fs::symlink(root.join("real.lua"), root.join("link.lua")).unwrap();

        assert_eq!(
            resolve("./link.lua", &root, EXTS).unwrap(),
            root.join("real.lua")
        );
    }

    #[test]
    fn test_request_extension() {
        assert_eq!(request_extension("./foo.lua"), Some("lua"));
        assert_eq!(request_extension("../a/b.c.frag"), Some("frag"));
        assert_eq!(request_extension("./foo"), None);
        assert_eq!(request_extension("./dir/"), None);
        assert_eq!(request_extension("./.hidden"), None);
        assert_eq!(request_extension(".."), None);
    }
}
