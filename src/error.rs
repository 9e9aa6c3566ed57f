//! Error taxonomy of the reload engine.
//!
//! Two classes:
//! - synchronous, programmer errors returned by subscribe calls
//!   (`PathNotFound`, `UnsupportedRequest`, `UnsupportedType`, `Watch`)
//! - asynchronous content errors attached to a tracked file
//!   (`Read`, `Eval`, `Cycle`), logged and delivered to fallible callbacks

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

pub type Result<T, E = LiveError> = std::result::Result<T, E>;

/// Reload engine errors.
///
/// `Clone` because one failure is delivered to every fallible subscriber
/// of the file it belongs to.
#[derive(Debug, Clone, Error)]
pub enum LiveError {
    #[error("cannot resolve `{request}` from `{}`", base.display())]
    PathNotFound { request: String, base: PathBuf },

    #[error("unsupported request `{0}` (expected `./`, `../` or `/` prefix)")]
    UnsupportedRequest(String),

    #[error("no handler for `{}`", .0.display())]
    UnsupportedType(PathBuf),

    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("evaluation of `{}` failed: {message}", path.display())]
    Eval { path: PathBuf, message: String },

    #[error("import cycle through `{}`", .0.display())]
    Cycle(PathBuf),

    #[error("cannot watch `{}`: {message}", path.display())]
    Watch { path: PathBuf, message: String },
}

impl LiveError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn eval(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Eval {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_error_display() {
        let err = LiveError::read("/tmp/a.lua", Error::new(ErrorKind::NotFound, "gone"));
        assert!(err.to_string().contains("/tmp/a.lua"));

        let err = LiveError::UnsupportedRequest("foo".into());
        assert!(err.to_string().contains("`foo`"));
    }

    #[test]
    fn test_error_clone_keeps_source() {
        let err = LiveError::read("/tmp/a.lua", Error::new(ErrorKind::PermissionDenied, "nope"));
        let cloned = err.clone();
        let source = std::error::Error::source(&cloned).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("nope"));
    }
}
