//! Change detection for tracked files.
//!
//! A filesystem event only means "something touched this file". The detector
//! reads the whole file and compares its content hash with the last one seen;
//! identical bytes are reported as `Unchanged` and stop the reload there.

use std::path::Path;
use std::rc::Rc;

use super::ContentHash;
use crate::error::LiveError;

/// Outcome of a content check.
#[derive(Debug)]
pub enum Detection {
    /// Content differs from the last seen version (or was never seen).
    Changed { content: Rc<str>, hash: ContentHash },
    /// Same bytes as last time.
    Unchanged,
    /// The read failed; last seen content stays valid.
    ReadError(LiveError),
}

impl Detection {
    fn from_read(path: &Path, read: std::io::Result<String>, last: Option<ContentHash>) -> Self {
        match read {
            Ok(text) => {
                let hash = ContentHash::of(&text);
                if last == Some(hash) {
                    Self::Unchanged
                } else {
                    Self::Changed {
                        content: Rc::from(text),
                        hash,
                    }
                }
            }
            Err(e) => Self::ReadError(LiveError::read(path, e)),
        }
    }
}

/// Read `path` asynchronously and compare against `last`.
pub async fn check(path: &Path, last: Option<ContentHash>) -> Detection {
    let read = tokio::fs::read_to_string(path).await;
    Detection::from_read(path, read, last)
}

/// Blocking variant, used when evaluated code imports a file that was never
/// loaded.
pub fn check_blocking(path: &Path, last: Option<ContentHash>) -> Detection {
    Detection::from_read(path, std::fs::read_to_string(path), last)
}
