//! Per-file record.

use std::rc::Rc;

use super::callback::{CallbackEntry, HandlerKind};
use crate::config::Strategy;
use crate::error::LiveError;
use crate::freshness::ContentHash;
use crate::sandbox::Value;

/// Observable lifecycle of a tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Subscribed, first read still pending.
    Loading,
    /// Content available, last evaluation (if any) succeeded.
    Loaded,
    /// The last read failed; earlier content and values are retained.
    ReadError,
    /// The current content failed to evaluate.
    EvalError,
}

pub(crate) struct TrackedFile {
    pub strategy: Option<Strategy>,
    pub content: Option<Rc<str>>,
    pub hash: Option<ContentHash>,
    /// Bumped on every content change.
    pub version: u64,
    /// Evaluation of `version`, success or failure. Memoized so that every
    /// subscriber of one version shares a single evaluation.
    evaluation: Option<(u64, Result<Value, LiveError>)>,
    /// Last good value of an earlier version.
    previous: Option<Value>,
    read_error: Option<LiveError>,
    /// Persistent `module` table, created on first evaluation.
    pub module: Option<mlua::Table>,
    /// Newest last.
    pub callbacks: Vec<CallbackEntry>,
    /// Entries that subscribed before the first read and still wait for
    /// their first delivery.
    pub awaiting: Vec<u64>,
}

impl TrackedFile {
    pub fn new(strategy: Option<Strategy>) -> Self {
        Self {
            strategy,
            content: None,
            hash: None,
            version: 0,
            evaluation: None,
            previous: None,
            read_error: None,
            module: None,
            callbacks: Vec::new(),
            awaiting: Vec::new(),
        }
    }

    pub fn state(&self) -> FileState {
        if self.read_error.is_some() {
            FileState::ReadError
        } else if self.content.is_none() {
            FileState::Loading
        } else if matches!(&self.evaluation, Some((v, Err(_))) if *v == self.version) {
            FileState::EvalError
        } else {
            FileState::Loaded
        }
    }

    /// Store freshly read content as a new version.
    pub fn apply_content(&mut self, content: Rc<str>, hash: ContentHash) {
        self.retire_evaluation();
        self.content = Some(content);
        self.hash = Some(hash);
        self.version += 1;
        self.read_error = None;
    }

    pub fn set_read_error(&mut self, err: LiveError) {
        self.read_error = Some(err);
    }

    /// Clear a read error. Returns whether there was one.
    pub fn recover(&mut self) -> bool {
        self.read_error.take().is_some()
    }

    /// Forget the memoized evaluation so the next request runs the code
    /// again (an imported file changed).
    pub fn invalidate(&mut self) {
        self.retire_evaluation();
    }

    pub fn record_evaluation(&mut self, version: u64, result: Result<Value, LiveError>) {
        if version == self.version {
            self.evaluation = Some((version, result));
        }
    }

    /// What a new evaluate subscriber would get without running anything.
    pub fn memoized(&self) -> Option<Result<Value, LiveError>> {
        if let Some(err) = &self.read_error {
            return Some(Err(err.clone()));
        }
        match &self.evaluation {
            Some((version, result)) if *version == self.version => Some(result.clone()),
            _ => None,
        }
    }

    /// Text for a read subscriber.
    pub fn text(&self) -> Option<Result<Value, LiveError>> {
        if let Some(err) = &self.read_error {
            return Some(Err(err.clone()));
        }
        self.content.clone().map(|text| Ok(Value::Text(text)))
    }

    /// Successful value of the current version.
    pub fn evaluated(&self) -> Option<&Value> {
        match &self.evaluation {
            Some((version, Ok(value))) if *version == self.version && self.read_error.is_none() => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Error attached to the file right now.
    pub fn last_error(&self) -> Option<&LiveError> {
        if let Some(err) = &self.read_error {
            return Some(err);
        }
        match &self.evaluation {
            Some((version, Err(err))) if *version == self.version => Some(err),
            _ => None,
        }
    }

    /// Newest good value, falling back to earlier versions.
    pub fn last_good(&self) -> Option<&Value> {
        match &self.evaluation {
            Some((version, Ok(value))) if *version == self.version => Some(value),
            _ => self.previous.as_ref(),
        }
    }

    /// Whether anything needs the file's content (not just its path).
    ///
    /// A failed read counts: the file was read once, and importers wait
    /// for it to become readable again.
    pub fn wants_content(&self) -> bool {
        self.content.is_some()
            || self.read_error.is_some()
            || self.callbacks.iter().any(|e| e.kind != HandlerKind::ResolvePath)
    }

    /// Snapshot of the selected entries, newest first.
    pub fn entries(&self, wanted: impl Fn(&CallbackEntry) -> bool) -> Vec<CallbackEntry> {
        self.callbacks
            .iter()
            .rev()
            .filter(|e| wanted(e))
            .cloned()
            .collect()
    }

    pub fn has_entry(&self, id: u64) -> bool {
        self.callbacks.iter().any(|e| e.id == id)
    }

    fn retire_evaluation(&mut self) {
        if let Some((_, Ok(value))) = self.evaluation.take() {
            self.previous = Some(value);
        }
    }
}
