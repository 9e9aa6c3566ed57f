//! The reload engine.
//!
//! # Architecture
//!
//! ```text
//! subscribe ──► resolve ──► TrackedFile ──► (queue Load) ─┐
//!                                                         ▼
//! notify ──► bridge ──► Live::run ──► ReloadQueue ──► settle
//!                                                         │
//!                      freshness::check (hash compare) ◄──┘
//!                                   │ changed
//!                                   ▼
//!            evaluate (purge origin → sandbox → memoize) ──► callbacks
//!                                   │
//!                                   └──► importers queued for re-evaluation
//! ```
//!
//! Everything runs on one thread. Callbacks and Lua code may subscribe,
//! watch or `require` re-entrantly; the registry is never borrowed while
//! user code runs.

mod callback;
mod deps;
mod dispatch;
mod engine;
mod locator;
mod once;
mod origin;
mod queue;
mod registry;
mod script_api;
mod tracked;

pub use callback::{Callback, HandlerKind};
pub use locator::{CallerLocator, FixedLocation, SourceRoot};
pub use once::OnceKey;
pub use tracked::FileState;

use std::cell::RefCell;
use std::future::Future;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tokio::sync::{Notify, mpsc};

use crate::config::{HandlerTable, LiveConfig};
use crate::error::Result;
use crate::sandbox::Value;
use crate::watch::EVENT_CHANNEL_CAPACITY;
use callback::Handler;
use registry::Registry;

pub(crate) struct Inner {
    // `state` holds Lua handles and is declared before `lua` so it drops first
    state: RefCell<Registry>,
    lua: mlua::Lua,
    config: LiveConfig,
    handlers: HandlerTable,
    locator: Box<dyn CallerLocator>,
    events_rx: RefCell<Option<mpsc::Receiver<notify::Event>>>,
    /// Wakes `run` when work is queued outside of event handling.
    queued: Notify,
}

/// Live-reload engine handle.
///
/// Cheap to clone; clones share one engine. Not `Send`: the engine, its
/// Lua VM and every callback live on the thread that created it.
#[derive(Clone)]
pub struct Live {
    inner: Rc<Inner>,
}

impl Live {
    pub fn new(config: LiveConfig, locator: impl CallerLocator + 'static) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let handlers = config.handler_table();
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(Registry::new(events_tx)),
                lua: mlua::Lua::new(),
                config,
                handlers,
                locator: Box::new(locator),
                events_rx: RefCell::new(Some(events_rx)),
                queued: Notify::new(),
            }),
        }
    }

    pub fn config(&self) -> &LiveConfig {
        &self.inner.config
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Deliver the text of `request` now (if loaded) and on every change.
    #[track_caller]
    pub fn read(&self, request: &str, callback: Callback) -> Result<PathBuf> {
        let base = self.caller_dir(Location::caller());
        self.read_from(&base, request, callback)
    }

    pub fn read_from(&self, base_dir: &Path, request: &str, callback: Callback) -> Result<PathBuf> {
        self.inner
            .subscribe(base_dir, request, HandlerKind::Read, Handler::Rust(callback))
    }

    /// Deliver the evaluated value of `request` now (if loaded) and after
    /// every change of it or of a file it imports.
    #[track_caller]
    pub fn require(&self, request: &str, callback: Callback) -> Result<PathBuf> {
        let base = self.caller_dir(Location::caller());
        self.require_from(&base, request, callback)
    }

    pub fn require_from(
        &self,
        base_dir: &Path,
        request: &str,
        callback: Callback,
    ) -> Result<PathBuf> {
        self.inner
            .subscribe(base_dir, request, HandlerKind::Evaluate, Handler::Rust(callback))
    }

    /// Deliver the resolved path of `request` now and on every filesystem
    /// event touching it. The file is never read for this subscriber.
    #[track_caller]
    pub fn watch_path(&self, request: &str, callback: Callback) -> Result<PathBuf> {
        let base = self.caller_dir(Location::caller());
        self.watch_path_from(&base, request, callback)
    }

    pub fn watch_path_from(
        &self,
        base_dir: &Path,
        request: &str,
        callback: Callback,
    ) -> Result<PathBuf> {
        self.inner
            .subscribe(base_dir, request, HandlerKind::ResolvePath, Handler::Rust(callback))
    }

    /// Watch a directory recursively. Idempotent; returns whether the
    /// directory was newly attached.
    #[track_caller]
    pub fn watch(&self, dir: &str) -> Result<bool> {
        let base = self.caller_dir(Location::caller());
        self.watch_from(&base, dir)
    }

    pub fn watch_from(&self, base_dir: &Path, dir: &str) -> Result<bool> {
        self.inner.watch_dir(&base_dir.join(dir))
    }

    /// Compute a value once per call site; later calls from the same site
    /// (including after reloads) return the cached value.
    #[track_caller]
    pub fn once<T: Clone + 'static>(&self, init: impl FnOnce() -> T) -> T {
        let site = Location::caller();
        let key = OnceKey {
            file: self.inner.locator.locate(site),
            line: site.line(),
            column: site.column(),
        };
        self.inner.once(key, init)
    }

    /// Drop every tracked file, callback, watch, cached `once` value and
    /// pending reload. Deliveries already in flight are discarded.
    pub fn clear(&self) {
        self.inner.state.borrow_mut().clear();
        crate::debug!("reload"; "registry cleared");
    }

    // =========================================================================
    // Change propagation
    // =========================================================================

    /// Queue `path` as changed. Returns `false` if nothing tracks it.
    ///
    /// Use this when changes come from somewhere other than the built-in
    /// watcher; call [`settle`](Self::settle) (or let `run` do it) to
    /// process.
    pub fn notify_changed(&self, path: &Path) -> bool {
        self.inner.mark_changed(path)
    }

    /// Route a raw watcher event. Returns how many tracked files it touched.
    pub fn handle_event(&self, event: &notify::Event) -> usize {
        self.inner.handle_event(event)
    }

    /// Process queued work until the queue is empty.
    pub async fn settle(&self) {
        self.inner.settle().await;
    }

    /// Event loop: process watcher events until `shutdown` resolves or the
    /// event channel closes.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        self.inner.run(shutdown).await;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn state(&self, path: &Path) -> Option<FileState> {
        self.inner.with_file(path, |f| f.state())
    }

    /// Current successful value of an evaluated file.
    pub fn value(&self, path: &Path) -> Option<Value> {
        self.inner.with_file(path, |f| f.evaluated().cloned()).flatten()
    }

    /// Newest good value, surviving later read or evaluation failures.
    pub fn last_good(&self, path: &Path) -> Option<Value> {
        self.inner.with_file(path, |f| f.last_good().cloned()).flatten()
    }

    pub fn last_error(&self, path: &Path) -> Option<crate::error::LiveError> {
        self.inner.with_file(path, |f| f.last_error().cloned()).flatten()
    }

    /// The persistent `module` table of a Lua file.
    pub fn module_state(&self, path: &Path) -> Option<mlua::Table> {
        self.inner.with_file(path, |f| f.module.clone()).flatten()
    }

    /// Number of callbacks registered on `path`.
    pub fn callback_count(&self, path: &Path) -> usize {
        self.inner.with_file(path, |f| f.callbacks.len()).unwrap_or(0)
    }

    pub fn tracked_count(&self) -> usize {
        self.inner.state.borrow().files.len()
    }

    /// Number of watched directories.
    pub fn watch_count(&self) -> usize {
        self.inner.state.borrow().watches.len()
    }

    /// Whether work is waiting for `settle`.
    pub fn has_pending(&self) -> bool {
        !self.inner.state.borrow().queue.is_empty()
    }

    fn caller_dir(&self, site: &Location<'_>) -> PathBuf {
        let file = self.inner.locator.locate(site);
        match file.parent() {
            Some(dir) => dir.to_path_buf(),
            None => file,
        }
    }
}
