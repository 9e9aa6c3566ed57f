//! Subscription, evaluation and static imports.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::Inner;
use super::callback::{CallbackEntry, Handler, HandlerKind};
use super::once::OnceKey;
use super::origin::OriginGuard;
use super::queue::Trigger;
use super::script_api;
use super::tracked::TrackedFile;
use crate::config::Strategy;
use crate::error::{LiveError, Result};
use crate::freshness::{self, Detection};
use crate::resolve::{request_extension, resolve};
use crate::sandbox::{self, Value};

/// What a new subscriber gets right away.
enum Immediate {
    Deliver(Result<Value>),
    Evaluate,
    /// Content not read yet; delivery happens when the queue settles.
    Deferred,
}

impl Inner {
    pub(super) fn with_file<R>(&self, path: &Path, f: impl FnOnce(&TrackedFile) -> R) -> Option<R> {
        self.state.borrow().files.get(path).map(f)
    }

    /// Resolve `request` and check that a handler exists for it.
    ///
    /// An explicit but unknown extension is rejected before any filesystem
    /// access.
    fn resolve_evaluable(&self, base_dir: &Path, request: &str) -> Result<(PathBuf, Strategy)> {
        if let Some(ext) = request_extension(request)
            && self.handlers.get(ext).is_none()
        {
            return Err(LiveError::UnsupportedType(PathBuf::from(request)));
        }
        let path = self.resolve(base_dir, request)?;
        let strategy = self
            .handlers
            .for_path(&path)
            .ok_or_else(|| LiveError::UnsupportedType(path.clone()))?;
        Ok((path, strategy))
    }

    fn resolve(&self, base_dir: &Path, request: &str) -> Result<PathBuf> {
        let extensions: Vec<&str> = self.handlers.extensions().collect();
        resolve(request, base_dir, &extensions)
    }

    pub(super) fn subscribe(
        self: &Rc<Self>,
        base_dir: &Path,
        request: &str,
        kind: HandlerKind,
        handler: Handler,
    ) -> Result<PathBuf> {
        let (path, strategy) = match kind {
            HandlerKind::Evaluate => {
                let (path, strategy) = self.resolve_evaluable(base_dir, request)?;
                (path, Some(strategy))
            }
            _ => {
                let path = self.resolve(base_dir, request)?;
                let strategy = self.handlers.for_path(&path);
                (path, strategy)
            }
        };

        let handler = Rc::new(handler);
        let (id, is_new, immediate) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let id = state.next_id();
            let origin = state.origins.current().cloned();
            if let Some(origin) = &origin {
                state.origins.record(origin);
            }

            let is_new = !state.files.contains_key(&path);
            let file = state
                .files
                .entry(path.clone())
                .or_insert_with(|| TrackedFile::new(strategy));
            file.callbacks.push(CallbackEntry {
                id,
                origin,
                kind,
                handler: Rc::clone(&handler),
            });

            let immediate = match kind {
                HandlerKind::ResolvePath => Immediate::Deliver(Ok(Value::Path(path.clone()))),
                HandlerKind::Read => match file.text() {
                    Some(outcome) => Immediate::Deliver(outcome),
                    None => Immediate::Deferred,
                },
                HandlerKind::Evaluate => match file.memoized() {
                    Some(outcome) => Immediate::Deliver(outcome),
                    None if file.content.is_some() => Immediate::Evaluate,
                    None => Immediate::Deferred,
                },
            };
            if matches!(immediate, Immediate::Deferred) {
                file.awaiting.push(id);
                state.queue.push(&path, Trigger::Load);
            }
            (id, is_new, immediate)
        };

        crate::debug!("reload"; "subscribed {:?} to {}", kind, path.display());
        if is_new {
            self.auto_watch(&path);
        }

        let outcome = match immediate {
            Immediate::Deliver(outcome) => outcome,
            Immediate::Evaluate => self.evaluate(&path),
            Immediate::Deferred => {
                self.queued.notify_one();
                return Ok(path);
            }
        };
        if self.state.borrow().is_registered(&path, id) {
            handler.call(&self.lua, &path, outcome);
        }
        Ok(path)
    }

    fn auto_watch(&self, path: &Path) {
        if !self.config.watch.auto {
            return;
        }
        let Some(dir) = path.parent() else { return };
        if let Err(e) = self.state.borrow_mut().watches.watch(dir) {
            crate::log!("watch"; "{}", e);
        }
    }

    pub(super) fn watch_dir(&self, dir: &Path) -> Result<bool> {
        self.state.borrow_mut().watches.watch(dir)
    }

    pub(super) fn once<T: Clone + 'static>(&self, key: OnceKey, init: impl FnOnce() -> T) -> T {
        if let Some(value) = self.state.borrow().once.get::<T>(&key) {
            return value;
        }
        let value = init();
        self.state.borrow_mut().once.insert(key, value.clone());
        value
    }

    /// Evaluated value of `path`, running the code at most once per version.
    pub(super) fn evaluate(self: &Rc<Self>, path: &Path) -> Result<Value> {
        let (content, strategy, version) = {
            let state = self.state.borrow();
            let file = state
                .files
                .get(path)
                .ok_or_else(|| LiveError::eval(path, "file is no longer tracked"))?;
            if let Some(outcome) = file.memoized() {
                return outcome;
            }
            if state.origins.is_evaluating(path) {
                return Err(LiveError::Cycle(path.to_path_buf()));
            }
            let content = file
                .content
                .clone()
                .ok_or_else(|| LiveError::eval(path, "content not loaded"))?;
            let strategy = file
                .strategy
                .ok_or_else(|| LiveError::UnsupportedType(path.to_path_buf()))?;
            (content, strategy, file.version)
        };

        let result = match strategy {
            Strategy::Text => Ok(Value::Text(content)),
            Strategy::Script => self.run_script(path, &content),
        };

        if let Some(file) = self.state.borrow_mut().files.get_mut(path) {
            file.record_evaluation(version, result.clone());
        }
        match &result {
            Ok(_) => crate::debug!("reload"; "evaluated {} (v{})", path.display(), version),
            Err(err) => {
                crate::logger::status_detach();
                crate::log!("error"; "{}", err);
            }
        }
        result
    }

    fn run_script(self: &Rc<Self>, path: &Path, code: &str) -> Result<Value> {
        let module = {
            let mut state = self.state.borrow_mut();
            let removed = state.purge_origin(path);
            if removed > 0 {
                crate::debug!("reload"; "retired {} callback(s) of {}", removed, path.display());
            }
            state.deps.forget(path);

            let file = state
                .files
                .get_mut(path)
                .ok_or_else(|| LiveError::eval(path, "file is no longer tracked"))?;
            match &file.module {
                Some(module) => module.clone(),
                None => {
                    let module = sandbox::module_table(&self.lua, path)?;
                    file.module = Some(module.clone());
                    module
                }
            }
        };

        let host = script_api::bindings(self, path).map_err(|e| LiveError::eval(path, e))?;
        let _origin = OriginGuard::enter(&self.state, path);
        sandbox::evaluate(
            &self.lua,
            code,
            path,
            &module,
            host,
            &self.config.sandbox.globals,
        )
    }

    /// Static import from evaluated code: load synchronously if needed,
    /// record the edge, return the evaluated value.
    pub(super) fn import(self: &Rc<Self>, importer: &Path, request: &str) -> Result<Value> {
        let base_dir = importer.parent().unwrap_or(importer);
        let (path, strategy) = self.resolve_evaluable(base_dir, request)?;

        let is_new = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            state.deps.add(importer, &path);

            let is_new = !state.files.contains_key(&path);
            let file = state
                .files
                .entry(path.clone())
                .or_insert_with(|| TrackedFile::new(Some(strategy)));
            if file.content.is_none() {
                match freshness::check_blocking(&path, None) {
                    Detection::Changed { content, hash } => file.apply_content(content, hash),
                    Detection::Unchanged => {}
                    Detection::ReadError(err) => file.set_read_error(err),
                }
            }
            is_new
        };

        if is_new {
            self.auto_watch(&path);
        }
        self.evaluate(&path)
    }
}
