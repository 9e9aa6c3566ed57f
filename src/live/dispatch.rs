//! Reload processing: queue → freshness check → fan-out.

use std::future::Future;
use std::path::Path;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use super::Inner;
use super::callback::{CallbackEntry, HandlerKind, report};
use super::queue::{Pending, Trigger};
use crate::freshness::{self, Detection};
use crate::sandbox::Value;
use crate::watch::ChangeKind;

/// What a processed step owes the content (`read`/`require`) subscribers.
enum Delivery {
    /// New content: every content entry hears about it.
    Changed,
    /// The read failed: every content entry gets the error.
    Failed,
    /// Unchanged content; only the listed entries, still waiting for their
    /// first value, get one.
    Awaiting(Vec<u64>),
    Nothing,
}

impl Delivery {
    fn includes(&self, entry: &CallbackEntry) -> bool {
        match self {
            Self::Changed | Self::Failed => true,
            Self::Awaiting(ids) => ids.contains(&entry.id),
            Self::Nothing => false,
        }
    }
}

impl Inner {
    pub(super) fn mark_changed(&self, path: &Path) -> bool {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let queued = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            if !state.files.contains_key(&path) {
                return false;
            }
            state.queue.push(&path, Trigger::Changed)
        };
        if queued {
            self.queued.notify_one();
        }
        true
    }

    pub(super) fn handle_event(&self, event: &notify::Event) -> usize {
        let routed = self.state.borrow().watches.route(event);
        let mut touched = 0;
        for (path, kind) in routed {
            if self.mark_changed(&path) {
                crate::debug!("watch"; "{}: {}", kind.label(), path.display());
                touched += 1;
            } else if kind == ChangeKind::Removed {
                crate::debug!("watch"; "ignored removal of untracked {}", path.display());
            }
        }
        touched
    }

    /// Drain the queue. Files re-evaluated because of an import change are
    /// processed at most once per call, which bounds import cycles.
    pub(super) async fn settle(self: &Rc<Self>) {
        let mut reevaluated = FxHashSet::default();
        loop {
            let next = self.state.borrow_mut().queue.pop();
            let Some((path, pending)) = next else { break };
            self.process(&path, pending, &mut reevaluated).await;
        }
    }

    async fn process(
        self: &Rc<Self>,
        path: &Path,
        pending: Pending,
        reevaluated: &mut FxHashSet<std::path::PathBuf>,
    ) {
        let generation = self.state.borrow().generation;

        let mut delivery = Delivery::Nothing;
        if pending.needs_read() {
            let Some((wants_content, last)) = self.with_file(path, |f| (f.wants_content(), f.hash))
            else {
                return;
            };
            if wants_content {
                let detection = freshness::check(path, last).await;
                if self.state.borrow().generation != generation {
                    crate::debug!("reload"; "dropped stale read of {}", path.display());
                    return;
                }
                delivery = self.apply(path, detection);
            }
        }

        // one pass in subscription order, newest first, whatever the kind
        let path_changed = pending.changed;
        self.fan_out(path, generation, |entry| match entry.kind {
            HandlerKind::ResolvePath => path_changed,
            HandlerKind::Read | HandlerKind::Evaluate => delivery.includes(entry),
        });
        if let Delivery::Changed = delivery {
            self.report_status(path);
        }

        if pending.reevaluate
            && !matches!(delivery, Delivery::Changed | Delivery::Failed)
            && reevaluated.insert(path.to_path_buf())
        {
            crate::debug!("reload"; "re-evaluating {} (import changed)", path.display());
            self.fan_out(path, generation, |entry| entry.kind == HandlerKind::Evaluate);
            self.invalidate_importers(path);
        }
    }

    /// Record a detection result and decide who hears about it.
    fn apply(&self, path: &Path, detection: Detection) -> Delivery {
        let name = display_name(path);
        match detection {
            Detection::Changed { content, hash } => {
                let version = {
                    let mut state = self.state.borrow_mut();
                    let Some(file) = state.files.get_mut(path) else {
                        return Delivery::Nothing;
                    };
                    file.apply_content(content, hash);
                    file.awaiting.clear();
                    file.version
                };
                crate::debug!("reload"; "{} changed (v{}, {})", path.display(), version, hash);
                self.invalidate_importers(path);
                Delivery::Changed
            }
            Detection::Unchanged => {
                let (recovered, awaiting) = {
                    let mut state = self.state.borrow_mut();
                    let Some(file) = state.files.get_mut(path) else {
                        return Delivery::Nothing;
                    };
                    (file.recover(), std::mem::take(&mut file.awaiting))
                };
                if recovered {
                    // same bytes as before the failure: nothing to re-deliver
                    crate::log!("reload"; "{} is readable again", name);
                    crate::logger::status_success(&format!("recovered: {name}"));
                } else {
                    crate::logger::status_unchanged(&format!("unchanged: {name}"));
                }
                Delivery::Awaiting(awaiting)
            }
            Detection::ReadError(err) => {
                let message = report(&err);
                {
                    let mut state = self.state.borrow_mut();
                    let Some(file) = state.files.get_mut(path) else {
                        return Delivery::Nothing;
                    };
                    file.set_read_error(err);
                    file.awaiting.clear();
                }
                crate::logger::status_error(&format!("cannot read {name}"), &message);
                crate::logger::status_detach();
                Delivery::Failed
            }
        }
    }

    /// Deliver to the entries of `path` selected by `wanted`, newest first.
    ///
    /// Works on a snapshot: entries added meanwhile wait for the next
    /// change, entries purged meanwhile (an earlier callback triggered a
    /// re-evaluation) are skipped.
    fn fan_out(
        self: &Rc<Self>,
        path: &Path,
        generation: u64,
        wanted: impl Fn(&CallbackEntry) -> bool,
    ) {
        let Some(entries) = self.with_file(path, |f| f.entries(&wanted)) else {
            return;
        };

        for entry in entries {
            {
                let state = self.state.borrow();
                if state.generation != generation {
                    return;
                }
                if !state.is_registered(path, entry.id) {
                    continue;
                }
            }
            let outcome = match entry.kind {
                HandlerKind::ResolvePath => Ok(Value::Path(path.to_path_buf())),
                HandlerKind::Read => match self.with_file(path, |f| f.text()).flatten() {
                    Some(outcome) => outcome,
                    None => continue,
                },
                HandlerKind::Evaluate => self.evaluate(path),
            };
            entry.handler.call(&self.lua, path, outcome);
        }
    }

    /// Forget memoized values of files importing `path` and queue them.
    fn invalidate_importers(&self, path: &Path) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        for importer in state.deps.used_by(path) {
            if let Some(file) = state.files.get_mut(&importer) {
                file.invalidate();
            }
            state.queue.push(&importer, Trigger::Reevaluate);
        }
    }

    fn report_status(&self, path: &Path) {
        let name = display_name(path);
        match self.with_file(path, |f| f.last_error().map(report)).flatten() {
            Some(message) => {
                crate::logger::status_error(&format!("failed: {name}"), &message);
                crate::logger::status_detach();
            }
            None => crate::logger::status_success(&format!("reloaded: {name}")),
        }
    }

    pub(super) async fn run(self: &Rc<Self>, shutdown: impl Future<Output = ()>) {
        let Some(mut events) = self.events_rx.borrow_mut().take() else {
            crate::log!("error"; "event loop is already running");
            return;
        };
        tokio::pin!(shutdown);

        self.settle().await;
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    self.handle_event(&event);
                    while let Ok(event) = events.try_recv() {
                        self.handle_event(&event);
                    }
                    self.settle().await;
                }
                () = self.queued.notified() => self.settle().await,
            }
        }

        *self.events_rx.borrow_mut() = Some(events);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
