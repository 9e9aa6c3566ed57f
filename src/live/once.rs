//! Call-site keyed memoization (`once`).
//!
//! A value created through `once` survives reloads of the file that asked
//! for it: the key is the call site (file, line, column), not the
//! evaluation. Only `Live::clear` drops these values.

use std::any::Any;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OnceKey {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

#[derive(Default)]
pub(crate) struct OnceCache {
    values: FxHashMap<OnceKey, Rc<dyn Any>>,
}

impl OnceCache {
    /// Cached value for `key`, if one of type `T` exists.
    pub fn get<T: Clone + 'static>(&self, key: &OnceKey) -> Option<T> {
        self.values.get(key)?.downcast_ref::<T>().cloned()
    }

    pub fn insert<T: 'static>(&mut self, key: OnceKey, value: T) {
        self.values.insert(key, Rc::new(value));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Per-line call counters for `live.once` within one run of Lua code.
///
/// Lua only reports the calling line, so calls sharing a line are told
/// apart by their order on that line. The order is stable across reloads
/// as long as the line is.
#[derive(Default)]
pub(crate) struct OnceSites {
    calls: RefCell<FxHashMap<u32, u32>>,
}

impl OnceSites {
    /// Ordinal of the next call on `line`.
    pub fn next(&self, line: u32) -> u32 {
        let mut calls = self.calls.borrow_mut();
        let count = calls.entry(line).or_insert(0);
        let ordinal = *count;
        *count += 1;
        ordinal
    }

    /// Run `f` with fresh counters, restoring the outer ones afterwards.
    pub fn scoped<R>(&self, f: impl FnOnce() -> R) -> R {
        let outer = self.calls.take();
        let result = f();
        *self.calls.borrow_mut() = outer;
        result
    }
}
