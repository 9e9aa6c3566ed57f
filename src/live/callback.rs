//! Subscriber callbacks.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::once::OnceSites;
use crate::error::LiveError;
use crate::sandbox::Value;

/// A Rust subscriber.
///
/// `Simple` callbacks only ever see values; failures are logged on their
/// behalf. `Fallible` callbacks receive every outcome.
#[derive(Clone)]
pub enum Callback {
    Simple(Rc<dyn Fn(Value)>),
    Fallible(Rc<dyn Fn(Result<Value, LiveError>)>),
}

impl Callback {
    pub fn simple(f: impl Fn(Value) + 'static) -> Self {
        Self::Simple(Rc::new(f))
    }

    pub fn fallible(f: impl Fn(Result<Value, LiveError>) + 'static) -> Self {
        Self::Fallible(Rc::new(f))
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(_) => f.write_str("Callback::Simple"),
            Self::Fallible(_) => f.write_str("Callback::Fallible"),
        }
    }
}

/// What a subscription asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Raw text (`read`).
    Read,
    /// The resolved path, on every change (`watch_path`).
    ResolvePath,
    /// The evaluated value (`require`).
    Evaluate,
}

/// A registered handler, either host code or a Lua function.
pub(crate) enum Handler {
    Rust(Callback),
    Script {
        func: mlua::Function,
        fallible: bool,
        /// `live.once` counters of the script that registered `func`.
        sites: Rc<OnceSites>,
    },
}

/// One registration on a tracked file.
#[derive(Clone)]
pub(crate) struct CallbackEntry {
    pub id: u64,
    /// File whose evaluation registered this entry; `None` for host code.
    pub origin: Option<PathBuf>,
    pub kind: HandlerKind,
    pub handler: Rc<Handler>,
}

impl Handler {
    /// Invoke with `outcome`. Errors raised by Lua handlers are logged.
    pub fn call(&self, lua: &mlua::Lua, path: &Path, outcome: Result<Value, LiveError>) {
        let result = match (self, outcome) {
            (Self::Rust(Callback::Simple(f)), Ok(value)) => {
                f(value);
                Ok(())
            }
            (Self::Rust(Callback::Fallible(f)), outcome) => {
                f(outcome);
                Ok(())
            }
            (
                Self::Script {
                    func,
                    fallible,
                    sites,
                },
                Ok(value),
            ) => {
                let value = mlua::IntoLua::into_lua(value, lua);
                value.and_then(|value| {
                    sites.scoped(|| {
                        if *fallible {
                            func.call::<()>((mlua::Value::Nil, value))
                        } else {
                            func.call::<()>(value)
                        }
                    })
                })
            }
            (
                Self::Script {
                    func,
                    fallible: true,
                    sites,
                },
                Err(err),
            ) => sites.scoped(|| func.call::<()>((report(&err), mlua::Value::Nil))),
            (Self::Rust(Callback::Simple(_)) | Self::Script { .. }, Err(err)) => {
                crate::logger::status_detach();
                crate::log!("error"; "{}", report(&err));
                Ok(())
            }
        };

        if let Err(e) = result {
            crate::logger::status_detach();
            crate::log!("error"; "callback for {} failed: {}", path.display(), e);
        }
    }
}

/// Error text including its source chain.
pub(crate) fn report(err: &LiveError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_simple_skips_errors() {
        let lua = mlua::Lua::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let handler = Handler::Rust(Callback::simple(move |v| sink.borrow_mut().push(v.to_string())));

        handler.call(&lua, Path::new("/a.txt"), Ok(Value::Text(Rc::from("one"))));
        handler.call(&lua, Path::new("/a.txt"), Err(LiveError::eval("/a.txt", "bad")));

        assert_eq!(*seen.borrow(), ["one"]);
    }

    #[test]
    fn test_fallible_sees_errors() {
        let lua = mlua::Lua::new();
        let errors = Rc::new(RefCell::new(0));
        let sink = errors.clone();
        let handler = Handler::Rust(Callback::fallible(move |r| {
            if r.is_err() {
                *sink.borrow_mut() += 1;
            }
        }));

        handler.call(&lua, Path::new("/a.txt"), Err(LiveError::eval("/a.txt", "bad")));
        assert_eq!(*errors.borrow(), 1);
    }

    #[test]
    fn test_script_fallible_argument_order() {
        let lua = mlua::Lua::new();
        let func: mlua::Function = lua
            .load("return function(err, value) last = tostring(err) .. '|' .. tostring(value) end")
            .eval()
            .unwrap();
        let handler = Handler::Script {
            func,
            fallible: true,
            sites: Rc::default(),
        };

        handler.call(&lua, Path::new("/a.txt"), Ok(Value::Text(Rc::from("ok"))));
        assert_eq!(lua.globals().get::<String>("last").unwrap(), "nil|ok");

        handler.call(&lua, Path::new("/a.txt"), Err(LiveError::eval("/a.txt", "bad")));
        let last = lua.globals().get::<String>("last").unwrap();
        assert!(last.ends_with("|nil") && last.contains("bad"));
    }

    #[test]
    fn test_report_includes_source() {
        let err = LiveError::read(
            "/a.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(report(&err).ends_with(": gone"));
    }
}
