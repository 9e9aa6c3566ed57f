//! Bindings handed to evaluated Lua code.
//!
//! ```lua
//! local lib = require("./lib")              -- static import (tracked)
//! live.read("./shader.frag", function(src) ... end)
//! live.require("./palette", live.fallible(function(err, colors) ... end))
//! live.path("./texture.png", function(path) ... end)
//! live.watch("./assets")
//! local canvas = live.once(function() return make_canvas() end)
//! ```
//!
//! Closures hold a `Weak` reference to the engine: the engine owns the Lua
//! VM, and the VM must not keep the engine alive.

use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use mlua::{AnyUserData, Function, Lua, UserData};

use super::Inner;
use super::callback::{Handler, HandlerKind};
use super::once::{OnceKey, OnceSites};
use crate::sandbox::{HostBindings, Value};

/// A Lua function wrapped by `live.fallible`: called as `f(err, value)`.
struct FallibleFn(Function);

impl UserData for FallibleFn {}

pub(super) fn bindings(inner: &Rc<Inner>, script: &Path) -> mlua::Result<HostBindings> {
    let lua = &inner.lua;
    let base_dir = script.parent().unwrap_or(script).to_path_buf();
    let api = Api {
        engine: Rc::downgrade(inner),
        script: script.to_path_buf(),
        base_dir,
        sites: Rc::default(),
    };

    let require = api.import_fn(lua)?;

    let live = lua.create_table()?;
    live.raw_set("require", api.subscribe_fn(lua, HandlerKind::Evaluate)?)?;
    live.raw_set("read", api.subscribe_fn(lua, HandlerKind::Read)?)?;
    live.raw_set("path", api.subscribe_fn(lua, HandlerKind::ResolvePath)?)?;
    live.raw_set("watch", api.watch_fn(lua)?)?;
    live.raw_set("once", api.once_fn(lua)?)?;
    live.raw_set(
        "fallible",
        lua.create_function(|lua, func: Function| lua.create_userdata(FallibleFn(func)))?,
    )?;

    Ok(HostBindings { require, live })
}

#[derive(Clone)]
struct Api {
    engine: Weak<Inner>,
    script: PathBuf,
    base_dir: PathBuf,
    /// Fresh per evaluation; callbacks get their own scope when invoked.
    sites: Rc<OnceSites>,
}

impl Api {
    fn engine(&self) -> mlua::Result<Rc<Inner>> {
        self.engine
            .upgrade()
            .ok_or_else(|| mlua::Error::runtime("live engine is gone"))
    }

    /// `require(request)`: evaluate now, re-evaluate this script on change.
    fn import_fn(&self, lua: &Lua) -> mlua::Result<Function> {
        let api = self.clone();
        lua.create_function(move |_, request: String| -> mlua::Result<Value> {
            api.engine()?
                .import(&api.script, &request)
                .map_err(mlua::Error::external)
        })
    }

    /// `live.read` / `live.require` / `live.path`: returns the resolved path.
    fn subscribe_fn(&self, lua: &Lua, kind: HandlerKind) -> mlua::Result<Function> {
        let api = self.clone();
        lua.create_function(move |_, (request, callback): (String, mlua::Value)| {
            let handler = script_handler(callback, &api.sites)?;
            let path = api
                .engine()?
                .subscribe(&api.base_dir, &request, kind, handler)
                .map_err(mlua::Error::external)?;
            Ok(path.to_string_lossy().into_owned())
        })
    }

    fn watch_fn(&self, lua: &Lua) -> mlua::Result<Function> {
        let api = self.clone();
        lua.create_function(move |_, dir: String| {
            api.engine()?
                .watch_dir(&api.base_dir.join(dir))
                .map_err(mlua::Error::external)
        })
    }

    /// `live.once(init)`: keyed by this script, the calling line and the
    /// call's order on that line.
    fn once_fn(&self, lua: &Lua) -> mlua::Result<Function> {
        let api = self.clone();
        lua.create_function(move |lua, init: Function| {
            let line = lua
                .inspect_stack(1)
                .map(|frame| frame.curr_line())
                .unwrap_or(0);
            let line = u32::try_from(line).unwrap_or(0);
            let key = OnceKey {
                file: api.script.clone(),
                line,
                column: api.sites.next(line),
            };
            let engine = api.engine()?;
            if let Some(value) = engine.state.borrow().once.get::<mlua::Value>(&key) {
                return Ok(value);
            }
            let value: mlua::Value = init.call(())?;
            engine.state.borrow_mut().once.insert(key, value.clone());
            Ok(value)
        })
    }
}

fn script_handler(callback: mlua::Value, sites: &Rc<OnceSites>) -> mlua::Result<Handler> {
    match callback {
        mlua::Value::Function(func) => Ok(Handler::Script {
            func,
            fallible: false,
            sites: Rc::clone(sites),
        }),
        mlua::Value::UserData(data) => fallible_handler(&data, sites),
        other => Err(mlua::Error::runtime(format!(
            "expected a callback function, got {}",
            other.type_name()
        ))),
    }
}

fn fallible_handler(data: &AnyUserData, sites: &Rc<OnceSites>) -> mlua::Result<Handler> {
    let wrapped = data.borrow::<FallibleFn>()?;
    Ok(Handler::Script {
        func: wrapped.0.clone(),
        fallible: true,
        sites: Rc::clone(sites),
    })
}
