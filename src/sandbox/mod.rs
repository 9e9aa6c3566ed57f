//! Lua evaluation scope.
//!
//! Every evaluation runs its chunk against a fresh environment table:
//!
//! | Name       | Source                                          |
//! |------------|-------------------------------------------------|
//! | `require`  | host binding (static import, see `live`)        |
//! | `live`     | host binding (`read`, `require`, `path`, ...)   |
//! | `console`  | `log` / `info` / `warn` / `error` → logger      |
//! | `module`   | the file's persistent module table              |
//! | allowlist  | configured globals, tables shallow-copied       |
//!
//! Nothing else from the host VM is reachable: `os`, `io`, `load`,
//! `debug` and friends are simply absent from the environment. Globals a
//! chunk assigns land in its own environment and vanish with it, so the
//! only state that survives a reload is what the chunk stores on `module`.

mod console;
mod value;

pub use value::Value;
pub(crate) use value::describe;

use std::path::Path;

use mlua::{Function, Lua, Table};

use crate::error::{LiveError, Result};

/// Host-provided bindings injected into the scope.
pub struct HostBindings {
    pub require: Function,
    pub live: Table,
}

/// Create a fresh module table for `path`.
///
/// The table outlives individual evaluations; `module.path` is set once.
pub fn module_table(lua: &Lua, path: &Path) -> Result<Table> {
    let create = || -> mlua::Result<Table> {
        let module = lua.create_table()?;
        module.raw_set("path", path.to_string_lossy().into_owned())?;
        Ok(module)
    };
    create().map_err(|e| LiveError::eval(path, e))
}

/// Evaluate `code` as the content of `path`.
///
/// The value is what the chunk returns, or `module.exports` when it returns
/// nothing. Any Lua error (syntax or runtime) becomes `LiveError::Eval`.
pub fn evaluate(
    lua: &Lua,
    code: &str,
    path: &Path,
    module: &Table,
    host: HostBindings,
    globals: &[String],
) -> Result<Value> {
    let run = || -> mlua::Result<Value> {
        let env = scope(lua, path, module, host, globals)?;
        let returned: mlua::Value = lua
            .load(code)
            .set_name(format!("@{}", path.display()))
            .set_environment(env)
            .eval()?;
        if !returned.is_nil() {
            return Ok(Value::Script(returned));
        }
        Ok(Value::Script(module.raw_get("exports")?))
    };
    run().map_err(|e| LiveError::eval(path, e))
}

fn scope(
    lua: &Lua,
    path: &Path,
    module: &Table,
    host: HostBindings,
    globals: &[String],
) -> mlua::Result<Table> {
    let env = lua.create_table()?;
    let host_globals = lua.globals();
    for name in globals {
        let value = match host_globals.raw_get::<mlua::Value>(name.as_str())? {
            mlua::Value::Table(table) => mlua::Value::Table(shallow_copy(lua, &table)?),
            other => other,
        };
        env.raw_set(name.as_str(), value)?;
    }

    env.raw_set("console", console::table(lua, path)?)?;
    env.raw_set("module", module.clone())?;
    env.raw_set("require", host.require)?;
    env.raw_set("live", host.live)?;
    Ok(env)
}

/// Copy so that `string.upper = nil` in one script doesn't leak into others.
fn shallow_copy(lua: &Lua, table: &Table) -> mlua::Result<Table> {
    let copy = lua.create_table()?;
    for pair in table.pairs::<mlua::Value, mlua::Value>() {
        let (key, value) = pair?;
        copy.raw_set(key, value)?;
    }
    Ok(copy)
}

#[cfg(test)]
mod tests;
