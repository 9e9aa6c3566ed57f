//! `console` table for evaluated code.

use std::path::Path;

use mlua::{Lua, Table, Variadic};

use super::describe;

/// Build `console` for the script at `path`.
///
/// Each line is prefixed with the script's file name so interleaved output
/// from several scripts stays readable.
pub(super) fn table(lua: &Lua, path: &Path) -> mlua::Result<Table> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let console = lua.create_table()?;
    for (method, module) in [
        ("log", "script"),
        ("info", "script"),
        ("warn", "warn"),
        ("error", "error"),
    ] {
        let name = name.clone();
        let print = lua.create_function(move |_, args: Variadic<mlua::Value>| {
            crate::logger::status_detach();
            crate::logger::log(module, &format!("{name}: {}", join(&args)));
            Ok(())
        })?;
        console.raw_set(method, print)?;
    }
    Ok(console)
}

fn join(args: &[mlua::Value]) -> String {
    args.iter().map(describe).collect::<Vec<_>>().join("\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_args() {
        let lua = Lua::new();
        let s = mlua::Value::String(lua.create_string("a").unwrap());
        assert_eq!(join(&[s, mlua::Value::Integer(2), mlua::Value::Nil]), "a\t2\tnil");
    }
}
