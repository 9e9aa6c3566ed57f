use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use mlua::{IntoLua, Lua};

/// A value delivered to subscribers.
///
/// What a subscriber receives depends on how it subscribed: `read` gets
/// `Text`, `watch_path` gets `Path`, `require` gets whatever the file's
/// strategy produces (`Script` for Lua, `Text` for pass-through formats).
#[derive(Debug, Clone)]
pub enum Value {
    Text(Rc<str>),
    Path(PathBuf),
    Script(mlua::Value),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Script(value) => f.write_str(&describe(value)),
        }
    }
}

impl IntoLua for Value {
    fn into_lua(self, lua: &Lua) -> mlua::Result<mlua::Value> {
        match self {
            Self::Text(text) => lua.create_string(text.as_bytes()).map(mlua::Value::String),
            Self::Path(path) => path.to_string_lossy().into_owned().into_lua(lua),
            Self::Script(value) => Ok(value),
        }
    }
}

/// Human-readable rendering of a Lua value (no metamethods involved).
pub(crate) fn describe(value: &mlua::Value) -> String {
    match value {
        mlua::Value::Nil => "nil".to_string(),
        mlua::Value::Boolean(b) => b.to_string(),
        mlua::Value::Integer(i) => i.to_string(),
        mlua::Value::Number(n) => n.to_string(),
        mlua::Value::String(s) => s.to_string_lossy().to_string(),
        other => other.type_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let lua = Lua::new();
        assert_eq!(Value::Text(Rc::from("hi")).to_string(), "hi");
        assert_eq!(Value::Path(PathBuf::from("/a/b.txt")).to_string(), "/a/b.txt");
        let s = lua.create_string("Value: 3").unwrap();
        assert_eq!(Value::Script(mlua::Value::String(s)).to_string(), "Value: 3");
        assert_eq!(Value::Script(mlua::Value::Integer(7)).to_string(), "7");
        let t = lua.create_table().unwrap();
        assert_eq!(Value::Script(mlua::Value::Table(t)).to_string(), "table");
    }

    #[test]
    fn test_into_lua() {
        let lua = Lua::new();
        let value = Value::Text(Rc::from("shader")).into_lua(&lua).unwrap();
        assert_eq!(describe(&value), "shader");
        let value = Value::Path(PathBuf::from("/x.frag")).into_lua(&lua).unwrap();
        assert_eq!(describe(&value), "/x.frag");
    }
}
