use super::*;
use std::path::PathBuf;

fn host(lua: &Lua) -> HostBindings {
    HostBindings {
        require: lua.create_function(|_, _: String| Ok(())).unwrap(),
        live: lua.create_table().unwrap(),
    }
}

fn globals() -> Vec<String> {
    crate::config::LiveConfig::default().sandbox.globals
}

fn run(lua: &Lua, module: &Table, code: &str) -> Result<Value> {
    let path = PathBuf::from("/scripts/test.lua");
    evaluate(lua, code, &path, module, host(lua), &globals())
}

fn text(value: &Value) -> String {
    value.to_string()
}

#[test]
fn test_returned_value_wins() {
    let lua = Lua::new();
    let module = module_table(&lua, Path::new("/scripts/test.lua")).unwrap();

    let value = run(&lua, &module, "module.exports = 'exports'\nreturn 'returned'").unwrap();
    assert_eq!(text(&value), "returned");
}

#[test]
fn test_exports_when_nothing_returned() {
    let lua = Lua::new();
    let module = module_table(&lua, Path::new("/scripts/test.lua")).unwrap();

    let value = run(&lua, &module, "module.exports = 'Value: ' .. 4").unwrap();
    assert_eq!(text(&value), "Value: 4");
}

#[test]
fn test_module_state_persists() {
    let lua = Lua::new();
    let module = module_table(&lua, Path::new("/scripts/test.lua")).unwrap();
    let code = "module.count = (module.count or 0) + 1\nreturn module.count";

    assert_eq!(text(&run(&lua, &module, code).unwrap()), "1");
    assert_eq!(text(&run(&lua, &module, code).unwrap()), "2");
    assert_eq!(module.raw_get::<String>("path").unwrap(), "/scripts/test.lua");
}

#[test]
fn test_globals_do_not_persist() {
    let lua = Lua::new();
    let module = module_table(&lua, Path::new("/scripts/test.lua")).unwrap();
    let code = "counter = (counter or 0) + 1\nreturn counter";

    assert_eq!(text(&run(&lua, &module, code).unwrap()), "1");
    assert_eq!(text(&run(&lua, &module, code).unwrap()), "1");
}

#[test]
fn test_host_capabilities_hidden() {
    let lua = Lua::new();
    let module = module_table(&lua, Path::new("/scripts/test.lua")).unwrap();

    let value = run(
        &lua,
        &module,
        "return tostring(os == nil and io == nil and load == nil and debug == nil)",
    )
    .unwrap();
    assert_eq!(text(&value), "true");
}

#[test]
fn test_allowlisted_tables_are_copies() {
    let lua = Lua::new();
    let module = module_table(&lua, Path::new("/scripts/test.lua")).unwrap();

    run(&lua, &module, "string.upper = nil").unwrap();
    let value = run(&lua, &module, "return string.upper('ok')").unwrap();
    assert_eq!(text(&value), "OK");
}

#[test]
fn test_runtime_error_caught() {
    let lua = Lua::new();
    let module = module_table(&lua, Path::new("/scripts/test.lua")).unwrap();

    let err = run(&lua, &module, "error('boom')").unwrap_err();
    match err {
        LiveError::Eval { path, message } => {
            assert_eq!(path, PathBuf::from("/scripts/test.lua"));
            assert!(message.contains("boom"));
        }
        other => panic!("expected Eval, got {other:?}"),
    }
}

#[test]
fn test_syntax_error_caught() {
    let lua = Lua::new();
    let module = module_table(&lua, Path::new("/scripts/test.lua")).unwrap();

    let err = run(&lua, &module, "module.exports = = 1").unwrap_err();
    assert!(matches!(err, LiveError::Eval { .. }));
}

#[test]
fn test_console_available() {
    let lua = Lua::new();
    let module = module_table(&lua, Path::new("/scripts/test.lua")).unwrap();

    let value = run(&lua, &module, "console.log('hello', 1)\nreturn type(console.warn)").unwrap();
    assert_eq!(text(&value), "function");
}
