//! End-to-end reload scenarios against checked-in fixtures and temp dirs.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use lucy_live::{Callback, FixedLocation, Live, LiveConfig, SourceRoot, Value};
use tempfile::TempDir;

type Seen = Rc<RefCell<Vec<String>>>;

fn recorder() -> (Seen, Callback) {
    let seen = Seen::default();
    let sink = Rc::clone(&seen);
    (seen, Callback::simple(move |v: Value| sink.borrow_mut().push(v.to_string())))
}

/// Fixture engine: requests resolve relative to this test file.
fn fixture_engine() -> Live {
    let mut config = LiveConfig::default();
    config.watch.auto = false;
    Live::new(config, SourceRoot::new(env!("CARGO_MANIFEST_DIR")))
}

fn is_digit_value(text: &str) -> bool {
    text.strip_prefix("Value: ")
        .is_some_and(|rest| rest.len() == 1 && rest.chars().all(|c| c.is_ascii_digit()))
}

#[tokio::test]
async fn require_fixture_delivers_cached_value() {
    let live = fixture_engine();
    let (first, callback) = recorder();
    let path = live.require("./fixtures/foo.lua", callback).unwrap();
    live.settle().await;

    let value = first.borrow()[0].clone();
    assert!(is_digit_value(&value), "unexpected value {value:?}");

    let (second, callback) = recorder();
    live.require("./fixtures/foo.lua", callback).unwrap();

    assert_eq!(*second.borrow(), [value]);
    let module = live.module_state(&path).unwrap();
    assert_eq!(module.get::<i64>("evaluations").unwrap(), 1);
}

#[tokio::test]
async fn watch_path_fixture_is_content_independent() {
    let live = fixture_engine();
    let (seen, callback) = recorder();
    let path = live.watch_path("./fixtures/foo.txt", callback).unwrap();

    let expected = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/foo.txt")
        .canonicalize()
        .unwrap();
    assert_eq!(path, expected);
    assert_eq!(*seen.borrow(), [expected.display().to_string()]);

    // rewrite the same bytes; the path is delivered again, unchanged
    let content = fs::read_to_string(&path).unwrap();
    fs::write(&path, content).unwrap();
    assert!(live.notify_changed(&path));
    live.settle().await;

    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(seen.borrow()[0], seen.borrow()[1]);
}

#[tokio::test]
async fn read_fixture_text() {
    let live = fixture_engine();
    let (seen, callback) = recorder();
    live.read("./fixtures/foo.txt", callback).unwrap();
    live.settle().await;

    assert_eq!(*seen.borrow(), ["Hello Lucy !\n"]);
}

#[tokio::test]
async fn three_writes_three_deliveries() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let path = root.join("value.lua");
    fs::write(&path, "return 'start'").unwrap();

    let mut config = LiveConfig::default();
    config.watch.auto = false;
    let live = Live::new(config, FixedLocation::in_dir(&root));
    let (seen, callback) = recorder();
    live.require("./value.lua", callback).unwrap();
    live.settle().await;
    seen.borrow_mut().clear();

    for value in ["A", "B", "C"] {
        fs::write(&path, format!("return '{value}'")).unwrap();
        live.notify_changed(&path);
        live.settle().await;
    }

    assert_eq!(*seen.borrow(), ["A", "B", "C"]);
}

#[test]
fn once_returns_first_value() {
    let live = fixture_engine();
    let counter = Cell::new(0u32);
    let volatile = || {
        counter.set(counter.get() + 1);
        format!("texture-{}", counter.get())
    };

    let values: Vec<String> = (0..2).map(|_| live.once(volatile)).collect();

    assert_eq!(values, ["texture-1", "texture-1"]);
}

#[tokio::test]
async fn os_events_drive_reloads() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let path = root.join("scene.lua");
    fs::write(&path, "return 'one'").unwrap();

    let live = Live::new(LiveConfig::default(), FixedLocation::in_dir(&root));
    let (seen, callback) = recorder();
    live.require("./scene.lua", callback).unwrap();
    if live.watch_count() == 0 {
        // no OS watcher in this environment
        return;
    }

    let observed = Rc::clone(&seen);
    let editor = async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(&path, "return 'two'").unwrap();
        for _ in 0..100 {
            if observed.borrow().last().is_some_and(|v| v == "two") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    };
    live.run(editor).await;

    let seen = seen.borrow();
    assert_eq!(seen.first().map(String::as_str), Some("one"));
    assert_eq!(seen.last().map(String::as_str), Some("two"));
}
