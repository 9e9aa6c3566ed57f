//! `lucy-live check`: evaluate a script once.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use lucy_live::{Callback, LiveConfig, LiveError, Value};

use super::{as_request, engine};

pub async fn check_script(config: LiveConfig, script: &Path) -> Result<()> {
    let mut config = config;
    config.watch.auto = false;
    let (live, cwd) = engine(config)?;

    let outcome: Rc<RefCell<Option<Result<Value, LiveError>>>> = Rc::default();
    let slot = Rc::clone(&outcome);
    live.require_from(
        &cwd,
        &as_request(script),
        Callback::fallible(move |result| *slot.borrow_mut() = Some(result)),
    )
    .with_context(|| format!("cannot load `{}`", script.display()))?;
    live.settle().await;

    let outcome = outcome.borrow_mut().take();
    match outcome {
        Some(Ok(value)) => {
            println!("{value}");
            Ok(())
        }
        Some(Err(e)) => bail!(e),
        None => bail!("`{}` produced no value", script.display()),
    }
}
