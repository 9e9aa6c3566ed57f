//! `lucy-live run`: evaluate a script and keep it live.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use lucy_live::logger::{status_detach, status_error, status_success};
use lucy_live::{Callback, LiveConfig, log};
use tokio::sync::Notify;

use super::{as_request, engine};

pub async fn run_script(config: LiveConfig, script: &Path, watch: &[PathBuf]) -> Result<()> {
    let shutdown = shutdown_signal()?;
    let (live, cwd) = engine(config)?;

    let name = script.display().to_string();
    let path = live
        .require_from(
            &cwd,
            &as_request(script),
            Callback::fallible(move |outcome| match outcome {
                Ok(value) => {
                    status_detach();
                    println!("{value}");
                    status_success(&format!("evaluated {name}"));
                }
                Err(e) => status_error(&format!("{name} failed"), &e.to_string()),
            }),
        )
        .with_context(|| format!("cannot load `{}`", script.display()))?;

    for dir in watch {
        live.watch_from(&cwd, &dir.to_string_lossy())
            .with_context(|| format!("cannot watch `{}`", dir.display()))?;
    }

    log!("reload"; "running {} (Ctrl+C to stop)", path.display());
    live.run(async move { shutdown.notified().await }).await;
    status_detach();
    log!("reload"; "stopped");
    Ok(())
}

/// Ctrl+C resolves the returned notifier.
fn shutdown_signal() -> Result<Arc<Notify>> {
    let notify = Arc::new(Notify::new());
    let handler = Arc::clone(&notify);
    ctrlc::set_handler(move || handler.notify_one())
        .map_err(|e| anyhow!("failed to set Ctrl+C handler: {}", e))?;
    Ok(notify)
}
