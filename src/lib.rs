//! Live-code reload engine.
//!
//! Subscribe to files with [`Live::read`], [`Live::require`] or
//! [`Live::watch_path`]; the engine watches them, re-evaluates Lua code in
//! an isolated scope when its content actually changes, and re-invokes the
//! current callbacks. Callbacks registered by a script are retired when that
//! script reloads, so reloading never stacks duplicate handlers.
//!
//! ```no_run
//! use lucy_live::{Callback, Live, LiveConfig, SourceRoot};
//!
//! # async fn demo() -> lucy_live::Result<()> {
//! let live = Live::new(LiveConfig::default(), SourceRoot::new(env!("CARGO_MANIFEST_DIR")));
//! live.require("./scene.lua", Callback::simple(|scene| println!("{scene}")))?;
//! live.run(std::future::pending::<()>()).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod freshness;
pub mod live;
pub mod logger;
pub mod resolve;
pub mod sandbox;
pub mod watch;

pub use config::LiveConfig;
pub use error::{LiveError, Result};
pub use live::{
    Callback, CallerLocator, FileState, FixedLocation, HandlerKind, Live, OnceKey, SourceRoot,
};
pub use sandbox::Value;
