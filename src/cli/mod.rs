//! Command-line interface module.

mod args;
pub mod check;
pub mod run;

pub use args::{Cli, Commands};

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use lucy_live::{FixedLocation, Live, LiveConfig};

/// Engine rooted at the current directory.
pub fn engine(config: LiveConfig) -> Result<(Live, PathBuf)> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let live = Live::new(config, FixedLocation::in_dir(&cwd));
    Ok((live, cwd))
}

/// Turn a command-line path into a request the resolver accepts.
///
/// `scene.lua` → `./scene.lua`; already anchored paths pass through.
pub fn as_request(script: &Path) -> String {
    match script.components().next() {
        Some(Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)) => {
            script.display().to_string()
        }
        _ => format!("./{}", script.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_request() {
        assert_eq!(as_request(Path::new("scene.lua")), "./scene.lua");
        assert_eq!(as_request(Path::new("lib/a.lua")), "./lib/a.lua");
        assert_eq!(as_request(Path::new("./scene.lua")), "./scene.lua");
        assert_eq!(as_request(Path::new("../up.lua")), "../up.lua");
        assert_eq!(as_request(Path::new("/abs/x.lua")), "/abs/x.lua");
    }
}
