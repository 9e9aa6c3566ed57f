//! Engine configuration from `live.toml`.
//!
//! # Sections
//!
//! | Section         | Purpose                                           |
//! |-----------------|---------------------------------------------------|
//! | `[[handlers]]`  | Extension → strategy table (order = probe order)  |
//! | `[watch]`       | Auto-watch of subscribed files' directories       |
//! | `[sandbox]`     | Lua globals copied into every evaluation scope    |
//! | `[log]`         | Verbose logging                                   |
//!
//! Configuration is read once; the engine keeps an immutable copy.

mod error;
mod handlers;

pub use error::ConfigError;
pub use handlers::{HandlerEntry, HandlerTable, Strategy};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name.
pub const CONFIG_FILE: &str = "live.toml";

/// Root configuration structure representing live.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiveConfig {
    /// Absolute path to the config file, if one was loaded (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Extension → strategy table
    pub handlers: Vec<HandlerEntry>,

    /// Watch settings
    pub watch: WatchConfig,

    /// Sandbox settings
    pub sandbox: SandboxConfig,

    /// Logging settings
    pub log: LogConfig,
}

/// `[watch]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Watch the containing directory on the first subscription to a file
    pub auto: bool,
}

/// `[sandbox]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxConfig {
    /// Lua globals made visible to evaluated code (everything else is hidden)
    pub globals: Vec<String>,
}

/// `[log]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub verbose: bool,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            handlers: handlers::default_handlers(),
            watch: WatchConfig::default(),
            sandbox: SandboxConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { auto: true }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        let globals = [
            "string", "math", "table", "tostring", "tonumber", "type", "pairs", "ipairs",
            "select", "error", "pcall", "assert",
        ];
        Self {
            globals: globals.iter().map(ToString::to_string).collect(),
        }
    }
}

impl LiveConfig {
    /// Load and validate a config file. The file must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let mut config = Self::parse(&contents)?;
        config.config_path = Some(path.canonicalize().unwrap_or_else(|_| path.to_path_buf()));
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate config text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.handlers.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[handlers]] entry is required".into(),
            ));
        }

        let mut seen = FxHashSet::default();
        for entry in &self.handlers {
            let ext = entry.extension.as_str();
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                return Err(ConfigError::Validation(format!(
                    "invalid handler extension `{ext}` (write `lua`, not `.lua`)"
                )));
            }
            if !seen.insert(ext) {
                return Err(ConfigError::Validation(format!(
                    "duplicate handler extension `{ext}`"
                )));
            }
        }

        for name in &self.sandbox.globals {
            if !is_identifier(name) {
                return Err(ConfigError::Validation(format!(
                    "sandbox global `{name}` is not a Lua identifier"
                )));
            }
        }

        Ok(())
    }

    /// Build the immutable handler table.
    pub fn handler_table(&self) -> HandlerTable {
        HandlerTable::new(self.handlers.clone())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
