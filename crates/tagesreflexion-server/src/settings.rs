//! Runtime configuration, layered from an optional TOML file and
//! `TAGESREFLEXION_*` environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;
use tagesreflexion_store_sqlite::StoreOptions;

/// Prefix for environment overrides, e.g. `TAGESREFLEXION_PORT=8080`.
pub const ENV_PREFIX: &str = "TAGESREFLEXION";

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  pub busy_timeout_ms: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            "127.0.0.1".to_string(),
      port:            3000,
      store_path:      PathBuf::from("~/.local/share/tagesreflexion/journal.sqlite"),
      busy_timeout_ms: 5_000,
    }
  }
}

impl ServerConfig {
  /// Load from `file` (if it exists) overridden by the environment.
  pub fn load(file: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_options(&self) -> StoreOptions {
    StoreOptions { busy_timeout: Duration::from_millis(self.busy_timeout_ms) }
  }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
