//! Runtime server configuration.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use cep_api::UserAccount;
use serde::Deserialize;

/// Server configuration, read from `config.toml` and overridden by
/// `CEP_`-prefixed environment variables (e.g. `CEP_PORT=8080`).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub store_path:         PathBuf,
  #[serde(default = "default_storage_timeout_ms")]
  pub storage_timeout_ms: u64,
  #[serde(default)]
  pub users:              Vec<UserAccount>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 3000 }

fn default_storage_timeout_ms() -> u64 {
  u64::try_from(cep_catalog::DEFAULT_STORAGE_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

impl ServerConfig {
  /// Layer the file at `path` (optional) under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("CEP")),
    )
  }

  fn from_builder(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> anyhow::Result<Self> {
    builder
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn storage_timeout(&self) -> Duration { Duration::from_millis(self.storage_timeout_ms) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
