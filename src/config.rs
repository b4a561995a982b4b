use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `server.url`.
pub const URL_ENV: &str = "BOOKSHELF_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Base URL of the catalog server; REST paths are appended to it
  #[serde(default = "default_url")]
  pub url: String,
  /// Whole-request timeout enforced by the HTTP client
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      url: default_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// When false every read goes to the server (in-flight reads are still shared)
  #[serde(default = "default_enabled")]
  pub enabled: bool,
  /// Freshness window for cached reads
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u64,
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_secs)
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: default_enabled(),
      ttl_secs: default_ttl_secs(),
    }
  }
}

fn default_url() -> String {
  "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_enabled() -> bool {
  true
}

fn default_ttl_secs() -> u64 {
  60
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./bookshelf.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/bookshelf/config.yaml
  ///
  /// Falls back to defaults when no file is found. `BOOKSHELF_URL`
  /// overrides the server URL either way.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    Ok(config.with_env_overrides())
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("bookshelf.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("bookshelf").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file means "all defaults"
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  fn with_env_overrides(self) -> Self {
    self.with_url_override(std::env::var(URL_ENV).ok())
  }

  /// Replace the server URL unless `url` is missing or blank.
  fn with_url_override(mut self, url: Option<String>) -> Self {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
      self.server.url = url;
    }
    self
  }
}
