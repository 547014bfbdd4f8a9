use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the recipe API.
  #[serde(default = "default_base_url")]
  pub base_url: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
    }
  }
}

fn default_base_url() -> String {
  "http://localhost:3001/api/".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// TTL for cached server responses, in seconds.
  #[serde(default = "default_ttl_seconds")]
  pub ttl_seconds: i64,
  /// How long a loaded collection stays fresh before a refresh reloads it.
  #[serde(default = "default_stale_after_seconds")]
  pub stale_after_seconds: u64,
  /// Custom location for the cache database file.
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_seconds: default_ttl_seconds(),
      stale_after_seconds: default_stale_after_seconds(),
      path: None,
    }
  }
}

fn default_ttl_seconds() -> i64 {
  5 * 60
}

fn default_stale_after_seconds() -> u64 {
  60
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./pantry.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/pantry/config.yaml
  /// 4. ~/.config/pantry/config.yaml
  ///
  /// Every setting has a default, so a missing file is not an error.
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

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Config::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("pantry.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("pantry").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// API token for write operations, when the server requires one.
  ///
  /// Read from the PANTRY_API_TOKEN environment variable.
  pub fn api_token() -> Option<String> {
    std::env::var("PANTRY_API_TOKEN").ok()
  }
}
