use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::EvictionPolicy;
use crate::fetch::RetryPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub retry: RetryConfig,
  pub harvest: HarvestConfig,
  pub cache: CacheConfig,
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Method endpoint root, e.g. https://api.vk.com/method
  pub base_url: String,
  /// API version sent as `v` with every call
  pub version: String,
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://api.vk.com/method".to_string(),
      version: "5.131".to_string(),
      timeout_secs: 30,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
  pub max_attempts: u32,
  /// Fixed pause between attempts
  pub backoff_secs: u64,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_attempts: 5,
      backoff_secs: 5,
    }
  }
}

impl RetryConfig {
  pub fn policy(&self) -> RetryPolicy {
    RetryPolicy::new(self.max_attempts, Duration::from_secs(self.backoff_secs))
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
  /// Numeric ids or screen names passed to users.get
  pub user_ids: Vec<String>,
  /// Only the first N groups of each user are crawled for engagement
  pub group_limit: usize,
  /// `count` for wall.get
  pub posts_per_group: u32,
  pub output_dir: PathBuf,
  pub fetch_audio: bool,
}

impl Default for HarvestConfig {
  fn default() -> Self {
    Self {
      user_ids: Vec::new(),
      group_limit: 10,
      posts_per_group: 20,
      output_dir: PathBuf::from("."),
      fetch_audio: false,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Entries older than this are fetched again. Unset keeps entries for the whole run.
  pub max_age_secs: Option<u64>,
}

impl CacheConfig {
  pub fn eviction_policy(&self) -> Result<EvictionPolicy> {
    let Some(secs) = self.max_age_secs else {
      return Ok(EvictionPolicy::Never);
    };
    let max_age = i64::try_from(secs)
      .ok()
      .and_then(chrono::Duration::try_seconds)
      .ok_or_else(|| eyre!("Invalid cache.max_age_secs {}: out of range", secs))?;
    Ok(EvictionPolicy::MaxAge(max_age))
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Filter directive used when RUST_LOG is not set
  pub level: String,
  /// Also append logs to this file
  pub file: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      file: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./vk-harvest.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/vk-harvest/config.yaml
  ///
  /// Falls back to defaults when no file is found.
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
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("vk-harvest.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("vk-harvest").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  /// Get the VK access token from environment variables.
  ///
  /// Checks VK_HARVEST_TOKEN first, then VK_ACCESS_TOKEN as fallback.
  pub fn get_access_token() -> Result<String> {
    std::env::var("VK_HARVEST_TOKEN")
      .or_else(|_| std::env::var("VK_ACCESS_TOKEN"))
      .map_err(|_| {
        eyre!("VK access token not found. Set VK_HARVEST_TOKEN or VK_ACCESS_TOKEN environment variable.")
      })
  }
}
