use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::sync::SyncSettings;
use crate::upstream::PageStyle;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Case-management API; without it only sample data is shown
  pub api: Option<ApiConfig>,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub sync: SyncConfig,
  /// Keep bundled sample data as the last fallback
  #[serde(default = "default_true")]
  pub sample_fallback: bool,
}

fn default_true() -> bool {
  true
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: None,
      title: None,
      sync: SyncConfig::default(),
      sample_fallback: true,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub url: String,
  #[serde(default)]
  pub page_style: PageStyle,
  /// Older deployment tried when the primary API fails
  pub legacy_url: Option<String>,
  #[serde(default = "legacy_page_style")]
  pub legacy_page_style: PageStyle,
}

fn legacy_page_style() -> PageStyle {
  PageStyle::Page
}

impl ApiConfig {
  pub fn url(&self) -> Result<Url> {
    parse_http_url(&self.url)
  }

  pub fn legacy_url(&self) -> Result<Option<Url>> {
    self.legacy_url.as_deref().map(parse_http_url).transpose()
  }
}

fn parse_http_url(raw: &str) -> Result<Url> {
  let url = Url::parse(raw.trim()).map_err(|e| eyre!("Invalid API url {}: {}", raw, e))?;
  match url.scheme() {
    "http" | "https" => Ok(url),
    other => Err(eyre!("Unsupported scheme {} in API url {}", other, raw)),
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  /// How long a fetched page is trusted
  pub ttl_secs: u64,
  /// Freshness monitor period, 0 disables it
  pub poll_interval_secs: u64,
  pub page_size: u64,
  pub probe_limit: u64,
}

impl Default for SyncConfig {
  fn default() -> Self {
    let settings = SyncSettings::default();
    Self {
      ttl_secs: settings.ttl.as_secs(),
      poll_interval_secs: settings.poll_interval.as_secs(),
      page_size: settings.page_size,
      probe_limit: settings.probe_limit,
    }
  }
}

impl SyncConfig {
  pub fn settings(&self) -> SyncSettings {
    SyncSettings {
      ttl: Duration::from_secs(self.ttl_secs),
      poll_interval: Duration::from_secs(self.poll_interval_secs),
      page_size: self.page_size.max(1),
      probe_limit: self.probe_limit.max(1),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./servedash.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/servedash/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    Self::load_optional(explicit_path)?.ok_or_else(|| {
      eyre!(
        "No configuration file found. Create one at ~/.config/servedash/config.yaml\n\
                 or run with --sample-only to browse the bundled sample data."
      )
    })
  }

  /// Like [`Config::load`], but `Ok(None)` when no file exists in the search
  /// path. A file that exists and fails to parse is still an error.
  pub fn load_optional(explicit_path: Option<&Path>) -> Result<Option<Self>> {
    let path = match explicit_path {
      Some(p) if p.exists() => Some(p.to_path_buf()),
      Some(p) => return Err(eyre!("Config file not found: {}", p.display())),
      None => Self::find_config_file(),
    };
    path.map(|p| Self::load_from_path(&p)).transpose()
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("servedash.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("servedash").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
    Self::parse(&contents).map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
  }

  pub fn parse(contents: &str) -> Result<Self> {
    let config: Config =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Failed to parse config: {}", e))?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    if let Some(api) = &self.api {
      api.url()?;
      api.legacy_url()?;
    }
    Ok(())
  }

  /// Header title: explicit title, else the API host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    self
      .api
      .as_ref()
      .and_then(|api| api.url().ok())
      .and_then(|url| url.host_str().map(str::to_string))
      .unwrap_or_else(|| "servedash".to_string())
  }

  /// Get the API token from environment variables.
  ///
  /// Checks SERVEDASH_API_TOKEN first, then CASE_API_TOKEN as fallback.
  /// The API may be open, so a missing token is not an error.
  pub fn api_token() -> Option<String> {
    std::env::var("SERVEDASH_API_TOKEN")
      .or_else(|_| std::env::var("CASE_API_TOKEN"))
      .ok()
      .filter(|t| !t.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = Config::parse("api:\n  url: https://cases.example.com/api/v1\n").unwrap();
    let api = config.api.as_ref().unwrap();
    assert_eq!(api.page_style, PageStyle::Offset);
    assert_eq!(api.legacy_page_style, PageStyle::Page);
    assert!(config.sample_fallback);
    assert_eq!(config.sync.settings(), SyncSettings::default());
    assert_eq!(config.display_title(), "cases.example.com");
  }

  #[test]
  fn test_full_config() {
    let yaml = r#"
title: Acme Process Serving
api:
  url: https://cases.example.com/api/v2
  page_style: page
  legacy_url: http://legacy.internal:8080/
sync:
  ttl_secs: 120
  poll_interval_secs: 0
  page_size: 25
sample_fallback: false
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.display_title(), "Acme Process Serving");
    assert!(!config.sample_fallback);

    let settings = config.sync.settings();
    assert_eq!(settings.ttl, Duration::from_secs(120));
    assert!(settings.poll_interval.is_zero());
    assert_eq!(settings.page_size, 25);
    assert_eq!(settings.probe_limit, 1);

    let legacy = config.api.unwrap().legacy_url().unwrap().unwrap();
    assert_eq!(legacy.port(), Some(8080));
  }

  #[test]
  fn test_invalid_urls_are_rejected() {
    assert!(Config::parse("api:\n  url: not a url\n").is_err());
    assert!(Config::parse("api:\n  url: ftp://cases.example.com\n").is_err());
    assert!(Config::parse(
      "api:\n  url: https://cases.example.com\n  legacy_url: nope\n"
    )
    .is_err());
  }

  #[test]
  fn test_zero_page_size_is_clamped() {
    let config = Config::parse("sync:\n  page_size: 0\n").unwrap();
    assert_eq!(config.sync.settings().page_size, 1);
    assert_eq!(config.display_title(), "servedash");
  }

  #[test]
  fn test_malformed_file_is_an_error() {
    let path = std::env::temp_dir().join(format!("servedash-bad-{}.yaml", std::process::id()));
    std::fs::write(&path, "api: [not, a, mapping\n").unwrap();
    let result = Config::load_optional(Some(&path));
    std::fs::remove_file(&path).unwrap();

    let err = result.unwrap_err().to_string();
    assert!(err.starts_with("Invalid config file"), "{}", err);
  }

  #[test]
  fn test_explicit_file_loads() {
    let path = std::env::temp_dir().join(format!("servedash-ok-{}.yaml", std::process::id()));
    std::fs::write(&path, "title: Night shift\n").unwrap();
    let result = Config::load_optional(Some(&path));
    std::fs::remove_file(&path).unwrap();

    let config = result.unwrap().unwrap();
    assert_eq!(config.display_title(), "Night shift");
  }

  #[test]
  fn test_missing_explicit_file_is_an_error() {
    let path = std::env::temp_dir().join("servedash-does-not-exist.yaml");
    assert!(Config::load_optional(Some(&path)).is_err());
  }
}
