use std::path::Path;

use serde::{Deserialize, Serialize};

pub const KEYRING_SERVICE: &str = "tutorlens";
pub const KEYRING_USER: &str = "moonshot";
const KEY_ENV_VARS: [&str; 2] = ["TUTORLENS_API_KEY", "MOONSHOT_API_KEY"];

/// Where the client sends chat requests. Resolved once at startup.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
  Proxy,
  Direct,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarkdownEngine {
  Cmark,
  Fallback,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
  pub port: u16,
  pub static_dir: String,
  pub upstream_url: String,
  /// Explicit chat endpoint for proxy mode; derived from `port` when unset.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub proxy_url: Option<String>,
  pub transport: TransportMode,
  pub text_model: String,
  pub vision_model: String,
  pub temperature: f32,
  pub max_tokens: u32,
  pub request_timeout_secs: u64,
  pub markdown_engine: MarkdownEngine,
  pub log_path: Option<String>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      port: 3000,
      static_dir: "static".to_string(),
      upstream_url: "https://api.moonshot.cn/v1/chat/completions".to_string(),
      proxy_url: None,
      transport: TransportMode::Proxy,
      text_model: "kimi-latest".to_string(),
      vision_model: "moonshot-v1-8k-vision-preview".to_string(),
      temperature: 0.7,
      max_tokens: 4096,
      request_timeout_secs: 120,
      markdown_engine: MarkdownEngine::Cmark,
      log_path: None,
    }
  }
}

impl AppConfig {
  pub fn proxy_url(&self) -> String {
    match &self.proxy_url {
      Some(url) => url.clone(),
      None => format!("http://127.0.0.1:{}/api/chat", self.port),
    }
  }
}

pub fn load_or_init(path: &Path) -> anyhow::Result<AppConfig> {
  if path.exists() {
    let data = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&data)?;
    Ok(config)
  } else {
    let config = AppConfig::default();
    save_config(path, &config)?;
    Ok(config)
  }
}

pub fn save_config(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(config)?;
  std::fs::write(path, json)?;
  Ok(())
}

/// Upstream credential, looked up server-side only: environment first, then the OS keyring.
pub fn resolve_api_key() -> Result<String, String> {
  for var in KEY_ENV_VARS {
    if let Ok(key) = std::env::var(var) {
      if !key.trim().is_empty() {
        return Ok(key.trim().to_string());
      }
    }
  }

  let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER).map_err(|e| e.to_string())?;
  let key = entry
    .get_password()
    .map_err(|_| "API key missing. Set TUTORLENS_API_KEY or store it in the keyring.".to_string())?;
  if key.trim().is_empty() {
    Err("API key missing. Set TUTORLENS_API_KEY or store it in the keyring.".to_string())
  } else {
    Ok(key)
  }
}

pub fn store_api_key(key: &str) -> Result<(), String> {
  let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER).map_err(|e| e.to_string())?;
  entry.set_password(key).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn load_or_init_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let config = load_or_init(&path).expect("defaults should load");
    assert_eq!(config, AppConfig::default());
    assert!(path.exists());
  }

  #[test]
  fn missing_fields_take_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "port": 8080, "transport": "direct" }"#).unwrap();
    let config = load_or_init(&path).unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.transport, TransportMode::Direct);
    assert_eq!(config.text_model, "kimi-latest");
    assert_eq!(config.markdown_engine, MarkdownEngine::Cmark);
  }

  #[test]
  fn proxy_url_follows_port() {
    assert_eq!(AppConfig::default().proxy_url(), "http://127.0.0.1:3000/api/chat");
    let config: AppConfig = serde_json::from_str(r#"{ "port": 8080 }"#).unwrap();
    assert_eq!(config.proxy_url(), "http://127.0.0.1:8080/api/chat");
  }

  #[test]
  fn explicit_proxy_url_wins() {
    let config: AppConfig =
      serde_json::from_str(r#"{ "port": 8080, "proxy_url": "http://10.0.0.2:9000/api/chat" }"#).unwrap();
    assert_eq!(config.proxy_url(), "http://10.0.0.2:9000/api/chat");
  }

  #[test]
  fn malformed_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(load_or_init(&path).is_err());
  }
}
