use serde::{Deserialize, Serialize};

use crate::{config::parse_number, error::ConfigError};

/// Largest upstream image the proxy relays.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration for the image proxy server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  /// Address to bind
  pub host: String,

  /// Port to bind
  pub port: u16,

  /// Upstream images larger than this are refused with 413
  pub max_image_bytes: u64,

  /// Global timeout for one upstream fetch, redirects included
  pub timeout_secs: u64,

  /// Redirect hops followed, each re-validated
  pub max_redirects: u8,

  /// `User-Agent` sent upstream
  pub user_agent: String,

  /// `max-age` and `s-maxage` of relayed images
  pub cache_max_age: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            "127.0.0.1".to_string(),
      port:            8787,
      max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
      timeout_secs:    15,
      max_redirects:   5,
      user_agent:      "pkgdoc-image-proxy/1.0".to_string(),
      cache_max_age:   86400,
    }
  }
}

impl ServerConfig {
  /// `host:port` to bind.
  #[must_use]
  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }

  /// Set one `server.*` key. Returns `false` for unknown keys.
  pub(crate) fn apply_override(
    &mut self,
    key: &str,
    value: &str,
  ) -> Result<bool, ConfigError> {
    match key {
      "host" => self.host = value.to_string(),
      "port" => self.port = parse_number(key, value)?,
      "max_image_bytes" => self.max_image_bytes = parse_number(key, value)?,
      "timeout_secs" => self.timeout_secs = parse_number(key, value)?,
      "max_redirects" => self.max_redirects = parse_number(key, value)?,
      "user_agent" => self.user_agent = value.to_string(),
      "cache_max_age" => self.cache_max_age = parse_number(key, value)?,
      _ => return Ok(false),
    }
    Ok(true)
  }
}
