use pkgdoc_commonmark::{
  ImageProxySigner,
  ProxyError,
  image_proxy::DEFAULT_PROXY_ENDPOINT,
};
use serde::{Deserialize, Serialize};

use crate::{config::parse_bool, error::ConfigError};

/// Environment variable holding the proxy HMAC secret.
pub const SECRET_ENV_VAR: &str = "PKGDOC_IMAGE_PROXY_SECRET";

/// Configuration for signed image proxy URLs
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageProxyConfig {
  /// Whether untrusted images are rewritten to the proxy
  pub enable: bool,

  /// Route (or absolute URL) of the proxy endpoint
  pub endpoint: String,

  /// HMAC secret shared between renderer and proxy.
  ///
  /// Prefer [`SECRET_ENV_VAR`]; it takes precedence over this field.
  #[serde(skip_serializing)]
  pub secret: Option<String>,

  /// The site's own host, whose images are loaded directly
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_party_host: Option<String>,

  /// Additional hosts whose images are loaded directly
  pub extra_trusted_domains: Vec<String>,
}

impl std::fmt::Debug for ImageProxyConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ImageProxyConfig")
      .field("enable", &self.enable)
      .field("endpoint", &self.endpoint)
      .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
      .field("first_party_host", &self.first_party_host)
      .field("extra_trusted_domains", &self.extra_trusted_domains)
      .finish()
  }
}

impl Default for ImageProxyConfig {
  fn default() -> Self {
    Self {
      enable:                true,
      endpoint:              DEFAULT_PROXY_ENDPOINT.to_string(),
      secret:                None,
      first_party_host:      None,
      extra_trusted_domains: Vec::new(),
    }
  }
}

impl ImageProxyConfig {
  /// The configured secret, from the environment or the config file.
  #[must_use]
  pub fn resolve_secret(&self) -> Option<String> {
    std::env::var(SECRET_ENV_VAR)
      .ok()
      .filter(|secret| !secret.is_empty())
      .or_else(|| self.secret.clone().filter(|secret| !secret.is_empty()))
  }

  /// Build a signer with this section's endpoint and trusted hosts.
  ///
  /// # Errors
  ///
  /// Returns an error if `secret` is empty.
  pub fn signer(
    &self,
    secret: impl AsRef<[u8]>,
  ) -> Result<ImageProxySigner, ProxyError> {
    let trusted = self
      .first_party_host
      .iter()
      .chain(&self.extra_trusted_domains)
      .cloned();
    Ok(
      ImageProxySigner::new(secret)?
        .with_endpoint(self.endpoint.clone())
        .with_trusted_domains(trusted),
    )
  }

  /// Set one `image_proxy.*` key. Returns `false` for unknown keys.
  pub(crate) fn apply_override(
    &mut self,
    key: &str,
    value: &str,
  ) -> Result<bool, ConfigError> {
    match key {
      "enable" => self.enable = parse_bool(key, value)?,
      "endpoint" => self.endpoint = value.to_string(),
      "secret" => self.secret = (!value.is_empty()).then(|| value.to_string()),
      "first_party_host" => {
        self.first_party_host = (!value.is_empty()).then(|| value.to_string());
      },
      "extra_trusted_domains" => {
        self.extra_trusted_domains = value
          .split(',')
          .map(str::trim)
          .filter(|domain| !domain.is_empty())
          .map(ToString::to_string)
          .collect();
      },
      _ => return Ok(false),
    }
    Ok(true)
  }
}
