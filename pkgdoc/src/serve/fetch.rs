//! Upstream image fetching.
use std::{io::Read, time::Duration};

use log::debug;
use pkgdoc_commonmark::is_allowed_image_url;
use pkgdoc_config::server::ServerConfig;
use thiserror::Error;
use ureq::{
  Agent,
  http::{StatusCode, header},
};
use url::Url;

/// Why an upstream image could not be relayed.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("redirect to disallowed URL: {0}")]
  DisallowedRedirect(String),

  #[error("upstream content type is not an image: {0}")]
  NotAnImage(String),

  #[error("upstream image not found")]
  NotFound,

  #[error("upstream image exceeds {0} bytes")]
  TooLarge(u64),

  #[error("too many redirects")]
  TooManyRedirects,

  #[error("upstream responded with status {0}")]
  Status(u16),

  #[error("upstream request failed: {0}")]
  Transport(String),
}

/// A relayed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
  pub content_type: String,
  pub bytes:        Vec<u8>,
}

/// Blocking upstream fetch, run on the blocking pool by the handler.
///
/// `url` has already passed [`is_allowed_image_url`]; implementations must
/// validate every redirect hop themselves.
pub trait ImageFetcher: Send + Sync + 'static {
  /// Fetch an image.
  ///
  /// # Errors
  ///
  /// Returns a [`FetchError`] describing the upstream failure.
  fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

/// Whether a `Content-Type` value names an image.
#[must_use]
pub fn is_image_content_type(content_type: &str) -> bool {
  content_type
    .trim_start()
    .get(..6)
    .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// [`ImageFetcher`] backed by a `ureq` agent that never follows redirects on
/// its own.
pub struct UreqFetcher {
  agent:         Agent,
  user_agent:    String,
  max_bytes:     u64,
  max_redirects: u8,
}

impl UreqFetcher {
  #[must_use]
  pub fn new(config: &ServerConfig) -> Self {
    let agent = Agent::config_builder()
      .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
      .http_status_as_error(false)
      .max_redirects(0)
      .max_redirects_will_error(false)
      .build()
      .into();

    Self {
      agent,
      user_agent: config.user_agent.clone(),
      max_bytes: config.max_image_bytes,
      max_redirects: config.max_redirects,
    }
  }
}

impl ImageFetcher for UreqFetcher {
  fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
    let mut current = url.to_string();

    for _ in 0..=self.max_redirects {
      let response = self
        .agent
        .get(&current)
        .header("User-Agent", self.user_agent.as_str())
        .header("Accept", "image/*")
        .call()
        .map_err(|e| FetchError::Transport(e.to_string()))?;
      let status = response.status();

      if status.is_redirection() {
        let location = response
          .headers()
          .get(header::LOCATION)
          .and_then(|value| value.to_str().ok())
          .ok_or(FetchError::Status(status.as_u16()))?;
        let next = Url::parse(&current)
          .and_then(|base| base.join(location))
          .map_err(|e| FetchError::Transport(e.to_string()))?;
        if !is_allowed_image_url(next.as_str()) {
          return Err(FetchError::DisallowedRedirect(next.to_string()));
        }
        debug!("Following redirect from {current} to {next}");
        current = next.into();
        continue;
      }

      if status == StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound);
      }
      if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
      }

      let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
      if !is_image_content_type(&content_type) {
        return Err(FetchError::NotAnImage(content_type));
      }

      let declared = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
      if declared.is_some_and(|length| length > self.max_bytes) {
        return Err(FetchError::TooLarge(self.max_bytes));
      }

      let mut bytes = Vec::new();
      response
        .into_body()
        .into_reader()
        .take(self.max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| FetchError::Transport(e.to_string()))?;
      if bytes.len() as u64 > self.max_bytes {
        return Err(FetchError::TooLarge(self.max_bytes));
      }

      return Ok(FetchedImage {
        content_type,
        bytes,
      });
    }

    Err(FetchError::TooManyRedirects)
  }
}
