use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use log::warn;
use pkgdoc_commonmark::ProxyError;
use thiserror::Error;

use super::fetch::FetchError;

/// Rejections and failures of the image proxy endpoint.
#[derive(Debug, Error)]
pub enum ServeError {
  #[error("missing url or sig parameter")]
  MissingParameter,

  #[error("invalid signature: {0}")]
  Signature(#[from] ProxyError),

  #[error("URL is not allowed: {0}")]
  DisallowedUrl(String),

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error("fetch task failed: {0}")]
  Task(String),
}

impl ServeError {
  /// HTTP status reported to the client.
  #[must_use]
  pub const fn status(&self) -> StatusCode {
    match self {
      Self::MissingParameter
      | Self::Signature(_)
      | Self::DisallowedUrl(_)
      | Self::Fetch(
        FetchError::DisallowedRedirect(_) | FetchError::NotAnImage(_),
      ) => StatusCode::BAD_REQUEST,
      Self::Fetch(FetchError::NotFound) => StatusCode::NOT_FOUND,
      Self::Fetch(FetchError::TooLarge(_)) => StatusCode::PAYLOAD_TOO_LARGE,
      Self::Fetch(
        FetchError::TooManyRedirects
        | FetchError::Status(_)
        | FetchError::Transport(_),
      )
      | Self::Task(_) => StatusCode::BAD_GATEWAY,
    }
  }
}

impl IntoResponse for ServeError {
  fn into_response(self) -> Response {
    let status = self.status();
    warn!("Image proxy request rejected with {status}: {self}");
    (status, status.canonical_reason().unwrap_or_default()).into_response()
  }
}
