use std::io;

use pkgdoc_commonmark::ProxyError;
use pkgdoc_config::ConfigError;
use thiserror::Error;

/// Top-level error type for the pkgdoc binary.
#[derive(Debug, Error)]
pub enum PkgdocError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("Invalid input: {0}")]
  Input(String),

  #[error("Rendering error: {0}")]
  Render(String),

  #[error("Image proxy error: {0}")]
  Proxy(#[from] ProxyError),

  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  #[error("Serde error: {0}")]
  Serde(#[from] serde_json::Error),

  #[error("Directory walk error: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("Thread pool error: {0}")]
  ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
