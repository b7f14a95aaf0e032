use std::sync::Arc;

use axum::{
  extract::{Query, State},
  http::{HeaderValue, header},
  response::{IntoResponse, Response},
};
use log::debug;
use pkgdoc_commonmark::{ImageProxySigner, is_allowed_image_url};
use serde::Deserialize;

use super::{
  error::ServeError,
  fetch::{FetchError, ImageFetcher, is_image_content_type},
};

/// Shared state of the image proxy route.
pub struct ProxyState {
  pub signer:        ImageProxySigner,
  pub fetcher:       Arc<dyn ImageFetcher>,
  pub cache_control: HeaderValue,
}

impl ProxyState {
  #[must_use]
  pub fn new(
    signer: ImageProxySigner,
    fetcher: Arc<dyn ImageFetcher>,
    cache_max_age: u64,
  ) -> Self {
    let cache_control = HeaderValue::from_str(&format!(
      "public, max-age={cache_max_age}, s-maxage={cache_max_age}"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("no-store"));

    Self {
      signer,
      fetcher,
      cache_control,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
  url: Option<String>,
  sig: Option<String>,
}

/// `GET {endpoint}?url=<encoded>&sig=<hex>`
pub async fn proxy_image(
  State(state): State<Arc<ProxyState>>,
  Query(query): Query<ProxyQuery>,
) -> Result<Response, ServeError> {
  let (Some(url), Some(sig)) = (query.url, query.sig) else {
    return Err(ServeError::MissingParameter);
  };

  state.signer.verify(&url, &sig)?;
  if !is_allowed_image_url(&url) {
    return Err(ServeError::DisallowedUrl(url));
  }

  debug!("Fetching proxied image {url}");
  let fetcher = Arc::clone(&state.fetcher);
  let image = tokio::task::spawn_blocking(move || fetcher.fetch(&url))
    .await
    .map_err(|e| ServeError::Task(e.to_string()))??;

  if !is_image_content_type(&image.content_type) {
    return Err(FetchError::NotAnImage(image.content_type).into());
  }
  let content_type = HeaderValue::from_str(&image.content_type)
    .map_err(|_| FetchError::NotAnImage(image.content_type.clone()))?;

  Ok(
    (
      [
        (header::CONTENT_TYPE, content_type),
        (header::CACHE_CONTROL, state.cache_control.clone()),
      ],
      image.bytes,
    )
      .into_response(),
  )
}
