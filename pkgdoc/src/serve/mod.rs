//! The image proxy HTTP boundary.
//!
//! Serves `GET {endpoint}?url=<encoded>&sig=<hex>`: the signature is checked
//! against the shared secret, the URL against the SSRF block-list, and the
//! image is then fetched on the blocking pool and relayed with caching and
//! hardening headers.
pub mod error;
pub mod fetch;
pub mod handler;

use std::{io, sync::Arc};

use axum::{
  Router,
  http::{HeaderValue, header},
  routing::get,
};
use log::info;
use pkgdoc_commonmark::{ImageProxySigner, image_proxy::DEFAULT_PROXY_ENDPOINT};
use pkgdoc_config::Config;
use tower_http::set_header::SetResponseHeaderLayer;

pub use self::{
  error::ServeError,
  fetch::{FetchError, FetchedImage, ImageFetcher, UreqFetcher},
  handler::ProxyState,
};

const CONTENT_SECURITY_POLICY: &str =
  "default-src 'none'; style-src 'unsafe-inline'";

/// Route path of a configured endpoint, which may be an absolute URL.
#[must_use]
pub fn route_path(endpoint: &str) -> String {
  if endpoint.starts_with('/') {
    return endpoint.to_string();
  }
  url::Url::parse(endpoint).map_or_else(
    |_| DEFAULT_PROXY_ENDPOINT.to_string(),
    |parsed| parsed.path().to_string(),
  )
}

/// Router serving the proxy endpoint at `path`.
pub fn router(state: ProxyState, path: &str) -> Router {
  Router::new()
    .route(path, get(handler::proxy_image))
    .with_state(Arc::new(state))
    .layer(SetResponseHeaderLayer::overriding(
      header::X_CONTENT_TYPE_OPTIONS,
      HeaderValue::from_static("nosniff"),
    ))
    .layer(SetResponseHeaderLayer::overriding(
      header::CONTENT_SECURITY_POLICY,
      HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    ))
}

/// Serve the image proxy until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run(config: &Config, signer: ImageProxySigner) -> io::Result<()> {
  let path = route_path(&config.image_proxy.endpoint);
  let fetcher = Arc::new(UreqFetcher::new(&config.server));
  let state = ProxyState::new(signer, fetcher, config.server.cache_max_age);
  let app = router(state, &path);

  let listener =
    tokio::net::TcpListener::bind(config.server.bind_address()).await?;
  info!(
    "Image proxy listening on http://{}{path}",
    listener.local_addr()?
  );

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down image proxy");
      }
    })
    .await
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use std::sync::Mutex;

  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
  };
  use tower::ServiceExt;

  use super::*;

  const SECRET: &str = "test-secret";
  const IMAGE_URL: &str = "https://example.com/logo.png";

  struct MockFetcher {
    result:    Box<dyn Fn(&str) -> Result<FetchedImage, FetchError> + Send + Sync>,
    requested: Mutex<Vec<String>>,
  }

  impl MockFetcher {
    fn new(
      result: impl Fn(&str) -> Result<FetchedImage, FetchError>
      + Send
      + Sync
      + 'static,
    ) -> Arc<Self> {
      Arc::new(Self {
        result:    Box::new(result),
        requested: Mutex::new(Vec::new()),
      })
    }

    fn requested(&self) -> Vec<String> {
      self.requested.lock().expect("not poisoned").clone()
    }
  }

  impl ImageFetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
      self.requested.lock().expect("not poisoned").push(url.to_string());
      (self.result)(url)
    }
  }

  fn png(_: &str) -> Result<FetchedImage, FetchError> {
    Ok(FetchedImage {
      content_type: "image/png".to_string(),
      bytes:        vec![0x89, b'P', b'N', b'G'],
    })
  }

  fn signer() -> ImageProxySigner {
    ImageProxySigner::new(SECRET).expect("non-empty secret")
  }

  fn app(fetcher: Arc<MockFetcher>) -> Router {
    router(ProxyState::new(signer(), fetcher, 86400), "/image-proxy")
  }

  async fn get(app: Router, uri: &str) -> axum::response::Response {
    app
      .oneshot(Request::get(uri).body(Body::empty()).expect("valid request"))
      .await
      .expect("infallible")
  }

  #[tokio::test]
  async fn test_relays_signed_image() {
    let fetcher = MockFetcher::new(png);
    let uri = signer().proxied_url(IMAGE_URL);
    let response = get(app(Arc::clone(&fetcher)), &uri).await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(
      headers[header::CACHE_CONTROL],
      "public, max-age=86400, s-maxage=86400"
    );
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(
      headers[header::CONTENT_SECURITY_POLICY],
      CONTENT_SECURITY_POLICY
    );
    let body = to_bytes(response.into_body(), usize::MAX)
      .await
      .expect("body");
    assert_eq!(&body[..], &[0x89, b'P', b'N', b'G']);
    assert_eq!(fetcher.requested(), [IMAGE_URL]);
  }

  #[tokio::test]
  async fn test_rejects_bad_signatures() {
    let fetcher = MockFetcher::new(png);
    let other = signer().proxied_url("https://example.com/other.png");
    let sig = other.split("sig=").nth(1).expect("signed");

    for uri in [
      "/image-proxy".to_string(),
      "/image-proxy?url=https%3A%2F%2Fexample.com%2Flogo.png".to_string(),
      "/image-proxy?url=https%3A%2F%2Fexample.com%2Flogo.png&sig=zz"
        .to_string(),
      format!("/image-proxy?url=https%3A%2F%2Fexample.com%2Flogo.png&sig={sig}"),
    ] {
      let response = get(app(Arc::clone(&fetcher)), &uri).await;
      assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
      assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }
    assert!(fetcher.requested().is_empty());
  }

  #[tokio::test]
  async fn test_rejects_private_hosts_even_when_signed() {
    let fetcher = MockFetcher::new(png);
    for url in [
      "http://127.0.0.1/admin.png",
      "http://169.254.169.254/latest",
      "http://[::ffff:10.0.0.1]/x.png",
      "http://printer.local/x.png",
    ] {
      let response =
        get(app(Arc::clone(&fetcher)), &signer().proxied_url(url)).await;
      assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{url}");
    }
    assert!(fetcher.requested().is_empty());
  }

  #[tokio::test]
  async fn test_maps_fetch_failures_to_statuses() {
    let cases: [(fn(&str) -> Result<FetchedImage, FetchError>, StatusCode); 6] = [
      (|_| Err(FetchError::NotFound), StatusCode::NOT_FOUND),
      (|_| Err(FetchError::TooLarge(10)), StatusCode::PAYLOAD_TOO_LARGE),
      (
        |_| Err(FetchError::DisallowedRedirect("http://127.0.0.1/".into())),
        StatusCode::BAD_REQUEST,
      ),
      (|_| Err(FetchError::Status(500)), StatusCode::BAD_GATEWAY),
      (|_| Err(FetchError::TooManyRedirects), StatusCode::BAD_GATEWAY),
      (
        |_| {
          Ok(FetchedImage {
            content_type: "text/html".to_string(),
            bytes:        b"<script>".to_vec(),
          })
        },
        StatusCode::BAD_REQUEST,
      ),
    ];

    for (result, expected) in cases {
      let response =
        get(app(MockFetcher::new(result)), &signer().proxied_url(IMAGE_URL))
          .await;
      assert_eq!(response.status(), expected);
      assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }
  }

  #[test]
  fn test_route_path() {
    assert_eq!(route_path("/img"), "/img");
    assert_eq!(route_path("https://cdn.example.com/proxy"), "/proxy");
    assert_eq!(route_path("not a url"), DEFAULT_PROXY_ENDPOINT);
  }
}
