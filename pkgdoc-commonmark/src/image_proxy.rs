//! Signed image proxy URLs.
//!
//! Untrusted README images are rewritten to
//! `{endpoint}?url={url}&sig={hex(HMAC-SHA256(secret, url))}` so visitors'
//! browsers never contact third-party hosts directly. The proxy recomputes the
//! signature before fetching, so the endpoint cannot be used as an open relay.
use std::{
  fmt,
  net::{Ipv4Addr, Ipv6Addr},
};

use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::Sha256;
use url::{Host, Url};

type HmacSha256 = Hmac<Sha256>;

/// Route the proxy is mounted on.
pub const DEFAULT_PROXY_ENDPOINT: &str = "/image-proxy";

/// Hosts serving images that are safe to load directly. Subdomains match too.
pub const TRUSTED_IMAGE_DOMAINS: &[&str] = &[
  // GitHub proxies through camo already
  "raw.githubusercontent.com",
  "github.com",
  "user-images.githubusercontent.com",
  "avatars.githubusercontent.com",
  "repository-images.githubusercontent.com",
  "github.githubassets.com",
  "objects.githubusercontent.com",
  "gitlab.com",
  // CDNs
  "cdn.jsdelivr.net",
  "unpkg.com",
  // Badges
  "img.shields.io",
  "shields.io",
  "badge.fury.io",
  "badgen.net",
  "flat.badgen.net",
  "codecov.io",
  "coveralls.io",
  "david-dm.org",
  "snyk.io",
  "app.fossa.com",
  "api.codeclimate.com",
  "bundlephobia.com",
  "packagephobia.com",
];

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'-')
  .remove(b'_')
  .remove(b'.')
  .remove(b'!')
  .remove(b'~')
  .remove(b'*')
  .remove(b'\'')
  .remove(b'(')
  .remove(b')');

/// Errors from signing and verifying proxy URLs.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
  #[error("Image proxy secret must not be empty")]
  EmptySecret,
  #[error("Invalid image proxy key: {0}")]
  InvalidKey(String),
  #[error("Signature is not valid hex: {0}")]
  MalformedSignature(#[from] hex::FromHexError),
  #[error("Signature does not match the URL")]
  SignatureMismatch,
}

/// Signs and rewrites image URLs for the proxy endpoint.
#[derive(Clone)]
pub struct ImageProxySigner {
  mac:             HmacSha256,
  endpoint:        String,
  trusted_domains: Vec<String>,
}

impl fmt::Debug for ImageProxySigner {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ImageProxySigner")
      .field("endpoint", &self.endpoint)
      .field("trusted_domains", &self.trusted_domains)
      .finish_non_exhaustive()
  }
}

impl ImageProxySigner {
  /// Create a signer from the shared HMAC secret.
  ///
  /// # Errors
  ///
  /// Returns [`ProxyError::EmptySecret`] for an empty secret.
  pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, ProxyError> {
    let secret = secret.as_ref();
    if secret.is_empty() {
      return Err(ProxyError::EmptySecret);
    }
    let mac = HmacSha256::new_from_slice(secret)
      .map_err(|e| ProxyError::InvalidKey(e.to_string()))?;

    Ok(Self {
      mac,
      endpoint: DEFAULT_PROXY_ENDPOINT.to_string(),
      trusted_domains: TRUSTED_IMAGE_DOMAINS
        .iter()
        .map(ToString::to_string)
        .collect(),
    })
  }

  /// Path or absolute URL of the proxy route.
  #[must_use]
  pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
    self.endpoint = endpoint.into();
    self
  }

  /// Trust additional hosts, e.g. the site's own domain.
  #[must_use]
  pub fn with_trusted_domains<I, S>(mut self, domains: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.trusted_domains.extend(
      domains
        .into_iter()
        .map(|d| d.into().trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty()),
    );
    self
  }

  #[must_use]
  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  /// Lowercase hex HMAC-SHA256 of `url`.
  #[must_use]
  pub fn sign(&self, url: &str) -> String {
    let mut mac = self.mac.clone();
    mac.update(url.as_bytes());
    hex::encode(mac.finalize().into_bytes())
  }

  /// Check `signature` against `url` in constant time.
  ///
  /// # Errors
  ///
  /// Returns [`ProxyError::MalformedSignature`] if `signature` is not hex and
  /// [`ProxyError::SignatureMismatch`] if it was not produced for `url`.
  pub fn verify(&self, url: &str, signature: &str) -> Result<(), ProxyError> {
    let expected = hex::decode(signature.trim())?;
    let mut mac = self.mac.clone();
    mac.update(url.as_bytes());
    mac
      .verify_slice(&expected)
      .map_err(|_| ProxyError::SignatureMismatch)
  }

  /// Whether `url` is served by a trusted host and can be loaded directly.
  #[must_use]
  pub fn is_trusted(&self, url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
      return false;
    };
    let Some(host) = parsed.host_str() else {
      return false;
    };
    let host = host.to_ascii_lowercase();
    self.trusted_domains.iter().any(|domain| {
      host == *domain
        || host
          .strip_suffix(domain.as_str())
          .is_some_and(|rest| rest.ends_with('.'))
    })
  }

  /// Proxied form of an image URL.
  ///
  /// Relative, `data:`, non-http(s) and trusted URLs are returned unchanged.
  #[must_use]
  pub fn proxied_url(&self, url: &str) -> String {
    if url.is_empty() || url.starts_with('#') || url.starts_with("data:") {
      return url.to_string();
    }

    let is_http = Url::parse(url)
      .is_ok_and(|parsed| matches!(parsed.scheme(), "http" | "https"));
    if !is_http || self.is_trusted(url) {
      return url.to_string();
    }

    format!(
      "{}?url={}&sig={}",
      self.endpoint,
      utf8_percent_encode(url, URI_COMPONENT),
      self.sign(url)
    )
  }
}

/// Whether the proxy may fetch `url`.
///
/// Only http(s) URLs pointing at public hosts pass; loopback, private,
/// link-local and unique-local addresses, IPv4-mapped forms of those, and
/// `localhost`/`*.local`/`*.internal` names are refused.
#[must_use]
pub fn is_allowed_image_url(url: &str) -> bool {
  let Ok(parsed) = Url::parse(url) else {
    return false;
  };
  if !matches!(parsed.scheme(), "http" | "https") {
    return false;
  }

  match parsed.host() {
    Some(Host::Domain(domain)) => {
      let domain = domain.trim_end_matches('.').to_ascii_lowercase();
      !(domain == "localhost"
        || domain.ends_with(".localhost")
        || domain.ends_with(".local")
        || domain.ends_with(".internal"))
    },
    Some(Host::Ipv4(ip)) => is_public_ipv4(ip),
    Some(Host::Ipv6(ip)) => is_public_ipv6(ip),
    None => false,
  }
}

const fn is_public_ipv4(ip: Ipv4Addr) -> bool {
  !(ip.is_loopback()
    || ip.is_private()
    || ip.is_link_local()
    || ip.is_unspecified()
    || ip.is_broadcast())
}

fn is_public_ipv6(ip: Ipv6Addr) -> bool {
  if let Some(mapped) = ip.to_ipv4_mapped() {
    return is_public_ipv4(mapped);
  }
  let first = ip.segments()[0];
  let link_local = first & 0xffc0 == 0xfe80;
  let unique_local = first & 0xfe00 == 0xfc00;
  !(ip.is_loopback() || ip.is_unspecified() || link_local || unique_local)
}
