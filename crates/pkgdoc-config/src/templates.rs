use std::fmt;

/// Error type for template operations.
#[derive(Debug)]
pub enum TemplateError {
  /// The requested configuration format is not supported.
  UnsupportedFormat(String),
}

impl fmt::Display for TemplateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnsupportedFormat(format) => {
        write!(f, "Unsupported config format: {format}")
      },
    }
  }
}

impl std::error::Error for TemplateError {}

/// Default configuration template in TOML, commented so that every key
/// explains itself.
pub const DEFAULT_TOML_TEMPLATE: &str = r#"# pkgdoc configuration file

[render]
# Heading level of the page section the README is embedded in.
# The first heading becomes one level deeper than this.
section_depth = 2

# Levels added to source headings: `#` renders as <h3> with the default.
heading_offset = 2

# CDN used for relative files when a package has no repository.
cdn_base = "https://cdn.jsdelivr.net/npm"

# Syntax highlight fenced code blocks.
highlight_code = true

# Highlighting theme (defaults to the built-in theme).
# highlight_theme = "InspiredGitHub"

# Rewrite npmjs.com package links to this site's package routes.
redirect_npm_links = true

# npmjs.com paths that are never rewritten.
npm_redirect_exceptions = ["/products", "/pricing", "/features", "/enterprise", "/signup", "/login", "/support", "/policies", "/about"]

[image_proxy]
# Rewrite untrusted images to signed proxy URLs.
enable = true

# Route of the proxy endpoint.
endpoint = "/image-proxy"

# HMAC secret. Prefer the PKGDOC_IMAGE_PROXY_SECRET environment variable.
# secret = "change-me"

# The site's own host; its images are loaded directly.
# first_party_host = "docs.example.com"

# More hosts whose images are loaded directly.
extra_trusted_domains = []

[server]
host = "127.0.0.1"
port = 8787

# Upstream images larger than this many bytes are refused.
max_image_bytes = 10485760

# Timeout for one upstream fetch, redirects included.
timeout_secs = 15

# Redirect hops followed. Every hop is validated again.
max_redirects = 5

user_agent = "pkgdoc-image-proxy/1.0"

# Cache lifetime of relayed images, in seconds.
cache_max_age = 86400
"#;

/// Default configuration template in JSON.
pub const DEFAULT_JSON_TEMPLATE: &str = r#"{
  "render": {
    "section_depth": 2,
    "heading_offset": 2,
    "cdn_base": "https://cdn.jsdelivr.net/npm",
    "highlight_code": true,
    "redirect_npm_links": true,
    "npm_redirect_exceptions": ["/products", "/pricing", "/features", "/enterprise", "/signup", "/login", "/support", "/policies", "/about"]
  },
  "image_proxy": {
    "enable": true,
    "endpoint": "/image-proxy",
    "extra_trusted_domains": []
  },
  "server": {
    "host": "127.0.0.1",
    "port": 8787,
    "max_image_bytes": 10485760,
    "timeout_secs": 15,
    "max_redirects": 5,
    "user_agent": "pkgdoc-image-proxy/1.0",
    "cache_max_age": 86400
  }
}
"#;

/// Get the configuration template for the requested format.
///
/// # Errors
///
/// Returns an error if the requested format is not supported.
pub fn get_template(format: &str) -> Result<&'static str, TemplateError> {
  match format.to_lowercase().as_str() {
    "toml" => Ok(DEFAULT_TOML_TEMPLATE),
    "json" => Ok(DEFAULT_JSON_TEMPLATE),
    _ => Err(TemplateError::UnsupportedFormat(format.to_string())),
  }
}
