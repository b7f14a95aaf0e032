//! Link and image URL resolution against the package's hosting context.
use percent_encoding::percent_decode_str;
use url::Url;

use crate::{
  context::USER_CONTENT_PREFIX,
  types::RepositoryInfo,
  utils::{slugify, url_scheme},
};

/// CDN serving published package files.
pub const DEFAULT_CDN_BASE: &str = "https://cdn.jsdelivr.net/npm";

/// npmjs.com pages that are not package pages and must not be redirected.
pub const DEFAULT_NPM_REDIRECT_EXCEPTIONS: &[&str] = &[
  "/products",
  "/pricing",
  "/features",
  "/enterprise",
  "/signup",
  "/login",
  "/support",
  "/policies",
  "/about",
];

const NPM_HOSTS: &[&str] =
  &["npmjs.com", "www.npmjs.com", "npmjs.org", "www.npmjs.org"];

/// Tunables for link resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOptions {
  /// Base for relative files of packages without repository info.
  pub cdn_base:                String,
  /// Rewrite npmjs.com package links to the site's own routes.
  pub redirect_npm_links:      bool,
  /// npmjs.com paths that are never rewritten.
  pub npm_redirect_exceptions: Vec<String>,
}

impl Default for LinkOptions {
  fn default() -> Self {
    Self {
      cdn_base:                DEFAULT_CDN_BASE.to_string(),
      redirect_npm_links:      true,
      npm_redirect_exceptions: DEFAULT_NPM_REDIRECT_EXCEPTIONS
        .iter()
        .map(ToString::to_string)
        .collect(),
    }
  }
}

/// Resolves `href`, `src` and `srcset` values of one render call.
#[derive(Debug, Clone, Copy)]
pub struct UrlResolver<'a> {
  repository:   Option<&'a RepositoryInfo>,
  package_name: &'a str,
  id_prefix:    &'a str,
  options:      &'a LinkOptions,
}

impl<'a> UrlResolver<'a> {
  #[must_use]
  pub const fn new(
    package_name: &'a str,
    id_prefix: &'a str,
    options: &'a LinkOptions,
  ) -> Self {
    Self {
      repository: None,
      package_name,
      id_prefix,
      options,
    }
  }

  #[must_use]
  pub const fn with_repository(
    mut self,
    repository: Option<&'a RepositoryInfo>,
  ) -> Self {
    self.repository = repository;
    self
  }

  /// Resolve one URL.
  ///
  /// Fragments are namespaced, absolute URLs pass through (npmjs.com package
  /// links become site-relative), and everything else is resolved against
  /// the repository or the package CDN. Scheme filtering is left to the
  /// sanitizer.
  #[must_use]
  pub fn resolve(&self, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
      return String::new();
    }

    if let Some(fragment) = value.strip_prefix('#') {
      return self.resolve_fragment(value, fragment);
    }

    if value.starts_with("//") {
      return value.to_string();
    }

    match url_scheme(value).as_deref() {
      Some("http" | "https") => {
        if let Ok(parsed) = Url::parse(value) {
          return self
            .redirect_npm(&parsed)
            .unwrap_or_else(|| value.to_string());
        }
        log::debug!("Unparseable absolute URL treated as relative: {value}");
      },
      Some("mailto") => return value.to_string(),
      _ => {},
    }

    self.resolve_relative(value)
  }

  /// Resolve every candidate of a `srcset`.
  ///
  /// `map` sees each raw candidate URL and returns its final form, or `None`
  /// to drop the candidate.
  pub fn resolve_srcset<F>(&self, srcset: &str, mut map: F) -> String
  where
    F: FnMut(&str) -> Option<String>,
  {
    srcset
      .split(',')
      .filter_map(|entry| {
        let mut parts = entry.split_whitespace();
        let resolved = map(parts.next()?)?;
        Some(match parts.next() {
          Some(descriptor) => format!("{resolved} {descriptor}"),
          None => resolved,
        })
      })
      .collect::<Vec<_>>()
      .join(", ")
  }

  fn resolve_fragment(&self, value: &str, fragment: &str) -> String {
    if fragment.is_empty() || fragment.starts_with(USER_CONTENT_PREFIX) {
      return value.to_string();
    }

    let decoded = percent_decode_str(fragment).decode_utf8_lossy();
    let slug = slugify(&decoded);
    if slug.is_empty() {
      return value.to_string();
    }
    format!("#{}-{slug}", self.id_prefix)
  }

  fn redirect_npm(&self, url: &Url) -> Option<String> {
    if !self.options.redirect_npm_links {
      return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    if !NPM_HOSTS.contains(&host.as_str()) {
      return None;
    }

    let path = url.path();
    let excepted = self.options.npm_redirect_exceptions.iter().any(|e| {
      path == e
        || path
          .strip_prefix(e.as_str())
          .is_some_and(|rest| rest.starts_with('/'))
    });
    if excepted {
      return None;
    }

    let redirectable = path.starts_with("/package/")
      || path.starts_with("/org/")
      || path.starts_with("/~")
      || (path == "/search" && url.query_pairs().any(|(key, _)| key == "q"));
    if !redirectable {
      return None;
    }

    let mut local = path.to_string();
    if let Some(query) = url.query() {
      local.push('?');
      local.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
      local.push('#');
      local.push_str(fragment);
    }
    Some(local)
  }

  fn resolve_relative(&self, value: &str) -> String {
    let Some(repository) = self.repository else {
      // Nothing renders markdown files of packages without a repository
      if is_markdown_path(value) {
        return value.to_string();
      }
      let base = format!(
        "{}/{}",
        self.options.cdn_base.trim_end_matches('/'),
        self.package_name
      );
      return join_within(&base, None, value);
    };

    let base = if is_markdown_path(value) {
      &repository.blob_base_url
    } else {
      &repository.raw_base_url
    };
    join_within(base, repository.directory.as_deref(), value)
  }
}

/// Whether the path part of `value` ends in `.md`, case-insensitively.
#[must_use]
pub fn is_markdown_path(value: &str) -> bool {
  let path = value.split(['?', '#']).next().unwrap_or_default();
  path.len() >= 3
    && path
      .get(path.len() - 3..)
      .is_some_and(|ext| ext.eq_ignore_ascii_case(".md"))
}

/// Join `value` onto `base` (and `directory`), refusing to leave `base`.
///
/// A leading `/` resolves from `base` itself. On escape or parse failure the
/// bare base is returned.
fn join_within(base: &str, directory: Option<&str>, value: &str) -> String {
  let base = base.trim_end_matches('/');
  let Ok(base_url) = Url::parse(&format!("{base}/")) else {
    log::warn!("Invalid base URL: {base}");
    return base.to_string();
  };
  let normalized_base = base_url.as_str().trim_end_matches('/').to_string();

  let resolved = if value.starts_with('/') {
    Url::parse(&format!("{normalized_base}{value}"))
  } else {
    let dir_url = match directory {
      Some(dir) => base_url.join(&format!("{}/", dir.trim_matches('/'))),
      None => Ok(base_url),
    };
    dir_url.and_then(|dir_url| dir_url.join(value))
  };

  match resolved {
    Ok(url) if stays_within(url.as_str(), &normalized_base) => url.into(),
    Ok(url) => {
      log::debug!("Link {value} escapes {normalized_base} (got {url})");
      normalized_base
    },
    Err(e) => {
      log::debug!("Failed to resolve {value} against {normalized_base}: {e}");
      normalized_base
    },
  }
}

fn stays_within(resolved: &str, base: &str) -> bool {
  resolved.strip_prefix(base).is_some_and(|rest| {
    rest.is_empty()
      || rest.starts_with('/')
      || rest.starts_with('?')
      || rest.starts_with('#')
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::RepositoryProvider;

  fn github() -> RepositoryInfo {
    RepositoryInfo::new(RepositoryProvider::GitHub, "test-owner", "test-repo")
      .expect("github has a known layout")
  }

  fn resolve_with(repo: Option<&RepositoryInfo>, value: &str) -> String {
    let options = LinkOptions::default();
    UrlResolver::new("test-pkg", "user-content", &options)
      .with_repository(repo)
      .resolve(value)
  }

  #[test]
  fn test_markdown_links_use_blob_base() {
    let repo = github();
    assert_eq!(
      resolve_with(Some(&repo), "./CONTRIBUTING.md"),
      "https://github.com/test-owner/test-repo/blob/HEAD/CONTRIBUTING.md"
    );
    assert_eq!(
      resolve_with(Some(&repo), "docs/GUIDE.MD?ref=main#setup"),
      "https://github.com/test-owner/test-repo/blob/HEAD/docs/GUIDE.MD?ref=main#setup"
    );
  }

  #[test]
  fn test_other_files_use_raw_base() {
    let repo = github();
    assert_eq!(
      resolve_with(Some(&repo), "./assets/logo.png"),
      "https://raw.githubusercontent.com/test-owner/test-repo/HEAD/assets/logo.png"
    );
    assert_eq!(
      resolve_with(Some(&repo), "/LICENSE"),
      "https://raw.githubusercontent.com/test-owner/test-repo/HEAD/LICENSE"
    );
  }

  #[test]
  fn test_monorepo_directory_and_parent_navigation() {
    let repo = github().in_directory("packages/core");
    assert_eq!(
      resolve_with(Some(&repo), "./README.md"),
      "https://github.com/test-owner/test-repo/blob/HEAD/packages/core/README.md"
    );
    assert_eq!(
      resolve_with(Some(&repo), "../../CONTRIBUTING.md"),
      "https://github.com/test-owner/test-repo/blob/HEAD/CONTRIBUTING.md"
    );
  }

  #[test]
  fn test_traversal_falls_back_to_base() {
    let repo = github();
    assert_eq!(
      resolve_with(Some(&repo), "../../../../etc/passwd"),
      "https://raw.githubusercontent.com/test-owner/test-repo/HEAD"
    );
    assert_eq!(
      resolve_with(Some(&repo), "javascript:alert(1)"),
      "https://raw.githubusercontent.com/test-owner/test-repo/HEAD"
    );
  }

  #[test]
  fn test_without_repository() {
    assert_eq!(resolve_with(None, "./CONTRIBUTING.md"), "./CONTRIBUTING.md");
    assert_eq!(
      resolve_with(None, "./schema.json"),
      "https://cdn.jsdelivr.net/npm/test-pkg/schema.json"
    );
    assert_eq!(
      resolve_with(None, "../../other-pkg/index.js"),
      "https://cdn.jsdelivr.net/npm/test-pkg"
    );
  }

  #[test]
  fn test_absolute_urls_pass_through() {
    let repo = github();
    for url in [
      "https://example.com/docs/guide.md",
      "https://example.com/image.png",
      "//cdn.example.com/a.png",
      "mailto:someone@example.com",
    ] {
      assert_eq!(resolve_with(Some(&repo), url), url);
    }
  }

  #[test]
  fn test_fragments() {
    assert_eq!(resolve_with(None, "#installation"), "#user-content-installation");
    assert_eq!(resolve_with(None, "#Getting%20Started"), "#user-content-getting-started");
    assert_eq!(resolve_with(None, "#user-content-x"), "#user-content-x");
    assert_eq!(resolve_with(None, "#"), "#");
  }

  #[test]
  fn test_npm_redirects() {
    assert_eq!(
      resolve_with(None, "https://www.npmjs.com/package/test-pkg"),
      "/package/test-pkg"
    );
    assert_eq!(
      resolve_with(None, "http://npmjs.org/package/@scope/pkg?activeTab=readme"),
      "/package/@scope/pkg?activeTab=readme"
    );
    assert_eq!(resolve_with(None, "https://www.npmjs.com/~someone"), "/~someone");
    assert_eq!(
      resolve_with(None, "https://www.npmjs.com/search?q=markdown"),
      "/search?q=markdown"
    );
    assert_eq!(
      resolve_with(None, "https://www.npmjs.com/products"),
      "https://www.npmjs.com/products"
    );
    assert_eq!(
      resolve_with(None, "https://docs.npmjs.com/cli"),
      "https://docs.npmjs.com/cli"
    );
  }

  #[test]
  fn test_npm_exception_list_wins() {
    let options = LinkOptions {
      npm_redirect_exceptions: vec!["/package/internal".to_string()],
      ..LinkOptions::default()
    };
    let resolver = UrlResolver::new("test-pkg", "user-content", &options);
    assert_eq!(
      resolver.resolve("https://www.npmjs.com/package/internal"),
      "https://www.npmjs.com/package/internal"
    );
    assert_eq!(
      resolver.resolve("https://www.npmjs.com/package/internal-tools"),
      "/package/internal-tools"
    );
  }

  #[test]
  fn test_srcset() {
    let repo = github();
    let options = LinkOptions::default();
    let resolver = UrlResolver::new("test-pkg", "user-content", &options)
      .with_repository(Some(&repo));
    assert_eq!(
      resolver.resolve_srcset("a.png 1x, b.png 2x, javascript:x 3x", |url| {
        (!url.starts_with("javascript:")).then(|| resolver.resolve(url))
      }),
      "https://raw.githubusercontent.com/test-owner/test-repo/HEAD/a.png 1x, \
       https://raw.githubusercontent.com/test-owner/test-repo/HEAD/b.png 2x"
    );
  }

  #[test]
  fn test_is_markdown_path() {
    assert!(is_markdown_path("README.md"));
    assert!(is_markdown_path("docs/a.MD#x"));
    assert!(!is_markdown_path("a.mdx"));
    assert!(!is_markdown_path("md"));
  }
}
