//! Types for pkgdoc-commonmark public API and internal use.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Source hosting provider of a package repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryProvider {
  GitHub,
  GitLab,
  Bitbucket,
  Codeberg,
  Gitee,
  Sourcehut,
  /// Self-hosted or unknown forge. Base URLs must be supplied explicitly.
  Other,
}

impl RepositoryProvider {
  /// Parse a provider name as used in configuration and on the command line.
  #[must_use]
  pub fn from_name(name: &str) -> Option<Self> {
    match name.to_ascii_lowercase().as_str() {
      "github" => Some(Self::GitHub),
      "gitlab" => Some(Self::GitLab),
      "bitbucket" => Some(Self::Bitbucket),
      "codeberg" => Some(Self::Codeberg),
      "gitee" => Some(Self::Gitee),
      "sourcehut" | "srht" => Some(Self::Sourcehut),
      "other" => Some(Self::Other),
      _ => None,
    }
  }

  /// `(raw, blob)` base URLs for a repository on this provider, pinned to
  /// `HEAD`.
  ///
  /// Returns `None` for [`RepositoryProvider::Other`].
  #[must_use]
  pub fn base_urls(self, owner: &str, repo: &str) -> Option<(String, String)> {
    let urls = match self {
      Self::GitHub => {
        (
          format!("https://raw.githubusercontent.com/{owner}/{repo}/HEAD"),
          format!("https://github.com/{owner}/{repo}/blob/HEAD"),
        )
      },
      Self::GitLab => {
        (
          format!("https://gitlab.com/{owner}/{repo}/-/raw/HEAD"),
          format!("https://gitlab.com/{owner}/{repo}/-/blob/HEAD"),
        )
      },
      Self::Bitbucket => {
        (
          format!("https://bitbucket.org/{owner}/{repo}/raw/HEAD"),
          format!("https://bitbucket.org/{owner}/{repo}/src/HEAD"),
        )
      },
      Self::Codeberg => {
        (
          format!("https://codeberg.org/{owner}/{repo}/raw/branch/HEAD"),
          format!("https://codeberg.org/{owner}/{repo}/src/branch/HEAD"),
        )
      },
      Self::Gitee => {
        (
          format!("https://gitee.com/{owner}/{repo}/raw/HEAD"),
          format!("https://gitee.com/{owner}/{repo}/blob/HEAD"),
        )
      },
      Self::Sourcehut => {
        (
          format!("https://git.sr.ht/~{owner}/{repo}/blob/HEAD"),
          format!("https://git.sr.ht/~{owner}/{repo}/tree/HEAD/item"),
        )
      },
      Self::Other => return None,
    };
    Some(urls)
  }
}

impl fmt::Display for RepositoryProvider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::GitHub => "github",
      Self::GitLab => "gitlab",
      Self::Bitbucket => "bitbucket",
      Self::Codeberg => "codeberg",
      Self::Gitee => "gitee",
      Self::Sourcehut => "sourcehut",
      Self::Other => "other",
    };
    f.write_str(name)
  }
}

/// Hosting context used to resolve relative links and images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
  pub provider:      RepositoryProvider,
  pub owner:         String,
  pub repo:          String,
  /// Base for raw file contents, e.g.
  /// `https://raw.githubusercontent.com/owner/repo/HEAD`.
  pub raw_base_url:  String,
  /// Base for rendered file views, e.g.
  /// `https://github.com/owner/repo/blob/HEAD`.
  pub blob_base_url: String,
  /// Package root inside a monorepo, e.g. `packages/core`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub directory:     Option<String>,
}

impl RepositoryInfo {
  /// Build repository info with the provider's default base URLs.
  ///
  /// Returns `None` for [`RepositoryProvider::Other`], which has no known
  /// URL layout; use [`RepositoryInfo::with_base_urls`] instead.
  #[must_use]
  pub fn new(provider: RepositoryProvider, owner: &str, repo: &str) -> Option<Self> {
    let (raw_base_url, blob_base_url) = provider.base_urls(owner, repo)?;
    Some(Self {
      provider,
      owner: owner.to_string(),
      repo: repo.to_string(),
      raw_base_url,
      blob_base_url,
      directory: None,
    })
  }

  /// Build repository info from explicit base URLs.
  #[must_use]
  pub fn with_base_urls(
    provider: RepositoryProvider,
    owner: &str,
    repo: &str,
    raw_base_url: &str,
    blob_base_url: &str,
  ) -> Self {
    Self {
      provider,
      owner: owner.to_string(),
      repo: repo.to_string(),
      raw_base_url: raw_base_url.trim_end_matches('/').to_string(),
      blob_base_url: blob_base_url.trim_end_matches('/').to_string(),
      directory: None,
    }
  }

  /// Set the monorepo directory the package lives in.
  #[must_use]
  pub fn in_directory<S: Into<String>>(mut self, directory: S) -> Self {
    let directory = directory.into();
    let trimmed = directory.trim_matches('/');
    self.directory = (!trimmed.is_empty()).then(|| trimmed.to_string());
    self
  }
}

/// One table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocItem {
  /// Plain heading text, tags stripped and emoji shortcodes expanded.
  pub text:  String,
  /// Namespaced, document-unique anchor id.
  pub id:    String,
  /// Source heading level (1-6), before semantic re-levelling.
  pub depth: u8,
}

/// Interactive playground sites recognised in README links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaygroundProvider {
  StackBlitz,
  CodeSandbox,
  CodePen,
  Replit,
  Gitpod,
}

impl PlaygroundProvider {
  pub const ALL: [Self; 5] = [
    Self::StackBlitz,
    Self::CodeSandbox,
    Self::CodePen,
    Self::Replit,
    Self::Gitpod,
  ];

  /// Human readable provider name.
  #[must_use]
  pub const fn name(self) -> &'static str {
    match self {
      Self::StackBlitz => "StackBlitz",
      Self::CodeSandbox => "CodeSandbox",
      Self::CodePen => "CodePen",
      Self::Replit => "Replit",
      Self::Gitpod => "Gitpod",
    }
  }

  /// Hosts served by this provider. Subdomains match as well.
  #[must_use]
  pub const fn domains(self) -> &'static [&'static str] {
    match self {
      Self::StackBlitz => &["stackblitz.com"],
      Self::CodeSandbox => &["codesandbox.io", "githubbox.com"],
      Self::CodePen => &["codepen.io"],
      Self::Replit => &["replit.com"],
      Self::Gitpod => &["gitpod.io"],
    }
  }

  /// Find the provider serving `host`.
  #[must_use]
  pub fn from_host(host: &str) -> Option<Self> {
    let host = host.to_ascii_lowercase();
    Self::ALL.into_iter().find(|provider| {
      provider.domains().iter().any(|domain| {
        host == *domain
          || host
            .strip_suffix(domain)
            .is_some_and(|rest| rest.ends_with('.'))
      })
    })
  }
}

/// A detected "open in playground" link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundLink {
  pub provider:      PlaygroundProvider,
  pub provider_name: String,
  pub label:         String,
  pub url:           String,
}

/// Result of rendering one README or release note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
  /// Sanitized HTML.
  pub html:             String,
  /// Headings in document order.
  pub toc:              Vec<TocItem>,
  /// Playground links in first-occurrence order.
  pub playground_links: Vec<PlaygroundLink>,
  /// Whether there was any markdown to render.
  pub md_exists:        bool,
}

impl RenderResult {
  /// The result returned for missing or empty content.
  #[must_use]
  pub fn empty() -> Self {
    Self::default()
  }
}

/// One render call.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
  pub content:      Option<&'a str>,
  pub package_name: &'a str,
  pub repository:   Option<&'a RepositoryInfo>,
  pub release_id:   Option<&'a str>,
}

impl<'a> RenderRequest<'a> {
  #[must_use]
  pub const fn new(content: Option<&'a str>, package_name: &'a str) -> Self {
    Self {
      content,
      package_name,
      repository: None,
      release_id: None,
    }
  }

  /// Resolve relative links against this repository.
  #[must_use]
  pub const fn repository(mut self, repository: &'a RepositoryInfo) -> Self {
    self.repository = Some(repository);
    self
  }

  /// Scope heading ids to one release (changelog rendering).
  #[must_use]
  pub const fn release(mut self, release_id: &'a str) -> Self {
    self.release_id = Some(release_id);
    self
  }
}
