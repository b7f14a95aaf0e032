use pkgdoc_commonmark::{
  LinkOptions,
  RenderOptions,
  context::{DEFAULT_HEADING_OFFSET, DEFAULT_SECTION_DEPTH},
  links::{DEFAULT_CDN_BASE, DEFAULT_NPM_REDIRECT_EXCEPTIONS},
};
use serde::{Deserialize, Serialize};

use crate::{
  config::{parse_bool, parse_number},
  error::ConfigError,
};

/// Configuration for README rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
  /// Heading level of the page section the README is embedded in
  pub section_depth: u8,

  /// Levels added to source headings (`#` becomes `<h3>` with the default 2)
  pub heading_offset: u8,

  /// CDN used for relative files of packages without a repository
  pub cdn_base: String,

  /// Whether to syntax highlight fenced code blocks
  pub highlight_code: bool,

  /// Syntax highlighting theme
  #[serde(skip_serializing_if = "Option::is_none")]
  pub highlight_theme: Option<String>,

  /// Rewrite npmjs.com package links to site routes
  pub redirect_npm_links: bool,

  /// npmjs.com paths that are never rewritten
  pub npm_redirect_exceptions: Vec<String>,
}

impl Default for RenderConfig {
  fn default() -> Self {
    Self {
      section_depth:           DEFAULT_SECTION_DEPTH,
      heading_offset:          DEFAULT_HEADING_OFFSET,
      cdn_base:                DEFAULT_CDN_BASE.to_string(),
      highlight_code:          true,
      highlight_theme:         None,
      redirect_npm_links:      true,
      npm_redirect_exceptions: DEFAULT_NPM_REDIRECT_EXCEPTIONS
        .iter()
        .map(ToString::to_string)
        .collect(),
    }
  }
}

impl RenderConfig {
  /// Renderer options described by this section.
  #[must_use]
  pub fn render_options(&self) -> RenderOptions {
    RenderOptions {
      gfm:             true,
      highlight_code:  self.highlight_code,
      highlight_theme: self.highlight_theme.clone(),
      section_depth:   self.section_depth,
      heading_offset:  self.heading_offset,
      links:           LinkOptions {
        cdn_base:                self.cdn_base.clone(),
        redirect_npm_links:      self.redirect_npm_links,
        npm_redirect_exceptions: self.npm_redirect_exceptions.clone(),
      },
    }
  }

  /// Set one `render.*` key. Returns `false` for unknown keys.
  pub(crate) fn apply_override(
    &mut self,
    key: &str,
    value: &str,
  ) -> Result<bool, ConfigError> {
    match key {
      "section_depth" => self.section_depth = parse_number(key, value)?,
      "heading_offset" => self.heading_offset = parse_number(key, value)?,
      "cdn_base" => self.cdn_base = value.to_string(),
      "highlight_code" => self.highlight_code = parse_bool(key, value)?,
      "highlight_theme" => {
        self.highlight_theme = (!value.is_empty()).then(|| value.to_string());
      },
      "redirect_npm_links" => self.redirect_npm_links = parse_bool(key, value)?,
      "npm_redirect_exceptions" => {
        self.npm_redirect_exceptions = value
          .split(',')
          .map(str::trim)
          .filter(|path| !path.is_empty())
          .map(ToString::to_string)
          .collect();
      },
      _ => return Ok(false),
    }
    Ok(true)
  }
}
