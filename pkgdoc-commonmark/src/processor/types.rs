//! Type definitions for the README renderer.
//!
//! Contains the configuration (`RenderOptions` and its builder), the renderer
//! itself (`ReadmeRenderer`) and the `AstTransformer` trait implemented by the
//! markdown hooks.
//!
//! # Examples
//!
//! ```
//! use pkgdoc_commonmark::{ReadmeRenderer, RenderOptions};
//!
//! let options = RenderOptions {
//!   highlight_code: false,
//!   ..Default::default()
//! };
//!
//! let renderer = ReadmeRenderer::new(options);
//! ```

use std::sync::Arc;

use comrak::nodes::AstNode;

use crate::{
  context::{DEFAULT_HEADING_OFFSET, DEFAULT_SECTION_DEPTH},
  image_proxy::ImageProxySigner,
  links::LinkOptions,
  syntax::SyntaxManager,
};

/// Options for configuring the renderer.
#[derive(Debug, Clone)]
pub struct RenderOptions {
  /// Enable GitHub Flavored Markdown (tables, task lists, strikethrough,
  /// footnotes, autolinks).
  pub gfm: bool,

  /// Enable syntax highlighting for fenced code blocks.
  pub highlight_code: bool,

  /// Optional: Custom syntax highlighting theme name.
  pub highlight_theme: Option<String>,

  /// Heading level of the page section the document is embedded in.
  pub section_depth: u8,

  /// Levels added to source headings (`#` renders as `<h{1 + offset}>`).
  pub heading_offset: u8,

  /// Link resolution settings.
  pub links: LinkOptions,
}

impl Default for RenderOptions {
  fn default() -> Self {
    Self {
      gfm:             true,
      highlight_code:  cfg!(feature = "syntect"),
      highlight_theme: None,
      section_depth:   DEFAULT_SECTION_DEPTH,
      heading_offset:  DEFAULT_HEADING_OFFSET,
      links:           LinkOptions::default(),
    }
  }
}

/// README and changelog renderer.
///
/// Holds only immutable configuration, so it is `Send + Sync` and can be
/// shared across threads. Every render call gets its own
/// [`RenderContext`](crate::RenderContext).
#[derive(Clone)]
pub struct ReadmeRenderer {
  pub(crate) options:        RenderOptions,
  pub(crate) syntax_manager: Option<Arc<SyntaxManager>>,
  pub(crate) signer:         Option<ImageProxySigner>,
}

/// Trait for AST transformations run between parsing and HTML output.
///
/// Transformers replace the nodes they handle with `Raw` nodes holding the final
/// markup and detach the replaced node's children.
pub trait AstTransformer {
  fn transform<'a>(&self, root: &'a AstNode<'a>);
}

/// Builder for constructing `RenderOptions` with method chaining.
#[derive(Debug, Clone, Default)]
pub struct RenderOptionsBuilder {
  options: RenderOptions,
}

impl RenderOptionsBuilder {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Enable or disable GitHub Flavored Markdown.
  #[must_use]
  pub const fn gfm(mut self, enabled: bool) -> Self {
    self.options.gfm = enabled;
    self
  }

  /// Enable or disable syntax highlighting.
  #[must_use]
  pub const fn highlight_code(mut self, enabled: bool) -> Self {
    self.options.highlight_code = enabled;
    self
  }

  /// Set the syntax highlighting theme.
  #[must_use]
  pub fn highlight_theme<S: Into<String>>(mut self, theme: Option<S>) -> Self {
    self.options.highlight_theme = theme.map(Into::into);
    self
  }

  #[must_use]
  pub const fn section_depth(mut self, depth: u8) -> Self {
    self.options.section_depth = depth;
    self
  }

  #[must_use]
  pub const fn heading_offset(mut self, offset: u8) -> Self {
    self.options.heading_offset = offset;
    self
  }

  /// Base URL of the package CDN used when no repository is known.
  #[must_use]
  pub fn cdn_base<S: Into<String>>(mut self, base: S) -> Self {
    self.options.links.cdn_base = base.into();
    self
  }

  /// Enable or disable rewriting npmjs.com package links to site routes.
  #[must_use]
  pub const fn redirect_npm_links(mut self, enabled: bool) -> Self {
    self.options.links.redirect_npm_links = enabled;
    self
  }

  /// Replace the list of npmjs.com paths that are never rewritten.
  #[must_use]
  pub fn npm_redirect_exceptions(mut self, paths: Vec<String>) -> Self {
    self.options.links.npm_redirect_exceptions = paths;
    self
  }

  /// Build the final `RenderOptions`.
  #[must_use]
  pub fn build(self) -> RenderOptions {
    self.options
  }
}
