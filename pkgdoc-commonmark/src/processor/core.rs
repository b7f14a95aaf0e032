//! Core implementation of the README renderer.
//!
//! Pipeline: lazy heading normalization, comrak parse, AST hooks, HTML output,
//! then one sanitizer walk that numbers markdown and raw headings alike in
//! document order while resolving links, and finally playground link
//! extraction.
use comrak::{Arena, options::Options, parse_document};
use log::trace;

use super::{
  hooks::{CalloutTransformer, CodeBlockTransformer, LinkTransformer},
  types::{AstTransformer, ReadmeRenderer, RenderOptions},
};
use crate::{
  context::RenderContext,
  image_proxy::ImageProxySigner,
  links::UrlResolver,
  playground::collect_playground_links,
  preprocess::normalize_lazy_headings,
  sanitize::{sanitize_document, serialize_body},
  syntax::shared_manager,
  types::{RenderRequest, RenderResult, RepositoryInfo},
};

impl ReadmeRenderer {
  /// Create a new renderer with the given options.
  #[must_use]
  pub fn new(options: RenderOptions) -> Self {
    let syntax_manager = if options.highlight_code {
      shared_manager()
    } else {
      None
    };

    Self {
      options,
      syntax_manager,
      signer: None,
    }
  }

  /// Rewrite untrusted images to signed proxy URLs.
  #[must_use]
  pub fn with_image_proxy(mut self, signer: ImageProxySigner) -> Self {
    self.signer = Some(signer);
    self
  }

  /// Access renderer options.
  #[must_use]
  pub const fn options(&self) -> &RenderOptions {
    &self.options
  }

  #[must_use]
  pub const fn image_proxy(&self) -> Option<&ImageProxySigner> {
    self.signer.as_ref()
  }

  /// Fresh per-call context honouring the configured depth settings.
  #[must_use]
  pub fn new_context(&self, release_id: Option<&str>) -> RenderContext {
    RenderContext::new(release_id)
      .with_section_depth(self.options.section_depth)
      .with_heading_offset(self.options.heading_offset)
  }

  /// Render a README or release note to sanitized HTML.
  ///
  /// Missing or blank content yields [`RenderResult::empty`].
  #[must_use]
  pub fn render(&self, request: &RenderRequest<'_>) -> RenderResult {
    let Some(content) = request.content.filter(|c| !c.trim().is_empty())
    else {
      return RenderResult::empty();
    };

    let html = self.render_markdown(content);
    trace!("Markdown pass produced {} bytes", html.len());

    let mut ctx = self.new_context(request.release_id);
    let id_prefix = ctx.id_prefix().to_string();
    let resolver =
      UrlResolver::new(request.package_name, &id_prefix, &self.options.links)
        .with_repository(request.repository);
    let document =
      sanitize_document(&html, &mut ctx, resolver, self.signer.as_ref());
    let playground_links = collect_playground_links(&document);

    RenderResult {
      html: serialize_body(&document),
      toc: ctx.into_toc(),
      playground_links,
      md_exists: true,
    }
  }

  /// Positional form of [`ReadmeRenderer::render`].
  #[must_use]
  pub fn render_content(
    &self,
    content: Option<&str>,
    package_name: &str,
    repository: Option<&RepositoryInfo>,
    release_id: Option<&str>,
  ) -> RenderResult {
    self.render(&RenderRequest {
      content,
      package_name,
      repository,
      release_id,
    })
  }

  /// Markdown to unsanitized HTML.
  ///
  /// Headings come out as plain `<h1>`-`<h6>`; ids and levels are assigned
  /// when the HTML is sanitized.
  #[must_use]
  pub fn render_markdown(&self, content: &str) -> String {
    let content = normalize_lazy_headings(content);
    let arena = Arena::new();
    let options = self.comrak_options();
    let root = parse_document(&arena, &content, &options);

    CodeBlockTransformer {
      syntax_manager: self.syntax_manager.as_deref(),
      theme:          self.options.highlight_theme.as_deref(),
    }
    .transform(root);
    LinkTransformer { options: &options }.transform(root);
    CalloutTransformer { options: &options }.transform(root);

    let mut html = String::new();
    if let Err(e) = comrak::format_html(root, &options, &mut html) {
      log::error!("Failed to format markdown as HTML: {e}");
    }
    html
  }

  /// Build comrak options from `RenderOptions`.
  fn comrak_options(&self) -> Options<'_> {
    let mut options = Options::default();
    if self.options.gfm {
      options.extension.table = true;
      options.extension.footnotes = true;
      options.extension.strikethrough = true;
      options.extension.tasklist = true;
      options.extension.superscript = true;
      options.extension.autolink = true;
    }
    // Raw HTML is kept for the sanitizer
    options.render.r#unsafe = true;
    options.extension.header_id_prefix = None;
    options
  }
}

impl Default for ReadmeRenderer {
  fn default() -> Self {
    Self::new(RenderOptions::default())
  }
}
