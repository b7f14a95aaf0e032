//! # pkgdoc-commonmark - safe README and changelog rendering
//!
//! Renders untrusted package READMEs and release notes (CommonMark with GitHub
//! extensions and embedded raw HTML) into sanitized HTML for a package
//! browsing site, together with a table of contents and the "open in
//! playground" links found in the document.
//!
//! ## Quick Start
//!
//! ```rust
//! use pkgdoc_commonmark::{ReadmeRenderer, RenderOptions, RenderRequest};
//!
//! let renderer = ReadmeRenderer::new(RenderOptions::default());
//! let result =
//!   renderer.render(&RenderRequest::new(Some("# Hello\n\n<h2>World</h2>"), "hello"));
//!
//! assert_eq!(result.toc.len(), 2);
//! assert_eq!(result.toc[0].id, "user-content-hello");
//! assert_eq!(result.toc[1].id, "user-content-world");
//! ```
//!
//! ## Features
//!
//! - **One heading order** for markdown headings and raw `<h1>`-`<h6>` tags:
//!   levels never skip, ids are namespaced and deduplicated in document order
//! - **Allow-list sanitizer** that drops scripts, handlers and unsafe schemes
//! - **Link resolution** against GitHub, GitLab and other forges, monorepo
//!   directories, or the package CDN
//! - **Signed image proxy URLs** so visitors never contact third-party hosts
//! - **Syntax highlighting** via syntect (feature `syntect`)
//!
//! ## Image proxy
//!
//! ```rust
//! use pkgdoc_commonmark::{ImageProxySigner, ReadmeRenderer, RenderOptions, RenderRequest};
//!
//! let signer = ImageProxySigner::new("secret").expect("non-empty secret");
//! let renderer = ReadmeRenderer::new(RenderOptions::default()).with_image_proxy(signer);
//! let result = renderer.render(&RenderRequest::new(
//!   Some("![x](https://example.com/x.png)"),
//!   "pkg",
//! ));
//! assert!(result.html.contains("/image-proxy?url=https%3A%2F%2Fexample.com%2Fx.png"));
//! ```

pub mod context;
pub mod image_proxy;
pub mod links;
pub mod playground;
pub mod preprocess;
pub mod processor;
pub mod sanitize;
pub mod syntax;
mod types;
pub mod utils;

pub use crate::{
  context::{HeadingAssignment, RenderContext},
  image_proxy::{ImageProxySigner, ProxyError, is_allowed_image_url},
  links::{LinkOptions, UrlResolver},
  playground::{collect_playground_links, extract_playground_links},
  preprocess::normalize_lazy_headings,
  processor::{
    CalloutKind,
    ReadmeRenderer,
    RenderOptions,
    RenderOptionsBuilder,
    process_with_recovery,
  },
  types::{
    PlaygroundLink,
    PlaygroundProvider,
    RenderRequest,
    RenderResult,
    RepositoryInfo,
    RepositoryProvider,
    TocItem,
  },
};
