//! Per-render heading state shared by the markdown and raw HTML passes.
//!
//! Markdown and raw HTML headings both go through
//! [`RenderContext::record_heading`] during the sanitizer walk, so slug
//! numbering, semantic depth and TOC order follow a single document order no
//! matter which syntax a heading was written in.
use std::collections::{HashMap, HashSet};

use crate::{
  types::TocItem,
  utils::{plain_text, slugify, strip_html_tags},
};

/// Prefix for every id generated from author content.
pub const USER_CONTENT_PREFIX: &str = "user-content";

/// Heading depth the host page already uses for the README section.
pub const DEFAULT_SECTION_DEPTH: u8 = 2;

/// Levels added to a source heading before clamping (`#` becomes `<h3>`).
pub const DEFAULT_HEADING_OFFSET: u8 = 2;

const FALLBACK_SLUG: &str = "heading";

/// Heading state of one render call.
#[derive(Debug, Clone)]
pub struct RenderContext {
  id_prefix:      String,
  slug_counts:    HashMap<String, usize>,
  issued_ids:     HashSet<String>,
  reserved_ids:   HashSet<String>,
  last_depth:     u8,
  heading_offset: u8,
  toc:            Vec<TocItem>,
}

/// Outcome of recording one heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingAssignment {
  /// Namespaced, document-unique id.
  pub id:    String,
  /// Semantic level to emit (`<h{level}>`).
  pub level: u8,
}

impl RenderContext {
  /// Fresh context for a README (`user-content`) or a release
  /// (`user-content-{release}`).
  #[must_use]
  pub fn new(release_id: Option<&str>) -> Self {
    let id_prefix = match release_id.map(str::trim) {
      Some(release) if !release.is_empty() => {
        format!("{USER_CONTENT_PREFIX}-{release}")
      },
      _ => USER_CONTENT_PREFIX.to_string(),
    };

    Self {
      id_prefix,
      slug_counts: HashMap::new(),
      issued_ids: HashSet::new(),
      reserved_ids: HashSet::new(),
      last_depth: DEFAULT_SECTION_DEPTH,
      heading_offset: DEFAULT_HEADING_OFFSET,
      toc: Vec::new(),
    }
  }

  /// Depth of the section the rendered document is embedded in.
  #[must_use]
  pub fn with_section_depth(mut self, depth: u8) -> Self {
    self.last_depth = depth.clamp(1, 6);
    self
  }

  /// Levels added to source headings before clamping.
  #[must_use]
  pub fn with_heading_offset(mut self, offset: u8) -> Self {
    self.heading_offset = offset.min(5);
    self
  }

  #[must_use]
  pub fn id_prefix(&self) -> &str {
    &self.id_prefix
  }

  /// Headings recorded so far, in document order.
  #[must_use]
  pub fn toc(&self) -> &[TocItem] {
    &self.toc
  }

  #[must_use]
  pub fn into_toc(self) -> Vec<TocItem> {
    self.toc
  }

  /// Semantic level for a heading of source level `raw_depth`.
  ///
  /// The target is `raw_depth + offset` capped at 6, but never more than one
  /// level below the previous heading.
  pub fn assign_depth(&mut self, raw_depth: u8) -> u8 {
    let target = raw_depth.saturating_add(self.heading_offset).min(6);
    let assigned = target.min(self.last_depth.saturating_add(1)).max(1);
    self.last_depth = assigned;
    assigned
  }

  /// Reserve a unique slug: `base`, then `base-1`, `base-2`, ...
  pub fn allocate_slug(&mut self, base: &str) -> String {
    let base = if base.is_empty() { FALLBACK_SLUG } else { base };
    let count = self.slug_counts.entry(base.to_string()).or_insert(0);
    let slug = if *count == 0 {
      base.to_string()
    } else {
      format!("{base}-{count}")
    };
    *count += 1;
    slug
  }

  /// Claim a non-heading id so later headings do not reuse it.
  ///
  /// Returns `false` if the id is already taken by a heading or an earlier
  /// claim.
  pub fn reserve_id(&mut self, id: &str) -> bool {
    !self.issued_ids.contains(id) && self.reserved_ids.insert(id.to_string())
  }

  /// Namespace an author-provided id. Already namespaced ids are kept.
  #[must_use]
  pub fn namespace_id(&self, id: &str) -> String {
    if id.starts_with(USER_CONTENT_PREFIX) {
      return id.to_string();
    }
    let slug = slugify(id);
    let slug = if slug.is_empty() { FALLBACK_SLUG } else { &slug };
    format!("{}-{slug}", self.id_prefix)
  }

  /// Record a heading with rendered inner HTML `inner_html`.
  ///
  /// Assigns its semantic level, allocates its id and appends it to the TOC.
  /// Must be called exactly once per heading, in document order.
  pub fn record_heading(
    &mut self,
    raw_depth: u8,
    inner_html: &str,
  ) -> HeadingAssignment {
    let raw_depth = raw_depth.clamp(1, 6);
    let level = self.assign_depth(raw_depth);

    // Slugs come from the literal text, so `:rocket:` stays `rocket`
    let slug_source =
      html_escape::decode_html_entities(&strip_html_tags(inner_html))
        .replace('\u{a0}', " ");
    let base = slugify(&slug_source);
    let id = loop {
      let slug = self.allocate_slug(&base);
      let id = format!("{}-{slug}", self.id_prefix);
      if !self.reserved_ids.contains(&id) {
        break id;
      }
    };
    self.issued_ids.insert(id.clone());

    let text = plain_text(inner_html);
    log::trace!("Heading h{raw_depth} -> h{level} #{id}");
    self.toc.push(TocItem {
      text,
      id: id.clone(),
      depth: raw_depth,
    });

    HeadingAssignment { id, level }
  }
}

impl Default for RenderContext {
  fn default() -> Self {
    Self::new(None)
  }
}
