//! Allow-list sanitizer and link resolver for rendered README HTML.
//!
//! One document-order walk over the kuchikikiki DOM does everything the
//! browser-facing HTML needs: drops dangerous elements, filters attributes,
//! namespaces ids, resolves and signs URLs and expands emoji shortcodes.
//!
//! Every heading is numbered here through the [`RenderContext`], whether
//! comrak emitted it or the author wrote it as raw HTML. The HTML parser has
//! already joined raw headings split across markdown blocks, so one walk sees
//! all headings in their final document order. Author ids are claimed after
//! the walk, once every heading id is known.
use std::{borrow::Cow, cell::RefCell};

use kuchikikiki::{Attribute, ElementData, ExpandedName, NodeData, NodeRef};
use markup5ever::{LocalName, QualName, local_name, ns};
use tendril::TendrilSink;

use crate::{
  context::RenderContext,
  image_proxy::ImageProxySigner,
  links::UrlResolver,
  processor::hooks::CalloutKind,
  utils::{expand_emoji, url_scheme},
};

/// Elements removed together with their content.
const DROPPED_TAGS: &[&str] = &[
  "applet", "audio", "base", "canvas", "dialog", "embed", "fieldset", "form",
  "frame", "frameset", "head", "iframe", "link", "math", "meta", "noscript",
  "object", "optgroup", "option", "script", "select", "style", "svg",
  "template", "textarea", "title", "video",
];

/// Elements kept as-is. Anything else is unwrapped.
const ALLOWED_TAGS: &[&str] = &[
  "a", "abbr", "b", "bdi", "bdo", "blockquote", "br", "button", "caption",
  "cite", "code", "col", "colgroup", "dd", "del", "details", "dfn", "div",
  "dl", "dt", "em", "figcaption", "figure", "hr", "i", "img", "input", "ins",
  "kbd", "li", "mark", "ol", "p", "picture", "pre", "q", "rp", "rt", "ruby",
  "s", "samp", "section", "small", "source", "span", "strike", "strong",
  "sub", "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead",
  "time", "tr", "tt", "u", "ul", "var", "wbr",
];

const GLOBAL_ATTRS: &[&str] = &[
  "align",
  "aria-hidden",
  "aria-label",
  "class",
  "dir",
  "lang",
  "title",
];

/// Elements syntax highlighting puts inline colours on.
const STYLED_TAGS: &[&str] = &["pre", "code", "span"];

const STYLE_PROPERTIES: &[&str] = &[
  "background-color",
  "color",
  "font-style",
  "font-weight",
  "text-decoration",
];

fn tag_attrs(tag: &str) -> &'static [&'static str] {
  match tag {
    "a" => &["data-footnote-backref", "data-footnote-ref", "name"],
    "button" => &["data-copy", "type"],
    "col" | "colgroup" => &["span", "width"],
    "details" => &["open"],
    "div" => &["data-language"],
    "img" => &["alt", "height", "loading", "width"],
    "input" => &["checked", "type"],
    "li" => &["value"],
    "ol" => &["reversed", "start", "type"],
    "section" => &["data-footnotes"],
    "source" => &["height", "media", "type", "width"],
    "td" | "th" => &["colspan", "rowspan", "valign"],
    "time" => &["datetime"],
    _ => &[],
  }
}

fn heading_level(tag: &str) -> Option<u8> {
  match tag {
    "h1" => Some(1),
    "h2" => Some(2),
    "h3" => Some(3),
    "h4" => Some(4),
    "h5" => Some(5),
    "h6" => Some(6),
    _ => None,
  }
}

/// State of one sanitize walk.
struct Sanitizer<'c, 'r> {
  ctx:           &'c mut RenderContext,
  resolver:      UrlResolver<'r>,
  signer:        Option<&'r ImageProxySigner>,
  code_depth:    usize,
  heading_depth: usize,
  author_ids:    Vec<(NodeRef, String)>,
}

impl Sanitizer<'_, '_> {
  fn walk(&mut self, node: &NodeRef) {
    let children: Vec<_> = node.children().collect();
    for child in children {
      self.visit(&child);
    }
  }

  fn visit(&mut self, node: &NodeRef) {
    match node.data() {
      // Heading text is expanded once the heading is numbered
      NodeData::Text(text) => {
        if self.code_depth == 0 && self.heading_depth == 0 {
          expand_text_emoji(text);
        }
      },
      NodeData::Element(element) => self.visit_element(node, element),
      _ => node.detach(),
    }
  }

  fn visit_element(&mut self, node: &NodeRef, element: &ElementData) {
    let tag = element.name.local.to_ascii_lowercase().to_string();

    if DROPPED_TAGS.contains(&tag.as_str())
      || (tag == "input" && !is_task_checkbox(element))
      || (tag == "button" && !is_copy_button(node, element))
    {
      log::trace!("Dropping <{tag}>");
      node.detach();
      return;
    }

    if let Some(level) = heading_level(&tag) {
      if self.heading_depth > 0 {
        // Nested headings become part of the enclosing one
        self.unwrap(node);
      } else {
        self.visit_heading(node, element, level);
      }
      return;
    }

    if !ALLOWED_TAGS.contains(&tag.as_str()) {
      self.unwrap(node);
      return;
    }

    self.filter_attributes(node, element, &tag);
    match tag.as_str() {
      "a" => mark_external_link(element),
      "input" => {
        element
          .attributes
          .borrow_mut()
          .insert(local_name!("disabled"), String::new());
      },
      _ => {},
    }

    let is_code = matches!(tag.as_str(), "code" | "pre");
    if is_code {
      self.code_depth += 1;
    }
    self.walk(node);
    if is_code {
      self.code_depth -= 1;
    }
  }

  /// Replace an element by its (sanitized) children.
  fn unwrap(&mut self, node: &NodeRef) {
    let children: Vec<_> = node.children().collect();
    for child in &children {
      node.insert_before(child.clone());
    }
    node.detach();
    for child in &children {
      self.visit(child);
    }
  }

  fn visit_heading(
    &mut self,
    node: &NodeRef,
    element: &ElementData,
    raw_level: u8,
  ) {
    self.heading_depth += 1;
    self.walk(node);
    self.heading_depth -= 1;

    // Author `id` and `data-level` are replaced
    let inner = inner_html(node);
    let assignment = self.ctx.record_heading(raw_level, inner.trim());
    expand_heading_emoji(node);

    let mut attrs = vec![
      ("id", assignment.id.clone()),
      ("data-level", raw_level.to_string()),
    ];
    if let Some(align) = element.attributes.borrow().get("align") {
      attrs.push(("align", align.to_string()));
    }

    let heading = new_element(&format!("h{}", assignment.level), attrs);
    let children: Vec<_> = node.children().collect();
    for child in children {
      heading.append(child);
    }
    heading.append(anchor_element(&assignment.id));
    node.insert_before(heading);
    node.detach();
  }

  fn filter_attributes(
    &mut self,
    node: &NodeRef,
    element: &ElementData,
    tag: &str,
  ) {
    let existing: Vec<(String, String)> = element
      .attributes
      .borrow()
      .map
      .iter()
      .filter(|(name, _)| name.ns == ns!())
      .map(|(name, attr)| {
        (name.local.to_ascii_lowercase().to_string(), attr.value.clone())
      })
      .collect();

    let mut kept = Vec::with_capacity(existing.len());

    for (name, value) in existing {
      if name.starts_with("on") {
        continue;
      }
      let value = match name.as_str() {
        "id" => self.defer_id(node, &value),
        "data-callout" if tag == "blockquote" => {
          CalloutKind::from_keyword(&value).map(|kind| kind.to_string())
        },
        "style" if STYLED_TAGS.contains(&tag) => clean_style(&value),
        "href" if tag == "a" => self.link_url(&value),
        "src" if matches!(tag, "img" | "source") => self.image_url(&value),
        "srcset" if matches!(tag, "img" | "source") => {
          let srcset = self
            .resolver
            .resolve_srcset(&value, |candidate| self.image_url(candidate));
          (!srcset.is_empty()).then_some(srcset)
        },
        _ if GLOBAL_ATTRS.contains(&name.as_str())
          || tag_attrs(tag).contains(&name.as_str()) =>
        {
          Some(value)
        },
        _ => None,
      };
      if let Some(value) = value {
        kept.push((name, value));
      }
    }

    let mut attrs = element.attributes.borrow_mut();
    attrs.map.clear();
    for (name, value) in kept {
      attrs.insert(LocalName::from(name), value);
    }
  }

  /// Namespace an author id. It is claimed in [`Self::claim_author_ids`].
  fn defer_id(&mut self, node: &NodeRef, id: &str) -> Option<String> {
    let id = id.trim();
    if id.is_empty() {
      return None;
    }
    let namespaced = self.ctx.namespace_id(id);
    self.author_ids.push((node.clone(), namespaced.clone()));
    Some(namespaced)
  }

  /// Drop author ids taken by a heading or by an earlier element.
  fn claim_author_ids(&mut self) {
    for (node, id) in std::mem::take(&mut self.author_ids) {
      if self.ctx.reserve_id(&id) {
        continue;
      }
      log::trace!("Dropping duplicate id '{id}'");
      if let Some(element) = node.as_element() {
        element.attributes.borrow_mut().remove(local_name!("id"));
      }
    }
  }

  fn link_url(&self, value: &str) -> Option<String> {
    allowed_scheme(value)
      .then(|| self.resolver.resolve(value))
      .filter(|url| !url.is_empty())
  }

  fn image_url(&self, value: &str) -> Option<String> {
    let resolved = self.link_url(value)?;
    Some(match self.signer {
      Some(signer) => signer.proxied_url(&resolved),
      None => resolved,
    })
  }
}

/// `http`, `https`, `mailto` and scheme-less URLs.
fn allowed_scheme(value: &str) -> bool {
  matches!(
    url_scheme(value.trim()).as_deref(),
    None | Some("http" | "https" | "mailto")
  )
}

fn is_external(href: &str) -> bool {
  href.starts_with("//")
    || matches!(url_scheme(href).as_deref(), Some("http" | "https"))
}

/// External links open in a new tab without leaking the referrer.
fn mark_external_link(element: &ElementData) {
  let mut attrs = element.attributes.borrow_mut();
  if attrs.get("href").is_some_and(is_external) {
    attrs.insert(local_name!("rel"), "nofollow noreferrer noopener".into());
    attrs.insert(local_name!("target"), "_blank".into());
  }
}

fn expand_text_emoji(text: &RefCell<String>) {
  let expanded = match expand_emoji(&text.borrow()) {
    Cow::Owned(expanded) => Some(expanded),
    Cow::Borrowed(_) => None,
  };
  if let Some(expanded) = expanded {
    *text.borrow_mut() = expanded;
  }
}

/// Expand emoji in a numbered heading, skipping inline code.
fn expand_heading_emoji(node: &NodeRef) {
  for child in node.children() {
    match child.data() {
      NodeData::Text(text) => expand_text_emoji(text),
      NodeData::Element(element)
        if !matches!(&*element.name.local, "code" | "pre") =>
      {
        expand_heading_emoji(&child);
      },
      _ => {},
    }
  }
}

fn is_task_checkbox(element: &ElementData) -> bool {
  element
    .attributes
    .borrow()
    .get("type")
    .is_some_and(|kind| kind.eq_ignore_ascii_case("checkbox"))
}

fn has_class(element: &ElementData, class: &str) -> bool {
  element
    .attributes
    .borrow()
    .get("class")
    .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

/// The copy button of a rendered code block.
fn is_copy_button(node: &NodeRef, element: &ElementData) -> bool {
  has_class(element, "readme-copy-button")
    && node.parent().is_some_and(|parent| {
      parent.as_element().is_some_and(|parent| {
        parent.name.local == local_name!("div")
          && has_class(parent, "readme-code-block")
      })
    })
}

/// Keep only colour and font declarations.
fn clean_style(style: &str) -> Option<String> {
  let lower = style.to_ascii_lowercase();
  if ["url(", "expression(", "javascript:", "@import", "\\"]
    .iter()
    .any(|needle| lower.contains(needle))
  {
    return None;
  }

  let declarations: Vec<String> = style
    .split(';')
    .filter_map(|declaration| {
      let (property, value) = declaration.split_once(':')?;
      let property = property.trim().to_ascii_lowercase();
      let value = value.trim();
      (STYLE_PROPERTIES.contains(&property.as_str()) && !value.is_empty())
        .then(|| format!("{property}:{value}"))
    })
    .collect();

  (!declarations.is_empty()).then(|| declarations.join(";"))
}

fn new_element(tag: &str, attributes: Vec<(&str, String)>) -> NodeRef {
  NodeRef::new_element(
    QualName::new(None, ns!(html), LocalName::from(tag)),
    attributes.into_iter().map(|(name, value)| {
      (ExpandedName::new("", name), Attribute {
        prefix: None,
        value,
      })
    }),
  )
}

/// The `#` link appended to every heading.
fn anchor_element(id: &str) -> NodeRef {
  let anchor = new_element("a", vec![("href", format!("#{id}"))]);
  anchor.append(new_element("span", vec![
    ("class", "i-lucide:link".to_string()),
    ("aria-hidden", "true".to_string()),
  ]));
  anchor
}

fn serialize_node(node: &NodeRef, out: &mut Vec<u8>) {
  if let Err(e) = node.serialize(out) {
    log::warn!("Failed to serialize HTML node: {e}");
  }
}

fn inner_html(node: &NodeRef) -> String {
  let mut out = Vec::new();
  for child in node.children() {
    serialize_node(&child, &mut out);
  }
  String::from_utf8_lossy(&out).into_owned()
}

/// Sanitize rendered HTML in place and return the parsed document.
///
/// Headings are recorded in `ctx` in document order.
pub fn sanitize_document(
  html: &str,
  ctx: &mut RenderContext,
  resolver: UrlResolver<'_>,
  signer: Option<&ImageProxySigner>,
) -> NodeRef {
  let document = kuchikikiki::parse_html().one(html);

  let mut sanitizer = Sanitizer {
    ctx,
    resolver,
    signer,
    code_depth: 0,
    heading_depth: 0,
    author_ids: Vec::new(),
  };

  match document.select_first("body") {
    Ok(body) => sanitizer.walk(body.as_node()),
    Err(()) => log::warn!("Parsed document has no body"),
  }
  sanitizer.claim_author_ids();

  document
}

/// Serialize the contents of the document's `<body>`.
#[must_use]
pub fn serialize_body(document: &NodeRef) -> String {
  document
    .select_first("body")
    .map(|body| inner_html(body.as_node()))
    .unwrap_or_default()
}

/// Sanitize an HTML fragment with a fresh resolver.
#[must_use]
pub fn sanitize_html(
  html: &str,
  ctx: &mut RenderContext,
  resolver: UrlResolver<'_>,
  signer: Option<&ImageProxySigner>,
) -> String {
  serialize_body(&sanitize_document(html, ctx, resolver, signer))
}
