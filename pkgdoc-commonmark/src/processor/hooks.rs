//! Markdown render hooks.
//!
//! Each hook is an [`AstTransformer`] that swaps the nodes it owns for
//! `Raw` nodes holding final markup. Headings are left to comrak: they are
//! numbered by the sanitizer walk together with the author's raw headings.
use std::{fmt, sync::LazyLock};

use comrak::{
  nodes::{AstNode, NodeValue},
  options::Options,
};
use html_escape::encode_double_quoted_attribute;
use regex::Regex;

use super::types::AstTransformer;
use crate::{
  syntax::SyntaxManager,
  utils::{compile_regex, is_email, plain_text},
};

/// GitHub-style callout keywords (`> [!NOTE]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalloutKind {
  Note,
  Tip,
  Important,
  Warning,
  Caution,
}

impl CalloutKind {
  /// Parse a callout keyword, case-insensitively.
  #[must_use]
  pub fn from_keyword(keyword: &str) -> Option<Self> {
    match keyword.to_ascii_uppercase().as_str() {
      "NOTE" => Some(Self::Note),
      "TIP" => Some(Self::Tip),
      "IMPORTANT" => Some(Self::Important),
      "WARNING" => Some(Self::Warning),
      "CAUTION" => Some(Self::Caution),
      _ => None,
    }
  }

  /// Value of the `data-callout` attribute.
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Note => "note",
      Self::Tip => "tip",
      Self::Important => "important",
      Self::Warning => "warning",
      Self::Caution => "caution",
    }
  }
}

impl fmt::Display for CalloutKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Render all children of `node` to HTML.
pub(crate) fn render_children<'a>(
  node: &'a AstNode<'a>,
  options: &Options,
) -> String {
  let mut html = String::new();
  for child in node.children() {
    if let Err(e) = comrak::format_html(child, options, &mut html) {
      log::warn!("Failed to render markdown node: {e}");
    }
  }
  html
}

/// Replace `node` with verbatim HTML, dropping its children.
fn replace_with_html<'a>(node: &'a AstNode<'a>, html: String) {
  let children: Vec<_> = node.children().collect();
  for child in children {
    child.detach();
  }
  node.data.borrow_mut().value = NodeValue::Raw(html);
}

/// Adds `target="_blank"` and a title to links, and unlinks fake `mailto:`
/// links whose text is not an e-mail address.
pub struct LinkTransformer<'o, 'c> {
  pub options: &'o Options<'c>,
}

impl AstTransformer for LinkTransformer<'_, '_> {
  fn transform<'a>(&self, root: &'a AstNode<'a>) {
    let nodes: Vec<_> = root.descendants().collect();
    for node in nodes {
      let link = match &node.data.borrow().value {
        NodeValue::Link(link) => Some((link.url.clone(), link.title.clone())),
        _ => None,
      };
      let Some((url, title)) = link else { continue };

      let inner = render_children(node, self.options);
      replace_with_html(node, link_html(&url, &title, &inner));
    }
  }
}

fn link_html(url: &str, title: &str, inner: &str) -> String {
  let text = plain_text(inner);

  if url.to_ascii_lowercase().starts_with("mailto:") && !is_email(&text) {
    return inner.to_string();
  }

  let title = if title.is_empty() { text.as_str() } else { title };
  let title_attr = if title.is_empty() {
    String::new()
  } else {
    format!(" title=\"{}\"", encode_double_quoted_attribute(title))
  };

  format!(
    "<a href=\"{}\"{title_attr} target=\"_blank\">{inner}</a>",
    encode_double_quoted_attribute(url)
  )
}

/// Renders fenced and indented code blocks inside a copy-button container.
pub struct CodeBlockTransformer<'m> {
  pub syntax_manager: Option<&'m SyntaxManager>,
  pub theme:          Option<&'m str>,
}

impl AstTransformer for CodeBlockTransformer<'_> {
  fn transform<'a>(&self, root: &'a AstNode<'a>) {
    let nodes: Vec<_> = root.descendants().collect();
    for node in nodes {
      let code = match &node.data.borrow().value {
        NodeValue::CodeBlock(block) => {
          Some((block.info.clone(), block.literal.clone()))
        },
        _ => None,
      };
      let Some((info, literal)) = code else { continue };

      let language = fence_language(&info);
      replace_with_html(node, self.render_code(&literal, &language));
    }
  }
}

impl CodeBlockTransformer<'_> {
  fn render_code(&self, code: &str, language: &str) -> String {
    let highlighted = self
      .syntax_manager
      .filter(|_| !language.is_empty())
      .and_then(|manager| {
        manager
          .highlight_code(code, language, self.theme)
          .map_err(|e| log::debug!("Not highlighting '{language}' block: {e}"))
          .ok()
      });

    let body = highlighted.unwrap_or_else(|| plain_code_block(code, language));
    let language_attr = if language.is_empty() {
      String::new()
    } else {
      format!(" data-language=\"{language}\"")
    };

    format!(
      "<div class=\"readme-code-block\"{language_attr}>\n<button \
       type=\"button\" class=\"readme-copy-button\" aria-label=\"Copy code\" \
       data-copy><span class=\"i-carbon:copy\" \
       aria-hidden=\"true\"></span><span class=\"sr-only\">Copy \
       code</span></button>\n{}\n</div>\n",
      body.trim_end()
    )
  }
}

/// First word of a fence info string, restricted to characters that are
/// safe inside a class name.
fn fence_language(info: &str) -> String {
  info
    .split_whitespace()
    .next()
    .unwrap_or_default()
    .trim_start_matches('{')
    .trim_start_matches('.')
    .chars()
    .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#'))
    .collect()
}

fn plain_code_block(code: &str, language: &str) -> String {
  let code = html_escape::encode_text(code);
  if language.is_empty() {
    format!("<pre><code>{code}</code></pre>")
  } else {
    format!("<pre><code class=\"language-{language}\">{code}</code></pre>")
  }
}

static CALLOUT_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_regex(
    "CALLOUT_RE",
    r"(?i)^<p>\[!(NOTE|TIP|IMPORTANT|WARNING|CAUTION)\](?:<br\s*/?>)?\s*",
  )
});

/// Turns `> [!NOTE]` blockquotes into `<blockquote data-callout="note">`.
pub struct CalloutTransformer<'o, 'c> {
  pub options: &'o Options<'c>,
}

impl AstTransformer for CalloutTransformer<'_, '_> {
  fn transform<'a>(&self, root: &'a AstNode<'a>) {
    let quotes: Vec<_> = root
      .descendants()
      .filter(|node| matches!(node.data.borrow().value, NodeValue::BlockQuote))
      .collect();

    // Innermost first so nested callouts are already final
    for node in quotes.into_iter().rev() {
      let body = render_children(node, self.options);
      let Some(caps) = CALLOUT_RE.captures(&body) else {
        continue;
      };
      let (Some(kind), Some(marker)) =
        (CalloutKind::from_keyword(&caps[1]), caps.get(0))
      else {
        continue;
      };

      let rest = format!("<p>{}", &body[marker.end()..]);
      let rest = rest.strip_prefix("<p></p>").map_or(rest.as_str(), str::trim_start);
      let html = format!("<blockquote data-callout=\"{kind}\">\n{rest}</blockquote>\n");
      replace_with_html(node, html);
    }
  }
}
