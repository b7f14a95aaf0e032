use std::{borrow::Cow, sync::LazyLock};
pub mod codeblock;

use regex::Regex;

/// Error type for utility operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
  #[error("Regex compilation failed: {0}")]
  RegexError(#[from] regex::Error),
}

/// Result type for utility operations.
pub type UtilResult<T> = Result<T, UtilError>;

/// Compile a regex, logging and falling back to a never-matching one on error.
pub(crate) fn compile_regex(name: &str, pattern: &str) -> Regex {
  try_compile_regex(pattern).unwrap_or_else(|e| {
    log::error!(
      "Failed to compile {name} regex: {e}\n Falling back to never matching \
       regex."
    );
    never_matching_regex()
  })
}

fn try_compile_regex(pattern: &str) -> UtilResult<Regex> {
  Ok(Regex::new(pattern)?)
}

/// Slugify heading text GitHub-style for use as an anchor id.
///
/// Lowercases, turns whitespace into dashes, keeps alphanumerics, `-` and `_`,
/// drops everything else and trims leading/trailing dashes. Returns an empty
/// string when nothing survives.
#[must_use]
pub fn slugify(text: &str) -> String {
  let mut slug = String::with_capacity(text.len());
  for c in text.trim().chars() {
    if c.is_alphanumeric() || c == '-' || c == '_' {
      slug.extend(c.to_lowercase());
    } else if c.is_whitespace() {
      slug.push('-');
    }
  }
  slug.trim_matches('-').to_string()
}

/// Remove everything that looks like an HTML tag.
#[must_use]
pub fn strip_html_tags(html: &str) -> Cow<'_, str> {
  static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex("TAG_RE", r"<[^>]*>"));
  TAG_RE.replace_all(html, "")
}

/// Expand `:shortcode:` emoji (e.g. `:rocket:`). Unknown shortcodes are kept.
#[must_use]
pub fn expand_emoji(text: &str) -> Cow<'_, str> {
  static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex("SHORTCODE_RE", r":([a-zA-Z0-9_+\-]+):")
  });

  if !text.contains(':') {
    return Cow::Borrowed(text);
  }

  SHORTCODE_RE.replace_all(text, |caps: &regex::Captures| {
    emojis::get_by_shortcode(&caps[1]).map_or_else(
      || caps[0].to_string(),
      |emoji| emoji.as_str().to_string(),
    )
  })
}

/// Plain text of an HTML fragment: tags stripped, entities decoded, emoji
/// expanded and non-breaking spaces removed.
#[must_use]
pub fn plain_text(html: &str) -> String {
  let stripped = strip_html_tags(html);
  let decoded = html_escape::decode_html_entities(&stripped);
  expand_emoji(&decoded)
    .replace('\u{a0}', "")
    .trim()
    .to_string()
}

/// Whether `text` is a syntactically valid e-mail address.
#[must_use]
pub fn is_email(text: &str) -> bool {
  static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex("EMAIL_RE", r"(?i)^[\w+\-.]+@[\w\-.]+\.[a-z]+$")
  });
  EMAIL_RE.is_match(text)
}

/// Lowercased URL scheme of `value`, if it has one.
///
/// Control characters and whitespace are ignored the way browsers ignore
/// them, so `java\tscript:` is reported as `javascript`.
#[must_use]
pub fn url_scheme(value: &str) -> Option<String> {
  static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex("SCHEME_RE", r"^([a-zA-Z][a-zA-Z0-9+.\-]*):")
  });

  let cleaned: String = value
    .chars()
    .filter(|c| !c.is_control() && !c.is_whitespace())
    .collect();
  SCHEME_RE
    .captures(&cleaned)
    .map(|caps| caps[1].to_ascii_lowercase())
}

/// Create a regex that never matches anything.
///
/// Used as a fallback when a regex fails to compile, so callers degrade to
/// "no match" instead of panicking.
#[must_use]
pub fn never_matching_regex() -> Regex {
  // Asserts something impossible, so the pattern is always valid
  #[allow(clippy::expect_used, reason = "This pattern is guaranteed to be valid")]
  Regex::new(r"[^\s\S]").expect("regex pattern [^\\s\\S] should always compile")
}
