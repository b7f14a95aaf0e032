//! Core types and traits for syntax highlighting.

use std::collections::HashMap;

use super::error::{SyntaxError, SyntaxResult};

/// Trait for syntax highlighting backends.
///
/// Implementations return a complete `<pre>` block of highlighted HTML. The
/// output still goes through the sanitizer, so only inline `color`,
/// `background-color`, `font-weight`, `font-style` and `text-decoration`
/// styles survive.
pub trait SyntaxHighlighter: Send + Sync {
  /// Get the name of this highlighter backend
  fn name(&self) -> &'static str;

  /// Whether `language` (already alias-resolved) has a grammar.
  fn supports_language(&self, language: &str) -> bool;

  /// Highlight code with the specified language and theme.
  fn highlight(
    &self,
    code: &str,
    language: &str,
    theme: Option<&str>,
  ) -> SyntaxResult<String>;
}

/// Configuration for syntax highlighting
#[derive(Debug, Clone)]
pub struct SyntaxConfig {
  /// Default theme to use when none is specified
  pub default_theme: Option<String>,

  /// Fence info strings commonly seen in READMEs, mapped to grammar names
  pub language_aliases: HashMap<String, String>,
}

impl Default for SyntaxConfig {
  fn default() -> Self {
    let aliases = [
      ("js", "javascript"),
      ("mjs", "javascript"),
      ("cjs", "javascript"),
      ("jsx", "javascript"),
      ("ts", "typescript"),
      ("mts", "typescript"),
      ("tsx", "typescript"),
      ("py", "python"),
      ("rb", "ruby"),
      ("sh", "bash"),
      ("shell", "bash"),
      ("zsh", "bash"),
      ("console", "bash"),
      ("yml", "yaml"),
      ("jsonc", "json"),
      ("json5", "json"),
      ("md", "markdown"),
    ];

    Self {
      default_theme:    None,
      language_aliases: aliases
        .into_iter()
        .map(|(alias, name)| (alias.to_string(), name.to_string()))
        .collect(),
    }
  }
}

/// High-level syntax highlighting manager.
///
/// Wraps a backend with alias resolution and a default theme.
pub struct SyntaxManager {
  highlighter: Box<dyn SyntaxHighlighter>,
  config:      SyntaxConfig,
}

impl SyntaxManager {
  #[must_use]
  pub fn new(
    highlighter: Box<dyn SyntaxHighlighter>,
    config: SyntaxConfig,
  ) -> Self {
    Self {
      highlighter,
      config,
    }
  }

  /// Get the underlying highlighter
  #[must_use]
  pub fn highlighter(&self) -> &dyn SyntaxHighlighter {
    self.highlighter.as_ref()
  }

  /// Resolve a language name using aliases. Matching is case-insensitive.
  #[must_use]
  pub fn resolve_language(&self, language: &str) -> String {
    let lower = language.to_ascii_lowercase();
    self
      .config
      .language_aliases
      .get(&lower)
      .cloned()
      .unwrap_or(lower)
  }

  /// Highlight code after resolving the fence language.
  ///
  /// # Errors
  ///
  /// Returns [`SyntaxError::UnsupportedLanguage`] when the backend has no
  /// grammar for the language, so the caller can emit a plain block instead.
  pub fn highlight_code(
    &self,
    code: &str,
    language: &str,
    theme: Option<&str>,
  ) -> SyntaxResult<String> {
    let resolved_language = self.resolve_language(language);
    let theme = theme.or(self.config.default_theme.as_deref());

    if self.highlighter.supports_language(&resolved_language) {
      return self.highlighter.highlight(code, &resolved_language, theme);
    }

    Err(SyntaxError::UnsupportedLanguage(resolved_language))
  }
}
