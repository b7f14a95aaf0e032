//! Syntect-based syntax highlighting backend enhanced with two-face.
//!
//! Uses Sublime Text syntax definitions. two-face adds the grammars syntect
//! does not ship (TOML, TypeScript, Dockerfile and friends), which show up in
//! package READMEs all the time.

use std::sync::OnceLock;

use syntect::{
  highlighting::{Theme, ThemeSet},
  html::highlighted_html_for_string,
  parsing::SyntaxSet,
};

use super::{
  error::{SyntaxError, SyntaxResult},
  types::{SyntaxConfig, SyntaxHighlighter, SyntaxManager},
};

const DEFAULT_THEME: &str = "InspiredGitHub";

/// Syntect-based syntax highlighter
pub struct SyntectHighlighter {
  theme_name: String,
}

impl SyntectHighlighter {
  #[must_use]
  pub fn new(theme_name: Option<String>) -> Self {
    Self {
      theme_name: theme_name.unwrap_or_else(|| DEFAULT_THEME.to_string()),
    }
  }

  fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(two_face::syntax::extra_newlines)
  }

  fn theme_set() -> &'static ThemeSet {
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(ThemeSet::load_defaults)
  }

  fn get_theme(&self, theme_name: Option<&str>) -> SyntaxResult<&'static Theme> {
    let themes = &Self::theme_set().themes;
    let name = theme_name.unwrap_or(&self.theme_name);

    themes
      .get(name)
      .or_else(|| {
        log::debug!("Theme '{name}' not found, using {DEFAULT_THEME}");
        themes.get(DEFAULT_THEME)
      })
      .ok_or_else(|| SyntaxError::BackendError("no themes loaded".to_string()))
  }
}

impl Default for SyntectHighlighter {
  fn default() -> Self {
    Self::new(None)
  }
}

impl SyntaxHighlighter for SyntectHighlighter {
  fn name(&self) -> &'static str {
    "Syntect"
  }

  fn supports_language(&self, language: &str) -> bool {
    Self::syntax_set().find_syntax_by_token(language).is_some()
  }

  fn highlight(
    &self,
    code: &str,
    language: &str,
    theme: Option<&str>,
  ) -> SyntaxResult<String> {
    let syntax_set = Self::syntax_set();
    let syntax = syntax_set
      .find_syntax_by_token(language)
      .ok_or_else(|| SyntaxError::UnsupportedLanguage(language.to_string()))?;

    let theme = self.get_theme(theme)?;

    highlighted_html_for_string(code, syntax_set, syntax, theme)
      .map_err(|e| SyntaxError::HighlightingFailed(e.to_string()))
  }
}

/// Create a Syntect-based syntax manager with configuration
///
/// # Errors
///
/// Currently infallible; kept fallible so backends can fail to initialize.
pub fn create_syntect_manager() -> SyntaxResult<SyntaxManager> {
  let highlighter = Box::new(SyntectHighlighter::default());
  let config = SyntaxConfig {
    default_theme: Some(DEFAULT_THEME.to_string()),
    ..SyntaxConfig::default()
  };
  Ok(SyntaxManager::new(highlighter, config))
}
