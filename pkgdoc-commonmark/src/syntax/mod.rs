//! Trait-based syntax highlighting for fenced code blocks.
//!
//! The only backend is Syntect (behind the `syntect` feature). Without it,
//! code blocks render as escaped `<pre><code>` blocks.

pub mod error;
pub mod types;

use std::sync::{Arc, OnceLock};

pub use error::{SyntaxError, SyntaxResult};
pub use types::{SyntaxConfig, SyntaxHighlighter, SyntaxManager};

#[cfg(feature = "syntect")] mod syntect;
#[cfg(feature = "syntect")] pub use syntect::*;

/// Create the default syntax manager based on available features.
///
/// # Errors
///
/// Returns [`SyntaxError::NoBackendAvailable`] when built without a backend.
pub fn create_default_manager() -> SyntaxResult<SyntaxManager> {
  #[cfg(feature = "syntect")]
  {
    create_syntect_manager()
  }

  #[cfg(not(feature = "syntect"))]
  {
    Err(SyntaxError::NoBackendAvailable)
  }
}

/// Process-wide syntax manager, created on first use.
///
/// Grammar loading is expensive, so every renderer shares one instance.
/// Returns `None` (after logging once) when no backend is available.
pub fn shared_manager() -> Option<Arc<SyntaxManager>> {
  static MANAGER: OnceLock<Option<Arc<SyntaxManager>>> = OnceLock::new();
  MANAGER
    .get_or_init(|| {
      match create_default_manager() {
        Ok(manager) => Some(Arc::new(manager)),
        Err(e) => {
          log::warn!("Syntax highlighting disabled: {e}");
          None
        },
      }
    })
    .clone()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_syntax_config_default() {
    let config = SyntaxConfig::default();
    assert_eq!(config.language_aliases["js"], "javascript");
    assert_eq!(config.language_aliases["console"], "bash");
  }

  #[cfg(feature = "syntect")]
  #[test]
  fn test_language_resolution() {
    let manager = create_default_manager()
      .expect("Failed to create default syntax manager");

    assert_eq!(manager.resolve_language("js"), "javascript");
    assert_eq!(manager.resolve_language("TS"), "typescript");
    assert_eq!(manager.resolve_language("rust"), "rust");
  }

  #[cfg(feature = "syntect")]
  #[test]
  fn test_syntect_highlight_simple() {
    let manager = create_default_manager()
      .expect("Failed to create default syntax manager");
    let html = manager
      .highlight_code("const answer = 42;", "js", None)
      .expect("javascript should be supported");
    assert!(html.starts_with("<pre"));
    assert!(html.contains("answer"));
  }

  #[cfg(feature = "syntect")]
  #[test]
  fn test_unsupported_language_is_an_error() {
    let manager = create_default_manager()
      .expect("Failed to create default syntax manager");
    let result = manager.highlight_code("???", "not-a-language", None);
    assert!(matches!(result, Err(SyntaxError::UnsupportedLanguage(_))));
  }

  #[cfg(feature = "syntect")]
  #[test]
  fn test_shared_manager_is_reused() {
    let first = shared_manager().expect("syntect backend is enabled");
    let second = shared_manager().expect("syntect backend is enabled");
    assert!(Arc::ptr_eq(&first, &second));
  }
}
