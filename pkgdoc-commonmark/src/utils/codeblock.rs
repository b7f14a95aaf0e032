/// State tracking for code fence detection in markdown.
///
/// Tracks whether we're currently inside a fenced code block and keeps the
/// fence character and length so that only a matching fence closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenceTracker {
  in_code_block:    bool,
  code_fence_char:  Option<char>,
  code_fence_count: usize,
}

impl FenceTracker {
  /// Create a new fence tracker.
  #[must_use]
  pub const fn new() -> Self {
    Self {
      in_code_block:    false,
      code_fence_char:  None,
      code_fence_count: 0,
    }
  }

  /// Check if currently inside a code block.
  #[must_use]
  pub const fn in_code_block(&self) -> bool {
    self.in_code_block
  }

  /// Process a line and update fence state.
  ///
  /// Returns the updated state after processing the line. Fences may be
  /// indented by at most three spaces; a closing fence must use the same
  /// character, be at least as long as the opening one and carry no info
  /// string.
  #[must_use]
  pub fn process_line(&self, line: &str) -> Self {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
      return *self;
    }
    let trimmed = &line[indent..];

    let Some(fence_char) = trimmed.chars().next() else {
      return *self;
    };
    if fence_char != '`' && fence_char != '~' {
      return *self;
    }

    let fence_count = trimmed.chars().take_while(|&c| c == fence_char).count();
    if fence_count < 3 {
      return *self;
    }

    if !self.in_code_block {
      // Backtick fences may not carry backticks in their info string
      let info = &trimmed[fence_count..];
      if fence_char == '`' && info.contains('`') {
        return *self;
      }
      return Self {
        in_code_block:    true,
        code_fence_char:  Some(fence_char),
        code_fence_count: fence_count,
      };
    }

    let rest = trimmed[fence_count..].trim();
    if self.code_fence_char == Some(fence_char)
      && fence_count >= self.code_fence_count
      && rest.is_empty()
    {
      return Self::new();
    }

    *self
  }
}
