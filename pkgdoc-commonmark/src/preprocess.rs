//! Text pre-pass run before the markdown parser.
use std::sync::LazyLock;

use regex::Regex;

use crate::utils::{codeblock::FenceTracker, compile_regex};

/// `#foo`: one to six hashes directly followed by content.
static LAZY_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_regex("LAZY_HEADING_RE", r"^( {0,3})(#{1,6})([^#\s].*)$")
});

/// Closing hash run, only when separated from the content by whitespace.
static CLOSING_HASHES_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_regex("CLOSING_HASHES_RE", r"\s+#+\s*$"));

/// Turn "lazy" ATX headings (`#foo`) into proper ones (`# foo`).
///
/// Lines inside fenced code blocks are left alone, as are lines with seven or
/// more hashes and headings that already have a space after the hashes.
#[must_use]
pub fn normalize_lazy_headings(content: &str) -> String {
  let mut result = String::with_capacity(content.len() + 16);
  let mut fence = FenceTracker::new();

  for line in content.split_inclusive('\n') {
    let (body, ending) = split_line_ending(line);
    let was_in_code = fence.in_code_block();
    fence = fence.process_line(body);

    // Fence lines themselves toggle state; only plain lines are rewritten
    if was_in_code || fence.in_code_block() {
      result.push_str(line);
      continue;
    }

    match LAZY_HEADING_RE.captures(body) {
      Some(caps) => {
        let text = CLOSING_HASHES_RE.replace(&caps[3], "");
        result.push_str(&caps[1]);
        result.push_str(&caps[2]);
        result.push(' ');
        result.push_str(text.trim_end());
        result.push_str(ending);
      },
      None => result.push_str(line),
    }
  }

  result
}

fn split_line_ending(line: &str) -> (&str, &str) {
  if let Some(body) = line.strip_suffix("\r\n") {
    (body, "\r\n")
  } else if let Some(body) = line.strip_suffix('\n') {
    (body, "\n")
  } else {
    (line, "")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lazy_headings_all_levels() {
    for level in 1..=6 {
      let hashes = "#".repeat(level);
      assert_eq!(
        normalize_lazy_headings(&format!("{hashes}foo")),
        format!("{hashes} foo")
      );
    }
  }

  #[test]
  fn test_seven_hashes_untouched() {
    assert_eq!(normalize_lazy_headings("#######foo"), "#######foo");
  }

  #[test]
  fn test_closing_sequence() {
    assert_eq!(normalize_lazy_headings("##foo ##"), "## foo");
    assert_eq!(normalize_lazy_headings("#foo#"), "# foo#");
  }

  #[test]
  fn test_proper_headings_pass_through() {
    let input = "# Title\n\n## Section ##\n";
    assert_eq!(normalize_lazy_headings(input), input);
  }

  #[test]
  fn test_indentation_kept() {
    assert_eq!(normalize_lazy_headings("   ##foo"), "   ## foo");
    assert_eq!(normalize_lazy_headings("    #foo"), "    #foo");
  }

  #[test]
  fn test_fenced_code_untouched() {
    let input = "```sh\n#comment\n```\n#heading\n~~~\n#also-code\n~~~\n";
    assert_eq!(
      normalize_lazy_headings(input),
      "```sh\n#comment\n```\n# heading\n~~~\n#also-code\n~~~\n"
    );
  }

  #[test]
  fn test_crlf_line_endings() {
    assert_eq!(normalize_lazy_headings("#a\r\nb\r\n"), "# a\r\nb\r\n");
  }
}
