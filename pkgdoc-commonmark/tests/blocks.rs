#![allow(clippy::expect_used, clippy::panic, reason = "Fine in tests")]

use pkgdoc_commonmark::{
  ReadmeRenderer,
  RenderOptions,
  RenderRequest,
  RenderResult,
  process_with_recovery,
};

fn render_with(options: RenderOptions, content: &str) -> RenderResult {
  ReadmeRenderer::new(options).render(&RenderRequest::new(Some(content), "pkg"))
}

fn render(content: &str) -> RenderResult {
  render_with(
    RenderOptions {
      highlight_code: false,
      ..Default::default()
    },
    content,
  )
}

#[test]
fn test_empty_results() {
  let renderer = ReadmeRenderer::default();
  for content in [None, Some(""), Some("\n  \n")] {
    let result = renderer.render(&RenderRequest::new(content, "pkg"));
    assert!(result.html.is_empty());
    assert!(result.toc.is_empty());
    assert!(result.playground_links.is_empty());
    assert!(!result.md_exists);
  }
}

#[test]
fn test_recovery_wrapper_renders() {
  let renderer = ReadmeRenderer::default();
  let result =
    process_with_recovery(&renderer, &RenderRequest::new(Some("text"), "pkg"));
  assert!(result.md_exists);
  assert_eq!(result.html.trim(), "<p>text</p>");
}

#[test]
fn test_callouts() {
  let result = render(
    "> [!NOTE]\n> Useful information.\n\n> [!warning]\n> Careful.\n\n> [!DANGER]\n> Not a callout.\n",
  );
  let html = &result.html;

  assert!(html.contains("<blockquote data-callout=\"note\">"));
  assert!(html.contains("<p>Useful information.</p>"));
  assert!(html.contains("<blockquote data-callout=\"warning\">"));
  assert!(!html.contains("[!NOTE]"));
  assert!(html.contains("[!DANGER]"));
  assert_eq!(html.matches("data-callout").count(), 2);
}

#[test]
fn test_forged_callout_attribute_dropped() {
  let result = render("<blockquote data-callout=\"x onload\">hi</blockquote>\n");
  assert!(!result.html.contains("data-callout"));
}

#[test]
fn test_plain_code_block() {
  let result = render("```js\nconst a = '<b>';\n```\n");
  let html = &result.html;

  assert!(html.contains("class=\"readme-code-block\""));
  assert!(html.contains("data-language=\"js\""));
  assert!(html.contains("class=\"readme-copy-button\""));
  assert!(html.contains("<code class=\"language-js\">const a = '&lt;b&gt;';"));
}

#[test]
fn test_author_buttons_dropped() {
  let result = render(
    "<button class=\"readme-copy-button\" onclick=\"steal()\">Click</button>\n",
  );
  assert!(!result.html.contains("<button"));
}

#[cfg(feature = "syntect")]
#[test]
fn test_highlighted_code_block() {
  let result = render_with(
    RenderOptions::default(),
    "```rust\nfn main() {}\n```\n",
  );
  let html = &result.html;

  assert!(html.contains("class=\"readme-code-block\""));
  assert!(html.contains("<pre style=\""));
  assert!(html.contains("<span style=\"color:"));
  assert!(html.contains("main"));
}

#[cfg(feature = "syntect")]
#[test]
fn test_unknown_language_falls_back() {
  let result = render_with(
    RenderOptions::default(),
    "```not-a-real-language\nx < y\n```\n",
  );
  assert!(
    result
      .html
      .contains("<code class=\"language-not-a-real-language\">x &lt; y")
  );
}

#[test]
fn test_gfm_extensions() {
  let result = render(
    "| a | b |\n|---|:-:|\n| 1 | 2 |\n\n- [x] done\n- [ ] todo\n\n~~old~~ \
     :rocket:\n",
  );
  let html = &result.html;

  assert!(html.contains("<table>"));
  assert!(html.contains("<td align=\"center\">2</td>"));
  assert_eq!(html.matches("type=\"checkbox\"").count(), 2);
  assert_eq!(html.matches("disabled=\"\"").count(), 2);
  assert!(html.contains("<del>old</del>"));
  assert!(html.contains("🚀"));
}

#[test]
fn test_dangerous_markup_removed() {
  let result = render(
    "<script>alert(1)</script>\n\n<img src=x onerror=alert(1)>\n\n<iframe \
     src=\"https://evil.test\"></iframe>\n\n<style>body{}</style>\n\n<svg \
     onload=alert(1)><circle/></svg>\n\n<form><input type=\"text\"></form>\n",
  );
  let html = result.html.to_ascii_lowercase();

  for needle in [
    "<script", "onerror", "<iframe", "<style", "<svg", "<form", "<input",
    "onload",
  ] {
    assert!(!html.contains(needle), "found {needle} in {html}");
  }
}
