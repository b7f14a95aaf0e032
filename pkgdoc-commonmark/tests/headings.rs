#![allow(clippy::expect_used, clippy::panic, reason = "Fine in tests")]

use pkgdoc_commonmark::{ReadmeRenderer, RenderOptions, RenderRequest, RenderResult};
use regex::Regex;

fn render(content: &str) -> RenderResult {
  let renderer = ReadmeRenderer::new(RenderOptions {
    highlight_code: false,
    ..Default::default()
  });
  renderer.render(&RenderRequest::new(Some(content), "test-pkg"))
}

/// `(level, id)` of every heading in the HTML, in order.
fn headings(html: &str) -> Vec<(u8, String)> {
  let open = Regex::new(r"<h([1-6])\b([^>]*)>").expect("valid regex");
  let id = Regex::new(r#"\bid="([^"]*)""#).expect("valid regex");
  open
    .captures_iter(html)
    .map(|caps| {
      let level = caps[1].parse().expect("digit");
      let id = id
        .captures(&caps[2])
        .map(|c| c[1].to_string())
        .unwrap_or_default();
      (level, id)
    })
    .collect()
}

fn toc_ids(result: &RenderResult) -> Vec<&str> {
  result.toc.iter().map(|item| item.id.as_str()).collect()
}

#[test]
fn test_mixed_heading_order() {
  let result = render("## API\n\n<h2>API</h2>\n\n## API\n");
  let found = headings(&result.html);
  let ids: Vec<_> = found.iter().map(|(_, id)| id.as_str()).collect();

  assert_eq!(ids, [
    "user-content-api",
    "user-content-api-1",
    "user-content-api-2"
  ]);
  assert_eq!(toc_ids(&result), ids);
}

#[test]
fn test_depth_never_skips() {
  let result = render("# Title\n\n<h3>Subsection</h3>\n\n#### Deep\n");
  let levels: Vec<_> = headings(&result.html).iter().map(|(l, _)| *l).collect();
  assert_eq!(levels, [3, 4, 5]);

  let depths: Vec<_> = result.toc.iter().map(|item| item.depth).collect();
  assert_eq!(depths, [1, 3, 4]);
}

#[test]
fn test_toc_matches_html_order() {
  let content = r#"# Intro

<div align="center">
  <h1>Logo Title</h1>
  <p>Tagline</p>
</div>

## Install

<details>
<summary>More</summary>

<h3>Hidden</h3>

</details>

## Usage
"#;
  let result = render(content);
  let html_ids: Vec<_> =
    headings(&result.html).into_iter().map(|(_, id)| id).collect();

  assert_eq!(html_ids, toc_ids(&result));
  assert_eq!(html_ids, [
    "user-content-intro",
    "user-content-logo-title",
    "user-content-install",
    "user-content-hidden",
    "user-content-usage",
  ]);
}

#[test]
fn test_heading_markup() {
  let result = render("# Hello *World*");
  let html = &result.html;

  assert!(html.contains("<h3 "));
  assert!(html.contains("data-level=\"1\""));
  assert!(html.contains("Hello <em>World</em>"));
  assert!(html.contains("<a href=\"#user-content-hello-world\"><span"));
  assert!(html.contains("class=\"i-lucide:link\""));
  assert_eq!(result.toc[0].text, "Hello World");
}

#[test]
fn test_toc_text_is_plain() {
  let result =
    render("## `render()` &amp; friends :sparkles:\n\n## Non&nbsp;breaking\n");
  assert_eq!(result.toc[0].text, "render() & friends ✨");
  assert_eq!(result.toc[1].text, "Nonbreaking");
}

#[test]
fn test_release_prefix() {
  let renderer = ReadmeRenderer::new(RenderOptions {
    highlight_code: false,
    ..Default::default()
  });
  let result = renderer.render(
    &RenderRequest::new(Some("## Fixes\n\nSee [fixes](#fixes)"), "pkg")
      .release("v2.0.0"),
  );

  assert_eq!(result.toc[0].id, "user-content-v2.0.0-fixes");
  assert!(result.html.contains("href=\"#user-content-v2.0.0-fixes\""));
}

#[test]
fn test_seven_hashes_not_heading() {
  let result = render("#######foo\n");
  assert!(result.toc.is_empty());
  assert!(result.html.contains("#######foo"));
}

#[test]
fn test_lazy_headings() {
  let result = render("#Install\n\n```sh\n#not-a-heading\n```\n##Usage ##\n");
  let texts: Vec<_> = result.toc.iter().map(|t| t.text.as_str()).collect();
  assert_eq!(texts, ["Install", "Usage"]);
  assert!(result.html.contains("#not-a-heading"));
}

#[test]
fn test_fragment_links_follow_slugs() {
  let result = render(
    "## Foo Bar\n\n[a](#Foo-Bar) [b](#user-content-x) [c](#foo%20bar)\n",
  );
  // Heading anchor plus two links
  assert_eq!(result.html.matches("href=\"#user-content-foo-bar\"").count(), 3);
  assert!(result.html.contains("href=\"#user-content-x\""));
  assert!(!result.html.contains("target=\"_blank\""));
}

#[test]
fn test_author_ids_do_not_collide() {
  let result = render("<a id=\"api\"></a>\n\n## API\n\n<p id=\"api\">x</p>\n");
  assert_eq!(result.toc[0].id, "user-content-api");
  assert_eq!(result.html.matches("id=\"user-content-api\"").count(), 1);
}

#[test]
fn test_empty_heading_gets_fallback_slug() {
  let result = render("## :::\n\n<h2></h2>\n");
  assert_eq!(toc_ids(&result), ["user-content-heading", "user-content-heading-1"]);
}

/// Heading ids in the HTML, checked against the TOC order.
fn ordered_ids(result: &RenderResult) -> Vec<String> {
  let html_ids: Vec<_> =
    headings(&result.html).into_iter().map(|(_, id)| id).collect();
  assert_eq!(html_ids, toc_ids(result), "TOC order differs from HTML order");
  html_ids
}

#[test]
fn test_inline_raw_heading_keeps_document_order() {
  let result = render("## A\n\nIntro text <h2>B</h2> more\n\n## C\n");
  assert_eq!(ordered_ids(&result), [
    "user-content-a",
    "user-content-b",
    "user-content-c",
  ]);
  assert!(result.html.contains("Intro text"));
  assert!(result.html.contains(" more"));
}

#[test]
fn test_inline_raw_heading_depth_follows_previous_heading() {
  let result = render("# A\n\nx <h4>B</h4> y\n\n#### C\n");
  let levels: Vec<_> = headings(&result.html).iter().map(|(l, _)| *l).collect();
  assert_eq!(levels, [3, 4, 5]);
  assert_eq!(ordered_ids(&result).len(), 3);
}

#[test]
fn test_multiline_raw_heading_split_by_blank_line() {
  let content = r#"## A

<h1 align="center">
  <img src="logo.png" alt="">

  My Package
</h1>

## C
"#;
  let result = render(content);
  assert_eq!(ordered_ids(&result), [
    "user-content-a",
    "user-content-my-package",
    "user-content-c",
  ]);
  assert_eq!(result.toc[1].text, "My Package");
  assert_eq!(result.toc[1].depth, 1);
  assert!(result.html.contains("align=\"center\""));
}

#[test]
fn test_nested_raw_headings() {
  let result = render("<h2>a<h3>b</h3></h2>\n\n## c\n");
  assert_eq!(ordered_ids(&result), [
    "user-content-a",
    "user-content-b",
    "user-content-c",
  ]);
}

#[test]
fn test_mixed_document_toc_matches_html() {
  let content = r#"<h1 align="center">Logo</h1>

# Intro :wave:

Some text <h3>Inline</h3> and <h2>Another</h2> here.

<details><summary>More</summary>

## Intro

<h2>
  Split

</h2>

</details>

### Intro
"#;
  let result = render(content);
  assert_eq!(ordered_ids(&result), [
    "user-content-logo",
    "user-content-intro-wave",
    "user-content-inline",
    "user-content-another",
    "user-content-intro",
    "user-content-split",
    "user-content-intro-1",
  ]);
}

#[test]
fn test_forged_data_level_does_not_take_heading_id() {
  let result = render(
    "Intro <h2 data-level=\"2\" id=\"user-content-api\">Other</h2>\n\n## API\n",
  );
  assert_eq!(ordered_ids(&result), ["user-content-other", "user-content-api"]);
  let texts: Vec<_> = result.toc.iter().map(|t| t.text.as_str()).collect();
  assert_eq!(texts, ["Other", "API"]);
}

#[test]
fn test_quoted_angle_bracket_in_heading_attribute() {
  let result = render("<h2 title=\"a > b\" align=\"center\">Title</h2>\n");
  assert_eq!(ordered_ids(&result), ["user-content-title"]);
  assert_eq!(result.toc[0].text, "Title");
  assert!(result.html.contains("align=\"center\""));
  assert!(!result.html.contains("b\">"));
}
