#![allow(clippy::expect_used, clippy::panic, reason = "Fine in tests")]

use std::fs;

use pkgdoc::{
  cli::{OutputFormat, RenderArgs},
  render,
};
use pkgdoc_commonmark::{ReadmeRenderer, RenderOptions, RenderResult};

fn renderer() -> ReadmeRenderer {
  ReadmeRenderer::new(RenderOptions {
    highlight_code: false,
    ..Default::default()
  })
}

#[test]
fn test_render_single_file_to_json() {
  let dir = tempfile::tempdir().expect("tempdir");
  let input = dir.path().join("README.md");
  let output = dir.path().join("out/readme.json");
  fs::write(&input, "# Widgets\n\n![logo](./logo.png)\n").expect("write");

  let args = RenderArgs {
    inputs: vec![input],
    package: "widgets".to_string(),
    provider: Some("github".to_string()),
    owner: Some("octo".to_string()),
    repo: Some("widgets".to_string()),
    format: OutputFormat::Json,
    output: Some(output.clone()),
    ..Default::default()
  };
  render::run(&renderer(), &args).expect("renders");

  let result: RenderResult =
    serde_json::from_str(&fs::read_to_string(output).expect("output written"))
      .expect("valid json");
  assert!(result.md_exists);
  assert_eq!(result.toc.len(), 1);
  assert_eq!(result.toc[0].id, "user-content-widgets");
  assert!(
    result
      .html
      .contains("https://raw.githubusercontent.com/octo/widgets/HEAD/logo.png")
  );
}

#[test]
fn test_render_directory_to_output_dir() {
  let dir = tempfile::tempdir().expect("tempdir");
  let docs = dir.path().join("docs");
  fs::create_dir_all(&docs).expect("mkdir");
  fs::write(docs.join("README.md"), "# One\n").expect("write");
  fs::write(docs.join("CHANGELOG.md"), "## 1.0.0\n").expect("write");
  fs::write(docs.join("notes.txt"), "not markdown").expect("write");
  let out = dir.path().join("html");

  let args = RenderArgs {
    inputs: vec![docs],
    release: Some("v1".to_string()),
    output: Some(out.clone()),
    jobs: Some(2),
    ..Default::default()
  };
  render::run(&renderer(), &args).expect("renders");

  let readme = fs::read_to_string(out.join("README.html")).expect("readme");
  let changelog =
    fs::read_to_string(out.join("CHANGELOG.html")).expect("changelog");
  assert!(readme.contains("id=\"user-content-v1-one\""));
  assert!(changelog.contains("id=\"user-content-v1-100\""));
  assert!(!out.join("notes.html").exists());
}

#[test]
fn test_render_empty_directory_fails() {
  let dir = tempfile::tempdir().expect("tempdir");
  let args = RenderArgs {
    inputs: vec![dir.path().to_path_buf()],
    ..Default::default()
  };
  assert!(render::run(&renderer(), &args).is_err());
}
