//! The `render` subcommand.
use std::{
  fs,
  io::{self, Read, Write},
  path::{Path, PathBuf},
};

use log::{debug, info};
use pkgdoc_commonmark::{
  ReadmeRenderer,
  RenderRequest,
  RenderResult,
  RepositoryInfo,
  RepositoryProvider,
  process_with_recovery,
};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::{
  cli::{OutputFormat, RenderArgs},
  error::PkgdocError,
};

/// One rendered input file in batch JSON output.
#[derive(Debug, Serialize)]
struct RenderedFile<'a> {
  path:   String,
  #[serde(flatten)]
  result: &'a RenderResult,
}

/// Repository described by the `--provider` family of flags.
///
/// # Errors
///
/// Returns an error for unknown providers, and for providers without a known
/// URL layout when no explicit base URLs are given.
pub fn repository_from_args(
  args: &RenderArgs,
) -> Result<Option<RepositoryInfo>, PkgdocError> {
  let Some(name) = args.provider.as_deref() else {
    return Ok(None);
  };
  let provider = RepositoryProvider::from_name(name)
    .ok_or_else(|| PkgdocError::Input(format!("Unknown provider: {name}")))?;
  let owner = args.owner.as_deref().unwrap_or_default();
  let repo = args.repo.as_deref().unwrap_or_default();

  let info = match (args.raw_base.as_deref(), args.blob_base.as_deref()) {
    (Some(raw), Some(blob)) => {
      RepositoryInfo::with_base_urls(provider, owner, repo, raw, blob)
    },
    _ => {
      RepositoryInfo::new(provider, owner, repo).ok_or_else(|| {
        PkgdocError::Input(format!(
          "Provider '{name}' needs --raw-base and --blob-base"
        ))
      })?
    },
  };

  Ok(Some(match args.directory.as_deref() {
    Some(directory) => info.in_directory(directory),
    None => info,
  }))
}

/// Expand the inputs into markdown files, walking directories for `*.md`.
///
/// # Errors
///
/// Returns an error if a directory cannot be walked.
pub fn collect_markdown_files(
  inputs: &[PathBuf],
) -> Result<Vec<PathBuf>, PkgdocError> {
  let mut files = Vec::new();
  for input in inputs {
    if !input.is_dir() {
      files.push(input.clone());
      continue;
    }

    for entry in WalkDir::new(input).sort_by_file_name() {
      let entry = entry?;
      let path = entry.path();
      if entry.file_type().is_file()
        && path
          .extension()
          .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
      {
        files.push(path.to_path_buf());
      }
    }
  }
  Ok(files)
}

fn build_request<'a>(
  content: &'a str,
  args: &'a RenderArgs,
  repository: Option<&'a RepositoryInfo>,
) -> RenderRequest<'a> {
  let mut request = RenderRequest::new(Some(content), &args.package);
  if let Some(repository) = repository {
    request = request.repository(repository);
  }
  if let Some(release) = args.release.as_deref() {
    request = request.release(release);
  }
  request
}

fn format_result(
  result: &RenderResult,
  format: OutputFormat,
) -> Result<String, PkgdocError> {
  match format {
    OutputFormat::Html => Ok(result.html.clone()),
    OutputFormat::Json => Ok(serde_json::to_string_pretty(result)? + "\n"),
  }
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), PkgdocError> {
  match output {
    Some(path) => {
      if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
      {
        fs::create_dir_all(parent)?;
      }
      fs::write(path, content)?;
      info!("Wrote {}", path.display());
    },
    None => io::stdout().lock().write_all(content.as_bytes())?,
  }
  Ok(())
}

/// Run `pkgdoc render`.
///
/// # Errors
///
/// Returns an error if an input cannot be read or an output cannot be
/// written. Rendering itself never fails.
pub fn run(
  renderer: &ReadmeRenderer,
  args: &RenderArgs,
) -> Result<(), PkgdocError> {
  let repository = repository_from_args(args)?;
  let reads_stdin = args.inputs.is_empty()
    || (args.inputs.len() == 1 && args.inputs[0].as_os_str() == "-");
  if reads_stdin {
    let mut content = String::new();
    io::stdin().lock().read_to_string(&mut content)?;
    let result = process_with_recovery(
      renderer,
      &build_request(&content, args, repository.as_ref()),
    );
    return write_output(
      args.output.as_deref(),
      &format_result(&result, args.format)?,
    );
  }

  let files = collect_markdown_files(&args.inputs)?;
  if files.is_empty() {
    return Err(PkgdocError::Input(
      "No markdown files found in the given inputs".to_string(),
    ));
  }

  let thread_count = args.jobs.unwrap_or_else(num_cpus::get);
  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(thread_count)
    .build()?;
  debug!("Rendering {} files on {thread_count} threads", files.len());

  let results = pool.install(|| {
    files
      .par_iter()
      .map(|path| {
        let content = fs::read_to_string(path).map_err(|e| {
          PkgdocError::Input(format!("Failed to read {}: {e}", path.display()))
        })?;
        let request = build_request(&content, args, repository.as_ref());
        Ok((path, process_with_recovery(renderer, &request)))
      })
      .collect::<Result<Vec<_>, PkgdocError>>()
  })?;

  if let [(_, result)] = results.as_slice() {
    return write_output(
      args.output.as_deref(),
      &format_result(result, args.format)?,
    );
  }

  match (args.output.as_deref(), args.format) {
    (Some(dir), format) => {
      for (path, result) in &results {
        let name = path.file_stem().unwrap_or(path.as_os_str());
        let target = dir.join(name).with_extension(format.extension());
        write_output(Some(&target), &format_result(result, format)?)?;
      }
      Ok(())
    },
    (None, OutputFormat::Json) => {
      let rendered: Vec<_> = results
        .iter()
        .map(|(path, result)| {
          RenderedFile {
            path: path.display().to_string(),
            result,
          }
        })
        .collect();
      write_output(None, &(serde_json::to_string_pretty(&rendered)? + "\n"))
    },
    (None, OutputFormat::Html) => {
      let html: String = results
        .iter()
        .map(|(path, result)| {
          format!("<!-- {} -->\n{}", path.display(), result.html)
        })
        .collect();
      write_output(None, &html)
    },
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use super::*;

  #[test]
  fn test_repository_from_args() {
    let args = RenderArgs {
      provider: Some("gitlab".to_string()),
      owner: Some("group".to_string()),
      repo: Some("project".to_string()),
      directory: Some("packages/core/".to_string()),
      ..Default::default()
    };
    let info = repository_from_args(&args)
      .expect("valid provider")
      .expect("repository given");
    assert_eq!(info.provider, RepositoryProvider::GitLab);
    assert_eq!(info.directory.as_deref(), Some("packages/core"));
  }

  #[test]
  fn test_other_provider_needs_bases() {
    let mut args = RenderArgs {
      provider: Some("other".to_string()),
      owner: Some("o".to_string()),
      repo: Some("r".to_string()),
      ..Default::default()
    };
    assert!(repository_from_args(&args).is_err());

    args.raw_base = Some("https://git.example.com/o/r/raw".to_string());
    args.blob_base = Some("https://git.example.com/o/r/view".to_string());
    assert!(repository_from_args(&args).expect("explicit bases").is_some());
  }

  #[test]
  fn test_unknown_provider() {
    let args = RenderArgs {
      provider: Some("svn".to_string()),
      ..Default::default()
    };
    assert!(matches!(
      repository_from_args(&args),
      Err(PkgdocError::Input(_))
    ));
  }

  #[test]
  fn test_collect_markdown_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("docs")).expect("mkdir");
    fs::write(dir.path().join("README.md"), "# a").expect("write");
    fs::write(dir.path().join("docs/GUIDE.MD"), "# b").expect("write");
    fs::write(dir.path().join("docs/notes.txt"), "c").expect("write");

    let files =
      collect_markdown_files(&[dir.path().to_path_buf()]).expect("walks");
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.extension().is_some()));
    assert!(!files.iter().any(|f| f.ends_with("notes.txt")));
  }
}
