use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Command line interface for pkgdoc
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "Render package READMEs and changelogs to safe HTML"
)]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Commands,

  /// Enable verbose debug logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times). Multiple files are merged in order, with later files overriding
  /// earlier ones
  #[arg(
    short = 'c',
    long = "config-file",
    global = true,
    action = clap::ArgAction::Append
  )]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, e.g.
  /// `render.heading_offset=1`; can be used multiple times)
  #[arg(long = "config", global = true, action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the pkgdoc CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Render markdown files, directories or stdin to sanitized HTML.
  Render(RenderArgs),

  /// Print the image proxy URL for an image.
  Sign {
    /// Absolute image URL
    url: String,
  },

  /// Check an image proxy signature.
  Verify {
    /// Absolute image URL
    url: String,

    /// Hex signature from the `sig` query parameter
    signature: String,
  },

  /// Serve the image proxy endpoint.
  #[cfg(feature = "serve")]
  Serve {
    /// Address to bind, overriding `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overriding `server.port`
    #[arg(short, long)]
    port: Option<u16>,
  },

  /// Initialize a new pkgdoc configuration file.
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "pkgdoc.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },

  /// Print shell completions.
  Completions {
    /// Shell to generate completions for
    shell: Shell,
  },
}

/// Output format of `pkgdoc render`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
  /// Sanitized HTML only
  #[default]
  Html,
  /// HTML, table of contents and playground links
  Json,
}

impl OutputFormat {
  #[must_use]
  pub const fn extension(self) -> &'static str {
    match self {
      Self::Html => "html",
      Self::Json => "json",
    }
  }
}

/// Arguments of `pkgdoc render`.
#[derive(Args, Debug, Default)]
pub struct RenderArgs {
  /// Markdown files or directories to render. Reads stdin when empty or `-`.
  pub inputs: Vec<PathBuf>,

  /// Package name, used for CDN fallback links
  #[arg(short = 'P', long, default_value = "package")]
  pub package: String,

  /// Repository provider (github, gitlab, bitbucket, codeberg, gitee,
  /// sourcehut, other)
  #[arg(long, requires_all = ["owner", "repo"])]
  pub provider: Option<String>,

  /// Repository owner
  #[arg(long, requires = "provider")]
  pub owner: Option<String>,

  /// Repository name
  #[arg(long, requires = "provider")]
  pub repo: Option<String>,

  /// Package directory inside a monorepo
  #[arg(long, requires = "provider")]
  pub directory: Option<String>,

  /// Base URL for raw files, required for the `other` provider
  #[arg(long, requires_all = ["provider", "blob_base"])]
  pub raw_base: Option<String>,

  /// Base URL for rendered markdown files, required for the `other` provider
  #[arg(long, requires_all = ["provider", "raw_base"])]
  pub blob_base: Option<String>,

  /// Release id, scopes heading ids for changelog rendering
  #[arg(short, long)]
  pub release: Option<String>,

  /// Output format
  #[arg(short, long, value_enum, default_value_t)]
  pub format: OutputFormat,

  /// Output file, or output directory when rendering several files
  #[arg(short, long)]
  pub output: Option<PathBuf>,

  /// Number of threads to use for parallel processing
  #[arg(short = 'j', long)]
  pub jobs: Option<usize>,
}

impl Cli {
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
