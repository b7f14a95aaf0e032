use std::{
  fs,
  io::{self, Write},
};

use clap::CommandFactory;
use color_eyre::eyre::{Context, Result, bail};
use log::{LevelFilter, info};
use pkgdoc::{
  cli::{Cli, Commands},
  render,
  signer::signer_from_config,
};
use pkgdoc_commonmark::ReadmeRenderer;
use pkgdoc_config::Config;

fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse_args();

  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  // Commands that do not need a configuration
  match &cli.command {
    Commands::Init {
      output,
      format,
      force,
    } => {
      if output.exists() && !force {
        bail!(
          "Configuration file already exists: {}. Use --force to overwrite.",
          output.display()
        );
      }

      if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
      {
        fs::create_dir_all(parent).wrap_err_with(|| {
          format!("Failed to create directory: {}", parent.display())
        })?;
        info!("Created directory: {}", parent.display());
      }

      Config::generate_default_config(format, output).wrap_err_with(|| {
        format!(
          "Failed to generate configuration file: {}",
          output.display()
        )
      })?;
      return Ok(());
    },

    Commands::Completions { shell } => {
      let mut cmd = Cli::command();
      clap_complete::generate(*shell, &mut cmd, "pkgdoc", &mut io::stdout());
      return Ok(());
    },

    _ => {},
  }

  let config = Config::load(&cli.config_files, &cli.config_overrides)
    .wrap_err("Failed to load configuration")?;

  match cli.command {
    Commands::Render(args) => {
      let mut renderer = ReadmeRenderer::new(config.render.render_options());
      if let Some(signer) = signer_from_config(&config, true)? {
        renderer = renderer.with_image_proxy(signer);
      }
      render::run(&renderer, &args).wrap_err("Failed to render markdown")?;
    },

    Commands::Sign { url } => {
      let Some(signer) = signer_from_config(&config, false)? else {
        bail!("Image proxy is disabled (image_proxy.enable = false)");
      };
      writeln!(io::stdout().lock(), "{}", signer.proxied_url(&url))?;
    },

    Commands::Verify { url, signature } => {
      let Some(signer) = signer_from_config(&config, false)? else {
        bail!("Image proxy is disabled (image_proxy.enable = false)");
      };
      signer
        .verify(&url, &signature)
        .wrap_err_with(|| format!("Signature rejected for {url}"))?;
      info!("Signature is valid");
    },

    #[cfg(feature = "serve")]
    Commands::Serve { host, port } => {
      let mut config = config;
      if let Some(host) = host {
        config.server.host = host;
      }
      if let Some(port) = port {
        config.server.port = port;
      }

      let Some(signer) = signer_from_config(&config, true)? else {
        bail!("Image proxy is disabled (image_proxy.enable = false)");
      };
      tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("Failed to start the async runtime")?
        .block_on(pkgdoc::serve::run(&config, signer))
        .wrap_err("Image proxy server failed")?;
    },

    Commands::Init { .. } | Commands::Completions { .. } => {},
  }

  Ok(())
}
