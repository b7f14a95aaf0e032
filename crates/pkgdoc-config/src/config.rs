use std::{
  fs,
  path::{Path, PathBuf},
  str::FromStr,
  sync::OnceLock,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, map::Entry};

use crate::{
  error::ConfigError,
  image_proxy::ImageProxyConfig,
  render::RenderConfig,
  server::ServerConfig,
};

/// Configuration for pkgdoc
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Markdown rendering
  pub render: RenderConfig,

  /// Signed image proxy URLs
  pub image_proxy: ImageProxyConfig,

  /// Image proxy HTTP server
  pub server: ServerConfig,
}

impl Config {
  /// Load configuration from a file (TOML or JSON).
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if the format is
  /// unsupported.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    Self::from_layer(read_layer(path)?, path)
  }

  /// Load and merge several config files, later files taking precedence.
  ///
  /// Only keys a file actually sets override earlier files; lists are
  /// extended.
  ///
  /// # Errors
  ///
  /// Returns an error if any file cannot be read or parsed.
  pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
    let mut merged = Value::Object(Map::new());
    for path in paths {
      let path = path.as_ref();
      let layer = read_layer(path)?;
      // Each file must be valid on its own so errors name the right file
      Self::from_layer(layer.clone(), path)?;
      merge_layer(&mut merged, layer);
    }

    serde_json::from_value(merged).map_err(|e| {
      ConfigError::Config(format!("Failed to merge config files: {e}"))
    })
  }

  fn from_layer(layer: Value, path: &Path) -> Result<Self, ConfigError> {
    serde_json::from_value(layer).map_err(|e| {
      ConfigError::Config(format!(
        "Invalid config in {}: {}",
        path.display(),
        e
      ))
    })
  }

  /// Load configuration from files and `KEY=VALUE` overrides.
  ///
  /// Explicit files are merged in order. Without any, a config file is
  /// looked up in the standard locations, and defaults are used if none is
  /// found. Overrides are applied last.
  ///
  /// # Errors
  ///
  /// Returns an error if a file cannot be loaded or an override is invalid.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let mut config = if !config_files.is_empty() {
      if config_files.len() > 1 {
        log::info!("Merging {} config files", config_files.len());
      }
      Self::from_files(config_files)?
    } else if let Some(discovered) = Self::find_config_file() {
      log::info!("Using discovered config file: {}", discovered.display());
      Self::from_file(&discovered)?
    } else {
      Self::default()
    };

    config.apply_overrides(config_overrides)?;
    Ok(config)
  }

  /// Apply configuration overrides from `KEY=VALUE` strings.
  ///
  /// Keys are dotted paths such as `render.section_depth` or `server.port`.
  ///
  /// # Errors
  ///
  /// Returns an error if an override is not in `KEY=VALUE` form, names an
  /// unknown key, or holds a value of the wrong type.
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  /// Apply a single override.
  ///
  /// # Errors
  ///
  /// Returns an error for unknown keys and unparsable values.
  pub fn apply_override(
    &mut self,
    key: &str,
    value: &str,
  ) -> Result<(), ConfigError> {
    let known = match key.split_once('.') {
      Some(("render", field)) => self.render.apply_override(field, value)?,
      Some(("image_proxy", field)) => {
        self.image_proxy.apply_override(field, value)?
      },
      Some(("server", field)) => self.server.apply_override(field, value)?,
      _ => false,
    };

    if known {
      Ok(())
    } else {
      Err(ConfigError::Config(format!(
        "Unknown configuration key: '{key}'"
      )))
    }
  }

  /// Search for config files in common locations
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    static RESULT: OnceLock<Option<PathBuf>> = OnceLock::new();
    RESULT
      .get_or_init(|| {
        let config_filenames = [
          "pkgdoc.toml",
          "pkgdoc.json",
          ".pkgdoc.toml",
          ".pkgdoc.json",
          ".config/pkgdoc.toml",
          ".config/pkgdoc.json",
        ];

        let current_dir = std::env::current_dir().ok()?;
        for filename in &config_filenames {
          let config_path = current_dir.join(filename);
          if config_path.exists() {
            return Some(config_path);
          }
        }

        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
          let xdg_config_dir = PathBuf::from(xdg_config_home);
          for filename in &["pkgdoc.toml", "pkgdoc.json"] {
            let config_path = xdg_config_dir.join(filename);
            if config_path.exists() {
              return Some(config_path);
            }
          }
        }

        if let Ok(home) = std::env::var("HOME") {
          let home_config_dir =
            PathBuf::from(home).join(".config").join("pkgdoc");
          for filename in &["config.toml", "config.json"] {
            let config_path = home_config_dir.join(filename);
            if config_path.exists() {
              return Some(config_path);
            }
          }
        }

        None
      })
      .clone()
  }

  /// Generate a default configuration file with commented explanations
  ///
  /// # Errors
  ///
  /// Returns an error if the format is unsupported or the file cannot be
  /// written.
  pub fn generate_default_config(
    format: &str,
    path: &Path,
  ) -> Result<(), ConfigError> {
    let config_content = crate::templates::get_template(format)
      .map_err(|e| ConfigError::Template(e.to_string()))?;

    fs::write(path, config_content).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to write default config to {}: {}",
        path.display(),
        e
      ))
    })?;

    log::info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}

/// Parse a config file into an untyped layer, keeping only the keys it sets.
fn read_layer(path: &Path) -> Result<Value, ConfigError> {
  let content = fs::read_to_string(path).map_err(|e| {
    ConfigError::Config(format!(
      "Failed to read config file: {}: {}",
      path.display(),
      e
    ))
  })?;

  let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
    return Err(ConfigError::Config(format!(
      "Config file has no extension: {}",
      path.display()
    )));
  };

  match ext.to_lowercase().as_str() {
    "json" => {
      serde_json::from_str(&content).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to parse JSON config from {}: {}",
          path.display(),
          e
        ))
      })
    },
    "toml" => {
      toml::from_str(&content).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to parse TOML config from {}: {}",
          path.display(),
          e
        ))
      })
    },
    _ => {
      Err(ConfigError::Config(format!(
        "Unsupported config file format: {}",
        path.display()
      )))
    },
  }
}

/// Merge `layer` into `base`. Tables merge key by key, lists are extended
/// with new entries and any other value replaces the earlier one.
fn merge_layer(base: &mut Value, layer: Value) {
  match (base, layer) {
    (Value::Object(base), Value::Object(layer)) => {
      for (key, value) in layer {
        match base.entry(key) {
          Entry::Occupied(mut existing) => {
            merge_layer(existing.get_mut(), value);
          },
          Entry::Vacant(slot) => {
            slot.insert(value);
          },
        }
      }
    },
    (Value::Array(base), Value::Array(layer)) => {
      for item in layer {
        if !base.contains(&item) {
          base.push(item);
        }
      }
    },
    (base, layer) => *base = layer,
  }
}

pub(crate) fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
  match value.to_lowercase().as_str() {
    "true" | "yes" | "1" | "on" => Ok(true),
    "false" | "no" | "0" | "off" => Ok(false),
    _ => {
      Err(ConfigError::InvalidValue {
        key:      key.to_string(),
        value:    value.to_string(),
        expected: "a boolean",
      })
    },
  }
}

pub(crate) fn parse_number<T: FromStr>(
  key: &str,
  value: &str,
) -> Result<T, ConfigError> {
  value.parse().map_err(|_| {
    ConfigError::InvalidValue {
      key:      key.to_string(),
      value:    value.to_string(),
      expected: "a number",
    }
  })
}
