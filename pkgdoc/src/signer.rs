//! Image proxy signer construction from configuration.
use log::warn;
use pkgdoc_commonmark::ImageProxySigner;
use pkgdoc_config::{Config, image_proxy::SECRET_ENV_VAR};
use rand::RngExt;

use crate::error::PkgdocError;

/// Signer for the configured secret, or `None` when proxying is disabled.
///
/// Without a configured secret an ephemeral random one is generated when
/// `allow_ephemeral` is set; signed URLs then stop verifying once the process
/// exits.
///
/// # Errors
///
/// Returns an error when no secret is configured and an ephemeral secret is
/// not allowed.
pub fn signer_from_config(
  config: &Config,
  allow_ephemeral: bool,
) -> Result<Option<ImageProxySigner>, PkgdocError> {
  if !config.image_proxy.enable {
    return Ok(None);
  }

  if let Some(secret) = config.image_proxy.resolve_secret() {
    return Ok(Some(config.image_proxy.signer(&secret)?));
  }

  if !allow_ephemeral {
    return Err(PkgdocError::Input(format!(
      "No image proxy secret configured. Set {SECRET_ENV_VAR} or \
       image_proxy.secret"
    )));
  }

  warn!(
    "No image proxy secret configured, using an ephemeral one. Signed URLs \
     will not survive a restart; set {SECRET_ENV_VAR} to persist them"
  );
  let secret: [u8; 32] = rand::rng().random();
  Ok(Some(config.image_proxy.signer(secret)?))
}
