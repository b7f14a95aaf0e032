//! Rendering with panic recovery.
use log::error;

use super::types::ReadmeRenderer;
use crate::types::{RenderRequest, RenderResult};

/// Render with panic recovery.
///
/// A panic anywhere in the pipeline is logged and turned into an empty HTML
/// result that still reports `md_exists`, so one hostile README cannot take
/// down a batch or a request handler.
#[must_use]
pub fn process_with_recovery(
  renderer: &ReadmeRenderer,
  request: &RenderRequest<'_>,
) -> RenderResult {
  match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
    renderer.render(request)
  })) {
    Ok(result) => result,
    Err(panic_err) => {
      error!(
        "Panic while rendering README of '{}': {}",
        request.package_name,
        panic_message(panic_err.as_ref())
      );
      RenderResult {
        md_exists: true,
        ..RenderResult::empty()
      }
    },
  }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
  if let Some(message) = payload.downcast_ref::<String>() {
    message
  } else if let Some(message) = payload.downcast_ref::<&str>() {
    message
  } else {
    "unknown panic payload"
  }
}
