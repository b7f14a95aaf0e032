//! Expose pkgdoc's command implementations for use in integration tests. The
//! stable API lives in `pkgdoc-commonmark` and `pkgdoc-config`.
pub mod cli;
pub mod error;
pub mod render;
#[cfg(feature = "serve")]
pub mod serve;
pub mod signer;
