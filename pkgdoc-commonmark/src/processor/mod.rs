//! README rendering pipeline.
//!
//! - [`core`]: `ReadmeRenderer` and the render pipeline
//! - [`hooks`]: markdown AST hooks for headings, links, code and callouts
//! - [`process`]: rendering with panic recovery
//! - [`types`]: options, the renderer type and the transformer trait
pub mod core;
pub mod hooks;
pub mod process;
pub mod types;

pub use hooks::CalloutKind;
pub use process::process_with_recovery;
pub use types::{
  AstTransformer,
  ReadmeRenderer,
  RenderOptions,
  RenderOptionsBuilder,
};
