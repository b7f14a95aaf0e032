pub mod config;
pub mod error;
pub mod image_proxy;
pub mod render;
pub mod server;
pub mod templates;

pub use config::Config;
pub use error::ConfigError;
