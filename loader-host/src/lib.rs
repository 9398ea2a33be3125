//! loader-host: plugin loader entry point for the host process.
//!
//! The host exposes its plugin manager and platform additions only after its
//! own bootstrap. The loader waits for them through `loader-core` and then
//! reads host details through [`HostServices`].

mod config;
mod error;
mod host;
mod loader;

pub use config::{LoaderConfig, DEFAULT_REQUIRED_TYPES};
pub use error::{LoaderError, Result};
pub use host::{HostInfo, HostServices};
pub use loader::PluginLoader;
