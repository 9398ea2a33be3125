//! plugin-loader: waits for host-internal runtime types to load, then runs
//! the host-specific startup that depends on them.
//!
//! The waiting primitive lives in [`core`]; the loader entry point lives in
//! [`host`].

pub use loader_core as core;
pub use loader_host as host;

pub use loader_core::{ClassWatcher, DynamicRegistry, ObserverHandle, ObserverState, WatchConfig};
pub use loader_host::{HostInfo, HostServices, LoaderConfig, PluginLoader};
