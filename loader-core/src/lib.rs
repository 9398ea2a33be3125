//! loader-core: waits for named runtime types to appear in a host registry
//! and runs a completion exactly once when they all resolve.

mod config;
mod error;
mod events;
mod handle;
mod observation;
mod registry;
mod request;
mod watcher;

pub use config::{WatchConfig, DEFAULT_POLL_INTERVAL};
pub use error::{ObserverError, Result};
pub use events::{filter_events, no_op_events, tee_events, tracing_events, EventFn};
pub use handle::{ObserverGuard, ObserverHandle};
pub use observation::WatchEvent;
pub use registry::{DynamicRegistry, TypeRegistry};
pub use request::{ObserverId, ObserverState};
pub use watcher::ClassWatcher;
