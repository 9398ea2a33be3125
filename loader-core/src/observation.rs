use std::time::SystemTime;

use crate::ObserverId;

/// Lifecycle events emitted by each observation request.
///
/// Names are carried by value so hooks can keep them past the callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    Created {
        ts: SystemTime,
        id: ObserverId,
        pending: Vec<String>,
    },
    Tick {
        ts: SystemTime,
        id: ObserverId,
        resolved: Vec<String>,
        remaining: usize,
    },
    Fired {
        ts: SystemTime,
        id: ObserverId,
        ticks: u64,
    },
    Cancelled {
        ts: SystemTime,
        id: ObserverId,
    },
}

impl WatchEvent {
    pub fn id(&self) -> ObserverId {
        match self {
            WatchEvent::Created { id, .. }
            | WatchEvent::Tick { id, .. }
            | WatchEvent::Fired { id, .. }
            | WatchEvent::Cancelled { id, .. } => *id,
        }
    }
}
