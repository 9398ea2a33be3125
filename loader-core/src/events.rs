use crate::WatchEvent;
use std::sync::Arc;

/// Event hook type
pub type EventFn = Arc<dyn Fn(&WatchEvent) + Send + Sync>;

/// No-op hook
pub fn no_op_events() -> EventFn {
    Arc::new(|_event: &WatchEvent| {})
}

/// Tracing hook - logs to tracing crate
pub fn tracing_events() -> EventFn {
    Arc::new(move |event: &WatchEvent| match event {
        WatchEvent::Created { id, pending, .. } => {
            tracing::debug!(target: "loader-core::observer", "Created({}, pending={:?})", id, pending);
        }
        WatchEvent::Tick {
            id,
            resolved,
            remaining,
            ..
        } => {
            tracing::trace!(
                target: "loader-core::observer",
                "Tick({}, resolved={:?}, remaining={})",
                id,
                resolved,
                remaining
            );
        }
        WatchEvent::Fired { id, ticks, .. } => {
            tracing::info!(target: "loader-core::observer", "Fired({}, ticks={})", id, ticks);
        }
        WatchEvent::Cancelled { id, .. } => {
            tracing::debug!(target: "loader-core::observer", "Cancelled({})", id);
        }
    })
}

/// Filter hook with custom predicate
pub fn filter_events<F>(wrapped: EventFn, predicate: F) -> EventFn
where
    F: Fn(&WatchEvent) -> bool + Send + Sync + 'static,
{
    Arc::new(move |event: &WatchEvent| {
        if predicate(event) {
            wrapped(event);
        }
    })
}

/// Tee hook - call multiple hooks
pub fn tee_events(hooks: Vec<EventFn>) -> EventFn {
    Arc::new(move |event: &WatchEvent| {
        for hook in &hooks {
            hook(event);
        }
    })
}
