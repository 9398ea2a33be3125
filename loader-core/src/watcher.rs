//! Request factory and polling scheduler.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::SystemTime;

use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::WatchConfig;
use crate::error::{ObserverError, Result};
use crate::events::{tracing_events, EventFn};
use crate::handle::ObserverHandle;
use crate::registry::TypeRegistry;
use crate::request::{ObservationRequest, ObserverId, ObserverState};
use crate::WatchEvent;

/// Creates observation requests against one registry and schedules their
/// re-checks on the current tokio runtime.
///
/// Requests are tracked weakly, so the watcher never keeps one alive.
pub struct ClassWatcher {
    registry: Arc<dyn TypeRegistry>,
    config: WatchConfig,
    events: EventFn,
    next_id: AtomicU64,
    requests: Mutex<HashMap<ObserverId, Weak<ObservationRequest>>>,
}

impl ClassWatcher {
    pub fn new(registry: impl TypeRegistry, config: WatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: Arc::new(registry),
            config,
            events: tracing_events(),
            next_id: AtomicU64::new(1),
            requests: Mutex::new(HashMap::new()),
        })
    }

    /// Replace the lifecycle hook (tracing by default).
    pub fn with_events(mut self, events: EventFn) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Run `completion` once every name in `names` resolves.
    ///
    /// The first check happens before this returns. If it already finds every
    /// name (or `names` is empty) the completion runs synchronously on the
    /// calling thread and the handle comes back `Fired`. Otherwise the names
    /// are re-checked every `poll_interval` on the current tokio runtime.
    pub fn observe<I, S, F>(&self, names: I, completion: F) -> Result<ObserverHandle>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce() + Send + 'static,
    {
        let mut pending = BTreeSet::new();
        for (position, name) in names.into_iter().enumerate() {
            let name: String = name.into();
            if name.trim().is_empty() {
                return Err(ObserverError::BlankName(position));
            }
            pending.insert(name);
        }

        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = ObservationRequest::new(
            id,
            pending,
            Box::new(completion),
            Arc::clone(&self.registry),
            Arc::clone(&self.events),
        );

        // Polling needs a runtime; the immediate case does not.
        let runtime = Handle::try_current().ok();
        let remaining = match request.resolve() {
            Some((_, remaining)) => remaining,
            None => 0,
        };
        if remaining > 0 && runtime.is_none() {
            tracing::debug!(target: "loader-core::observer", "{} rejected: no runtime", id);
            return Err(ObserverError::NoRuntime);
        }

        request.emit(WatchEvent::Created {
            ts: SystemTime::now(),
            id,
            pending: request.pending(),
        });

        match runtime {
            Some(runtime) if remaining > 0 => {
                self.track(&request);
                let polled = Arc::clone(&request);
                let period = self.config.poll_interval;
                let timer = runtime.spawn(async move {
                    let mut ticker = interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        ticker.tick().await;
                        if polled.tick() {
                            break;
                        }
                    }
                });
                request.attach_timer(timer);
            }
            _ => {
                request.complete();
            }
        }

        Ok(ObserverHandle::new(request))
    }

    /// Cancel a request by id. Unknown, fired and released ids are no-ops.
    pub fn cancel(&self, id: ObserverId) -> bool {
        let request = {
            let mut requests = self.lock_requests();
            let request = requests.remove(&id).and_then(|weak| weak.upgrade());
            Self::prune_locked(&mut requests);
            request
        };
        match request {
            Some(request) => request.cancel(),
            None => false,
        }
    }

    /// Cancel every request this watcher still has waiting.
    pub fn cancel_all(&self) -> usize {
        let requests: Vec<Arc<ObservationRequest>> = self
            .lock_requests()
            .drain()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect();
        let cancelled = requests.iter().filter(|request| request.cancel()).count();
        tracing::debug!(target: "loader-core::observer", "cancelled {} waiting requests", cancelled);
        cancelled
    }

    pub fn waiting_count(&self) -> usize {
        let mut requests = self.lock_requests();
        Self::prune_locked(&mut requests);
        requests.len()
    }

    /// Forget requests that have fired, been cancelled or been released.
    /// Returns how many entries were dropped.
    pub fn prune(&self) -> usize {
        Self::prune_locked(&mut self.lock_requests())
    }

    fn track(&self, request: &Arc<ObservationRequest>) {
        let mut requests = self.lock_requests();
        Self::prune_locked(&mut requests);
        requests.insert(request.id(), Arc::downgrade(request));
    }

    fn prune_locked(requests: &mut HashMap<ObserverId, Weak<ObservationRequest>>) -> usize {
        let before = requests.len();
        requests.retain(|_, weak| {
            weak.upgrade()
                .map(|request| request.state() == ObserverState::Waiting)
                .unwrap_or(false)
        });
        before - requests.len()
    }

    fn lock_requests(&self) -> MutexGuard<'_, HashMap<ObserverId, Weak<ObservationRequest>>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }
}
