use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;
use tokio::task::JoinHandle;

use crate::events::EventFn;
use crate::registry::TypeRegistry;
use crate::WatchEvent;

/// Identifier assigned to each request by its watcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u64);

impl ObserverId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// Request lifecycle. `Fired` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObserverState {
    Waiting,
    Fired,
    Cancelled,
}

impl ObserverState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ObserverState::Waiting)
    }
}

impl fmt::Display for ObserverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObserverState::Waiting => "waiting",
            ObserverState::Fired => "fired",
            ObserverState::Cancelled => "cancelled",
        })
    }
}

pub(crate) type Completion = Box<dyn FnOnce() + Send + 'static>;

/// Shared record behind every handle and the polling task.
///
/// The mutex is never held while the registry is queried or the completion
/// runs, so completions may freely touch their own handle.
pub(crate) struct ObservationRequest {
    id: ObserverId,
    registry: Arc<dyn TypeRegistry>,
    events: EventFn,
    inner: Mutex<Inner>,
}

/// Completion and timer taken out of a request at the `Fired` transition.
struct Firing {
    completion: Option<Completion>,
    ticks: u64,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    pending: BTreeSet<String>,
    completion: Option<Completion>,
    state: ObserverState,
    ticks: u64,
    timer: Option<JoinHandle<()>>,
}

impl ObservationRequest {
    pub(crate) fn new(
        id: ObserverId,
        pending: BTreeSet<String>,
        completion: Completion,
        registry: Arc<dyn TypeRegistry>,
        events: EventFn,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            registry,
            events,
            inner: Mutex::new(Inner {
                pending,
                completion: Some(completion),
                state: ObserverState::Waiting,
                ticks: 0,
                timer: None,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn id(&self) -> ObserverId {
        self.id
    }

    pub(crate) fn state(&self) -> ObserverState {
        self.lock().state
    }

    pub(crate) fn pending(&self) -> Vec<String> {
        self.lock().pending.iter().cloned().collect()
    }

    pub(crate) fn emit(&self, event: WatchEvent) {
        (self.events)(&event);
    }

    /// Names still pending that the registry resolves right now, or `None`
    /// once the request has left `Waiting`.
    fn query(&self) -> Option<Vec<String>> {
        let snapshot: Vec<String> = {
            let inner = self.lock();
            if inner.state.is_terminal() {
                return None;
            }
            inner.pending.iter().cloned().collect()
        };

        Some(
            snapshot
                .into_iter()
                .filter(|name| self.registry.is_resolvable(name))
                .collect(),
        )
    }

    /// Drop every pending name the registry now resolves, without firing.
    ///
    /// Returns the names resolved by this pass and the number still pending,
    /// or `None` once the request has left `Waiting`.
    pub(crate) fn resolve(&self) -> Option<(Vec<String>, usize)> {
        let resolved = self.query()?;
        let mut inner = self.lock();
        if inner.state.is_terminal() {
            return None;
        }
        for name in &resolved {
            inner.pending.remove(name);
        }
        Some((resolved, inner.pending.len()))
    }

    /// Transition `Waiting -> Fired` if nothing is pending and run the
    /// completion. Returns `true` only for the call that fired.
    pub(crate) fn complete(&self) -> bool {
        let firing = {
            let mut inner = self.lock();
            if inner.state.is_terminal() || !inner.pending.is_empty() {
                return false;
            }
            Self::begin_fire(&mut inner)
        };
        self.fire(firing);
        true
    }

    /// One scheduled re-check. Returns `true` when polling should stop.
    ///
    /// Removing the last name and the `Fired` transition share one critical
    /// section, so a concurrent cancel either wins before the names are gone
    /// or loses to the fire.
    pub(crate) fn tick(&self) -> bool {
        let Some(resolved) = self.query() else {
            return true;
        };

        let (remaining, firing) = {
            let mut inner = self.lock();
            if inner.state.is_terminal() {
                return true;
            }
            inner.ticks += 1;
            for name in &resolved {
                inner.pending.remove(name);
            }
            let remaining = inner.pending.len();
            let firing = (remaining == 0).then(|| Self::begin_fire(&mut inner));
            (remaining, firing)
        };

        self.emit(WatchEvent::Tick {
            ts: SystemTime::now(),
            id: self.id,
            resolved,
            remaining,
        });

        match firing {
            Some(firing) => {
                self.fire(firing);
                true
            }
            None => false,
        }
    }

    fn begin_fire(inner: &mut Inner) -> Firing {
        inner.state = ObserverState::Fired;
        Firing {
            completion: inner.completion.take(),
            ticks: inner.ticks,
            timer: inner.timer.take(),
        }
    }

    fn fire(&self, firing: Firing) {
        // The firing tick runs inside this task; dropping the handle detaches it.
        drop(firing.timer);

        if let Some(completion) = firing.completion {
            completion();
        }
        self.emit(WatchEvent::Fired {
            ts: SystemTime::now(),
            id: self.id,
            ticks: firing.ticks,
        });
    }

    /// Keep the polling task so cancellation can abort it.
    pub(crate) fn attach_timer(&self, timer: JoinHandle<()>) {
        let mut inner = self.lock();
        if inner.state.is_terminal() {
            timer.abort();
        } else {
            inner.timer = Some(timer);
        }
    }

    /// Transition `Waiting -> Cancelled`. Returns `true` only for the call
    /// that cancelled; later calls and calls after firing are no-ops.
    ///
    /// A request with nothing left pending is about to fire and cannot be
    /// cancelled.
    pub(crate) fn cancel(&self) -> bool {
        let (completion, timer) = {
            let mut inner = self.lock();
            if inner.state.is_terminal() || inner.pending.is_empty() {
                return false;
            }
            inner.state = ObserverState::Cancelled;
            (inner.completion.take(), inner.timer.take())
        };
        if let Some(timer) = timer {
            timer.abort();
        }
        drop(completion);

        self.emit(WatchEvent::Cancelled {
            ts: SystemTime::now(),
            id: self.id,
        });
        true
    }
}
