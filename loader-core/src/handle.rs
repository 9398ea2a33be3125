use std::fmt;
use std::sync::Arc;

use crate::request::{ObservationRequest, ObserverId, ObserverState};

/// Caller-side view of an observation request.
///
/// Clones share the same request. Dropping a handle does not cancel it: a
/// waiting request stays alive through its polling task until it fires or
/// is cancelled. Use [`ObserverHandle::cancel_on_drop`] to tie the request
/// to a scope instead.
#[derive(Clone)]
pub struct ObserverHandle {
    request: Arc<ObservationRequest>,
}

impl ObserverHandle {
    pub(crate) fn new(request: Arc<ObservationRequest>) -> Self {
        Self { request }
    }

    pub fn id(&self) -> ObserverId {
        self.request.id()
    }

    pub fn state(&self) -> ObserverState {
        self.request.state()
    }

    pub fn is_waiting(&self) -> bool {
        self.state() == ObserverState::Waiting
    }

    /// Names not yet seen in the registry, in sorted order.
    pub fn pending(&self) -> Vec<String> {
        self.request.pending()
    }

    /// Stop polling and discard the completion without running it.
    ///
    /// Returns `true` if this call moved the request to `Cancelled`.
    pub fn cancel(&self) -> bool {
        self.request.cancel()
    }

    pub fn cancel_on_drop(self) -> ObserverGuard {
        ObserverGuard { handle: Some(self) }
    }
}

impl fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverHandle")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("pending", &self.pending())
            .finish()
    }
}

/// Cancels the wrapped request when dropped.
#[derive(Debug)]
pub struct ObserverGuard {
    handle: Option<ObserverHandle>,
}

impl ObserverGuard {
    pub fn handle(&self) -> Option<&ObserverHandle> {
        self.handle.as_ref()
    }

    /// Release the request without cancelling it.
    pub fn disarm(mut self) -> Option<ObserverHandle> {
        self.handle.take()
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }
}
