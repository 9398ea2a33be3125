use std::sync::{Arc, Mutex, MutexGuard};

use loader_core::{ClassWatcher, ObserverHandle, ObserverState, TypeRegistry};
use tokio::sync::watch;

use crate::config::LoaderConfig;
use crate::error::Result;
use crate::host::{HostInfo, HostServices};

/// Plugin loader entry point.
///
/// [`PluginLoader::start`] waits for the configured host types and then
/// publishes a [`HostInfo`] snapshot to subscribers.
pub struct PluginLoader {
    watcher: Arc<ClassWatcher>,
    host: Arc<dyn HostServices>,
    config: LoaderConfig,
    started: Mutex<Option<ObserverHandle>>,
    info_tx: Arc<watch::Sender<Option<HostInfo>>>,
}

impl PluginLoader {
    pub fn new(
        registry: impl TypeRegistry,
        host: impl HostServices,
        config: LoaderConfig,
    ) -> Result<Self> {
        let watcher = ClassWatcher::new(registry, config.watch.clone())?;
        Ok(Self::with_watcher(Arc::new(watcher), host, config))
    }

    /// Share an existing watcher, e.g. one other plugin code also observes through.
    pub fn with_watcher(
        watcher: Arc<ClassWatcher>,
        host: impl HostServices,
        config: LoaderConfig,
    ) -> Self {
        let (info_tx, _) = watch::channel(None);
        Self {
            watcher,
            host: Arc::new(host),
            config,
            started: Mutex::new(None),
            info_tx: Arc::new(info_tx),
        }
    }

    /// Begin waiting for the host. Host details may be published after this
    /// returns, once the host finishes loading the required types.
    ///
    /// Calling again while a start is waiting or has fired is a no-op; a
    /// stopped loader starts over.
    pub fn start(&self) -> Result<ObserverState> {
        if let Some(state) = self.active_state() {
            tracing::debug!(target: "loader-host::loader", "start ignored: already {}", state);
            return Ok(state);
        }

        // Not locked here: the completion may run before `observe` returns and
        // host services are free to call back into the loader.
        let host = Arc::clone(&self.host);
        let info_tx = Arc::clone(&self.info_tx);
        let handle = self
            .watcher
            .observe(self.config.required_types.iter().cloned(), move || {
                let info = HostInfo::read(host.as_ref());
                tracing::info!(
                    target: "loader-host::loader",
                    "host ready: plugin host {:?}, build {:?}",
                    info.plugin_host_uuid,
                    info.product_build_version
                );
                info_tx.send_replace(Some(info));
            })?;

        let mut started = self.lock_started();
        if let Some(existing) = started.as_ref() {
            let state = existing.state();
            if state != ObserverState::Cancelled {
                // A concurrent start got there first.
                handle.cancel();
                return Ok(state);
            }
        }

        let state = handle.state();
        tracing::debug!(
            target: "loader-host::loader",
            "start {}: {} ({:?} pending)",
            handle.id(),
            state,
            handle.pending()
        );
        *started = Some(handle);
        Ok(state)
    }

    /// Cancel a waiting start. Returns `true` if something was cancelled.
    pub fn stop(&self) -> bool {
        let handle = self.lock_started().clone();
        match handle {
            Some(handle) => handle.cancel(),
            None => false,
        }
    }

    pub fn state(&self) -> Option<ObserverState> {
        self.lock_started().as_ref().map(ObserverHandle::state)
    }

    pub fn host_info(&self) -> Option<HostInfo> {
        self.info_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<HostInfo>> {
        self.info_tx.subscribe()
    }

    /// Wait until host details are published.
    pub async fn ready(&self) -> Option<HostInfo> {
        let mut rx = self.subscribe();
        let info = rx.wait_for(Option::is_some).await.ok()?;
        info.clone()
    }

    pub fn watcher(&self) -> &Arc<ClassWatcher> {
        &self.watcher
    }

    fn active_state(&self) -> Option<ObserverState> {
        self.state().filter(|state| *state != ObserverState::Cancelled)
    }

    fn lock_started(&self) -> MutexGuard<'_, Option<ObserverHandle>> {
        self.started.lock().unwrap_or_else(|e| e.into_inner())
    }
}
