use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use loader_core::{DynamicRegistry, ObserverState, WatchConfig};
use loader_host::{HostInfo, HostServices, LoaderConfig, PluginLoader, DEFAULT_REQUIRED_TYPES};
use tokio::runtime::{Builder, Runtime};

const POLL: Duration = Duration::from_millis(50);

struct StubHost {
    uuid: Option<&'static str>,
    build: Option<&'static str>,
}

impl HostServices for StubHost {
    fn plugin_host_uuid(&self) -> Option<String> {
        self.uuid.map(str::to_string)
    }

    fn product_build_version(&self) -> Option<String> {
        self.build.map(str::to_string)
    }
}

fn xcode_like() -> StubHost {
    StubHost {
        uuid: Some("8F1D2C3B-0000-4000-8000-1234567890AB"),
        build: Some("15C500b"),
    }
}

fn runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime")
}

fn loader(registry: &DynamicRegistry, host: StubHost) -> PluginLoader {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();
    let config = LoaderConfig {
        watch: WatchConfig::default().with_poll_interval(POLL),
        ..LoaderConfig::default()
    };
    PluginLoader::new(registry.clone(), host, config).expect("loader")
}

fn expected_info() -> HostInfo {
    HostInfo {
        plugin_host_uuid: Some("8F1D2C3B-0000-4000-8000-1234567890AB".to_string()),
        product_build_version: Some("15C500b".to_string()),
    }
}

#[test]
fn start_publishes_host_info_once_types_load() {
    runtime().block_on(async {
        tokio::time::pause();
        let registry = DynamicRegistry::new();
        let loader = loader(&registry, xcode_like());

        assert_eq!(loader.start().expect("start"), ObserverState::Waiting);
        tokio::time::sleep(POLL * 3).await;
        assert_eq!(loader.host_info(), None);

        registry.register_all(DEFAULT_REQUIRED_TYPES.iter().copied());
        let info = tokio::time::timeout(Duration::from_secs(1), loader.ready())
            .await
            .expect("loader should become ready");

        assert_eq!(info, Some(expected_info()));
        assert_eq!(loader.state(), Some(ObserverState::Fired));
        assert_eq!(loader.host_info(), Some(expected_info()));
    });
}

#[test]
fn start_is_immediate_when_host_already_loaded() {
    let registry = DynamicRegistry::new();
    registry.register_all(DEFAULT_REQUIRED_TYPES.iter().copied());
    let loader = loader(&registry, xcode_like());
    let rx = loader.subscribe();

    assert_eq!(loader.start().expect("start"), ObserverState::Fired);
    assert_eq!(*rx.borrow(), Some(expected_info()));
}

#[test]
fn repeated_start_does_not_stack_observers() {
    runtime().block_on(async {
        tokio::time::pause();
        let registry = DynamicRegistry::new();
        let loader = loader(&registry, xcode_like());

        loader.start().expect("start");
        loader.start().expect("start again");
        assert_eq!(loader.watcher().waiting_count(), 1);
    });
}

#[test]
fn stop_cancels_and_start_resumes() {
    runtime().block_on(async {
        tokio::time::pause();
        let registry = DynamicRegistry::new();
        let loader = loader(&registry, xcode_like());

        assert!(!loader.stop());
        loader.start().expect("start");
        assert!(loader.stop());
        assert!(!loader.stop());

        registry.register_all(DEFAULT_REQUIRED_TYPES.iter().copied());
        tokio::time::sleep(POLL * 4).await;
        assert_eq!(loader.state(), Some(ObserverState::Cancelled));
        assert_eq!(loader.host_info(), None);

        // Types are loaded now, so a fresh start fires straight away.
        assert_eq!(loader.start().expect("restart"), ObserverState::Fired);
        assert_eq!(loader.host_info(), Some(expected_info()));
    });
}

#[test]
fn silent_host_leaves_fields_empty() {
    let registry = DynamicRegistry::new();
    registry.register_all(DEFAULT_REQUIRED_TYPES.iter().copied());
    let loader = loader(
        &registry,
        StubHost {
            uuid: None,
            build: Some("15C500b"),
        },
    );

    loader.start().expect("start");
    assert_eq!(
        loader.host_info(),
        Some(HostInfo {
            plugin_host_uuid: None,
            product_build_version: Some("15C500b".to_string()),
        })
    );
}

#[test]
fn config_parses_from_toml() {
    let config = LoaderConfig::from_toml_str(
        r#"
required_types = ["DVTPlugInManager"]

[watch]
poll_interval_ms = 20
"#,
    )
    .expect("parse");
    assert_eq!(config.required_types, vec!["DVTPlugInManager".to_string()]);
    assert_eq!(config.watch.poll_interval, Duration::from_millis(20));

    let defaults = LoaderConfig::from_toml_str("").expect("empty document");
    assert_eq!(defaults, LoaderConfig::default());
    assert_eq!(defaults.required_types.len(), DEFAULT_REQUIRED_TYPES.len());

    assert!(LoaderConfig::from_toml_str("[watch]\npoll_interval_ms = 0").is_err());
}

/// Host whose services query the loader that is reading them.
struct ReentrantHost {
    loader: Arc<OnceLock<Arc<PluginLoader>>>,
    seen: Arc<Mutex<Vec<(Option<ObserverState>, bool)>>>,
}

impl HostServices for ReentrantHost {
    fn plugin_host_uuid(&self) -> Option<String> {
        let loader = self.loader.get()?;
        self.seen.lock().unwrap().push((loader.state(), loader.stop()));
        Some("8F1D2C3B-0000-4000-8000-1234567890AB".to_string())
    }

    fn product_build_version(&self) -> Option<String> {
        None
    }
}

#[test]
fn host_services_may_call_back_into_the_loader() {
    let registry = DynamicRegistry::new();
    registry.register_all(DEFAULT_REQUIRED_TYPES.iter().copied());
    let cell = Arc::new(OnceLock::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let host = ReentrantHost {
        loader: Arc::clone(&cell),
        seen: Arc::clone(&seen),
    };
    let loader = Arc::new(
        PluginLoader::new(registry, host, LoaderConfig::default()).expect("loader"),
    );
    assert!(cell.set(Arc::clone(&loader)).is_ok());

    assert_eq!(loader.start().expect("start"), ObserverState::Fired);
    assert_eq!(&*seen.lock().unwrap(), &[(None, false)]);
    assert_eq!(loader.state(), Some(ObserverState::Fired));
    assert_eq!(
        loader.host_info().and_then(|info| info.plugin_host_uuid),
        Some("8F1D2C3B-0000-4000-8000-1234567890AB".to_string())
    );
}
