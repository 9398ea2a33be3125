use std::time::Duration;

use loader_core::{
    ClassWatcher, DynamicRegistry, ObserverError, ObserverState, WatchConfig,
    DEFAULT_POLL_INTERVAL,
};

#[test]
fn default_interval_is_short() {
    let config = WatchConfig::default();
    assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    assert!(config.poll_interval < Duration::from_secs(1));
    assert!(config.validate().is_ok());
}

#[test]
fn parses_interval_from_toml() {
    let config = WatchConfig::from_toml_str("poll_interval_ms = 250").expect("parse");
    assert_eq!(config.poll_interval, Duration::from_millis(250));

    let config = WatchConfig::from_toml_str("").expect("empty document");
    assert_eq!(config, WatchConfig::default());
}

#[test]
fn rejects_zero_interval() {
    let err = WatchConfig::from_toml_str("poll_interval_ms = 0").expect_err("zero");
    assert!(matches!(err, ObserverError::InvalidConfig(_)));

    let config = WatchConfig::default().with_poll_interval(Duration::ZERO);
    let err = ClassWatcher::new(DynamicRegistry::new(), config)
        .err()
        .expect("zero interval rejected");
    assert!(matches!(err, ObserverError::InvalidConfig(_)));
}

#[test]
fn rejects_malformed_toml() {
    let err = WatchConfig::from_toml_str("poll_interval_ms = \"soon\"").expect_err("string");
    assert!(matches!(err, ObserverError::ConfigParse(_)));
}

#[test]
fn state_serializes_lowercase() {
    let states = [
        ObserverState::Waiting,
        ObserverState::Fired,
        ObserverState::Cancelled,
    ];
    let json = serde_json::to_string(&states).expect("serialize");
    assert_eq!(json, r#"["waiting","fired","cancelled"]"#);
    assert_eq!(ObserverState::Cancelled.to_string(), "cancelled");
    assert!(!ObserverState::Waiting.is_terminal());
}
