use loader_core::WatchConfig;
use serde::Deserialize;

use crate::error::Result;

/// Host types the loader waits for by default.
pub const DEFAULT_REQUIRED_TYPES: &[&str] =
    &["DVTPlugInManager", "NSProcessInfo(PBXTSPlatformAdditions)"];

/// Loader configuration.
///
/// ```toml
/// required_types = ["DVTPlugInManager"]
///
/// [watch]
/// poll_interval_ms = 50
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub required_types: Vec<String>,
    pub watch: WatchConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            required_types: DEFAULT_REQUIRED_TYPES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            watch: WatchConfig::default(),
        }
    }
}

impl LoaderConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: LoaderConfig = toml::from_str(source)?;
        config.watch.validate()?;
        Ok(config)
    }
}
