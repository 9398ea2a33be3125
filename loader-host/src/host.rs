use serde::Serialize;

/// Narrow view of the host-owned singletons the loader reads once the
/// required types exist. Hosts that cannot answer return `None`.
pub trait HostServices: Send + Sync + 'static {
    /// Identifier of the host's plugin manager singleton.
    fn plugin_host_uuid(&self) -> Option<String>;

    /// Build version string of the running host product.
    fn product_build_version(&self) -> Option<String>;
}

/// Snapshot of host details taken when the loader becomes ready.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    pub plugin_host_uuid: Option<String>,
    pub product_build_version: Option<String>,
}

impl HostInfo {
    pub fn read(host: &dyn HostServices) -> Self {
        Self {
            plugin_host_uuid: host.plugin_host_uuid(),
            product_build_version: host.product_build_version(),
        }
    }
}
