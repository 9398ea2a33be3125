//! Lookup-by-name seam over the host's live type registry.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Answers whether a named runtime type currently exists.
///
/// Implementations must be cheap and side-effect free; the watcher calls
/// this once per pending name on every poll tick.
pub trait TypeRegistry: Send + Sync + 'static {
    fn is_resolvable(&self, name: &str) -> bool;
}

impl<F> TypeRegistry for F
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    fn is_resolvable(&self, name: &str) -> bool {
        self(name)
    }
}

/// In-memory registry the host fills in as its bootstrap progresses.
///
/// Clones share the same name set.
#[derive(Clone, Debug, Default)]
pub struct DynamicRegistry {
    names: Arc<RwLock<HashSet<String>>>,
}

impl DynamicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a type as loaded. Returns `false` if it was already present.
    pub fn register(&self, name: impl Into<String>) -> bool {
        let mut names = self.names.write().unwrap_or_else(|e| e.into_inner());
        names.insert(name.into())
    }

    pub fn register_all<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = self.names.write().unwrap_or_else(|e| e.into_inner());
        set.extend(names.into_iter().map(Into::into));
    }

    /// Forget a type. Returns `true` if it was present.
    pub fn unregister(&self, name: &str) -> bool {
        let mut names = self.names.write().unwrap_or_else(|e| e.into_inner());
        names.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        let names = self.names.read().unwrap_or_else(|e| e.into_inner());
        names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TypeRegistry for DynamicRegistry {
    fn is_resolvable(&self, name: &str) -> bool {
        self.contains(name)
    }
}
