//! Session configuration flags.
//!
//! A [`SessionConf`] is a shared handle: clones see each other's updates, so
//! the harness can flip a flag on the same session an engine reads from.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Enables the engine's block read cache.
pub const IO_CACHE_ENABLED: &str = "engine.io.cache.enabled";

/// String key/value session settings
#[derive(Debug, Clone, Default)]
pub struct SessionConf {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionConf {
    /// Create an empty session configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SessionConf::set`], used when creating a session
    pub fn with(self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Set a value, replacing any previous one
    pub fn set(&self, key: &str, value: impl ToString) {
        let value = value.to_string();
        debug!(key, value = %value, "Session conf set");
        self.values.write().insert(key.to_string(), value);
    }

    /// Current value of a key
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    /// Boolean value of a key; unparseable values fall back to `default`
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            None => default,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                other => {
                    warn!(key, value = other, "Ignoring non-boolean session conf value");
                    default
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let conf = SessionConf::new();
        let handle = conf.clone();

        handle.set(IO_CACHE_ENABLED, true);
        assert!(conf.get_bool(IO_CACHE_ENABLED, false));

        conf.set(IO_CACHE_ENABLED, false);
        assert_eq!(handle.get(IO_CACHE_ENABLED).as_deref(), Some("false"));
    }

    #[test]
    fn test_get_bool_parsing() {
        let conf = SessionConf::new().with("a", "TRUE").with("b", " false ").with("c", "yes");

        assert!(conf.get_bool("a", false));
        assert!(!conf.get_bool("b", true));
        assert!(conf.get_bool("c", true));
        assert!(!conf.get_bool("c", false));
        assert!(conf.get_bool("missing", true));
    }
}
