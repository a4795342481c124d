//! Environment variable access.
//!
//! The native implementation reads the process environment. [`MapEnvironment`]
//! holds a fixed set of variables and is what tests and embedders use so
//! they never have to mutate process-global state.

use std::collections::HashMap;

/// Read-only environment lookup.
pub trait Environment: Send + Sync {
    /// The value of `name`, or `None` if it is unset or not valid unicode.
    fn get_var(&self, name: &str) -> Option<String>;
}

/// Process environment via [`std::env`].
pub struct NativeEnvironment;

impl Environment for NativeEnvironment {
    fn get_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory environment.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl Environment for MapEnvironment {
    fn get_var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
