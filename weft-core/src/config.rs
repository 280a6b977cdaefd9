//! Runtime configuration.
//!
//! Configuration is per thread, matching the thread-local runtime. Call
//! [`configure`] before building any reactive graph to change the defaults.

use std::cell::RefCell;

/// Tunables for the reactive runtime and the renderers built on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum number of effect runs in a single flush. When exceeded, the
    /// remaining queue is dropped and an error is logged.
    pub max_flush_iterations: usize,

    /// Text of the marker node inserted when a match case fails to render.
    pub fallback_marker: String,

    /// Tag used for the `display: contents` containers created by the list
    /// and conditional renderers.
    pub container_tag: String,
}

impl RuntimeConfig {
    pub fn with_max_flush_iterations(mut self, limit: usize) -> Self {
        self.max_flush_iterations = limit;
        self
    }

    pub fn with_fallback_marker(mut self, marker: impl Into<String>) -> Self {
        self.fallback_marker = marker.into();
        self
    }

    pub fn with_container_tag(mut self, tag: impl Into<String>) -> Self {
        self.container_tag = tag.into();
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_flush_iterations: 10_000,
            fallback_marker: "[render error]".to_string(),
            container_tag: "div".to_string(),
        }
    }
}

thread_local! {
    static CONFIG: RefCell<RuntimeConfig> = RefCell::new(RuntimeConfig::default());
}

/// Install a configuration for the current thread.
pub fn configure(config: RuntimeConfig) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// Get a copy of the current thread's configuration.
pub fn runtime_config() -> RuntimeConfig {
    CONFIG.with(|c| c.borrow().clone())
}

/// Read a single field without cloning the whole configuration.
pub(crate) fn with_config<R>(f: impl FnOnce(&RuntimeConfig) -> R) -> R {
    CONFIG.with(|c| f(&c.borrow()))
}
