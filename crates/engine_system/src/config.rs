//! System registration settings.

use crate::phase::Phase;

/// How a system is registered into a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    /// Human-readable system name (e.g. `"movement"`).
    pub name: String,
    /// The phase the system runs in.
    pub phase: Phase,
    /// Disabled systems stay registered but are skipped.
    pub enabled: bool,
    /// Registration-time ordering hint. Lower runs first; equal values keep
    /// registration order. Not re-applied after registration.
    pub execution_order: i32,
}

impl SystemConfig {
    /// Create an enabled config with the default execution order.
    #[must_use]
    pub fn new(name: impl Into<String>, phase: Phase) -> Self {
        Self {
            name: name.into(),
            phase,
            enabled: true,
            execution_order: 0,
        }
    }

    /// Override the execution order hint.
    #[must_use]
    pub fn with_execution_order(mut self, order: i32) -> Self {
        self.execution_order = order;
        self
    }

    /// Set whether the system starts enabled.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
