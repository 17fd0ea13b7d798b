//! Host configuration, loaded from JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use engine_ecs::WorldConfig;

use crate::demo::DemoConfig;
use crate::tick::TickConfig;

/// Everything the host reads at startup. Every section is optional.
///
/// ```json
/// {
///   "world": { "entity_cache_size": 2048 },
///   "tick": { "tick_rate": 60.0, "fixed_rate": 50.0, "max_ticks": 600 },
///   "demo": { "spawn_count": 256 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Capacity hints for the default world.
    pub world: WorldConfig,
    /// Tick loop timing.
    pub tick: TickConfig,
    /// Demo simulation settings.
    pub demo: DemoConfig,
}

impl AppConfig {
    /// Load a config file. The result is not validated; call
    /// [`AppConfig::validate`] once every override is applied.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid config '{}'", path.display()))
    }

    /// Reject settings the host cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.tick.validate().context("invalid tick settings")
    }
}
