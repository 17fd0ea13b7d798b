//! Per-phase execution context provided to systems.

use std::collections::HashMap;

use engine_ecs::World;

use crate::phase::Phase;

/// Timing of the current pipeline call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInfo {
    /// Number of `Update` phases started so far.
    pub frame: u64,
    /// Delta time passed by the host for the current phase, in seconds.
    pub dt: f64,
}

/// The worlds a pipeline drives: one default world plus any named ones.
#[derive(Debug, Default)]
pub struct Worlds {
    default: World,
    named: HashMap<String, World>,
}

impl Worlds {
    /// Wrap a default world.
    #[must_use]
    pub fn new(default: World) -> Self {
        Self {
            default,
            named: HashMap::new(),
        }
    }

    /// The default world.
    #[must_use]
    pub fn default_world(&self) -> &World {
        &self.default
    }

    /// The default world, mutably.
    pub fn default_world_mut(&mut self) -> &mut World {
        &mut self.default
    }

    /// Add a named world, returning any world previously under that name.
    pub fn insert(&mut self, name: impl Into<String>, world: World) -> Option<World> {
        self.named.insert(name.into(), world)
    }

    /// A named world.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&World> {
        self.named.get(name)
    }

    /// A named world, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut World> {
        self.named.get_mut(name)
    }

    /// Names of the named worlds, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    /// Number of worlds, including the default one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.named.len() + 1
    }

    /// Always `false`: there is at least the default world.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Context handed to a system on each run.
#[derive(Debug)]
pub struct SystemContext<'a> {
    worlds: &'a mut Worlds,
    phase: Phase,
    frame: FrameInfo,
}

impl<'a> SystemContext<'a> {
    /// Create a context over `worlds` for one phase call.
    #[must_use]
    pub fn new(worlds: &'a mut Worlds, phase: Phase, frame: FrameInfo) -> Self {
        Self {
            worlds,
            phase,
            frame,
        }
    }

    /// The default world.
    pub fn world(&mut self) -> &mut World {
        self.worlds.default_world_mut()
    }

    /// A named world.
    pub fn world_named(&mut self, name: &str) -> Option<&mut World> {
        self.worlds.get_mut(name)
    }

    /// Every world this pipeline drives.
    pub fn worlds(&mut self) -> &mut Worlds {
        &mut *self.worlds
    }

    /// The phase being run.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Delta time passed by the host, in seconds. Zero for the one-shot
    /// phases.
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.frame.dt
    }

    /// Number of `Update` phases started so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame.frame
    }
}
