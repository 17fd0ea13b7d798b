//! Lifecycle phases and the pipeline state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A fixed lifecycle stage a system is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Runs once, before [`Phase::Init`].
    PreInit,
    /// Runs once; afterwards the per-frame phases are allowed.
    Init,
    /// Per-frame update.
    Update,
    /// Per-frame update after [`Phase::Update`], by host convention.
    LateUpdate,
    /// Fixed-timestep update.
    FixedUpdate,
    /// Runs once at shutdown.
    Destroy,
    /// Runs once, after [`Phase::Destroy`].
    PostDestroy,
}

impl Phase {
    /// Number of phases.
    pub const COUNT: usize = 7;

    /// Every phase in lifecycle order.
    pub const ALL: [Phase; Self::COUNT] = [
        Phase::PreInit,
        Phase::Init,
        Phase::Update,
        Phase::LateUpdate,
        Phase::FixedUpdate,
        Phase::Destroy,
        Phase::PostDestroy,
    ];

    /// Dense index of this phase, in lifecycle order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns `true` for the phases a host drives repeatedly.
    #[must_use]
    pub const fn is_per_frame(self) -> bool {
        matches!(self, Phase::Update | Phase::LateUpdate | Phase::FixedUpdate)
    }

    /// Short name, as used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::PreInit => "pre_init",
            Phase::Init => "init",
            Phase::Update => "update",
            Phase::LateUpdate => "late_update",
            Phase::FixedUpdate => "fixed_update",
            Phase::Destroy => "destroy",
            Phase::PostDestroy => "post_destroy",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a pipeline is in its lifecycle.
///
/// ```text
/// Created --PreInit--> PreInitialized --Init--> Running --Destroy--> Destroying --PostDestroy--> Destroyed
///    \____________________Init___________________/   ^  |
///                                                    |__| Update / LateUpdate / FixedUpdate
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Nothing has run yet.
    Created,
    /// `PreInit` has completed.
    PreInitialized,
    /// `Init` has completed; per-frame phases may run.
    Running,
    /// `Destroy` has completed.
    Destroying,
    /// `PostDestroy` has completed. Terminal.
    Destroyed,
}

impl LifecycleState {
    /// The state after `phase` completes, or `None` if `phase` may not run
    /// in this state.
    #[must_use]
    pub const fn after(self, phase: Phase) -> Option<LifecycleState> {
        use LifecycleState::*;
        match (self, phase) {
            (Created, Phase::PreInit) => Some(PreInitialized),
            (Created | PreInitialized, Phase::Init) => Some(Running),
            (Running, Phase::Update | Phase::LateUpdate | Phase::FixedUpdate) => Some(Running),
            (Running, Phase::Destroy) => Some(Destroying),
            (Destroying, Phase::PostDestroy) => Some(Destroyed),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::PreInitialized => "pre_initialized",
            LifecycleState::Running => "running",
            LifecycleState::Destroying => "destroying",
            LifecycleState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}
