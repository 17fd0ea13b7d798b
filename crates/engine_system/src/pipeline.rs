//! Systems pipeline: the phase-ordered system registry and its driver.
//!
//! Systems are registered into exactly one [`Phase`]. Running a phase walks
//! that phase's list in order, skipping disabled systems, and hands each one
//! a [`SystemContext`] over the pipeline's worlds. Everything runs on the
//! caller's thread and completes before the call returns.
//!
//! A system error stops the phase immediately: later systems in the list do
//! not run, and the lifecycle state does not advance.

use tracing::{debug, info, trace, warn};

use engine_ecs::World;

use crate::config::SystemConfig;
use crate::context::{FrameInfo, SystemContext, Worlds};
use crate::error::PipelineError;
use crate::phase::{LifecycleState, Phase};
use crate::system::System;

/// Handle to a registered system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(u64);

/// A registered system with its settings.
struct SystemEntry {
    id: SystemId,
    config: SystemConfig,
    system: Box<dyn System>,
}

/// The ordered registry of systems, grouped by phase, plus the worlds they
/// run against.
pub struct SystemsPipeline {
    worlds: Worlds,
    phases: [Vec<SystemEntry>; Phase::COUNT],
    state: LifecycleState,
    frame: FrameInfo,
    next_id: u64,
}

impl SystemsPipeline {
    /// Create a pipeline driving `world` as its default world.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            worlds: Worlds::new(world),
            phases: std::array::from_fn(|_| Vec::new()),
            state: LifecycleState::Created,
            frame: FrameInfo::default(),
            next_id: 0,
        }
    }

    /// Add a named world that systems can reach through
    /// [`SystemContext::world_named`]. Returns any world previously under
    /// that name.
    pub fn add_world(&mut self, name: impl Into<String>, world: World) -> Option<World> {
        self.worlds.insert(name, world)
    }

    /// The default world.
    #[must_use]
    pub fn world(&self) -> &World {
        self.worlds.default_world()
    }

    /// The default world, mutably.
    pub fn world_mut(&mut self) -> &mut World {
        self.worlds.default_world_mut()
    }

    /// A named world.
    #[must_use]
    pub fn world_named(&self, name: &str) -> Option<&World> {
        self.worlds.get(name)
    }

    /// Every world this pipeline drives.
    #[must_use]
    pub fn worlds(&self) -> &Worlds {
        &self.worlds
    }

    /// Every world this pipeline drives, mutably.
    pub fn worlds_mut(&mut self) -> &mut Worlds {
        &mut self.worlds
    }

    // -- Registration --

    /// Register `system` into `phase` under its own name, enabled, with the
    /// default execution order.
    pub fn register(&mut self, system: impl System + 'static, phase: Phase) -> SystemId {
        let config = SystemConfig::new(system.name(), phase);
        self.register_with(config, system)
    }

    /// Register `system` with explicit settings.
    ///
    /// The system is placed after every system of its phase whose
    /// `execution_order` is lower or equal, so equal orders keep registration
    /// order. No duplicate detection is done.
    pub fn register_with(&mut self, config: SystemConfig, system: impl System + 'static) -> SystemId {
        let id = SystemId(self.next_id);
        self.next_id += 1;

        let list = &mut self.phases[config.phase.index()];
        let at = list
            .iter()
            .position(|entry| entry.config.execution_order > config.execution_order)
            .unwrap_or(list.len());

        debug!(
            system = %config.name,
            phase = %config.phase,
            order = config.execution_order,
            position = at,
            "system registered"
        );
        list.insert(
            at,
            SystemEntry {
                id,
                config,
                system: Box::new(system),
            },
        );
        id
    }

    /// Enable or disable a system. Returns `false` for an unknown handle.
    pub fn set_enabled(&mut self, id: SystemId, enabled: bool) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.config.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Whether a system is enabled, or `None` for an unknown handle.
    #[must_use]
    pub fn is_enabled(&self, id: SystemId) -> Option<bool> {
        self.phases
            .iter()
            .flatten()
            .find(|entry| entry.id == id)
            .map(|entry| entry.config.enabled)
    }

    /// Settings of the systems registered into `phase`, in run order.
    pub fn systems(&self, phase: Phase) -> impl Iterator<Item = &SystemConfig> {
        self.phases[phase.index()].iter().map(|entry| &entry.config)
    }

    /// Total number of registered systems across all phases.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.phases.iter().map(Vec::len).sum()
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Number of `Update` phases started so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame.frame
    }

    // -- Execution --

    /// Run every enabled system of `phase`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::OutOfOrder`] if `phase` may not run in the
    /// current state, or [`PipelineError::SystemFailed`] for the first system
    /// that returns an error. In both cases the state does not advance.
    pub fn run_phase(&mut self, phase: Phase) -> Result<(), PipelineError> {
        let Some(next) = self.state.after(phase) else {
            warn!(%phase, state = %self.state, "phase requested out of order");
            return Err(PipelineError::OutOfOrder {
                phase,
                state: self.state,
            });
        };

        if !phase.is_per_frame() {
            self.frame.dt = 0.0;
        }

        let Self {
            worlds,
            phases,
            frame,
            ..
        } = &mut *self;
        let mut ctx = SystemContext::new(worlds, phase, *frame);
        for entry in phases[phase.index()].iter_mut() {
            if !entry.config.enabled {
                trace!(system = %entry.config.name, %phase, "system disabled, skipped");
                continue;
            }
            trace!(system = %entry.config.name, %phase, "running system");
            if let Err(source) = entry.system.run(&mut ctx) {
                warn!(system = %entry.config.name, %phase, error = %source, "system failed");
                return Err(PipelineError::SystemFailed {
                    system: entry.config.name.clone(),
                    phase,
                    source,
                });
            }
        }

        if next != self.state {
            info!(%phase, from = %self.state, to = %next, "pipeline state changed");
            self.state = next;
        }
        Ok(())
    }

    /// Run `PreInit`, then `Init`.
    ///
    /// # Errors
    ///
    /// See [`SystemsPipeline::run_phase`].
    pub fn init(&mut self) -> Result<(), PipelineError> {
        self.run_phase(Phase::PreInit)?;
        self.run_phase(Phase::Init)
    }

    /// Start a new frame and run `Update` with delta time `dt`.
    ///
    /// # Errors
    ///
    /// See [`SystemsPipeline::run_phase`].
    pub fn update(&mut self, dt: f64) -> Result<(), PipelineError> {
        if self.state == LifecycleState::Running {
            self.frame.frame += 1;
        }
        self.frame.dt = dt;
        self.run_phase(Phase::Update)
    }

    /// Run `LateUpdate` with delta time `dt`.
    ///
    /// # Errors
    ///
    /// See [`SystemsPipeline::run_phase`].
    pub fn late_update(&mut self, dt: f64) -> Result<(), PipelineError> {
        self.frame.dt = dt;
        self.run_phase(Phase::LateUpdate)
    }

    /// Run `FixedUpdate` with the fixed step `dt`.
    ///
    /// # Errors
    ///
    /// See [`SystemsPipeline::run_phase`].
    pub fn fixed_update(&mut self, dt: f64) -> Result<(), PipelineError> {
        self.frame.dt = dt;
        self.run_phase(Phase::FixedUpdate)
    }

    /// Run `Destroy`, then `PostDestroy`.
    ///
    /// # Errors
    ///
    /// See [`SystemsPipeline::run_phase`].
    pub fn destroy(&mut self) -> Result<(), PipelineError> {
        self.run_phase(Phase::Destroy)?;
        self.run_phase(Phase::PostDestroy)
    }

    fn entry_mut(&mut self, id: SystemId) -> Option<&mut SystemEntry> {
        self.phases.iter_mut().flatten().find(|entry| entry.id == id)
    }
}

impl Default for SystemsPipeline {
    fn default() -> Self {
        Self::new(World::default())
    }
}

impl std::fmt::Debug for SystemsPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemsPipeline")
            .field("state", &self.state)
            .field("frame", &self.frame)
            .field("systems", &self.system_count())
            .field("worlds", &self.worlds.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use anyhow::bail;
    use engine_ecs::{Component, FilterDescriptor};

    use crate::system::system_fn;

    use super::*;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn recorder(log: &Log, name: &'static str) -> impl System + 'static {
        let log = Rc::clone(log);
        system_fn(name, move |_ctx| {
            log.borrow_mut().push(name);
            Ok(())
        })
    }

    fn running_pipeline() -> SystemsPipeline {
        let mut pipeline = SystemsPipeline::default();
        pipeline.init().unwrap();
        pipeline
    }

    #[test]
    fn test_registration_order_is_run_order() {
        let log = Log::default();
        let mut pipeline = running_pipeline();
        pipeline.register(recorder(&log, "s1"), Phase::Update);
        pipeline.register(recorder(&log, "s2"), Phase::Update);
        pipeline.register(recorder(&log, "s3"), Phase::Update);

        for _ in 0..3 {
            pipeline.run_phase(Phase::Update).unwrap();
        }
        assert_eq!(
            *log.borrow(),
            vec!["s1", "s2", "s3", "s1", "s2", "s3", "s1", "s2", "s3"]
        );
    }

    #[test]
    fn test_disabled_system_is_skipped() {
        let log = Log::default();
        let mut pipeline = running_pipeline();
        pipeline.register(recorder(&log, "s1"), Phase::Update);
        let s2 = pipeline.register(recorder(&log, "s2"), Phase::Update);
        pipeline.register(recorder(&log, "s3"), Phase::Update);

        assert!(pipeline.set_enabled(s2, false));
        assert_eq!(pipeline.is_enabled(s2), Some(false));
        pipeline.run_phase(Phase::Update).unwrap();
        assert_eq!(*log.borrow(), vec!["s1", "s3"]);

        log.borrow_mut().clear();
        pipeline.set_enabled(s2, true);
        pipeline.run_phase(Phase::Update).unwrap();
        assert_eq!(*log.borrow(), vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn test_registered_disabled() {
        let log = Log::default();
        let mut pipeline = running_pipeline();
        pipeline.register_with(
            SystemConfig::new("off", Phase::LateUpdate).with_enabled(false),
            recorder(&log, "off"),
        );
        pipeline.late_update(0.0).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_execution_order_sorts_at_registration() {
        let log = Log::default();
        let mut pipeline = running_pipeline();
        pipeline.register_with(
            SystemConfig::new("late", Phase::Update).with_execution_order(10),
            recorder(&log, "late"),
        );
        pipeline.register(recorder(&log, "a"), Phase::Update);
        pipeline.register_with(
            SystemConfig::new("early", Phase::Update).with_execution_order(-1),
            recorder(&log, "early"),
        );
        pipeline.register(recorder(&log, "b"), Phase::Update);

        let names: Vec<&str> = pipeline
            .systems(Phase::Update)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["early", "a", "b", "late"]);

        pipeline.update(0.016).unwrap();
        assert_eq!(*log.borrow(), vec!["early", "a", "b", "late"]);
    }

    #[test]
    fn test_failure_aborts_rest_of_phase() {
        let log = Log::default();
        let mut pipeline = SystemsPipeline::default();
        pipeline.register(recorder(&log, "first"), Phase::Init);
        pipeline.register(
            system_fn("broken", |_ctx| bail!("out of ammo")),
            Phase::Init,
        );
        pipeline.register(recorder(&log, "never"), Phase::Init);

        let err = pipeline.init().unwrap_err();
        match &err {
            PipelineError::SystemFailed { system, phase, .. } => {
                assert_eq!(system, "broken");
                assert_eq!(*phase, Phase::Init);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("out of ammo"));
        assert_eq!(*log.borrow(), vec!["first"]);
        // PreInit succeeded, Init did not.
        assert_eq!(pipeline.state(), LifecycleState::PreInitialized);
    }

    #[test]
    fn test_ecs_errors_propagate_through_systems() {
        #[derive(Debug, Default)]
        struct Tag;
        impl Component for Tag {}

        let mut pipeline = SystemsPipeline::default();
        pipeline.register(
            system_fn("double_tag", |ctx| {
                let world = ctx.world();
                let e = world.new_entity();
                world.add_component::<Tag>(e)?;
                world.add_component::<Tag>(e)?;
                Ok(())
            }),
            Phase::Init,
        );
        let err = pipeline.init().unwrap_err();
        assert!(err.to_string().contains("already attached"));
    }

    #[test]
    fn test_phases_out_of_order_are_rejected() {
        let mut pipeline = SystemsPipeline::default();
        assert!(matches!(
            pipeline.update(0.1),
            Err(PipelineError::OutOfOrder {
                phase: Phase::Update,
                state: LifecycleState::Created
            })
        ));
        assert!(matches!(
            pipeline.run_phase(Phase::PostDestroy),
            Err(PipelineError::OutOfOrder { .. })
        ));
        pipeline.init().unwrap();
        assert!(pipeline.init().is_err());
        pipeline.destroy().unwrap();
        assert_eq!(pipeline.state(), LifecycleState::Destroyed);
        assert!(pipeline.fixed_update(0.02).is_err());
    }

    #[test]
    fn test_full_lifecycle_runs_each_phase() {
        let log = Log::default();
        let mut pipeline = SystemsPipeline::default();
        for phase in Phase::ALL {
            pipeline.register(recorder(&log, phase.as_str()), phase);
        }

        pipeline.init().unwrap();
        pipeline.fixed_update(0.02).unwrap();
        pipeline.update(0.016).unwrap();
        pipeline.late_update(0.016).unwrap();
        pipeline.destroy().unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "pre_init",
                "init",
                "fixed_update",
                "update",
                "late_update",
                "destroy",
                "post_destroy"
            ]
        );
        assert_eq!(pipeline.frame(), 1);
        assert_eq!(pipeline.system_count(), Phase::COUNT);
    }

    #[test]
    fn test_context_reports_phase_and_dt() {
        let seen: Rc<RefCell<Vec<(Phase, f64, u64)>>> = Rc::default();
        let mut pipeline = SystemsPipeline::default();
        for phase in [Phase::Init, Phase::Update, Phase::FixedUpdate] {
            let seen = Rc::clone(&seen);
            pipeline.register(
                system_fn("probe", move |ctx| {
                    seen.borrow_mut().push((ctx.phase(), ctx.dt(), ctx.frame()));
                    Ok(())
                }),
                phase,
            );
        }
        pipeline.init().unwrap();
        pipeline.update(0.5).unwrap();
        pipeline.fixed_update(0.25).unwrap();
        pipeline.update(0.5).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                (Phase::Init, 0.0, 0),
                (Phase::Update, 0.5, 1),
                (Phase::FixedUpdate, 0.25, 1),
                (Phase::Update, 0.5, 2),
            ]
        );
    }

    #[test]
    fn test_systems_drive_world_through_filter() {
        #[derive(Debug, Clone, Copy, Default, PartialEq)]
        struct Position(f64);
        impl Component for Position {}

        #[derive(Debug, Clone, Copy, Default, PartialEq)]
        struct Velocity(f64);
        impl Component for Velocity {}

        let mut pipeline = SystemsPipeline::default();
        let moving = pipeline.world_mut().create_filter(
            FilterDescriptor::new()
                .include::<Position>()
                .include::<Velocity>(),
        );

        pipeline.register(
            system_fn("spawn", |ctx| {
                let world = ctx.world();
                for i in 0..4 {
                    let e = world.new_entity();
                    world.add_component::<Position>(e)?;
                    if i % 2 == 0 {
                        world.insert_component(e, Velocity(2.0))?;
                    }
                }
                Ok(())
            }),
            Phase::Init,
        );
        pipeline.register(
            system_fn("movement", move |ctx| {
                let dt = ctx.dt();
                let world = ctx.world();
                for e in world.matching_entities(moving).to_vec() {
                    let v = world.get_component::<Velocity>(e)?.0;
                    world.get_component_mut::<Position>(e)?.0 += v * dt;
                }
                Ok(())
            }),
            Phase::Update,
        );

        pipeline.init().unwrap();
        pipeline.update(0.5).unwrap();
        pipeline.update(0.5).unwrap();

        let world = pipeline.world();
        assert_eq!(world.matching_entities(moving).len(), 2);
        let mut positions: Vec<f64> = world.get_components::<Position>().iter().map(|p| p.0).collect();
        positions.sort_by(f64::total_cmp);
        assert_eq!(positions, vec![0.0, 0.0, 2.0, 2.0]);
    }

    #[test]
    fn test_named_world_reachable_from_systems() {
        let mut pipeline = SystemsPipeline::default();
        pipeline.add_world("events", World::default());
        pipeline.register(
            system_fn("emit", |ctx| {
                let Some(events) = ctx.world_named("events") else {
                    bail!("events world missing");
                };
                events.new_entity();
                Ok(())
            }),
            Phase::Init,
        );
        pipeline.init().unwrap();
        assert_eq!(pipeline.world_named("events").unwrap().entity_count(), 1);
        assert_eq!(pipeline.world().entity_count(), 0);
    }

    #[test]
    fn test_unknown_system_id() {
        let mut pipeline = SystemsPipeline::default();
        assert!(!pipeline.set_enabled(SystemId(42), false));
        assert_eq!(pipeline.is_enabled(SystemId(42)), None);
    }
}
