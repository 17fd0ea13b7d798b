//! Host tick loop.
//!
//! Drives a [`SystemsPipeline`] through its lifecycle:
//!
//! 1. `init()` once, before the first tick.
//! 2. Per tick: `update(dt)`, then as many `fixed_update(fixed_dt)` steps as
//!    the accumulated time allows, then `late_update(dt)`.
//! 3. `destroy()` once, after the last tick.

use std::time::{Duration, Instant};

use anyhow::ensure;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use engine_system::{PipelineError, SystemsPipeline};

/// Configuration for the tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Fixed-step updates per second.
    pub fixed_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
    /// Upper bound on fixed steps per tick. Time beyond it is dropped.
    pub max_fixed_steps: u32,
    /// Sleep out the rest of each tick's budget. When `false`, ticks run
    /// back to back with simulated time.
    pub realtime: bool,
}

impl TickConfig {
    /// Check that both rates are finite and positive.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.tick_rate.is_finite() && self.tick_rate > 0.0,
            "tick_rate must be a positive number, got {}",
            self.tick_rate
        );
        ensure!(
            self.fixed_rate.is_finite() && self.fixed_rate > 0.0,
            "fixed_rate must be a positive number, got {}",
            self.fixed_rate
        );
        Ok(())
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            fixed_rate: 50.0,
            max_ticks: 0,
            max_fixed_steps: 8,
            realtime: true,
        }
    }
}

/// The host's tick loop state.
#[derive(Debug)]
pub struct TickLoop {
    /// Ticks completed so far.
    tick_id: u64,
    config: TickConfig,
    pipeline: SystemsPipeline,
    /// Simulated time not yet consumed by fixed steps.
    accumulator: f64,
    /// Fixed steps run so far.
    fixed_steps: u64,
}

impl TickLoop {
    /// Create a tick loop driving `pipeline`. `config` is expected to have
    /// passed [`TickConfig::validate`].
    #[must_use]
    pub fn new(config: TickConfig, pipeline: SystemsPipeline) -> Self {
        Self {
            tick_id: 0,
            config,
            pipeline,
            accumulator: 0.0,
            fixed_steps: 0,
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Total fixed steps run.
    #[must_use]
    pub fn fixed_steps(&self) -> u64 {
        self.fixed_steps
    }

    /// Returns a reference to the pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &SystemsPipeline {
        &self.pipeline
    }

    /// Run one tick with frame time `dt`.
    ///
    /// # Errors
    ///
    /// Propagates the first pipeline error; the rest of the tick is skipped.
    pub fn tick(&mut self, dt: f64) -> Result<(), PipelineError> {
        self.tick_id += 1;
        self.pipeline.update(dt)?;

        let fixed_dt = 1.0 / self.config.fixed_rate;
        self.accumulator += dt;
        let mut steps = 0u32;
        while self.accumulator >= fixed_dt {
            if steps == self.config.max_fixed_steps {
                warn!(
                    tick_id = self.tick_id,
                    dropped_secs = self.accumulator,
                    "fixed step budget exhausted, dropping time"
                );
                self.accumulator = 0.0;
                break;
            }
            self.pipeline.fixed_update(fixed_dt)?;
            self.accumulator -= fixed_dt;
            self.fixed_steps += 1;
            steps += 1;
        }

        self.pipeline.late_update(dt)?;

        debug!(
            tick_id = self.tick_id,
            dt,
            fixed_steps = steps,
            entities = self.pipeline.world().entity_count(),
            "tick complete"
        );
        Ok(())
    }

    /// Initialise the pipeline, run the configured number of ticks (or
    /// forever), then destroy it.
    ///
    /// # Errors
    ///
    /// Propagates the first pipeline error. `destroy()` is not attempted
    /// after a failed tick.
    pub fn run(&mut self) -> Result<(), PipelineError> {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let dt = tick_duration.as_secs_f64();

        info!(
            tick_rate = self.config.tick_rate,
            fixed_rate = self.config.fixed_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );
        self.pipeline.init()?;

        loop {
            let start = Instant::now();
            self.tick(dt)?;

            if self.config.max_ticks > 0 && self.tick_id >= self.config.max_ticks {
                info!(
                    ticks = self.tick_id,
                    fixed_steps = self.fixed_steps,
                    "tick loop complete"
                );
                break;
            }

            if !self.config.realtime {
                continue;
            }
            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }

        self.pipeline.destroy()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use engine_system::{LifecycleState, Phase, system_fn};

    use super::*;

    fn simulated(tick_rate: f64, fixed_rate: f64, max_ticks: u64) -> TickConfig {
        TickConfig {
            tick_rate,
            fixed_rate,
            max_ticks,
            realtime: false,
            ..TickConfig::default()
        }
    }

    fn recording_pipeline(log: &Rc<RefCell<Vec<Phase>>>) -> SystemsPipeline {
        let mut pipeline = SystemsPipeline::default();
        for phase in Phase::ALL {
            let log = Rc::clone(log);
            pipeline.register(
                system_fn(phase.as_str(), move |ctx| {
                    log.borrow_mut().push(ctx.phase());
                    Ok(())
                }),
                phase,
            );
        }
        pipeline
    }

    #[test]
    fn test_default_rates_are_valid() {
        assert!(TickConfig::default().validate().is_ok());
    }

    #[test]
    fn test_non_positive_or_non_finite_rates_are_rejected() {
        for bad in [0.0, -30.0, f64::NAN, f64::INFINITY] {
            let err = TickConfig {
                tick_rate: bad,
                ..TickConfig::default()
            }
            .validate()
            .unwrap_err();
            assert!(err.to_string().contains("tick_rate"));

            let err = TickConfig {
                fixed_rate: bad,
                ..TickConfig::default()
            }
            .validate()
            .unwrap_err();
            assert!(err.to_string().contains("fixed_rate"));
        }
    }

    #[test]
    fn test_tick_advances_counter() {
        let mut pipeline = SystemsPipeline::default();
        pipeline.init().unwrap();
        let mut tick_loop = TickLoop::new(TickConfig::default(), pipeline);
        assert_eq!(tick_loop.tick_id(), 0);
        tick_loop.tick(1.0 / 60.0).unwrap();
        assert_eq!(tick_loop.tick_id(), 1);
        tick_loop.tick(1.0 / 60.0).unwrap();
        assert_eq!(tick_loop.tick_id(), 2);
        assert_eq!(tick_loop.pipeline().frame(), 2);
    }

    #[test]
    fn test_tick_before_init_fails() {
        let mut tick_loop = TickLoop::new(TickConfig::default(), SystemsPipeline::default());
        assert!(matches!(
            tick_loop.tick(0.1),
            Err(PipelineError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_fixed_steps_follow_accumulated_time() {
        // 4 ticks/s and 2 fixed steps/s: one fixed step every other tick.
        let mut pipeline = SystemsPipeline::default();
        pipeline.init().unwrap();
        let mut tick_loop = TickLoop::new(simulated(4.0, 2.0, 0), pipeline);

        tick_loop.tick(0.25).unwrap();
        assert_eq!(tick_loop.fixed_steps(), 0);
        tick_loop.tick(0.25).unwrap();
        assert_eq!(tick_loop.fixed_steps(), 1);
        tick_loop.tick(0.25).unwrap();
        tick_loop.tick(0.25).unwrap();
        assert_eq!(tick_loop.fixed_steps(), 2);

        // A long frame catches up with several steps.
        tick_loop.tick(1.0).unwrap();
        assert_eq!(tick_loop.fixed_steps(), 4);
    }

    #[test]
    fn test_fixed_step_budget_drops_time() {
        let mut pipeline = SystemsPipeline::default();
        pipeline.init().unwrap();
        let config = TickConfig {
            max_fixed_steps: 2,
            ..simulated(4.0, 4.0, 0)
        };
        let mut tick_loop = TickLoop::new(config, pipeline);

        tick_loop.tick(2.0).unwrap();
        assert_eq!(tick_loop.fixed_steps(), 2);
        tick_loop.tick(0.25).unwrap();
        assert_eq!(tick_loop.fixed_steps(), 3);
    }

    #[test]
    fn test_phase_order_within_tick() {
        let log = Rc::default();
        let mut pipeline = recording_pipeline(&log);
        pipeline.init().unwrap();
        log.borrow_mut().clear();

        let mut tick_loop = TickLoop::new(simulated(2.0, 2.0, 0), pipeline);
        tick_loop.tick(0.5).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![Phase::Update, Phase::FixedUpdate, Phase::LateUpdate]
        );
    }

    #[test]
    fn test_run_limited_ticks() {
        let log = Rc::default();
        let pipeline = recording_pipeline(&log);
        let mut tick_loop = TickLoop::new(simulated(4.0, 2.0, 4), pipeline);
        tick_loop.run().unwrap();

        assert_eq!(tick_loop.tick_id(), 4);
        assert_eq!(tick_loop.fixed_steps(), 2);
        let log = log.borrow();
        assert_eq!(&log[..2], &[Phase::PreInit, Phase::Init]);
        assert_eq!(&log[log.len() - 2..], &[Phase::Destroy, Phase::PostDestroy]);
        assert_eq!(log.iter().filter(|p| **p == Phase::Update).count(), 4);
        assert_eq!(tick_loop.pipeline().state(), LifecycleState::Destroyed);
    }

    #[test]
    fn test_run_stops_on_system_error() {
        let mut pipeline = SystemsPipeline::default();
        pipeline.register(
            system_fn("fuse", |ctx| {
                if ctx.frame() == 3 {
                    anyhow::bail!("fuse blown");
                }
                Ok(())
            }),
            Phase::Update,
        );
        let mut tick_loop = TickLoop::new(simulated(60.0, 60.0, 10), pipeline);
        let err = tick_loop.run().unwrap_err();
        assert!(matches!(err, PipelineError::SystemFailed { .. }));
        assert_eq!(tick_loop.tick_id(), 3);
        assert_eq!(tick_loop.pipeline().state(), LifecycleState::Running);
    }
}
