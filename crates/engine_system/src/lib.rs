//! # engine_system
//!
//! Phase-ordered system execution on top of [`engine_ecs`] worlds.
//!
//! A [`SystemsPipeline`] owns a default [`World`](engine_ecs::World) (plus
//! any named ones) and a list of [`System`]s per [`Phase`]. The host calls
//! the lifecycle methods in order; each call runs the phase's enabled systems
//! synchronously, in registration order.
//!
//! ```text
//! init()  ->  update(dt) / late_update(dt) / fixed_update(dt)  ...  ->  destroy()
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use engine_system::{Phase, SystemConfig, SystemsPipeline, system_fn};
//!
//! let mut pipeline = SystemsPipeline::default();
//! pipeline.register_with(
//!     SystemConfig::new("tick", Phase::Update).with_execution_order(-1),
//!     system_fn("tick", |ctx| {
//!         let e = ctx.world().new_entity();
//!         ctx.world().remove_entity(e)?;
//!         Ok(())
//!     }),
//! );
//!
//! pipeline.init().unwrap();
//! pipeline.update(1.0 / 60.0).unwrap();
//! pipeline.destroy().unwrap();
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod phase;
pub mod pipeline;
pub mod system;

pub use config::SystemConfig;
pub use context::{FrameInfo, SystemContext, Worlds};
pub use error::PipelineError;
pub use phase::{LifecycleState, Phase};
pub use pipeline::{SystemId, SystemsPipeline};
pub use system::{FnSystem, System, system_fn};
