//! # engine_ecs
//!
//! The in-memory ECS world.
//!
//! - [`World`]: entity lifecycle, lazily registered component stores, and
//!   the entity/component CRUD surface.
//! - [`Filter`]: a cached list of entities holding a given component set,
//!   rebuilt when a component of an included type is attached.
//! - [`WorldConfig`]: capacity hints, loadable from JSON.
//!
//! Everything is single-threaded and synchronous. Diagnostics go through
//! `tracing`; the world never prints.

pub mod config;
pub mod filter;
pub mod world;

pub use config::{ConfigError, WorldConfig};
pub use filter::{Filter, FilterId};
pub use world::{World, WorldStats};

pub use engine_component::{
    Component, ComponentStore, ComponentTypeId, EcsError, Entity, EntityRecord, FilterDescriptor,
};
