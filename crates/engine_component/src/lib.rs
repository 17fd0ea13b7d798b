//! # engine_component
//!
//! The "E" and "C" in ECS: entity identity, the component contract, and
//! per-type component storage.
//!
//! This crate provides:
//!
//! - [`Component`] trait: the contract all ECS data must satisfy.
//! - [`Entity`]: generational `(index, generation)` entity handles.
//! - [`EntityAllocator`]: dense/sparse live-entity table with index recycling.
//! - [`ComponentStore`]: sparse-set storage for one component type, and its
//!   type-erased [`ErasedStore`] view.
//! - [`FilterDescriptor`]: the component set a filter requires.
//! - [`EcsError`]: failures of entity and component operations.

pub mod component;
pub mod entity;
pub mod error;
pub mod query;
pub mod storage;

pub use component::{Component, ComponentMeta, ComponentTypeId};
pub use entity::{Entity, EntityAllocator, EntityRecord, MAX_PREALLOCATION};
pub use error::EcsError;
pub use query::FilterDescriptor;
pub use storage::{ComponentStore, ErasedStore};
