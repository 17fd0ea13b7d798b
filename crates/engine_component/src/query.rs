//! Filter descriptors.
//!
//! A [`FilterDescriptor`] declares which component types an entity must hold
//! to be matched. The set is fixed once the descriptor is handed to the world,
//! so a filter can never be observed half-configured.

use std::collections::BTreeMap;

use crate::component::{Component, ComponentTypeId};

/// Describes the component types a filter requires.
///
/// ```rust
/// use engine_component::{Component, FilterDescriptor};
///
/// struct Position;
/// impl Component for Position {}
/// struct Velocity;
/// impl Component for Velocity {}
///
/// let moving = FilterDescriptor::new()
///     .include::<Position>()
///     .include::<Velocity>();
/// assert_eq!(moving.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterDescriptor {
    /// Required component types, with their names for diagnostics.
    included: BTreeMap<ComponentTypeId, &'static str>,
}

impl FilterDescriptor {
    /// Create a new empty descriptor. An empty descriptor matches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require component type `T`. Including a type twice has no effect.
    #[must_use]
    pub fn include<T: Component>(mut self) -> Self {
        self.included.insert(T::component_type_id(), T::type_name());
        self
    }

    /// Returns `true` if `type_id` is one of the required types.
    #[must_use]
    pub fn includes(&self, type_id: ComponentTypeId) -> bool {
        self.included.contains_key(&type_id)
    }

    /// Iterates the required component type IDs.
    pub fn included_types(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.included.keys().copied()
    }

    /// Iterates the names of the required component types.
    pub fn included_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.included.values().copied()
    }

    /// Number of required component types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.included.len()
    }

    /// Returns `true` if no type is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }
}
