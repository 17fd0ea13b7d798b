//! Sparse-set component storage.
//!
//! A [`ComponentStore<T>`] maps entities to values of one component type:
//!
//! ```text
//! sparse:   [EMPTY, 1, EMPTY, 0]     index -> dense position
//! entities: [Entity(3v0), Entity(1v0)]
//! values:   [T,           T          ]
//! ```
//!
//! For every stored entity `e`, `entities[sparse[e.index]] == e`. Removal
//! swaps the last dense slot into the hole and patches its sparse entry, so
//! it is O(1) and never compacts. Dense order is therefore not insertion order
//! and changes on every removal.
//!
//! References returned by the accessors are only valid until the next
//! structural change (insert or remove) of the same store.

use std::any::Any;

use crate::component::{Component, ComponentMeta};
use crate::entity::{EMPTY, Entity, MAX_PREALLOCATION};
use crate::error::EcsError;

/// Dense/sparse storage for a single component type.
#[derive(Debug, Clone)]
pub struct ComponentStore<T> {
    sparse: Vec<u32>,
    entities: Vec<Entity>,
    values: Vec<T>,
}

impl<T: Component> ComponentStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty store with room for `capacity` components, clamped
    /// to [`MAX_PREALLOCATION`].
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_PREALLOCATION);
        Self {
            sparse: Vec::with_capacity(capacity),
            entities: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Attaches `value` to `entity`.
    ///
    /// A slot still holding data for an older generation of the same index is
    /// overwritten in place.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentAlreadyAttached`] if `entity` already has
    /// a component in this store. The store is left untouched.
    pub fn insert(&mut self, entity: Entity, value: T) -> Result<&mut T, EcsError> {
        if self.contains(entity) {
            return Err(EcsError::ComponentAlreadyAttached {
                component: T::type_name(),
                entity,
            });
        }
        let pos = self.place(entity, value);
        Ok(&mut self.values[pos])
    }

    /// Returns the component of `entity`, inserting the value produced by `f`
    /// if it has none.
    pub fn get_or_insert_with(&mut self, entity: Entity, f: impl FnOnce() -> T) -> &mut T {
        let pos = match self.position(entity) {
            Some(pos) => pos,
            None => self.place(entity, f()),
        };
        &mut self.values[pos]
    }

    /// Returns the component of `entity`, inserting `T::default()` if absent.
    pub fn get_or_default(&mut self, entity: Entity) -> &mut T
    where
        T: Default,
    {
        self.get_or_insert_with(entity, T::default)
    }

    /// Returns `true` if `entity` has a component in this store.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.position(entity).is_some()
    }

    /// Returns the component of `entity`.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.position(entity).map(|pos| &self.values[pos])
    }

    /// Returns the component of `entity` mutably.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.position(entity).map(move |pos| &mut self.values[pos])
    }

    /// Detaches and returns the component of `entity`.
    ///
    /// Returns `None` and leaves the store unchanged if `entity` has none.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let pos = self.position(entity)?;
        self.entities.swap_remove(pos);
        let value = self.values.swap_remove(pos);
        if let Some(moved) = self.entities.get(pos) {
            self.sparse[moved.index() as usize] = pos as u32;
        }
        self.sparse[entity.index() as usize] = EMPTY;
        Some(value)
    }

    /// Entities holding this component, in dense order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Component values, parallel to [`ComponentStore::entities`].
    #[must_use]
    pub fn components(&self) -> &[T] {
        &self.values
    }

    /// Mutable component values, parallel to [`ComponentStore::entities`].
    pub fn components_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Iterates `(entity, &value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.values.iter())
    }

    /// Iterates `(entity, &mut value)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.values.iter_mut())
    }

    /// Number of stored components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the store holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes every component.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.entities.clear();
        self.values.clear();
    }

    /// Stores `value` for an entity known to be absent and returns its dense
    /// position.
    fn place(&mut self, entity: Entity, value: T) -> usize {
        let index = entity.index() as usize;
        if index >= self.sparse.len() {
            self.sparse.resize(index + 1, EMPTY);
        }

        let slot = self.sparse[index];
        if slot != EMPTY {
            // Leftover from a previous incarnation of this index.
            let pos = slot as usize;
            self.entities[pos] = entity;
            self.values[pos] = value;
            return pos;
        }

        let pos = self.values.len();
        self.sparse[index] = pos as u32;
        self.entities.push(entity);
        self.values.push(value);
        pos
    }

    fn position(&self, entity: Entity) -> Option<usize> {
        let slot = *self.sparse.get(entity.index() as usize)?;
        if slot == EMPTY {
            return None;
        }
        let pos = slot as usize;
        (self.entities.get(pos) == Some(&entity)).then_some(pos)
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Object-safe view of a [`ComponentStore<T>`] with the type erased.
///
/// The world keeps one boxed store per component type and recovers the
/// concrete store with a checked downcast through [`ErasedStore::as_any`].
pub trait ErasedStore: Any + Send + Sync {
    /// Metadata of the stored component type.
    fn meta(&self) -> ComponentMeta;

    /// Returns `true` if `entity` has a component in this store.
    fn contains(&self, entity: Entity) -> bool;

    /// Detaches the component of `entity`, dropping it. Returns `true` if one
    /// was present.
    fn remove_entity(&mut self, entity: Entity) -> bool;

    /// Entities holding this component, in dense order.
    fn entities(&self) -> &[Entity];

    /// Number of stored components.
    fn len(&self) -> usize;

    /// Returns `true` if the store holds nothing.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upcast for downcasting to the concrete store.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete store.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn meta(&self) -> ComponentMeta {
        T::meta()
    }

    fn contains(&self, entity: Entity) -> bool {
        ComponentStore::contains(self, entity)
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
