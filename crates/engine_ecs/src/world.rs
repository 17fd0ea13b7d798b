//! ECS World: entity identity, typed component stores, and filters.
//!
//! Components are Rust types. Each type gets its own
//! [`ComponentStore`], created lazily on first attach and kept in a registry
//! keyed by [`ComponentTypeId`]. The concrete store is recovered with a
//! checked downcast at each typed call site.
//!
//! ## Usage contract
//!
//! References handed out by the world borrow it, so the borrow checker
//! already forbids structural changes while one is alive. Slices such as
//! [`World::get_entities_with`] and [`Filter::matching_entities`] reorder on
//! every removal; systems that mutate while walking one must copy it first
//! (`to_vec()`), or defer the mutation.

use std::collections::HashMap;

use engine_component::{
    Component, ComponentStore, ComponentTypeId, EcsError, Entity, EntityAllocator, EntityRecord,
    ErasedStore, FilterDescriptor, MAX_PREALLOCATION,
};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::WorldConfig;
use crate::filter::{Filter, FilterId};

/// Point-in-time counters, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorldStats {
    /// Live entities.
    pub entities: usize,
    /// Indices waiting to be recycled.
    pub recycled_ids: usize,
    /// Registered component types.
    pub component_types: usize,
    /// Components stored across every type, including stale data left by
    /// `remove_entity`.
    pub components: usize,
    /// Registered filters.
    pub filters: usize,
}

/// The ECS world: entity storage, component stores, and filters.
pub struct World {
    config: WorldConfig,
    entities: EntityAllocator,
    stores: HashMap<ComponentTypeId, Box<dyn ErasedStore>>,
    filters: Vec<Filter>,
}

impl World {
    /// Create a world pre-sized by `config`.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            entities: EntityAllocator::with_capacity(config.entity_cache_size),
            stores: HashMap::with_capacity(config.pool_cache_size.min(MAX_PREALLOCATION)),
            filters: Vec::new(),
        }
    }

    /// The capacity hints this world was created with.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // -- Entity lifecycle --

    /// Create a new entity with no components, recycling a freed index if
    /// one is available.
    pub fn new_entity(&mut self) -> Entity {
        let entity = self.entities.allocate();
        trace!(%entity, "entity created");
        entity
    }

    /// Remove an entity. Its index is returned to the free list.
    ///
    /// Component data is left in the stores: it is invisible to the next
    /// incarnation of the index and is overwritten when that incarnation
    /// attaches the same type. Filters keep listing the entity until their
    /// next rebuild. Use [`World::despawn`] to drop the components as well.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if `entity` is not live.
    pub fn remove_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        match self.entities.free(entity) {
            Some(record) => {
                trace!(%entity, components = record.component_count, "entity removed");
                Ok(())
            }
            None => Err(self.report(EcsError::EntityNotFound { entity }, "remove_entity")),
        }
    }

    /// Remove every component of `entity`, then the entity itself.
    ///
    /// Costs one lookup per registered component type.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if `entity` is not live.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), EcsError> {
        if !self.entities.contains(entity) {
            return Err(self.report(EcsError::EntityNotFound { entity }, "despawn"));
        }
        for store in self.stores.values_mut() {
            store.remove_entity(entity);
        }
        self.remove_entity(entity)
    }

    /// Returns `true` if `entity` is live.
    #[must_use]
    pub fn contains_entity(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    /// Returns the record of a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if `entity` is not live.
    pub fn get_entity(&self, entity: Entity) -> Result<&EntityRecord, EcsError> {
        self.entities
            .get(entity)
            .ok_or(EcsError::EntityNotFound { entity })
    }

    /// Live entities in dense order. The order changes on every removal.
    #[must_use]
    pub fn entities(&self) -> &[EntityRecord] {
        self.entities.records()
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -- Component operations --

    /// Attach a default-initialised `T` to `entity` and return it.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if `entity` is not live, or
    /// [`EcsError::ComponentAlreadyAttached`] if it already holds a `T`. The
    /// world is unchanged on error.
    pub fn add_component<T: Component + Default>(
        &mut self,
        entity: Entity,
    ) -> Result<&mut T, EcsError> {
        self.insert_component(entity, T::default())
    }

    /// Attach `value` to `entity` and return it.
    ///
    /// Every filter that includes `T` is rebuilt before this returns.
    ///
    /// # Errors
    ///
    /// Same as [`World::add_component`].
    pub fn insert_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<&mut T, EcsError> {
        if !self.entities.contains(entity) {
            return Err(self.report(EcsError::EntityNotFound { entity }, "add_component"));
        }

        let inserted = self
            .store_or_register::<T>()
            .and_then(|store| store.insert(entity, value).map(|_| ()));
        if let Err(err) = inserted {
            return Err(self.report(err, "add_component"));
        }

        if let Some(record) = self.entities.get_mut(entity) {
            record.component_count += 1;
        }
        self.update_filters_for_add(T::component_type_id());

        self.component_mut_or_err(entity)
    }

    /// Return the `T` of `entity`, attaching a default one first if absent.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if `entity` is not live.
    pub fn get_or_add_component<T: Component + Default>(
        &mut self,
        entity: Entity,
    ) -> Result<&mut T, EcsError> {
        if self.has_component::<T>(entity) {
            return self.component_mut_or_err(entity);
        }
        self.add_component(entity)
    }

    /// Returns the `T` attached to `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if `entity` is not live, or
    /// [`EcsError::ComponentNotAttached`] if no `T` store exists or the
    /// entity holds no `T`.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        if !self.entities.contains(entity) {
            return Err(self.report(EcsError::EntityNotFound { entity }, "get_component"));
        }
        match self.store::<T>().and_then(|store| store.get(entity)) {
            Some(value) => Ok(value),
            None => Err(self.report(not_attached::<T>(entity), "get_component")),
        }
    }

    /// Returns the `T` attached to `entity` mutably.
    ///
    /// # Errors
    ///
    /// Same as [`World::get_component`].
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        if !self.entities.contains(entity) {
            return Err(self.report(EcsError::EntityNotFound { entity }, "get_component"));
        }
        if !self.has_component::<T>(entity) {
            return Err(self.report(not_attached::<T>(entity), "get_component"));
        }
        self.component_mut_or_err(entity)
    }

    /// Returns `true` if `entity` is live and holds a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
            && self
                .store::<T>()
                .is_some_and(|store| store.contains(entity))
    }

    /// Detach and return the `T` of `entity`.
    ///
    /// A no-op returning `None` if the entity is not live, the type has no
    /// store, or the entity holds no `T`. Filters are not updated.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.entities.contains(entity) {
            return None;
        }
        let value = self.store_mut::<T>()?.remove(entity)?;
        if let Some(record) = self.entities.get_mut(entity) {
            record.component_count = record.component_count.saturating_sub(1);
        }
        trace!(%entity, component = T::type_name(), "component removed");
        Some(value)
    }

    /// Overwrite the `T` of `entity` with `value`.
    ///
    /// Returns `false` and drops `value` if the entity is not live, the type
    /// has no store, or the entity holds no `T`.
    pub fn update_component<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        if !self.entities.contains(entity) {
            return false;
        }
        match self.store_mut::<T>().and_then(|store| store.get_mut(entity)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// All `T` values, in the dense order of [`World::get_entities_with`].
    /// Empty if the type has no store.
    #[must_use]
    pub fn get_components<T: Component>(&self) -> &[T] {
        self.store::<T>()
            .map(ComponentStore::components)
            .unwrap_or(&[])
    }

    /// All `T` values, mutably.
    pub fn get_components_mut<T: Component>(&mut self) -> &mut [T] {
        match self.store_mut::<T>() {
            Some(store) => store.components_mut(),
            None => &mut [],
        }
    }

    /// Entities with a `T` in the store, in dense order.
    ///
    /// This is raw store membership: it may include entities removed with
    /// [`World::remove_entity`] whose components were never detached.
    #[must_use]
    pub fn get_entities_with<T: Component>(&self) -> &[Entity] {
        self.store::<T>()
            .map(ComponentStore::entities)
            .unwrap_or(&[])
    }

    /// The typed store for `T`, if any `T` was ever attached.
    #[must_use]
    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&T::component_type_id())?
            .as_any()
            .downcast_ref()
    }

    /// The typed store for `T`, mutably.
    pub fn store_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.stores
            .get_mut(&T::component_type_id())?
            .as_any_mut()
            .downcast_mut()
    }

    /// Names of all registered component types, in no particular order.
    #[must_use]
    pub fn component_names(&self) -> Vec<&'static str> {
        self.stores.values().map(|store| store.meta().name).collect()
    }

    // -- Filters --

    /// Register a filter and return its handle.
    ///
    /// The match list is computed immediately from current membership.
    /// Registering a descriptor equal to an existing filter's returns the
    /// existing handle, after rebuilding that filter.
    pub fn create_filter(&mut self, descriptor: FilterDescriptor) -> FilterId {
        let Self {
            entities,
            stores,
            filters,
            ..
        } = &mut *self;
        if let Some(existing) = filters
            .iter_mut()
            .find(|filter| *filter.descriptor() == descriptor)
        {
            existing.rebuild(entities, stores);
            trace!(filter = existing.id().index(), matches = existing.len(), "filter reused");
            return existing.id();
        }

        let id = FilterId(self.filters.len());
        let mut filter = Filter::new(id, descriptor, self.config.entity_type_cache_size);
        filter.rebuild(&self.entities, &self.stores);
        debug!(
            filter = id.index(),
            includes = ?filter.descriptor().included_names().collect::<Vec<_>>(),
            matches = filter.len(),
            "filter created"
        );
        self.filters.push(filter);
        id
    }

    /// Returns a registered filter.
    #[must_use]
    pub fn filter(&self, id: FilterId) -> Option<&Filter> {
        self.filters.get(id.0)
    }

    /// The cached match list of a filter. Empty for an unknown handle.
    #[must_use]
    pub fn matching_entities(&self, id: FilterId) -> &[Entity] {
        self.filter(id)
            .map(Filter::matching_entities)
            .unwrap_or(&[])
    }

    /// All registered filters, in registration order.
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Rebuild every filter now, dropping entries made stale by removals.
    pub fn refresh_filters(&mut self) {
        let Self {
            entities,
            stores,
            filters,
            ..
        } = self;
        for filter in filters.iter_mut() {
            filter.rebuild(entities, stores);
        }
    }

    /// Rebuild every filter that includes `type_id`.
    fn update_filters_for_add(&mut self, type_id: ComponentTypeId) {
        let Self {
            entities,
            stores,
            filters,
            ..
        } = self;
        for filter in filters.iter_mut().filter(|filter| filter.watches(type_id)) {
            filter.rebuild(entities, stores);
        }
    }

    // -- Diagnostics --

    /// Point-in-time counters.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            entities: self.entities.len(),
            recycled_ids: self.entities.free_count(),
            component_types: self.stores.len(),
            components: self.stores.values().map(|store| store.len()).sum(),
            filters: self.filters.len(),
        }
    }

    // -- Internals --

    fn store_or_register<T: Component>(&mut self) -> Result<&mut ComponentStore<T>, EcsError> {
        let capacity = self.config.component_cache_size;
        self.stores
            .entry(T::component_type_id())
            .or_insert_with(|| {
                debug!(component = T::type_name(), "component store registered");
                Box::new(ComponentStore::<T>::with_capacity(capacity))
            })
            .as_any_mut()
            .downcast_mut()
            .ok_or(EcsError::ComponentNotAttached {
                component: T::type_name(),
                entity: Entity::INVALID,
            })
    }

    fn component_mut_or_err<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.store_mut::<T>()
            .and_then(|store| store.get_mut(entity))
            .ok_or_else(|| not_attached::<T>(entity))
    }

    /// Route a hard failure to the diagnostic sink and hand it back.
    fn report(&self, err: EcsError, operation: &'static str) -> EcsError {
        warn!(operation, error = %err, "world operation failed");
        err
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn not_attached<T: Component>(entity: Entity) -> EcsError {
    EcsError::ComponentNotAttached {
        component: T::type_name(),
        entity,
    }
}
