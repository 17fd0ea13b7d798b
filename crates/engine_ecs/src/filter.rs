//! Cached component-set filters.
//!
//! A [`Filter`] holds a snapshot of the live entities that have every
//! component type in its [`FilterDescriptor`]. The world rebuilds the snapshot
//! from scratch whenever a component of an included type is attached
//! anywhere. Removals are not observed: after `remove_component` or
//! `remove_entity` the snapshot keeps the old entity until the next qualifying
//! attach or an explicit [`World::refresh_filters`](crate::World::refresh_filters).

use std::collections::HashMap;

use engine_component::{
    ComponentTypeId, Entity, EntityAllocator, ErasedStore, FilterDescriptor, MAX_PREALLOCATION,
};

/// Handle to a filter registered in a [`World`](crate::World).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterId(pub(crate) usize);

impl FilterId {
    /// Position of the filter in its world's registration order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A registered filter and its cached match list.
#[derive(Debug, Clone)]
pub struct Filter {
    id: FilterId,
    descriptor: FilterDescriptor,
    matching: Vec<Entity>,
}

impl Filter {
    pub(crate) fn new(id: FilterId, descriptor: FilterDescriptor, capacity: usize) -> Self {
        Self {
            id,
            descriptor,
            matching: Vec::with_capacity(capacity.min(MAX_PREALLOCATION)),
        }
    }

    /// This filter's handle.
    #[must_use]
    pub fn id(&self) -> FilterId {
        self.id
    }

    /// The component set this filter requires.
    #[must_use]
    pub fn descriptor(&self) -> &FilterDescriptor {
        &self.descriptor
    }

    /// The cached match list, in no particular order.
    #[must_use]
    pub fn matching_entities(&self) -> &[Entity] {
        &self.matching
    }

    /// Number of cached matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matching.len()
    }

    /// Returns `true` if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matching.is_empty()
    }

    /// Returns `true` if `entity` is in the cached match list.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.matching.contains(&entity)
    }

    /// Returns `true` if attaching a `type_id` component can change this
    /// filter's result.
    #[must_use]
    pub fn watches(&self, type_id: ComponentTypeId) -> bool {
        self.descriptor.includes(type_id)
    }

    /// Recompute the match list from current store membership.
    ///
    /// Candidates come from the smallest included store; each is kept if it
    /// is live and present in every other included store.
    pub(crate) fn rebuild(
        &mut self,
        entities: &EntityAllocator,
        stores: &HashMap<ComponentTypeId, Box<dyn ErasedStore>>,
    ) {
        self.matching.clear();
        if self.descriptor.is_empty() {
            return;
        }

        let mut included = Vec::with_capacity(self.descriptor.len());
        for type_id in self.descriptor.included_types() {
            match stores.get(&type_id) {
                Some(store) => included.push(&**store),
                // A type nobody has attached yet: nothing can match.
                None => return,
            }
        }
        included.sort_by_key(|store| store.len());

        let Some((smallest, rest)) = included.split_first() else {
            return;
        };
        self.matching.extend(smallest.entities().iter().copied().filter(|&entity| {
            entities.contains(entity) && rest.iter().all(|store| store.contains(entity))
        }));
    }
}
