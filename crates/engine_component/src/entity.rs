//! Entity handles and the recycling entity allocator.
//!
//! An [`Entity`] is a lightweight `(index, generation)` pair with no inherent
//! data. Indices are recycled through a free list; the generation is bumped
//! every time a slot is freed, so a handle kept past its entity's removal no
//! longer passes [`EntityAllocator::contains`].
//!
//! Live entities are kept in a dense array with a parallel sparse array
//! mapping `index -> dense position`, the same layout the component stores
//! use. Removal is a swap-remove: O(1), but it reorders the dense array.

use std::fmt;

/// Sparse-array marker for "no dense slot".
pub(crate) const EMPTY: u32 = u32::MAX;

/// Largest number of slots any capacity hint pre-allocates. Bigger hints are
/// clamped; the arrays still grow on demand.
pub const MAX_PREALLOCATION: usize = 1 << 16;

/// A handle naming a row across all component stores.
///
/// Index `0` is reserved for [`Entity::INVALID`]; allocated indices start at 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// The null / invalid entity sentinel.
    pub const INVALID: Entity = Entity {
        index: 0,
        generation: 0,
    };

    /// Create a handle from raw parts.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index. Recycled between incarnations.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation of the slot at the time this handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Returns `true` if this is not the reserved zero index.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.index != 0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// A live entity plus its bookkeeping counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRecord {
    /// The entity handle.
    pub entity: Entity,
    /// Number of components currently attached through the world.
    pub component_count: u32,
}

/// Allocates, tracks, and recycles entity handles.
#[derive(Debug)]
pub struct EntityAllocator {
    /// Live entities in dense order.
    dense: Vec<EntityRecord>,
    /// `sparse[index]` is the position of that index in `dense`, or `EMPTY`.
    sparse: Vec<u32>,
    /// Current generation of every slot ever allocated.
    generations: Vec<u32>,
    /// Indices released by `free`, reused LIFO.
    free_ids: Vec<u32>,
}

impl EntityAllocator {
    /// Creates a new allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an allocator with room for `capacity` live entities before
    /// its arrays need to grow. The hint is clamped to [`MAX_PREALLOCATION`].
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_PREALLOCATION);
        // Slot 0 is the reserved INVALID index.
        let mut sparse = Vec::with_capacity(capacity + 1);
        sparse.push(EMPTY);
        let mut generations = Vec::with_capacity(capacity + 1);
        generations.push(0);
        Self {
            dense: Vec::with_capacity(capacity),
            sparse,
            generations,
            free_ids: Vec::new(),
        }
    }

    /// Allocates an entity, reusing a freed index if one is available.
    pub fn allocate(&mut self) -> Entity {
        let index = match self.free_ids.pop() {
            Some(index) => index,
            None => {
                let index = self.sparse.len() as u32;
                self.sparse.push(EMPTY);
                self.generations.push(0);
                index
            }
        };

        let entity = Entity::new(index, self.generations[index as usize]);
        self.sparse[index as usize] = self.dense.len() as u32;
        self.dense.push(EntityRecord {
            entity,
            component_count: 0,
        });
        entity
    }

    /// Releases a live entity. Its index goes onto the free list and the slot
    /// generation is bumped.
    ///
    /// Returns the released record, or `None` if the handle was not live.
    pub fn free(&mut self, entity: Entity) -> Option<EntityRecord> {
        let pos = self.dense_index(entity)?;
        let index = entity.index() as usize;

        let record = self.dense.swap_remove(pos);
        if let Some(moved) = self.dense.get(pos) {
            self.sparse[moved.entity.index() as usize] = pos as u32;
        }
        self.sparse[index] = EMPTY;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free_ids.push(entity.index());
        Some(record)
    }

    /// Returns `true` if `entity` is live, including a generation match.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Returns the record of a live entity.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&EntityRecord> {
        self.dense_index(entity).map(|pos| &self.dense[pos])
    }

    /// Returns the mutable record of a live entity.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        self.dense_index(entity).map(move |pos| &mut self.dense[pos])
    }

    /// Live entities in dense order. The order changes on every removal.
    #[must_use]
    pub fn records(&self) -> &[EntityRecord] {
        &self.dense
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` when no entity is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Number of indices waiting to be recycled.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_ids.len()
    }

    fn dense_index(&self, entity: Entity) -> Option<usize> {
        if !entity.is_valid() {
            return None;
        }
        let pos = *self.sparse.get(entity.index() as usize)?;
        if pos == EMPTY {
            return None;
        }
        let pos = pos as usize;
        match self.dense.get(pos) {
            Some(record) if record.entity == entity => Some(pos),
            _ => None,
        }
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_entity_invalid() {
        assert!(!Entity::INVALID.is_valid());
        assert_eq!(Entity::INVALID.index(), 0);
    }

    #[test]
    fn test_huge_capacity_hint_is_clamped() {
        let mut alloc = EntityAllocator::with_capacity(usize::MAX);
        let a = alloc.allocate();
        assert_eq!(a.index(), 1);
        assert!(alloc.contains(a));
    }

    #[test]
    fn test_allocator_produces_sequential_ids() {
        let mut alloc = EntityAllocator::new();
        let e1 = alloc.allocate();
        let e2 = alloc.allocate();
        let e3 = alloc.allocate();
        assert_eq!(e1.index(), 1);
        assert_eq!(e2.index(), 2);
        assert_eq!(e3.index(), 3);
        assert_eq!(alloc.len(), 3);
    }

    #[test]
    fn test_free_patches_moved_entity() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let c = alloc.allocate();

        assert!(alloc.free(a).is_some());
        assert!(!alloc.contains(a));
        assert!(alloc.contains(b));
        assert!(alloc.contains(c));
        // c was swapped into a's dense slot.
        assert_eq!(alloc.records()[0].entity, c);
        assert_eq!(alloc.get(c).map(|r| r.entity), Some(c));
    }

    #[test]
    fn test_free_twice_is_rejected() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        assert!(alloc.free(a).is_some());
        assert!(alloc.free(a).is_none());
        assert_eq!(alloc.free_count(), 1);
    }

    #[test]
    fn test_stale_handle_after_recycle() {
        let mut alloc = EntityAllocator::new();
        let old = alloc.allocate();
        alloc.free(old);
        let new = alloc.allocate();

        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());
        assert!(alloc.contains(new));
        assert!(!alloc.contains(old));
    }

    #[test]
    fn test_recycled_ids_come_from_removed_set() {
        let mut alloc = EntityAllocator::with_capacity(4);
        let keep = alloc.allocate();
        let first: Vec<Entity> = (0..16).map(|_| alloc.allocate()).collect();
        for &e in &first {
            alloc.free(e);
        }
        let removed: HashSet<u32> = first.iter().map(|e| e.index()).collect();

        let second: Vec<Entity> = (0..16).map(|_| alloc.allocate()).collect();
        for e in &second {
            assert!(removed.contains(&e.index()));
            assert_ne!(e.index(), keep.index());
        }
        let unique: HashSet<u32> = second.iter().map(|e| e.index()).collect();
        assert_eq!(unique.len(), 16);
        assert_eq!(alloc.len(), 17);
    }

    #[test]
    fn test_invalid_and_unknown_handles() {
        let alloc = EntityAllocator::new();
        assert!(!alloc.contains(Entity::INVALID));
        assert!(!alloc.contains(Entity::new(99, 0)));
    }
}
