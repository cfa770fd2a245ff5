//! Entity store: the live set of fragment entities and their id allocator.
//!
//! # Duplicate ids
//! Inserting an entity whose id is already present breaks the uniqueness
//! invariant and is a programming error. Debug builds panic (`debug_assert!`);
//! release builds log an error and overwrite the previous entity. The overwritten
//! entity's body is returned to the caller so it can still be destroyed.
//!
//! Iteration is ordered by id so that everything derived from the store
//! (snapshots, despawn scans) is deterministic.

use std::collections::BTreeMap;

use crate::entity::{EntityId, FragmentEntity};

#[derive(Debug)]
pub struct EntityStore<H> {
    entities: BTreeMap<EntityId, FragmentEntity<H>>,
    next_id: EntityId,
}

impl<H> Default for EntityStore<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> EntityStore<H> {
    /// An empty store whose allocator starts at zero. A new simulation run
    /// always gets a new store; ids are never reset in place.
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Hands out the next unused id. Ids are monotonic and never reused.
    pub fn allocate(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Inserts `entity`. Returns the displaced entity if the id was already live
    /// (release builds only; see the module docs).
    pub fn insert(&mut self, entity: FragmentEntity<H>) -> Option<FragmentEntity<H>> {
        let id = entity.id;
        debug_assert!(
            !self.entities.contains_key(&id),
            "duplicate fragment id {id} inserted into the entity store"
        );
        let displaced = self.entities.insert(id, entity);
        if displaced.is_some() {
            log::error!("fragment id {id} inserted twice; previous entity overwritten");
        }
        displaced
    }

    pub fn remove(&mut self, id: EntityId) -> Option<FragmentEntity<H>> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&FragmentEntity<H>> {
        self.entities.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn for_each(&self, mut f: impl FnMut(&FragmentEntity<H>)) {
        self.entities.values().for_each(|e| f(e));
    }

    pub fn iter(&self) -> impl Iterator<Item = &FragmentEntity<H>> {
        self.entities.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Removes every entity, returning them so their bodies can be destroyed.
    /// The allocator is left untouched.
    pub fn drain(&mut self) -> Vec<FragmentEntity<H>> {
        std::mem::take(&mut self.entities).into_values().collect()
    }
}
