use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_EPOCH: AtomicU32 = AtomicU32::new(1);

/// Unique identifier with generation tracking to prevent stale references.
///
/// `epoch` identifies the arena that issued the id, so a handle kept across a
/// world rebuild never resolves against the replacement world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct GenerationalId {
    pub epoch: u32,
    pub index: usize,
    pub generation: u32,
}

impl GenerationalId {
    pub fn new(epoch: u32, index: usize, generation: u32) -> Self {
        Self {
            epoch,
            index,
            generation,
        }
    }
}

/// Handle of a rigid body inside a [`PhysicsWorld`](crate::world::PhysicsWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct BodyId(pub GenerationalId);

impl BodyId {
    pub fn index(&self) -> usize {
        self.0.index
    }

    pub fn generation(&self) -> u32 {
        self.0.generation
    }

    pub fn epoch(&self) -> u32 {
        self.0.epoch
    }
}

/// Generational arena that hands out stable ids while preventing use-after-free.
///
/// Freed slots are reused lowest-index first so that identical insert/remove
/// sequences always produce identical ids.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    epoch: u32,
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free: BTreeSet<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            epoch: NEXT_EPOCH.fetch_add(1, Ordering::Relaxed),
            items: Vec::new(),
            generations: Vec::new(),
            free: BTreeSet::new(),
        }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn insert(&mut self, item: T) -> BodyId {
        if let Some(index) = self.free.pop_first() {
            self.items[index] = Some(item);
            return BodyId(GenerationalId::new(self.epoch, index, self.generations[index]));
        }

        let index = self.items.len();
        self.items.push(Some(item));
        self.generations.push(0);
        BodyId(GenerationalId::new(self.epoch, index, 0))
    }

    pub fn get(&self, id: BodyId) -> Option<&T> {
        if self.is_valid(id) {
            self.items.get(id.index()).and_then(|slot| slot.as_ref())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut T> {
        if self.is_valid(id) {
            self.items.get_mut(id.index()).and_then(|slot| slot.as_mut())
        } else {
            None
        }
    }

    pub fn get2_mut(&mut self, id_a: BodyId, id_b: BodyId) -> Option<(&mut T, &mut T)> {
        if id_a.index() == id_b.index() {
            return None;
        }

        if !self.is_valid(id_a) || !self.is_valid(id_b) {
            return None;
        }

        let (first, second, flipped) = if id_a.index() < id_b.index() {
            (id_a, id_b, false)
        } else {
            (id_b, id_a, true)
        };

        let (left, right) = self.items.split_at_mut(second.index());
        let first_slot = left.get_mut(first.index()).and_then(|slot| slot.as_mut())?;
        let second_slot = right.get_mut(0).and_then(|slot| slot.as_mut())?;

        if flipped {
            Some((second_slot, first_slot))
        } else {
            Some((first_slot, second_slot))
        }
    }

    pub fn remove(&mut self, id: BodyId) -> Option<T> {
        if !self.is_valid(id) {
            return None;
        }
        let slot = self.items.get_mut(id.index())?;
        let item = slot.take()?;
        self.generations[id.index()] = self.generations[id.index()].wrapping_add(1);
        self.free.insert(id.index());
        Some(item)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &T)> + '_ {
        self.items.iter().enumerate().filter_map(move |(index, slot)| {
            slot.as_ref().map(|item| {
                (
                    BodyId(GenerationalId::new(self.epoch, index, self.generations[index])),
                    item,
                )
            })
        })
    }

    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.iter().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.items.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_valid(&self, id: BodyId) -> bool {
        id.epoch() == self.epoch
            && self
                .generations
                .get(id.index())
                .copied()
                .map(|gen| gen == id.generation())
                .unwrap_or(false)
    }
}
