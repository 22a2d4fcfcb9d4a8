use std::collections::HashMap;
use std::hash::Hash;

use rush_types::{PartId, PartType, SLOT_COUNT};
use serde::{Deserialize, Serialize};

/// An unordered, gap-free list of token ids with O(1) membership and removal.
///
/// Removal swaps the last element into the vacated position and pops, so the
/// backing vector never holds holes. A position map tracks where each id
/// lives. Only the id list is serialized; positions are rebuilt on load.
#[derive(Clone, Debug)]
pub struct TokenIndex<T> {
    items: Vec<T>,
    positions: HashMap<T, usize>,
}

impl<T: Copy + Eq + Hash> TokenIndex<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Append `id`. Returns `false` if it was already present.
    pub fn insert(&mut self, id: T) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }
        self.positions.insert(id, self.items.len());
        self.items.push(id);
        true
    }

    /// Remove `id` by swapping in the last element. Returns `false` if absent.
    pub fn remove(&mut self, id: T) -> bool {
        let Some(position) = self.positions.remove(&id) else {
            return false;
        };
        let last = self.items.len() - 1;
        if position != last {
            let moved = self.items[last];
            self.items[position] = moved;
            self.positions.insert(moved, position);
        }
        self.items.pop();
        true
    }

    pub fn contains(&self, id: T) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T> Default for TokenIndex<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> From<Vec<T>> for TokenIndex<T> {
    fn from(items: Vec<T>) -> Self {
        let mut index = Self::new();
        for id in items {
            index.insert(id);
        }
        index
    }
}

impl<T: PartialEq> PartialEq for TokenIndex<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Eq> Eq for TokenIndex<T> {}

impl<T: Serialize> Serialize for TokenIndex<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for TokenIndex<T>
where
    T: Deserialize<'de> + Copy + Eq + Hash,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from)
    }
}

/// The four index partitions kept for one part owner.
///
/// `all` is always the disjoint union of `equipped` and `unequipped`, and
/// also the disjoint union of the three `by_type` lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerParts {
    pub all: TokenIndex<PartId>,
    pub by_type: [TokenIndex<PartId>; SLOT_COUNT],
    pub equipped: TokenIndex<PartId>,
    pub unequipped: TokenIndex<PartId>,
}

impl OwnerParts {
    /// Index a part under this owner in the partition matching `equipped`.
    pub fn add(&mut self, id: PartId, part_type: PartType, equipped: bool) {
        self.all.insert(id);
        self.by_type[part_type.slot_index()].insert(id);
        if equipped {
            self.equipped.insert(id);
        } else {
            self.unequipped.insert(id);
        }
    }

    /// Drop a part from every partition of this owner.
    pub fn remove(&mut self, id: PartId, part_type: PartType) {
        self.all.remove(id);
        self.by_type[part_type.slot_index()].remove(id);
        self.equipped.remove(id);
        self.unequipped.remove(id);
    }

    /// Move a part between the equipped and unequipped partitions.
    pub fn mark_equipped(&mut self, id: PartId, equipped: bool) {
        if equipped {
            self.unequipped.remove(id);
            self.equipped.insert(id);
        } else {
            self.equipped.remove(id);
            self.unequipped.insert(id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
