// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Implements a fixed-size bitset over component ids.

use std::fmt;

use crate::ecs::schema::ComponentId;

const WORDS: usize = 4;

/// The maximum number of components a schema may declare.
pub const MAX_COMPONENTS: usize = WORDS * 64;

/// A set of [`ComponentId`]s packed into four 64-bit words.
///
/// Used for query include/exclude masks and for the changed-component sets
/// handed to `updated` hooks, so that "which components changed" is a cheap,
/// copyable value rather than a boolean.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentSet {
    bits: [u64; WORDS],
}

impl ComponentSet {
    /// Creates a new, empty set.
    pub const fn new() -> Self {
        Self { bits: [0; WORDS] }
    }

    #[inline]
    fn locate(id: ComponentId) -> (usize, u64) {
        let index = id.index();
        (index / 64, 1 << (index % 64))
    }

    /// Adds `id` to the set.
    pub fn insert(&mut self, id: ComponentId) {
        let (word, mask) = Self::locate(id);
        self.bits[word] |= mask;
    }

    /// Removes `id` from the set.
    pub fn remove(&mut self, id: ComponentId) {
        let (word, mask) = Self::locate(id);
        self.bits[word] &= !mask;
    }

    /// Returns true if `id` is in the set.
    pub fn contains(&self, id: ComponentId) -> bool {
        let (word, mask) = Self::locate(id);
        self.bits[word] & mask != 0
    }

    /// Returns true if the set holds no ids.
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }

    /// Number of ids in the set.
    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Adds every id of `other` to this set.
    pub fn union_with(&mut self, other: &ComponentSet) {
        for (a, b) in self.bits.iter_mut().zip(other.bits) {
            *a |= b;
        }
    }

    /// Returns the ids present in both sets.
    pub fn intersection(&self, other: &ComponentSet) -> ComponentSet {
        let mut out = *self;
        for (a, b) in out.bits.iter_mut().zip(other.bits) {
            *a &= b;
        }
        out
    }

    /// Returns true if every id of `self` is also in `other`.
    pub fn is_subset(&self, other: &ComponentSet) -> bool {
        self.bits.iter().zip(other.bits).all(|(a, b)| a & !b == 0)
    }

    /// Returns true if the sets share no id.
    pub fn is_disjoint(&self, other: &ComponentSet) -> bool {
        self.intersection(other).is_empty()
    }

    /// Iterates the ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.bits.iter().enumerate().flat_map(|(word_idx, word)| {
            let word = *word;
            (0..64u32)
                .filter(move |bit| word & (1u64 << *bit) != 0)
                .map(move |bit| ComponentId::from_index(word_idx * 64 + bit as usize))
        })
    }
}

impl FromIterator<ComponentId> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        let mut set = ComponentSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|id| id.index())).finish()
    }
}
