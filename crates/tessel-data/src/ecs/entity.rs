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

use tessel_core::ecs::EntityId;

use crate::ecs::bitset::ComponentSet;
use crate::ecs::component::ComponentValue;
use crate::ecs::schema::ComponentId;

/// An entity value: an identity plus a sparse record of component slots.
///
/// Slots are kept sorted by [`ComponentId`], so lookups are a binary search
/// and diffing two versions of the same entity is a linear merge over the
/// components they actually hold.
///
/// Entity values are immutable once registered. The builder-style
/// [`Entity::with`] and [`Entity::without`] return modified copies which must
/// be registered again to take effect.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    components: Vec<(ComponentId, ComponentValue)>,
}

impl Entity {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            components: Vec::new(),
        }
    }

    /// The entity's identity.
    pub fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self, cid: ComponentId) -> Result<usize, usize> {
        self.components.binary_search_by_key(&cid, |(id, _)| *id)
    }

    /// Returns the value of component `cid`, if present.
    pub fn get(&self, cid: ComponentId) -> Option<&ComponentValue> {
        self.position(cid).ok().map(|i| &self.components[i].1)
    }

    pub(crate) fn get_mut(&mut self, cid: ComponentId) -> Option<&mut ComponentValue> {
        match self.position(cid) {
            Ok(i) => Some(&mut self.components[i].1),
            Err(_) => None,
        }
    }

    /// Returns true if component `cid` is present.
    pub fn has(&self, cid: ComponentId) -> bool {
        self.position(cid).is_ok()
    }

    pub(crate) fn insert(&mut self, cid: ComponentId, value: ComponentValue) {
        match self.position(cid) {
            Ok(i) => self.components[i].1 = value,
            Err(i) => self.components.insert(i, (cid, value)),
        }
    }

    pub(crate) fn remove(&mut self, cid: ComponentId) -> Option<ComponentValue> {
        self.position(cid)
            .ok()
            .map(|i| self.components.remove(i).1)
    }

    /// Returns a copy of this entity with component `cid` set to `value`.
    pub fn with(&self, cid: ComponentId, value: ComponentValue) -> Entity {
        let mut next = self.clone();
        next.insert(cid, value);
        next
    }

    /// Returns a copy of this entity without component `cid`.
    pub fn without(&self, cid: ComponentId) -> Entity {
        let mut next = self.clone();
        next.remove(cid);
        next
    }

    /// Number of components present.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if the entity holds no component.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Iterates the present components in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &ComponentValue)> {
        self.components.iter().map(|(id, value)| (*id, value))
    }

    /// The set of present component ids.
    pub fn component_set(&self) -> ComponentSet {
        self.components.iter().map(|(id, _)| *id).collect()
    }
}
