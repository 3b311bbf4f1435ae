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

//! Immutable store snapshots and the commit primitives that derive new ones.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tessel_core::ecs::EntityId;

use crate::ecs::bitset::ComponentSet;
use crate::ecs::component::ComponentValue;
use crate::ecs::entity::Entity;
use crate::ecs::error::StoreError;
use crate::ecs::schema::{ComponentId, ComponentSchema};

/// Internal bookkeeping kept next to every registered entity value.
#[derive(Debug, Clone)]
pub(crate) struct EntityRecord {
    pub(crate) entity: Arc<Entity>,
    /// Version stamp per present component, in the same order as the entity's slots.
    versions: Vec<(ComponentId, u64)>,
    /// Values replaced by the most recent in-place updates.
    previous: Vec<(ComponentId, ComponentValue)>,
}

/// Describes what a single commit did to one entity.
#[derive(Debug, Clone)]
pub struct Commit {
    /// The entity affected.
    pub id: EntityId,
    /// The value stored before the commit, if the entity was registered.
    pub before: Option<Arc<Entity>>,
    /// The value stored after the commit, `None` after a deregistration.
    pub after: Option<Arc<Entity>>,
    /// Components that were added, removed or whose value changed.
    pub changed: ComponentSet,
}

impl Commit {
    /// Returns true if the commit left the state untouched.
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty() && self.before.is_some() == self.after.is_some()
    }
}

/// An immutable snapshot of every registered entity.
///
/// A state holds:
/// * the entity id → entity value map,
/// * for every component type, the set of ids currently holding it,
/// * per entity and component, the version stamp of the last change.
///
/// The component index for type `T` always equals the set of registered
/// entities whose value has `T` present.
///
/// States are plain values. [`StoreState::register_entity`] and
/// [`StoreState::deregister_entity`] consume a state and return the next
/// one; clone first to keep the old snapshot around. The owned
/// [`Store`](crate::ecs::Store) wraps this in an `Arc` and only pays for the
/// clone when a snapshot is still referenced elsewhere.
#[derive(Debug, Clone)]
pub struct StoreState {
    schema: Arc<ComponentSchema>,
    version: u64,
    entities: IndexMap<EntityId, EntityRecord>,
    index: Vec<IndexSet<EntityId>>,
}

impl StoreState {
    /// Creates an empty state for `schema`.
    pub fn new(schema: Arc<ComponentSchema>) -> Self {
        let index = vec![IndexSet::new(); schema.len()];
        Self {
            schema,
            version: 0,
            entities: IndexMap::new(),
            index,
        }
    }

    /// The schema this state was built against.
    pub fn schema(&self) -> &Arc<ComponentSchema> {
        &self.schema
    }

    /// Monotonic counter bumped by every effective commit.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the registered value of entity `id`.
    pub fn get_entity(&self, id: EntityId) -> Option<&Arc<Entity>> {
        self.entities.get(&id).map(|record| &record.entity)
    }

    /// Returns true if `id` is registered.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity is registered.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates every registered entity.
    pub fn entities(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.entities.values().map(|record| &record.entity)
    }

    /// The set of entities currently holding component `cid`.
    pub fn index(&self, cid: ComponentId) -> &IndexSet<EntityId> {
        &self.index[cid.index()]
    }

    /// Version stamp of the last change to component `cid` on entity `id`.
    pub fn component_version(&self, id: EntityId, cid: ComponentId) -> Option<u64> {
        let record = self.entities.get(&id)?;
        record
            .versions
            .binary_search_by_key(&cid, |(c, _)| *c)
            .ok()
            .map(|i| record.versions[i].1)
    }

    /// The value component `cid` held before its last in-place update.
    pub fn previous_component(&self, id: EntityId, cid: ComponentId) -> Option<&ComponentValue> {
        self.entities
            .get(&id)?
            .previous
            .iter()
            .find(|(c, _)| *c == cid)
            .map(|(_, value)| value)
    }

    /// Commits `entity`, returning the next state.
    pub fn register_entity(mut self, entity: Entity) -> Result<Self, StoreError> {
        self.register(entity)?;
        Ok(self)
    }

    /// Removes entity `id`, returning the next state.
    pub fn deregister_entity(mut self, id: EntityId) -> Self {
        self.deregister(id);
        self
    }

    fn check_singletons(&self, entity: &Entity) -> Result<(), StoreError> {
        for (cid, _) in entity.iter() {
            let def = self.schema.def(cid);
            if !def.singleton {
                continue;
            }
            if let Some(holder) = self.index[cid.index()].iter().find(|h| **h != entity.id()) {
                return Err(StoreError::SingletonViolation {
                    component: def.name.to_string(),
                    holder: *holder,
                });
            }
        }
        Ok(())
    }

    /// Commits an entity value in place.
    ///
    /// Only the component indices whose membership changed are touched, and
    /// only components whose value reference changed get a new version, so
    /// the cost is linear in the number of components on the entity.
    pub(crate) fn register(&mut self, entity: Entity) -> Result<Commit, StoreError> {
        if let Some((cid, _)) = entity.iter().find(|(cid, _)| cid.index() >= self.schema.len()) {
            return Err(StoreError::ForeignComponent {
                entity: entity.id(),
                component: cid,
            });
        }
        self.check_singletons(&entity)?;

        let id = entity.id();
        let stamp = self.version + 1;
        let before = self.entities.get(&id).map(|r| Arc::clone(&r.entity));
        let old_versions: Vec<u64> = self
            .entities
            .get(&id)
            .map(|r| r.versions.iter().map(|(_, v)| *v).collect())
            .unwrap_or_default();
        let old: Vec<(ComponentId, &ComponentValue, u64)> = before
            .as_deref()
            .map(|b| {
                b.iter()
                    .zip(old_versions)
                    .map(|((cid, value), version)| (cid, value, version))
                    .collect()
            })
            .unwrap_or_default();

        let mut changed = ComponentSet::new();
        let mut versions = Vec::with_capacity(entity.len());
        let mut i = 0;

        for (cid, value) in entity.iter() {
            while i < old.len() && old[i].0 < cid {
                changed.insert(old[i].0);
                self.index[old[i].0.index()].swap_remove(&id);
                i += 1;
            }
            if i < old.len() && old[i].0 == cid {
                if old[i].1.same_as(value) {
                    versions.push((cid, old[i].2));
                } else {
                    changed.insert(cid);
                    versions.push((cid, stamp));
                }
                i += 1;
            } else {
                changed.insert(cid);
                self.index[cid.index()].insert(id);
                versions.push((cid, stamp));
            }
        }
        for (cid, _, _) in &old[i..] {
            changed.insert(*cid);
            self.index[cid.index()].swap_remove(&id);
        }
        drop(old);

        if before.is_some() && changed.is_empty() {
            return Ok(Commit {
                id,
                after: before.clone(),
                before,
                changed,
            });
        }

        self.version = stamp;
        let after = Arc::new(entity);
        self.entities.insert(
            id,
            EntityRecord {
                entity: Arc::clone(&after),
                versions,
                previous: Vec::new(),
            },
        );

        Ok(Commit {
            id,
            before,
            after: Some(after),
            changed,
        })
    }

    pub(crate) fn deregister(&mut self, id: EntityId) -> Option<Commit> {
        let record = self.entities.swap_remove(&id)?;
        let mut changed = ComponentSet::new();
        for (cid, _) in record.entity.iter() {
            self.index[cid.index()].swap_remove(&id);
            changed.insert(cid);
        }
        self.version += 1;

        Some(Commit {
            id,
            before: Some(record.entity),
            after: None,
            changed,
        })
    }

    /// Mutates one component of a registered entity without re-registering it.
    ///
    /// The replaced value is kept as the component's previous value and the
    /// component version is bumped, even if `f` leaves the value unchanged.
    pub(crate) fn update_in_place(
        &mut self,
        id: EntityId,
        cid: ComponentId,
        f: impl FnOnce(&mut ComponentValue),
    ) -> Result<Commit, StoreError> {
        let missing = || StoreError::MissingComponent {
            entity: id,
            component: self.schema.name(cid).to_string(),
        };
        let record = self
            .entities
            .get_mut(&id)
            .ok_or(StoreError::UnknownEntity(id))?;
        if !record.entity.has(cid) {
            return Err(missing());
        }

        let before = Arc::clone(&record.entity);
        let slot = Arc::make_mut(&mut record.entity)
            .get_mut(cid)
            .ok_or_else(missing)?;
        let old = slot.clone();
        f(slot);

        record.previous.retain(|(c, _)| *c != cid);
        record.previous.push((cid, old));

        let stamp = self.version + 1;
        if let Ok(i) = record.versions.binary_search_by_key(&cid, |(c, _)| *c) {
            record.versions[i].1 = stamp;
        }
        self.version = stamp;

        Ok(Commit {
            id,
            before: Some(before),
            after: Some(Arc::clone(&record.entity)),
            changed: std::iter::once(cid).collect(),
        })
    }

    /// Bumps the version of a component without touching its value.
    pub(crate) fn flag_update(&mut self, id: EntityId, cid: ComponentId) -> Result<Commit, StoreError> {
        let record = self
            .entities
            .get_mut(&id)
            .ok_or(StoreError::UnknownEntity(id))?;
        let Ok(i) = record.versions.binary_search_by_key(&cid, |(c, _)| *c) else {
            return Err(StoreError::MissingComponent {
                entity: id,
                component: self.schema.name(cid).to_string(),
            });
        };

        let stamp = self.version + 1;
        record.versions[i].1 = stamp;
        self.version = stamp;

        let entity = Arc::clone(&record.entity);
        Ok(Commit {
            id,
            before: Some(Arc::clone(&entity)),
            after: Some(entity),
            changed: std::iter::once(cid).collect(),
        })
    }
}
