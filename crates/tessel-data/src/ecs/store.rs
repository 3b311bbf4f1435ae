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

//! The owned store: current snapshot, live queries and consumers.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use indexmap::IndexSet;
use tessel_core::ecs::entity::SINGLETON_SEED;
use tessel_core::ecs::EntityId;

use crate::ecs::component::ComponentValue;
use crate::ecs::consumer::{ConsumerState, Delta};
use crate::ecs::entity::Entity;
use crate::ecs::error::StoreError;
use crate::ecs::planner::MatchCache;
use crate::ecs::query::{IndexKey, Query, QuerySpec};
use crate::ecs::schema::{ComponentId, ComponentSchema};
use crate::ecs::state::{Commit, StoreState};

/// Handle to a live query registered in a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(usize);

/// Handle to a consumer registered in a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerId(usize);

/// A query whose matching set is kept current on every commit.
#[derive(Debug)]
struct LiveQuery {
    query: Query,
    members: IndexSet<EntityId>,
    keyed: HashMap<IndexKey, IndexSet<EntityId>>,
    consumers: Vec<ConsumerId>,
}

impl LiveQuery {
    fn key_of(&self, entity: &Entity) -> Option<IndexKey> {
        let cid = self.query.key()?;
        entity.get(cid).and_then(IndexKey::of)
    }

    fn index_key(&mut self, id: EntityId, key: Option<IndexKey>) {
        if let Some(key) = key {
            self.keyed.entry(key).or_default().insert(id);
        }
    }

    fn unindex_key(&mut self, id: EntityId, key: Option<IndexKey>) {
        if let Some(key) = key {
            if let Some(ids) = self.keyed.get_mut(&key) {
                ids.swap_remove(&id);
                if ids.is_empty() {
                    self.keyed.remove(&key);
                }
            }
        }
    }
}

/// The single owner of the current [`StoreState`].
///
/// Every mutation goes through the store, which swaps in the next snapshot
/// and reclassifies the touched entity against every live query, feeding
/// the resulting enter/update/leave events to the consumers of that query.
///
/// Snapshots handed out by [`Store::snapshot`] stay valid and unchanged; they
/// do not follow later commits.
#[derive(Debug)]
pub struct Store {
    schema: Arc<ComponentSchema>,
    current: Arc<StoreState>,
    history: VecDeque<Arc<StoreState>>,
    history_depth: usize,
    queries: Vec<LiveQuery>,
    consumers: Vec<(QueryId, ConsumerState)>,
    cache: MatchCache,
}

impl Store {
    /// Creates an empty store for `schema`, without snapshot history.
    pub fn new(schema: ComponentSchema) -> Self {
        Self::with_history(schema, 0)
    }

    /// Creates an empty store retaining up to `depth` prior snapshots.
    pub fn with_history(schema: ComponentSchema, depth: usize) -> Self {
        let schema = Arc::new(schema);
        log::info!(
            "Store created with {} component types (history depth {depth}).",
            schema.len()
        );
        Self {
            current: Arc::new(StoreState::new(Arc::clone(&schema))),
            schema,
            history: VecDeque::with_capacity(depth),
            history_depth: depth,
            queries: Vec::new(),
            consumers: Vec::new(),
            cache: MatchCache::default(),
        }
    }

    // --- Snapshots ---

    /// The component schema.
    pub fn schema(&self) -> &Arc<ComponentSchema> {
        &self.schema
    }

    /// The current state.
    pub fn state(&self) -> &StoreState {
        &self.current
    }

    /// A shared handle to the current state.
    pub fn snapshot(&self) -> Arc<StoreState> {
        Arc::clone(&self.current)
    }

    /// Retained prior snapshots, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Arc<StoreState>> {
        self.history.iter()
    }

    /// Resolves a component name.
    pub fn component_id(&self, name: &str) -> Result<ComponentId, StoreError> {
        self.schema
            .id(name)
            .ok_or_else(|| StoreError::UnknownComponent(name.to_string()))
    }

    // --- Entities ---

    /// Allocates a fresh entity value; see [`ComponentSchema::create_entity`].
    pub fn create_entity(&self, seed: Option<&str>) -> Entity {
        self.schema.create_entity(seed)
    }

    /// See [`ComponentSchema::add_component`].
    pub fn add_component(&self, entity: &Entity, name: &str, value: impl Into<ComponentValue>) -> Entity {
        self.schema.add_component(entity, name, Some(value.into()))
    }

    /// See [`ComponentSchema::remove_component`].
    pub fn remove_component(&self, entity: &Entity, name: &str) -> Entity {
        self.schema.remove_component(entity, name)
    }

    /// Returns the registered value of entity `id`.
    pub fn get(&self, id: EntityId) -> Option<&Arc<Entity>> {
        self.current.get_entity(id)
    }

    /// Reads component `name` of entity `id`.
    pub fn get_component(&self, id: EntityId, name: &str) -> Option<&ComponentValue> {
        let cid = self.schema.id(name)?;
        self.get(id)?.get(cid)
    }

    fn commit_with(
        &mut self,
        apply: impl FnOnce(&mut StoreState) -> Result<Commit, StoreError>,
    ) -> Result<Commit, StoreError> {
        let commit = if self.history_depth == 0 {
            apply(Arc::make_mut(&mut self.current))?
        } else {
            let mut next = StoreState::clone(&self.current);
            let commit = apply(&mut next)?;
            if !commit.is_noop() {
                let previous = std::mem::replace(&mut self.current, Arc::new(next));
                if self.history.len() == self.history_depth {
                    self.history.pop_front();
                }
                self.history.push_back(previous);
            }
            commit
        };
        self.propagate(&commit);
        Ok(commit)
    }

    /// Commits an entity value into the store.
    pub fn register(&mut self, entity: Entity) -> Result<Commit, StoreError> {
        self.commit_with(|state| state.register(entity))
    }

    /// Removes entity `id`, returning its last value.
    pub fn deregister(&mut self, id: EntityId) -> Option<Arc<Entity>> {
        let result = self.commit_with(|state| state.deregister(id).ok_or(StoreError::UnknownEntity(id)));
        match result {
            Ok(commit) => commit.before,
            Err(_) => None,
        }
    }

    /// Creates, fills and registers an entity in one call.
    ///
    /// Unlike [`Store::add_component`], unknown component names are an error.
    pub fn quick_entity<'a>(
        &mut self,
        components: impl IntoIterator<Item = (&'a str, ComponentValue)>,
    ) -> Result<EntityId, StoreError> {
        let mut entity = self.create_entity(None);
        for (name, value) in components {
            let cid = self.component_id(name)?;
            entity.insert(cid, value);
        }
        let id = entity.id();
        self.register(entity)?;
        Ok(id)
    }

    /// Mutates a component of a registered entity without a structural copy.
    ///
    /// Meant for high-frequency numeric components. The previous value stays
    /// readable through [`Store::previous_component`].
    pub fn update_in_place(
        &mut self,
        id: EntityId,
        name: &str,
        f: impl FnOnce(&mut ComponentValue),
    ) -> Result<(), StoreError> {
        let cid = self.component_id(name)?;
        self.commit_with(|state| state.update_in_place(id, cid, f))?;
        Ok(())
    }

    /// Marks a component as changed without modifying it.
    pub fn flag_update(&mut self, id: EntityId, name: &str) -> Result<(), StoreError> {
        let cid = self.component_id(name)?;
        self.commit_with(|state| state.flag_update(id, cid))?;
        Ok(())
    }

    /// The value a component held before its last in-place update.
    pub fn previous_component(&self, id: EntityId, name: &str) -> Option<&ComponentValue> {
        let cid = self.schema.id(name)?;
        self.current.previous_component(id, cid)
    }

    /// The reserved singleton entity: the registered one, or a fresh value
    /// with the well-known id ready to be filled and registered.
    pub fn singleton_entity(&self) -> Entity {
        self.get(EntityId::singleton())
            .map(|entity| Entity::clone(entity))
            .unwrap_or_else(|| self.create_entity(Some(SINGLETON_SEED)))
    }

    /// The entity holding component `name`, if any.
    pub fn singleton_holder(&self, name: &str) -> Option<&Arc<Entity>> {
        let cid = self.schema.id(name)?;
        let id = self.current.index(cid).first()?;
        self.get(*id)
    }

    // --- Queries ---

    /// Registers a live query, reusing an identical one if it exists.
    pub fn create_query(&mut self, spec: &QuerySpec) -> Result<QueryId, StoreError> {
        let query = spec.resolve(&self.schema)?;
        if let Some(existing) = self.queries.iter().position(|live| live.query == query) {
            return Ok(QueryId(existing));
        }

        let mut live = LiveQuery {
            members: query.matching(&self.current).into_iter().collect(),
            query,
            keyed: HashMap::new(),
            consumers: Vec::new(),
        };
        let keys: Vec<(EntityId, Option<IndexKey>)> = live
            .members
            .iter()
            .filter_map(|id| self.current.get_entity(*id))
            .map(|entity| (entity.id(), live.key_of(entity)))
            .collect();
        for (id, key) in keys {
            live.index_key(id, key);
        }

        log::debug!(
            "Live query '{}' registered with {} initial matches.",
            live.query,
            live.members.len()
        );
        self.queries.push(live);
        Ok(QueryId(self.queries.len() - 1))
    }

    fn live(&self, query: QueryId) -> Result<&LiveQuery, StoreError> {
        self.queries
            .get(query.0)
            .ok_or(StoreError::UnknownHandle("query"))
    }

    /// A view over the current matching set of a live query.
    pub fn query(&self, query: QueryId) -> Result<QueryView<'_>, StoreError> {
        Ok(QueryView {
            state: &self.current,
            live: self.live(query)?,
        })
    }

    /// Entities of a keyed query whose key component equals `key`.
    pub fn lookup(&self, query: QueryId, key: &IndexKey) -> Result<Vec<EntityId>, StoreError> {
        let live = self.live(query)?;
        Ok(live
            .keyed
            .get(key)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default())
    }

    /// Computes the matching set of an ad-hoc query against the current state.
    ///
    /// Results are cached until the next effective commit.
    pub fn matching(&self, query: &Query) -> Arc<[EntityId]> {
        self.cache.get_or_compute(query, &self.current)
    }

    // --- Consumers ---

    /// Creates a consumer on a live query. Every entity currently matching
    /// is pending as `new`.
    pub fn create_consumer(&mut self, query: QueryId) -> Result<ConsumerId, StoreError> {
        let live = self
            .queries
            .get_mut(query.0)
            .ok_or(StoreError::UnknownHandle("query"))?;
        let mut consumer = ConsumerState::default();
        for id in &live.members {
            consumer.on_enter(*id);
        }
        let handle = ConsumerId(self.consumers.len());
        live.consumers.push(handle);
        self.consumers.push((query, consumer));
        Ok(handle)
    }

    /// Re-marks every matching entity as `new`. Pending removals are kept;
    /// other pending deltas are dropped.
    pub fn reset_consumer(&mut self, consumer: ConsumerId) -> Result<(), StoreError> {
        let (query, state) = self
            .consumers
            .get_mut(consumer.0)
            .ok_or(StoreError::UnknownHandle("consumer"))?;
        let live = self
            .queries
            .get(query.0)
            .ok_or(StoreError::UnknownHandle("query"))?;
        state.reset();
        for id in &live.members {
            state.on_enter(*id);
        }
        Ok(())
    }

    /// Takes the pending deltas of `consumer`.
    ///
    /// Draining is destructive: whatever is returned will not be returned
    /// again, whether or not the caller manages to process it.
    pub fn drain(&mut self, consumer: ConsumerId) -> Result<Delta, StoreError> {
        let (_, state) = self
            .consumers
            .get_mut(consumer.0)
            .ok_or(StoreError::UnknownHandle("consumer"))?;
        Ok(state.drain(&self.current))
    }

    /// A view over the query a consumer is bound to.
    pub fn query_of(&self, consumer: ConsumerId) -> Result<QueryView<'_>, StoreError> {
        let (query, _) = self
            .consumers
            .get(consumer.0)
            .ok_or(StoreError::UnknownHandle("consumer"))?;
        self.query(*query)
    }

    /// Returns true if `consumer` has something to deliver.
    pub fn has_pending(&self, consumer: ConsumerId) -> bool {
        self.consumers
            .get(consumer.0)
            .is_some_and(|(_, state)| state.has_pending())
    }

    fn propagate(&mut self, commit: &Commit) {
        if commit.is_noop() {
            return;
        }
        let id = commit.id;
        for live in &mut self.queries {
            let was = live.members.contains(&id);
            let now = commit
                .after
                .as_deref()
                .is_some_and(|entity| live.query.matches(entity));

            match (was, now, &commit.before, &commit.after) {
                (false, true, _, Some(after)) => {
                    live.members.insert(id);
                    let key = live.key_of(after);
                    live.index_key(id, key);
                    for handle in &live.consumers {
                        self.consumers[handle.0].1.on_enter(id);
                    }
                }
                (true, false, Some(before), _) => {
                    live.members.swap_remove(&id);
                    let key = live.key_of(before);
                    live.unindex_key(id, key);
                    for handle in &live.consumers {
                        self.consumers[handle.0].1.on_leave(id, Arc::clone(before));
                    }
                }
                (true, true, Some(before), Some(after)) => {
                    let (old_key, new_key) = (live.key_of(before), live.key_of(after));
                    if old_key != new_key {
                        live.unindex_key(id, old_key);
                        live.index_key(id, new_key);
                    }
                    let watched = live.query.watched(&commit.changed);
                    for handle in &live.consumers {
                        self.consumers[handle.0].1.on_update(id, watched);
                    }
                }
                _ => {}
            }
        }
    }
}

/// A borrowed view over the matching set of a live query.
///
/// Iteration follows the insertion order of the query's member set. Removals
/// reorder it, so callers must treat the order as unspecified. The view is
/// `Copy`; calling [`QueryView::iter`] again restarts the iteration.
#[derive(Clone, Copy)]
pub struct QueryView<'a> {
    state: &'a StoreState,
    live: &'a LiveQuery,
}

impl<'a> QueryView<'a> {
    /// The query's canonical name.
    pub fn name(&self) -> &'a str {
        self.live.query.name()
    }

    /// Number of matching entities.
    pub fn len(&self) -> usize {
        self.live.members.len()
    }

    /// Returns true if nothing matches.
    pub fn is_empty(&self) -> bool {
        self.live.members.is_empty()
    }

    /// Returns true if `id` matches.
    pub fn contains(&self, id: EntityId) -> bool {
        self.live.members.contains(&id)
    }

    /// Lazily iterates the matching ids.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + 'a {
        self.live.members.iter().copied()
    }

    /// Lazily iterates the matching entities.
    pub fn iter(&self) -> impl Iterator<Item = &'a Arc<Entity>> + 'a {
        let state = self.state;
        self.live
            .members
            .iter()
            .filter_map(move |id| state.get_entity(*id))
    }

    /// The first matching entity satisfying `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&Entity) -> bool) -> Option<&'a Arc<Entity>> {
        self.iter().find(|entity| predicate(entity))
    }
}
