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

//! Query specifications and set-based matching over the component indices.

use std::fmt;
use std::sync::Arc;

use tessel_core::ecs::EntityId;

use crate::ecs::bitset::ComponentSet;
use crate::ecs::component::ComponentValue;
use crate::ecs::entity::Entity;
use crate::ecs::error::QueryError;
use crate::ecs::schema::{ComponentId, ComponentSchema};
use crate::ecs::state::StoreState;

/// A query as written by the caller, in terms of component names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpec {
    includes: Vec<String>,
    excludes: Vec<String>,
    keyed_by: Option<String>,
}

impl QuerySpec {
    /// An empty spec, matching every entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `component` to be present.
    pub fn include(mut self, component: impl Into<String>) -> Self {
        self.includes.push(component.into());
        self
    }

    /// Requires `component` to be absent.
    pub fn exclude(mut self, component: impl Into<String>) -> Self {
        self.excludes.push(component.into());
        self
    }

    /// Maintains a value index over `component` for [`Store::lookup`](crate::ecs::Store::lookup).
    pub fn keyed_by(mut self, component: impl Into<String>) -> Self {
        self.keyed_by = Some(component.into());
        self
    }

    /// Resolves the spec against `schema`.
    ///
    /// Fails fast on unknown components and on a component that is both
    /// included and excluded.
    pub fn resolve(&self, schema: &ComponentSchema) -> Result<Query, QueryError> {
        let lookup = |name: &String| {
            schema
                .id(name)
                .ok_or_else(|| QueryError::UnknownComponent(name.clone()))
        };

        let includes = self
            .includes
            .iter()
            .map(lookup)
            .collect::<Result<ComponentSet, _>>()?;
        let excludes = self
            .excludes
            .iter()
            .map(lookup)
            .collect::<Result<ComponentSet, _>>()?;
        if let Some(overlap) = includes.intersection(&excludes).iter().next() {
            return Err(QueryError::Overlap(schema.name(overlap).to_string()));
        }
        let key = self.keyed_by.as_ref().map(lookup).transpose()?;

        let name = includes
            .iter()
            .map(|cid| format!("+{}", schema.name(cid)))
            .chain(excludes.iter().map(|cid| format!("-{}", schema.name(cid))))
            .collect::<Vec<_>>()
            .join(",");

        Ok(Query {
            name: Arc::from(name),
            includes,
            excludes,
            key,
        })
    }
}

/// A resolved query: include and exclude masks over component ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    name: Arc<str>,
    includes: ComponentSet,
    excludes: ComponentSet,
    key: Option<ComponentId>,
}

impl Query {
    /// Canonical name, e.g. `+type,-mesh`. Two queries with the same name
    /// match the same entities.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Components that must be present.
    pub fn includes(&self) -> &ComponentSet {
        &self.includes
    }

    /// Components that must be absent.
    pub fn excludes(&self) -> &ComponentSet {
        &self.excludes
    }

    /// The keyed component, if any.
    pub fn key(&self) -> Option<ComponentId> {
        self.key
    }

    /// Returns true if `entity` satisfies includes ∧ ¬excludes.
    pub fn matches(&self, entity: &Entity) -> bool {
        let present = entity.component_set();
        self.includes.is_subset(&present) && self.excludes.is_disjoint(&present)
    }

    /// The subset of `changed` this query reports as updates.
    ///
    /// Only included components count; a query without includes watches
    /// every component.
    pub fn watched(&self, changed: &ComponentSet) -> ComponentSet {
        if self.includes.is_empty() {
            *changed
        } else {
            changed.intersection(&self.includes)
        }
    }

    /// Computes the matching set of `state` from its component indices.
    ///
    /// Starts from the smallest included index and filters it by the others,
    /// so the cost is bounded by the rarest included component. Order follows
    /// that index and is not meaningful.
    pub fn matching(&self, state: &StoreState) -> Vec<EntityId> {
        let smallest = self
            .includes
            .iter()
            .min_by_key(|cid| state.index(*cid).len());

        let candidates: Box<dyn Iterator<Item = EntityId> + '_> = match smallest {
            Some(cid) => Box::new(state.index(cid).iter().copied()),
            None => Box::new(state.entities().map(|e| e.id())),
        };

        candidates
            .filter(|id| {
                self.includes.iter().all(|cid| state.index(cid).contains(id))
                    && !self.excludes.iter().any(|cid| state.index(cid).contains(id))
            })
            .collect()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Hashable projection of a component value, used by keyed queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    /// A boolean key.
    Bool(bool),
    /// An integer key.
    Int(i64),
    /// A text key, compared by content.
    Text(Arc<str>),
}

impl IndexKey {
    /// Projects `value`; non-hashable variants have no key.
    pub fn of(value: &ComponentValue) -> Option<IndexKey> {
        match value {
            ComponentValue::Bool(v) => Some(IndexKey::Bool(*v)),
            ComponentValue::Int(v) => Some(IndexKey::Int(*v)),
            ComponentValue::Text(v) => Some(IndexKey::Text(Arc::clone(v))),
            _ => None,
        }
    }
}

impl From<&str> for IndexKey {
    fn from(value: &str) -> Self {
        IndexKey::Text(Arc::from(value))
    }
}
