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

//! The closed component schema every store is built against.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tessel_core::ecs::EntityId;

use crate::ecs::bitset::MAX_COMPONENTS;
use crate::ecs::component::ComponentValue;
use crate::ecs::entity::Entity;
use crate::ecs::error::SchemaError;

/// Dense index of a component type inside its [`ComponentSchema`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u16);

impl ComponentId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u16)
    }

    /// The position of the component in its schema.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Declaration of one component type.
#[derive(Debug, Clone)]
pub struct ComponentDef {
    /// Unique name, as used in queries and wire messages.
    pub name: Arc<str>,
    /// Zero-value used when the component is added without an explicit value.
    pub default: ComponentValue,
    /// Attached to every freshly created entity.
    pub seeded: bool,
    /// At most one registered entity may hold this component.
    pub singleton: bool,
}

/// Collects component declarations before they are frozen into a schema.
#[derive(Debug, Default)]
pub struct ComponentSchemaBuilder {
    defs: Vec<ComponentDef>,
}

impl ComponentSchemaBuilder {
    fn push(mut self, name: &str, default: ComponentValue, seeded: bool, singleton: bool) -> Self {
        self.defs.push(ComponentDef {
            name: Arc::from(name),
            default,
            seeded,
            singleton,
        });
        self
    }

    /// Declares a component with its zero-value.
    pub fn component(self, name: &str, default: impl Into<ComponentValue>) -> Self {
        self.push(name, default.into(), false, false)
    }

    /// Declares a component that every new entity starts with.
    pub fn seeded(self, name: &str, default: impl Into<ComponentValue>) -> Self {
        self.push(name, default.into(), true, false)
    }

    /// Declares a component that only one entity may hold at a time.
    pub fn singleton(self, name: &str, default: impl Into<ComponentValue>) -> Self {
        self.push(name, default.into(), false, true)
    }

    /// Validates the declarations and freezes them.
    pub fn build(self) -> Result<ComponentSchema, SchemaError> {
        if self.defs.len() > MAX_COMPONENTS {
            return Err(SchemaError::TooManyComponents {
                count: self.defs.len(),
                max: MAX_COMPONENTS,
            });
        }

        let mut by_name = HashMap::with_capacity(self.defs.len());
        for (index, def) in self.defs.iter().enumerate() {
            if def.name.is_empty() {
                return Err(SchemaError::EmptyName);
            }
            if by_name
                .insert(Arc::clone(&def.name), ComponentId::from_index(index))
                .is_some()
            {
                return Err(SchemaError::DuplicateComponent(def.name.to_string()));
            }
        }

        log::debug!("Component schema built with {} components.", self.defs.len());
        Ok(ComponentSchema {
            defs: self.defs,
            by_name,
        })
    }
}

/// A registry mapping component names to their ids and zero-values.
///
/// This is the single source of truth for which component types exist. It
/// is checked once at startup; after that every name lookup is infallible
/// for declared components and returns `None` for anything else.
#[derive(Debug)]
pub struct ComponentSchema {
    defs: Vec<ComponentDef>,
    by_name: HashMap<Arc<str>, ComponentId>,
}

impl ComponentSchema {
    /// Starts a new schema declaration.
    pub fn builder() -> ComponentSchemaBuilder {
        ComponentSchemaBuilder::default()
    }

    /// Looks up a component id by name.
    pub fn id(&self, name: &str) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    /// Returns the declaration of `id`.
    pub fn def(&self, id: ComponentId) -> &ComponentDef {
        &self.defs[id.index()]
    }

    /// Returns the name of `id`.
    pub fn name(&self, id: ComponentId) -> &str {
        &self.def(id).name
    }

    /// Number of declared components.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns true if no component was declared.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Iterates the declarations with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &ComponentDef)> {
        self.defs
            .iter()
            .enumerate()
            .map(|(i, def)| (ComponentId::from_index(i), def))
    }

    /// Allocates a fresh entity holding the seeded components.
    ///
    /// With a `seed` the id is deterministic, see [`EntityId::from_seed`].
    pub fn create_entity(&self, seed: Option<&str>) -> Entity {
        let id = seed.map_or_else(EntityId::new, EntityId::from_seed);
        let mut entity = Entity::new(id);
        for (cid, def) in self.iter().filter(|(_, def)| def.seeded) {
            entity.insert(cid, def.default.clone());
        }
        entity
    }

    /// Returns a copy of `entity` with component `name` set.
    ///
    /// `None` uses the component's zero-value. Unknown names leave the entity
    /// untouched.
    pub fn add_component(
        &self,
        entity: &Entity,
        name: &str,
        value: Option<ComponentValue>,
    ) -> Entity {
        match self.id(name) {
            Some(cid) => {
                let value = value.unwrap_or_else(|| self.def(cid).default.clone());
                entity.with(cid, value)
            }
            None => {
                log::warn!("Ignoring unknown component '{name}' on entity {}.", entity.id());
                entity.clone()
            }
        }
    }

    /// Returns a copy of `entity` without component `name`.
    pub fn remove_component(&self, entity: &Entity, name: &str) -> Entity {
        match self.id(name) {
            Some(cid) => entity.without(cid),
            None => entity.clone(),
        }
    }
}
