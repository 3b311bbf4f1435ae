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

//! Error types of the data layer.

use tessel_core::ecs::EntityId;
use thiserror::Error;

use crate::ecs::schema::ComponentId;

/// Errors raised while freezing a component schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Two components share a name.
    #[error("component '{0}' is declared more than once")]
    DuplicateComponent(String),
    /// A component was declared with an empty name.
    #[error("component names must not be empty")]
    EmptyName,
    /// The schema is wider than a component set can address.
    #[error("schema declares {count} components, the maximum is {max}")]
    TooManyComponents {
        /// Declared count.
        count: usize,
        /// Supported maximum.
        max: usize,
    },
}

/// Errors raised while building a query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// A query names a component the schema does not declare.
    #[error("query references unknown component '{0}'")]
    UnknownComponent(String),
    /// A component appears in both the include and exclude lists.
    #[error("component '{0}' is both included and excluded")]
    Overlap(String),
}

/// Errors raised by store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A component name is not declared in the schema.
    #[error("unknown component '{0}'")]
    UnknownComponent(String),
    /// An entity carries a component id from another, wider schema.
    #[error("entity {entity} carries {component:?}, which is outside this store's schema")]
    ForeignComponent {
        /// The entity.
        entity: EntityId,
        /// The out-of-range id.
        component: ComponentId,
    },
    /// No entity with this id is registered.
    #[error("entity {0} is not registered")]
    UnknownEntity(EntityId),
    /// The entity does not hold the component.
    #[error("entity {entity} has no '{component}' component")]
    MissingComponent {
        /// The entity.
        entity: EntityId,
        /// The component name.
        component: String,
    },
    /// A singleton component is already held by another entity.
    #[error("singleton component '{component}' is already held by entity {holder}")]
    SingletonViolation {
        /// The component name.
        component: String,
        /// The entity currently holding it.
        holder: EntityId,
    },
    /// A query or consumer handle does not belong to this store.
    #[error("unknown {0} handle")]
    UnknownHandle(&'static str),
    /// A query could not be built.
    #[error(transparent)]
    Query(#[from] QueryError),
}
