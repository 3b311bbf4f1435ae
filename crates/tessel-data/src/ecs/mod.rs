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

//! Implements Tessel's change-tracked Entity-Component-System.
//!
//! Entities are sparse records of [`ComponentValue`]s keyed by the
//! [`ComponentId`]s of a closed [`ComponentSchema`]. Commits go through the
//! owned [`Store`], which keeps the current [`StoreState`] snapshot, the live
//! queries and the per-system consumers in step.
//!
//! The primary entry points are [`Store`] and [`Pipeline`].

mod bitset;
mod component;
mod consumer;
mod entity;
mod error;
mod pipeline;
mod planner;
mod query;
mod schema;
mod state;
mod store;
mod system;

pub use bitset::ComponentSet;
pub use component::ComponentValue;
pub use consumer::{Delta, Updated};
pub use entity::Entity;
pub use error::{QueryError, SchemaError, StoreError};
pub use pipeline::{Pipeline, Stage, TickReport};
pub use query::{IndexKey, Query, QuerySpec};
pub use schema::{ComponentDef, ComponentId, ComponentSchema, ComponentSchemaBuilder};
pub use state::{Commit, StoreState};
pub use store::{ConsumerId, QueryId, QueryView, Store};
pub use system::System;

#[cfg(test)]
mod tests;
