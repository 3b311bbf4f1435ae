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

//! Per-query cursors turning store commits into one-shot deltas.

use std::sync::Arc;

use indexmap::IndexMap;
use tessel_core::ecs::EntityId;

use crate::ecs::bitset::ComponentSet;
use crate::ecs::entity::Entity;
use crate::ecs::state::StoreState;

/// An entity reported as updated, with the included components that changed.
#[derive(Debug, Clone)]
pub struct Updated {
    /// The entity value at drain time.
    pub entity: Arc<Entity>,
    /// The union of included components changed since the previous drain.
    pub changed: ComponentSet,
}

/// Everything a consumer has to report since its previous drain.
#[derive(Debug, Clone, Default)]
pub struct Delta {
    /// Entities that left the matching set, with their last known value.
    pub removed: Vec<Arc<Entity>>,
    /// Entities that entered the matching set, at their current value.
    pub new: Vec<Arc<Entity>>,
    /// Entities that stayed in the matching set and changed.
    pub updated: Vec<Updated>,
}

impl Delta {
    /// Returns true if there is nothing to deliver.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.new.is_empty() && self.updated.is_empty()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.removed.len() + self.new.len() + self.updated.len()
    }
}

/// Pending delivery state of one entity.
///
/// `removed` and `new` can both be set when an entity left and re-entered
/// the matching set between two drains; the removal is delivered first.
/// Writes made after an entity became `new` are still reported as an update.
#[derive(Debug, Default)]
struct Pending {
    removed: Option<Arc<Entity>>,
    new: bool,
    changed: ComponentSet,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.removed.is_none() && !self.new && self.changed.is_empty()
    }
}

/// Cursor state of one consumer.
#[derive(Debug, Default)]
pub(crate) struct ConsumerState {
    pending: IndexMap<EntityId, Pending>,
}

impl ConsumerState {
    pub(crate) fn on_enter(&mut self, id: EntityId) {
        let pending = self.pending.entry(id).or_default();
        pending.new = true;
        pending.changed = ComponentSet::new();
    }

    pub(crate) fn on_update(&mut self, id: EntityId, changed: ComponentSet) {
        if changed.is_empty() {
            return;
        }
        self.pending.entry(id).or_default().changed.union_with(&changed);
    }

    pub(crate) fn on_leave(&mut self, id: EntityId, last: Arc<Entity>) {
        let pending = self.pending.entry(id).or_default();
        pending.changed = ComponentSet::new();
        if pending.new {
            // The consumer never saw this incarnation.
            pending.new = false;
        } else {
            pending.removed = Some(last);
        }
        if pending.is_empty() {
            self.pending.swap_remove(&id);
        }
    }

    /// Takes every pending delta. A second drain without new writes is empty.
    pub(crate) fn drain(&mut self, state: &StoreState) -> Delta {
        let mut delta = Delta::default();
        for (id, pending) in self.pending.drain(..) {
            if let Some(last) = pending.removed {
                delta.removed.push(last);
            }
            let Some(current) = state.get_entity(id) else {
                continue;
            };
            if pending.new {
                delta.new.push(Arc::clone(current));
            }
            if !pending.changed.is_empty() {
                delta.updated.push(Updated {
                    entity: Arc::clone(current),
                    changed: pending.changed,
                });
            }
        }
        delta
    }

    /// Forgets pending `new` and `updated` marks. Pending removals are kept
    /// so cleanup still runs for entities that already left.
    pub(crate) fn reset(&mut self) {
        self.pending.retain(|_, pending| {
            pending.new = false;
            pending.changed = ComponentSet::new();
            pending.removed.is_some()
        });
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
