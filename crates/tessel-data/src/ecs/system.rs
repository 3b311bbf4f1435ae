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

//! Systems: a consumer plus the hooks that process its deltas.

use std::fmt;
use std::sync::Arc;

use crate::ecs::bitset::ComponentSet;
use crate::ecs::consumer::Updated;
use crate::ecs::entity::Entity;
use crate::ecs::store::{ConsumerId, Store};

type EntityHook = Box<dyn FnMut(&mut Store, &Arc<Entity>, f64) -> anyhow::Result<()>>;
type UpdatedHook = Box<dyn FnMut(&mut Store, &Updated, f64) -> anyhow::Result<()>>;
type NewOrUpdatedHook =
    Box<dyn FnMut(&mut Store, &Arc<Entity>, Option<&ComponentSet>, f64) -> anyhow::Result<()>>;
type TickHook = Box<dyn FnMut(&mut Store, f64) -> anyhow::Result<()>>;

/// A named unit of per-frame work bound to one consumer.
///
/// Each [`System::run`] drains the consumer once and hands the delta to the
/// configured hooks in a fixed order: `removed`, then `for_new` and
/// `new_or_updated` for new entities, then `for_updated` and
/// `new_or_updated` for updated ones, then `each` for every entity still
/// matching. Removal runs first so resources can be released before new
/// entities claim them.
///
/// An entity written to after it became new shows up in both lists and gets
/// both `for_new` and `for_updated`. `new_or_updated` sees it once, as new.
///
/// Hooks receive the store mutably. Writes they make land in the consumers'
/// pending state and surface on the next drain, never in the delta that is
/// being processed.
pub struct System {
    name: String,
    consumer: Option<ConsumerId>,
    tick: Option<TickHook>,
    for_new: Option<EntityHook>,
    for_updated: Option<UpdatedHook>,
    new_or_updated: Option<NewOrUpdatedHook>,
    removed: Option<EntityHook>,
    each: Option<EntityHook>,
}

impl System {
    /// Creates a system driven by `consumer`.
    pub fn new(name: impl Into<String>, consumer: ConsumerId) -> Self {
        Self {
            consumer: Some(consumer),
            ..Self::tick_only(name)
        }
    }

    /// Creates a system without a consumer; only its `tick` hook runs.
    pub fn tick_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            consumer: None,
            tick: None,
            for_new: None,
            for_updated: None,
            new_or_updated: None,
            removed: None,
            each: None,
        }
    }

    /// The system's name, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The consumer this system drains.
    pub fn consumer(&self) -> Option<ConsumerId> {
        self.consumer
    }

    /// Runs once per frame before the delta is drained.
    pub fn on_tick(mut self, hook: impl FnMut(&mut Store, f64) -> anyhow::Result<()> + 'static) -> Self {
        self.tick = Some(Box::new(hook));
        self
    }

    /// Runs for every entity that entered the matching set.
    pub fn for_new(
        mut self,
        hook: impl FnMut(&mut Store, &Arc<Entity>, f64) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.for_new = Some(Box::new(hook));
        self
    }

    /// Runs for every matching entity with changed included components.
    pub fn for_updated(
        mut self,
        hook: impl FnMut(&mut Store, &Updated, f64) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.for_updated = Some(Box::new(hook));
        self
    }

    /// Runs for new entities (with `None`) and updated ones (with the
    /// changed components).
    pub fn new_or_updated(
        mut self,
        hook: impl FnMut(&mut Store, &Arc<Entity>, Option<&ComponentSet>, f64) -> anyhow::Result<()>
            + 'static,
    ) -> Self {
        self.new_or_updated = Some(Box::new(hook));
        self
    }

    /// Runs for every entity that left the matching set, with its last value.
    pub fn removed(
        mut self,
        hook: impl FnMut(&mut Store, &Arc<Entity>, f64) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.removed = Some(Box::new(hook));
        self
    }

    /// Runs for every currently matching entity, after the delta hooks.
    pub fn each(
        mut self,
        hook: impl FnMut(&mut Store, &Arc<Entity>, f64) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.each = Some(Box::new(hook));
        self
    }

    fn report(&self, hook: &str, entity: Option<&Entity>, error: anyhow::Error) {
        match entity {
            Some(entity) => log::error!(
                "System '{}': {hook} hook failed for entity {}: {error:#}",
                self.name,
                entity.id()
            ),
            None => log::error!("System '{}': {hook} hook failed: {error:#}", self.name),
        }
    }

    /// Drains the consumer and runs the hooks. Returns the number of hook
    /// invocations that failed.
    ///
    /// A failing hook is logged and skipped; its delta still counts as
    /// delivered.
    pub fn run(&mut self, store: &mut Store, delta_time: f64) -> usize {
        let mut failures = 0;

        if let Some(tick) = self.tick.as_mut() {
            if let Err(e) = tick(store, delta_time) {
                failures += 1;
                self.report("tick", None, e);
            }
        }

        let Some(consumer) = self.consumer else {
            return failures;
        };
        let delta = match store.drain(consumer) {
            Ok(delta) => delta,
            Err(e) => {
                log::error!("System '{}' cannot drain its consumer: {e}", self.name);
                return failures + 1;
            }
        };

        let mut errors: Vec<(&'static str, Arc<Entity>, anyhow::Error)> = Vec::new();

        for entity in &delta.removed {
            if let Some(hook) = self.removed.as_mut() {
                if let Err(e) = hook(store, entity, delta_time) {
                    errors.push(("removed", Arc::clone(entity), e));
                }
            }
        }

        for entity in &delta.new {
            if let Some(hook) = self.for_new.as_mut() {
                if let Err(e) = hook(store, entity, delta_time) {
                    errors.push(("for_new", Arc::clone(entity), e));
                }
            }
            if let Some(hook) = self.new_or_updated.as_mut() {
                if let Err(e) = hook(store, entity, None, delta_time) {
                    errors.push(("new_or_updated", Arc::clone(entity), e));
                }
            }
        }

        for updated in &delta.updated {
            if let Some(hook) = self.for_updated.as_mut() {
                if let Err(e) = hook(store, updated, delta_time) {
                    errors.push(("for_updated", Arc::clone(&updated.entity), e));
                }
            }
            if delta.new.iter().any(|entity| entity.id() == updated.entity.id()) {
                continue;
            }
            if let Some(hook) = self.new_or_updated.as_mut() {
                if let Err(e) = hook(store, &updated.entity, Some(&updated.changed), delta_time) {
                    errors.push(("new_or_updated", Arc::clone(&updated.entity), e));
                }
            }
        }

        if let Some(hook) = self.each.as_mut() {
            let members: Vec<Arc<Entity>> = store
                .query_of(consumer)
                .map(|view| view.iter().cloned().collect())
                .unwrap_or_default();
            for entity in &members {
                if let Err(e) = hook(store, entity, delta_time) {
                    errors.push(("each", Arc::clone(entity), e));
                }
            }
        }

        failures += errors.len();
        for (hook, entity, error) in errors {
            self.report(hook, Some(&entity), error);
        }
        failures
    }
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("name", &self.name)
            .field("consumer", &self.consumer)
            .finish_non_exhaustive()
    }
}
