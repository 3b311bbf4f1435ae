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

//! Ordered composition of systems, run once per frame.

use std::time::Instant;

use crate::ecs::error::StoreError;
use crate::ecs::store::Store;
use crate::ecs::system::System;

/// One entry handed to [`Pipeline::with`].
#[derive(Debug)]
pub enum Stage {
    /// A single system.
    System(System),
    /// A nested pipeline, flattened in place.
    Pipeline(Pipeline),
}

impl From<System> for Stage {
    fn from(value: System) -> Self {
        Stage::System(value)
    }
}

impl From<Pipeline> for Stage {
    fn from(value: Pipeline) -> Self {
        Stage::Pipeline(value)
    }
}

/// Summary of one [`Pipeline::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Systems that ran.
    pub systems: usize,
    /// Hook invocations that returned an error.
    pub failures: usize,
}

/// A flat, ordered list of systems.
///
/// Nested pipelines are flattened when added, so the run order is exactly
/// the declaration order. Systems run strictly one after another on the
/// calling thread; a later system sees every write made by earlier ones in
/// the same tick.
#[derive(Debug, Default)]
pub struct Pipeline {
    systems: Vec<System>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a system or a nested pipeline.
    pub fn with(mut self, stage: impl Into<Stage>) -> Self {
        self.push(stage);
        self
    }

    /// Appends a system or a nested pipeline.
    pub fn push(&mut self, stage: impl Into<Stage>) {
        match stage.into() {
            Stage::System(system) => self.systems.push(system),
            Stage::Pipeline(pipeline) => self.systems.extend(pipeline.systems),
        }
    }

    /// Number of systems after flattening.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns true if the pipeline holds no system.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// The names of the systems, in run order.
    pub fn system_names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(System::name)
    }

    /// One-time setup: every consumer reports all currently matching
    /// entities as new on the next tick.
    pub fn init(&mut self, store: &mut Store) -> Result<(), StoreError> {
        for consumer in self.systems.iter().filter_map(System::consumer) {
            store.reset_consumer(consumer)?;
        }
        log::info!("Pipeline initialized with {} systems.", self.systems.len());
        Ok(())
    }

    /// Runs every system once, in order. `delta_time` is in milliseconds.
    pub fn tick(&mut self, store: &mut Store, delta_time: f64) -> TickReport {
        let mut report = TickReport::default();
        for system in &mut self.systems {
            let start = Instant::now();
            report.failures += system.run(store, delta_time);
            report.systems += 1;
            log::trace!(
                "System '{}' ran in {}us.",
                system.name(),
                start.elapsed().as_micros()
            );
        }
        report
    }
}
