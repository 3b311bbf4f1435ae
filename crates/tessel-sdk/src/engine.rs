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

//! The frame driver.

use std::fmt;
use std::sync::Arc;

use tessel_data::ecs::{ComponentSchema, ComponentValue, Pipeline, Stage, Store, StoreState, TickReport};
use tessel_link::{LinkInbox, LinkMessage, LinkRouter, MessageKind};
use tessel_shader::{FrameInfo, ShaderCompiler};

use crate::components::{self, CAMERA, DIRECTION, POSITION};
use crate::config::EngineConfig;
use crate::material::CompiledMaterial;
use crate::shader_trees::ShaderTrees;

/// Draws a store state. Implemented by the rendering backend.
pub trait RenderBackend {
    /// Called once per frame after the pipeline ticked.
    fn render(&mut self, state: &StoreState, frame: &FrameInfo) -> anyhow::Result<()>;
}

type InputHook = Box<dyn FnMut(&mut Store, f64) -> anyhow::Result<()>>;

/// What one [`Engine::frame`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Index of the frame, starting at zero.
    pub frame: u64,
    /// Link messages applied at the frame boundary.
    pub messages: usize,
    /// The pipeline tick.
    pub tick: TickReport,
}

/// Owns the store and the pipeline and runs them one frame at a time.
///
/// Every frame runs, in order: input sampling, link messages received since
/// the previous frame, the pipeline tick, rendering. Link messages are
/// never applied while systems run.
pub struct Engine {
    config: EngineConfig,
    store: Store,
    pipeline: Pipeline,
    inbox: LinkInbox,
    router: LinkRouter,
    shader_trees: ShaderTrees,
    input: Option<InputHook>,
    initialized: bool,
    frame: u64,
    elapsed_ms: f64,
}

impl Engine {
    /// Creates an engine with the standard components.
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        Self::with_schema(config, components::standard_schema()?)
    }

    /// Creates an engine over `schema`, which must contain the standard
    /// components.
    pub fn with_schema(config: EngineConfig, schema: ComponentSchema) -> anyhow::Result<Self> {
        let mut store = Store::with_history(schema, config.store.history_depth);
        let shader_trees = ShaderTrees::new(&mut store)?;
        let compiler = Arc::new(ShaderCompiler::default());
        let pipeline = Pipeline::new().with(shader_trees.system(&mut store, compiler, config.shader.clone())?);

        log::info!("Engine created.");
        Ok(Self {
            config,
            store,
            pipeline,
            inbox: LinkInbox::new(),
            router: LinkRouter::new(),
            shader_trees,
            input: None,
            initialized: false,
            frame: 0,
            elapsed_ms: 0.0,
        })
    }

    /// The configuration the engine was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The entity store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The entity store, for setup and systems-free edits.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Appends a system or pipeline after the built-in ones.
    pub fn add_system(&mut self, stage: impl Into<Stage>) {
        self.pipeline.push(stage);
    }

    /// Sets the input sampling callback, run first in every frame.
    pub fn on_input(&mut self, hook: impl FnMut(&mut Store, f64) -> anyhow::Result<()> + 'static) {
        self.input = Some(Box::new(hook));
    }

    /// The live-link inbox. Hand its sender to the transport.
    pub fn inbox(&mut self) -> &mut LinkInbox {
        &mut self.inbox
    }

    /// Listeners for link messages.
    pub fn router(&mut self) -> &mut LinkRouter {
        &mut self.router
    }

    /// The compiled material named `name`, if any.
    pub fn material(&self, name: &str) -> Option<Arc<CompiledMaterial>> {
        self.shader_trees.material(&self.store, name)
    }

    /// Per-frame values for uniform hooks, read from the camera entity.
    pub fn frame_info(&self) -> FrameInfo {
        let mut info = FrameInfo {
            time: self.elapsed_ms / 1000.0,
            frame: self.frame,
            ..FrameInfo::default()
        };
        if let Some(camera) = self.store.singleton_holder(CAMERA) {
            let read = |name: &str| {
                self.store
                    .get_component(camera.id(), name)
                    .and_then(ComponentValue::as_vec3)
            };
            info.camera_position = read(POSITION).unwrap_or_default();
            info.camera_direction = read(DIRECTION).unwrap_or(info.camera_direction);
        }
        info
    }

    /// Initializes the pipeline. Called by the first [`Engine::frame`].
    pub fn init(&mut self) -> anyhow::Result<()> {
        self.pipeline.init(&mut self.store)?;
        self.initialized = true;
        Ok(())
    }

    fn apply(&mut self, message: &LinkMessage) {
        if let LinkMessage::ShaderTree { name, data } = message {
            if let Err(e) = self.shader_trees.apply(&mut self.store, name, data.clone()) {
                log::error!("Cannot store node tree of material '{name}': {e}");
            }
        }
        let listeners = self.router.dispatch(message);
        if listeners == 0 && message.kind() != MessageKind::ShaderTree {
            log::debug!("Ignoring {:?} '{}'.", message.kind(), message.name());
        }
    }

    /// Runs one frame. `delta_ms` is the time since the previous frame.
    pub fn frame(&mut self, delta_ms: f64, backend: &mut dyn RenderBackend) -> anyhow::Result<FrameStats> {
        if !self.initialized {
            self.init()?;
        }

        if let Some(input) = self.input.as_mut() {
            if let Err(e) = input(&mut self.store, delta_ms) {
                log::error!("Input sampling failed: {e:#}");
            }
        }

        let messages = self.inbox.take();
        for message in &messages {
            self.apply(message);
        }

        let tick = self.pipeline.tick(&mut self.store, delta_ms);
        self.elapsed_ms += delta_ms;

        backend.render(self.store.state(), &self.frame_info())?;

        let stats = FrameStats {
            frame: self.frame,
            messages: messages.len(),
            tick,
        };
        self.frame += 1;
        log::trace!("Frame {} done: {:?}", stats.frame, stats.tick);
        Ok(stats)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("frame", &self.frame)
            .field("systems", &self.pipeline.len())
            .field("entities", &self.store.state().len())
            .finish_non_exhaustive()
    }
}
