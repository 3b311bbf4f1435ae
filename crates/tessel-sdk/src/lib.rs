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

//! The public-facing SDK of the Tessel engine.
//!
//! Wires the data layer, the shader compiler and the live link into an
//! [`Engine`] driven one frame at a time by the host application.

#![warn(missing_docs)]

pub mod components;
pub mod config;
pub mod engine;
pub mod logging;
pub mod material;
pub mod shader_trees;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, FrameStats, RenderBackend};
pub use material::CompiledMaterial;
pub use shader_trees::ShaderTrees;

/// Re-exports of the types most applications need.
pub mod prelude {
    pub use crate::components;
    pub use crate::{CompiledMaterial, Engine, EngineConfig, FrameStats, RenderBackend};
    pub use tessel_core::ecs::EntityId;
    pub use tessel_core::math::{Vec2, Vec3, Vec4};
    pub use tessel_data::ecs::{ComponentValue, Pipeline, QuerySpec, Store, StoreState, System};
    pub use tessel_link::{LinkMessage, MessageKind};
    pub use tessel_shader::{FrameInfo, ShaderCompiler, UniformTable};
}
