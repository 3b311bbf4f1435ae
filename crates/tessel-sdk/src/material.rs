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

//! Compiled materials as stored on entities.

use serde_json::Value;
use tessel_shader::{
    CompileError, CompiledShader, FrameInfo, ShaderCompiler, ShaderSources, UniformTable,
};

use crate::config::ShaderConfig;

/// A material node tree compiled into GPU programs.
///
/// Held by entities in the `material` component and handed to the render
/// backend as-is.
#[derive(Debug, Clone)]
pub struct CompiledMaterial {
    name: String,
    shader: CompiledShader,
    depth: Option<ShaderSources>,
}

impl CompiledMaterial {
    /// Compiles the node tree of material `name`.
    pub fn compile(
        compiler: &ShaderCompiler,
        name: &str,
        tree: &Value,
        config: &ShaderConfig,
    ) -> Result<Self, CompileError> {
        let shader = compiler.compile_json(tree)?;
        let depth = config.depth_variant.then(|| shader.depth_variant());
        if config.log_sources {
            log::debug!(
                "Material '{name}' vertex source:\n{}\nfragment source:\n{}",
                shader.vertex(),
                shader.fragment()
            );
        }
        Ok(Self {
            name: name.to_string(),
            shader,
            depth,
        })
    }

    /// The material name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The main program.
    pub fn sources(&self) -> &ShaderSources {
        self.shader.sources()
    }

    /// The depth-only program, when enabled.
    pub fn depth(&self) -> Option<&ShaderSources> {
        self.depth.as_ref()
    }

    /// The compile result, with its uniforms and hooks.
    pub fn shader(&self) -> &CompiledShader {
        &self.shader
    }

    /// Uniform values for one draw: the defaults, updated by every hook.
    pub fn uniforms(&self, frame: &FrameInfo) -> UniformTable {
        let cache = self.shader.cache();
        let mut table = cache.uniform_table();
        cache.apply_hooks(&mut table, frame);
        table
    }
}
