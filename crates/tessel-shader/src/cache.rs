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

//! The per-compile accumulator of program-level declarations.

use indexmap::{IndexMap, IndexSet};

use crate::hooks::{BeforeRenderHook, FrameInfo, UniformTable, UniformValue};
use crate::types::SocketType;

/// A value passed from the vertex to the fragment stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varying {
    /// Its type.
    pub ty: SocketType,
    /// The vertex-stage expression it is assigned from.
    pub source: String,
}

/// Everything a compiled program declares besides its node code.
///
/// Scoped to one compile and handed out with the result: the renderer reads
/// the uniform defaults and hooks from it, the emitter the declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationCache {
    uniforms: IndexMap<String, UniformValue>,
    defines: IndexSet<String>,
    varyings: IndexMap<String, Varying>,
    attributes: IndexMap<String, SocketType>,
    includes: IndexSet<String>,
    hooks: Vec<BeforeRenderHook>,
}

impl CompilationCache {
    /// Uniforms with their default value.
    pub fn uniforms(&self) -> &IndexMap<String, UniformValue> {
        &self.uniforms
    }

    /// Preprocessor flags, emitted as `#define NAME`.
    pub fn defines(&self) -> &IndexSet<String> {
        &self.defines
    }

    /// Values interpolated from the vertex stage.
    pub fn varyings(&self) -> &IndexMap<String, Varying> {
        &self.varyings
    }

    /// Extra per-vertex attributes beyond position, normal and uv.
    pub fn attributes(&self) -> &IndexMap<String, SocketType> {
        &self.attributes
    }

    /// Library fragments, dependencies first.
    pub fn includes(&self) -> &IndexSet<String> {
        &self.includes
    }

    /// Hooks to run before each draw, without duplicates.
    pub fn hooks(&self) -> &[BeforeRenderHook] {
        &self.hooks
    }

    /// A table holding every uniform at its default value.
    pub fn uniform_table(&self) -> UniformTable {
        self.uniforms
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Runs every hook against `table`.
    pub fn apply_hooks(&self, table: &mut UniformTable, frame: &FrameInfo) {
        for hook in &self.hooks {
            hook.apply(table, frame);
        }
    }

    pub(crate) fn add_uniform(&mut self, name: &str, default: UniformValue) {
        self.uniforms.entry(name.to_string()).or_insert(default);
    }

    pub(crate) fn add_define(&mut self, name: &str) {
        self.defines.insert(name.to_string());
    }

    pub(crate) fn add_varying(&mut self, name: &str, ty: SocketType, source: &str) {
        self.varyings.entry(name.to_string()).or_insert_with(|| Varying {
            ty,
            source: source.to_string(),
        });
    }

    pub(crate) fn add_attribute(&mut self, name: &str, ty: SocketType) {
        self.attributes.entry(name.to_string()).or_insert(ty);
    }

    pub(crate) fn add_hook(&mut self, hook: BeforeRenderHook) {
        if !self.hooks.contains(&hook) {
            self.hooks.push(hook);
        }
    }

    pub(crate) fn includes_mut(&mut self) -> &mut IndexSet<String> {
        &mut self.includes
    }
}

/// What one node's code relies on, so a subset of the nodes can be emitted
/// with only the declarations it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Requirements {
    pub(crate) uniforms: IndexSet<String>,
    pub(crate) defines: IndexSet<String>,
    pub(crate) varyings: IndexSet<String>,
    pub(crate) attributes: IndexSet<String>,
    pub(crate) includes: IndexSet<String>,
}

impl Requirements {
    pub(crate) fn merge(&mut self, other: &Requirements) {
        self.uniforms.extend(other.uniforms.iter().cloned());
        self.defines.extend(other.defines.iter().cloned());
        self.varyings.extend(other.varyings.iter().cloned());
        self.attributes.extend(other.attributes.iter().cloned());
        self.includes.extend(other.includes.iter().cloned());
    }
}
