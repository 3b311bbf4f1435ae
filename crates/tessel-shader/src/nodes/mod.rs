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

//! Node implementations and the registry the compiler looks them up in.
//!
//! A [`NodeKind`] describes a node type in two steps: [`NodeKind::signature`]
//! lists its typed sockets (used to validate links before anything is
//! generated), and [`NodeKind::emit`] turns already-converted input
//! expressions into one expression per output. The compiler stores each
//! output in its own variable, so `emit` never has to care how many
//! consumers a value has.

mod converter;
mod input;
mod output;
mod texture;

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use crate::cache::{CompilationCache, Requirements};
use crate::error::CompileError;
use crate::hooks::{BeforeRenderHook, UniformValue};
use crate::library::LibraryRegistry;
use crate::naming::{socket_key, NameAllocator};
use crate::tree::Node;
use crate::types::SocketType;

pub use self::output::OUTPUT_MATERIAL;

/// The shader stage code is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Per-vertex code, feeding displacement.
    Vertex,
    /// Per-fragment code, feeding color and alpha.
    Fragment,
}

/// One input socket of a node type.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    /// Normalized socket name.
    pub name: String,
    /// The type the node reads.
    pub ty: SocketType,
    /// Value used when the socket is neither linked nor authored. `None`
    /// marks an implicit input the node fills itself (e.g. mesh UVs).
    pub default: Option<Value>,
}

/// The typed sockets of one node instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    /// Inputs, in evaluation order.
    pub inputs: Vec<InputSpec>,
    /// Outputs, in the order [`NodeKind::emit`] returns them.
    pub outputs: Vec<(String, SocketType)>,
}

impl Signature {
    /// Creates an empty signature.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input with a default literal.
    pub fn input(mut self, name: &str, ty: SocketType, default: Value) -> Self {
        self.inputs.push(InputSpec {
            name: socket_key(name),
            ty,
            default: Some(default),
        });
        self
    }

    /// Adds an input the node fills itself when it is not linked.
    pub fn implicit_input(mut self, name: &str, ty: SocketType) -> Self {
        self.inputs.push(InputSpec {
            name: socket_key(name),
            ty,
            default: None,
        });
        self
    }

    /// Adds an output.
    pub fn output(mut self, name: &str, ty: SocketType) -> Self {
        self.outputs.push((socket_key(name), ty));
        self
    }

    /// The type of an input socket.
    pub fn input_type(&self, name: &str) -> Option<SocketType> {
        self.inputs.iter().find(|i| i.name == name).map(|i| i.ty)
    }

    /// The type of an output socket.
    pub fn output_type(&self, name: &str) -> Option<SocketType> {
        self.outputs.iter().find(|(n, _)| n == name).map(|(_, ty)| *ty)
    }
}

/// The name of the only output of a single-output node: the authored one
/// if the tree declares exactly one, `default` otherwise.
pub(crate) fn single_output(node: &Node, default: &str) -> String {
    let mut outputs = node.outputs();
    match (outputs.next(), outputs.next()) {
        (Some((name, _)), None) => name.to_string(),
        _ => socket_key(default),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Arg {
    expr: String,
    linked: bool,
}

/// Input expressions handed to [`NodeKind::emit`], already converted to the
/// socket types of the signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    node: String,
    values: IndexMap<String, Arg>,
}

impl Args {
    pub(crate) fn new(node: &str) -> Self {
        Self {
            node: node.to_string(),
            values: IndexMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: &str, expr: String, linked: bool) {
        self.values.insert(name.to_string(), Arg { expr, linked });
    }

    /// The expression feeding input `name`.
    pub fn get(&self, name: &str) -> Result<&str, CompileError> {
        self.values
            .get(name)
            .filter(|arg| arg.linked || !arg.expr.is_empty())
            .map(|arg| arg.expr.as_str())
            .ok_or_else(|| CompileError::UnknownSocket {
                node: self.node.clone(),
                socket: name.to_string(),
            })
    }

    /// The expression feeding input `name`, only if it is linked.
    pub fn linked(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .filter(|arg| arg.linked)
            .map(|arg| arg.expr.as_str())
    }
}

/// The mutable side of emitting one node: program-level declarations,
/// helper statements and fresh identifiers.
pub struct EmitContext<'a> {
    pub(crate) stage: Stage,
    pub(crate) node: &'a str,
    pub(crate) cache: &'a mut CompilationCache,
    pub(crate) library: &'a LibraryRegistry,
    pub(crate) names: &'a mut NameAllocator,
    pub(crate) requires: &'a mut Requirements,
    pub(crate) statements: &'a mut Vec<String>,
}

impl EmitContext<'_> {
    /// The stage being generated.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Pulls a library fragment (and its dependencies) into the program.
    pub fn include(&mut self, name: &str) -> Result<(), CompileError> {
        self.library.resolve_into(name, self.cache.includes_mut())?;
        self.library.resolve_into(name, &mut self.requires.includes)
    }

    /// Declares a uniform and returns its name.
    pub fn uniform(&mut self, name: &str, default: UniformValue) -> String {
        self.cache.add_uniform(name, default);
        self.requires.uniforms.insert(name.to_string());
        name.to_string()
    }

    /// Declares the sampler bound to `image`, shared by every node reading
    /// the same image, and returns its name.
    pub fn texture(&mut self, image: &str) -> String {
        let existing = self.cache.uniforms().iter().find_map(|(name, value)| match value {
            UniformValue::Texture(path) if path == image => Some(name.clone()),
            _ => None,
        });
        let name = existing.unwrap_or_else(|| self.names.allocate(&["tex", image]));
        self.uniform(&name, UniformValue::Texture(image.to_string()))
    }

    /// Registers a hook the renderer must run before each draw.
    pub fn hook(&mut self, hook: BeforeRenderHook) {
        self.cache.add_hook(hook);
    }

    /// Sets a preprocessor flag.
    pub fn define(&mut self, name: &str) {
        self.cache.add_define(name);
        self.requires.defines.insert(name.to_string());
    }

    /// Declares a per-vertex attribute and returns its name.
    pub fn attribute(&mut self, name: &str, ty: SocketType) -> String {
        self.cache.add_attribute(name, ty);
        self.requires.attributes.insert(name.to_string());
        name.to_string()
    }

    /// Declares a varying assigned from `source` in the vertex stage and
    /// returns its name.
    pub fn varying(&mut self, name: &str, ty: SocketType, source: &str) -> String {
        self.cache.add_varying(name, ty, source);
        self.requires.varyings.insert(name.to_string());
        name.to_string()
    }

    /// A fresh identifier for a helper variable of this node.
    pub fn local(&mut self, suffix: &str) -> String {
        self.names.allocate(&["n", self.node, suffix])
    }

    /// Appends a statement ahead of the node's output assignments.
    pub fn statement(&mut self, statement: impl Into<String>) {
        self.statements.push(statement.into());
    }

    /// The mesh UV coordinates (`vec2`).
    pub fn uv(&mut self) -> String {
        match self.stage {
            Stage::Vertex => "uv".to_string(),
            Stage::Fragment => self.varying("vUv", SocketType::Vec2, "uv"),
        }
    }

    /// The object-space position (`vec3`).
    pub fn object_position(&mut self) -> String {
        match self.stage {
            Stage::Vertex => "position".to_string(),
            Stage::Fragment => self.varying("vPosition", SocketType::Vec3, "position"),
        }
    }

    /// The world-space normal (`vec3`).
    pub fn normal(&mut self) -> String {
        match self.stage {
            Stage::Vertex => "normalize(mat3(modelMatrix) * normal)".to_string(),
            Stage::Fragment => self.varying(
                "vNormal",
                SocketType::Vec3,
                "normalize(mat3(modelMatrix) * normal)",
            ),
        }
    }

    /// The world-space position (`vec3`).
    pub fn world_position(&mut self) -> String {
        match self.stage {
            Stage::Vertex => "(modelMatrix * vec4(position, 1.0)).xyz".to_string(),
            Stage::Fragment => self.varying("vWorldPosition", SocketType::Vec3, "worldPosition.xyz"),
        }
    }
}

/// A node type.
pub trait NodeKind: Send + Sync {
    /// The canonical lower-case type name.
    fn name(&self) -> &'static str;

    /// The sockets of `node`, which may depend on its properties.
    fn signature(&self, node: &Node) -> Result<Signature, CompileError>;

    /// Generates one expression per output of the signature.
    fn emit(&self, node: &Node, args: &Args, ctx: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError>;
}

/// Error for a missing or unusable node property.
pub(crate) fn invalid_property(node: &Node, property: &str, reason: impl Into<String>) -> CompileError {
    CompileError::InvalidProperty {
        node: node.id().to_string(),
        property: property.to_string(),
        reason: reason.into(),
    }
}

/// Reads an upper-case enum property such as `operation`.
pub(crate) fn enum_property(node: &Node, property: &str, default: &str) -> Result<String, CompileError> {
    match node.property(property) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.to_ascii_uppercase()),
        Some(other) => Err(invalid_property(node, property, format!("expected a string, got {other}"))),
    }
}

/// Maps authored type names, including the short forms some authoring
/// tools export, to canonical names.
fn canonical(kind: &str) -> String {
    let key = socket_key(kind);
    let canonical = match key.as_str() {
        "combxyz" => "combine_xyz",
        "sepxyz" => "separate_xyz",
        "vect_math" => "vector_math",
        "camera" => "camera_data",
        "time" => "scene_time",
        other => other,
    };
    canonical.to_string()
}

/// The set of node types the compiler understands.
#[derive(Default)]
pub struct NodeRegistry {
    kinds: HashMap<&'static str, Box<dyn NodeKind>>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in node type.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        input::register(&mut registry);
        converter::register(&mut registry);
        texture::register(&mut registry);
        output::register(&mut registry);
        registry
    }

    /// Adds or replaces a node type.
    pub fn register(&mut self, kind: impl NodeKind + 'static) {
        self.kinds.insert(kind.name(), Box::new(kind));
    }

    /// Looks up the implementation of an authored type name.
    pub fn get(&self, kind: &str) -> Option<&dyn NodeKind> {
        self.kinds.get(canonical(kind).as_str()).map(|k| k.as_ref())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns true if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.kinds.keys().collect();
        names.sort();
        f.debug_struct("NodeRegistry").field("kinds", &names).finish()
    }
}
