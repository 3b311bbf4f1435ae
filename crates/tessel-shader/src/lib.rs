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

//! # Tessel Shader
//!
//! Turns a node tree authored in an external tool into a GLSL ES 3.00
//! vertex/fragment pair. Compilation runs in phases: the tree is parsed and
//! every link is type-checked, the graph is ordered, the nodes feeding each
//! output root are evaluated once into intermediate variables, and the
//! result is emitted together with the [`CompilationCache`] describing the
//! uniforms, varyings and library code the program needs.

#![warn(missing_docs)]

pub mod cache;
pub mod compiler;
mod emit;
pub mod error;
pub mod hooks;
pub mod library;
pub mod naming;
pub mod nodes;
pub mod tree;
pub mod types;

pub use cache::CompilationCache;
pub use compiler::{CompiledShader, OutputRoot, RootTarget, ShaderCompiler, ShaderSources};
pub use error::CompileError;
pub use hooks::{BeforeRenderHook, FrameInfo, UniformTable, UniformValue};
pub use library::{LibraryFragment, LibraryRegistry};
pub use nodes::{NodeKind, NodeRegistry, Stage};
pub use tree::{Node, NodeTree, SocketRef};
pub use types::SocketType;
