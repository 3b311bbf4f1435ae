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

//! Shading and material output nodes.

use serde_json::json;

use super::{Args, EmitContext, NodeKind, NodeRegistry, Signature};
use crate::error::CompileError;
use crate::tree::Node;
use crate::types::SocketType;

/// Type name of the material output node roots are inferred from.
pub const OUTPUT_MATERIAL: &str = "output_material";

pub(super) fn register(registry: &mut NodeRegistry) {
    registry.register(EmissionNode);
    registry.register(OutputMaterialNode);
}

/// Unlit emitted color.
struct EmissionNode;

impl NodeKind for EmissionNode {
    fn name(&self) -> &'static str {
        "emission"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .input("color", SocketType::Vec4, json!([1.0, 1.0, 1.0, 1.0]))
            .input("strength", SocketType::Float, json!(1.0))
            .output("emission", SocketType::Vec4))
    }

    fn emit(&self, _: &Node, args: &Args, _: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let color = args.get("color")?;
        Ok(vec![format!(
            "vec4({color}.rgb * {}, {color}.a)",
            args.get("strength")?
        )])
    }
}

/// The material sink. It generates no code itself: the compiler reads the
/// links into `surface`, `alpha` and `displacement` to find output roots.
struct OutputMaterialNode;

impl NodeKind for OutputMaterialNode {
    fn name(&self) -> &'static str {
        OUTPUT_MATERIAL
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .implicit_input("surface", SocketType::Vec4)
            .implicit_input("alpha", SocketType::Float)
            .implicit_input("displacement", SocketType::Vec3))
    }

    fn emit(&self, _: &Node, _: &Args, _: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        Ok(Vec::new())
    }
}
