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

//! Nodes that read constants, mesh data or per-frame state.

use serde_json::{json, Value};

use super::{invalid_property, single_output, Args, EmitContext, NodeKind, NodeRegistry, Signature};
use crate::error::CompileError;
use crate::hooks::{self, BeforeRenderHook, UniformValue};
use crate::library;
use crate::naming::sanitize;
use crate::tree::Node;
use crate::types::{float, SocketType};
use tessel_core::math::Vec3;

pub(super) fn register(registry: &mut NodeRegistry) {
    registry.register(ValueNode);
    registry.register(RgbNode);
    registry.register(TexCoordNode);
    registry.register(AttributeNode);
    registry.register(SceneTimeNode);
    registry.register(CameraDataNode);
    registry.register(ObjectInfoNode);
}

/// A constant `float`, read from the `value` property.
struct ValueNode;

impl NodeKind for ValueNode {
    fn name(&self) -> &'static str {
        "value"
    }

    fn signature(&self, node: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new().output(&single_output(node, "value"), SocketType::Float))
    }

    fn emit(&self, node: &Node, _: &Args, _: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let value = match node.property("value") {
            None | Some(Value::Null) => 0.0,
            Some(v) => v
                .as_f64()
                .ok_or_else(|| invalid_property(node, "value", "expected a number"))?,
        };
        Ok(vec![float(value)])
    }
}

/// A constant color, read from the `color` property.
struct RgbNode;

impl NodeKind for RgbNode {
    fn name(&self) -> &'static str {
        "rgb"
    }

    fn signature(&self, node: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new().output(&single_output(node, "color"), SocketType::Vec4))
    }

    fn emit(&self, node: &Node, _: &Args, _: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let default = json!([0.8, 0.8, 0.8, 1.0]);
        let color = node.property("color").unwrap_or(&default);
        let literal = SocketType::Vec4
            .literal(color)
            .ok_or_else(|| invalid_property(node, "color", "expected a list of numbers"))?;
        Ok(vec![literal])
    }
}

/// Texture coordinates of the mesh.
struct TexCoordNode;

impl NodeKind for TexCoordNode {
    fn name(&self) -> &'static str {
        "tex_coord"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .output("generated", SocketType::Vec3)
            .output("normal", SocketType::Vec3)
            .output("uv", SocketType::Vec3)
            .output("object", SocketType::Vec3))
    }

    fn emit(&self, _: &Node, _: &Args, ctx: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let position = ctx.object_position();
        let normal = ctx.normal();
        let uv = ctx.uv();
        Ok(vec![
            format!("({position} * 0.5 + 0.5)"),
            normal,
            format!("vec3({uv}, 0.0)"),
            position,
        ])
    }
}

/// A named per-vertex attribute of the mesh.
struct AttributeNode;

impl NodeKind for AttributeNode {
    fn name(&self) -> &'static str {
        "attribute"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .output("color", SocketType::Vec4)
            .output("vector", SocketType::Vec3)
            .output("fac", SocketType::Float))
    }

    fn emit(&self, node: &Node, _: &Args, ctx: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let name = node
            .str_property("attribute_name")
            .map(sanitize)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| invalid_property(node, "attribute_name", "expected a non-empty name"))?;

        let attribute = ctx.attribute(&format!("a_{name}"), SocketType::Vec4);
        let value = match ctx.stage() {
            super::Stage::Vertex => attribute,
            super::Stage::Fragment => ctx.varying(&format!("v_{name}"), SocketType::Vec4, &attribute),
        };
        let fac = SocketType::Vec4
            .convert(&value, SocketType::Float)
            .unwrap_or_else(|| format!("{value}.x"));
        Ok(vec![value.clone(), format!("{value}.xyz"), fac])
    }
}

/// Elapsed time and frame count.
struct SceneTimeNode;

impl NodeKind for SceneTimeNode {
    fn name(&self) -> &'static str {
        "scene_time"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .output("seconds", SocketType::Float)
            .output("frame", SocketType::Float))
    }

    fn emit(&self, _: &Node, _: &Args, ctx: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let seconds = ctx.uniform(hooks::TIME, UniformValue::Float(0.0));
        let frame = ctx.uniform(hooks::FRAME, UniformValue::Float(0.0));
        ctx.hook(BeforeRenderHook::UpdateTime);
        Ok(vec![seconds, frame])
    }
}

/// The position of the shaded point relative to the camera.
struct CameraDataNode;

impl NodeKind for CameraDataNode {
    fn name(&self) -> &'static str {
        "camera_data"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .output("view_vector", SocketType::Vec3)
            .output("view_z_depth", SocketType::Float)
            .output("view_distance", SocketType::Float))
    }

    fn emit(&self, _: &Node, _: &Args, ctx: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let camera = ctx.uniform(hooks::CAMERA_POSITION, UniformValue::Vec3(Vec3::ZERO));
        let direction = ctx.uniform(
            hooks::CAMERA_DIRECTION,
            UniformValue::Vec3(Vec3::new(0.0, 0.0, -1.0)),
        );
        ctx.hook(BeforeRenderHook::UpdateCamera);

        let world = ctx.world_position();
        let offset = ctx.local("offset");
        ctx.statement(format!("vec3 {offset} = {world} - {camera};"));
        Ok(vec![
            format!("normalize({offset})"),
            format!("dot({offset}, normalize({direction}))"),
            format!("length({offset})"),
        ])
    }
}

/// The location of the drawn object and a stable random value derived
/// from it.
struct ObjectInfoNode;

impl NodeKind for ObjectInfoNode {
    fn name(&self) -> &'static str {
        "object_info"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .output("location", SocketType::Vec3)
            .output("random", SocketType::Float))
    }

    fn emit(&self, _: &Node, _: &Args, ctx: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let location = ctx.uniform(hooks::OBJECT_LOCATION, UniformValue::Vec3(Vec3::ZERO));
        ctx.hook(BeforeRenderHook::UpdateObjectLocation);
        ctx.define("USE_OBJECT_INFO");
        ctx.include(library::HASH)?;
        Ok(vec![location.clone(), format!("tessel_hash13({location})")])
    }
}
