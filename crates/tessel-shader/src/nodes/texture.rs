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

//! Procedural and image textures.

use serde_json::{json, Value};

use super::{invalid_property, Args, EmitContext, NodeKind, NodeRegistry, Signature};
use crate::error::CompileError;
use crate::library;
use crate::tree::Node;
use crate::types::SocketType;

pub(super) fn register(registry: &mut NodeRegistry) {
    registry.register(TexImageNode);
    registry.register(TexNoiseNode);
    registry.register(TexWhiteNoiseNode);
}

/// The `vector` input, or the node's natural coordinates when unlinked.
fn coordinates(args: &Args, fallback: impl FnOnce() -> String) -> String {
    args.linked("vector").map(str::to_string).unwrap_or_else(fallback)
}

/// Samples an image, bound through a `sampler2D` uniform.
struct TexImageNode;

impl TexImageNode {
    /// The image path: a string, or an object carrying `filepath` or `name`.
    fn image(node: &Node) -> Result<&str, CompileError> {
        let image = match node.property("image") {
            Some(Value::String(path)) => Some(path.as_str()),
            Some(Value::Object(image)) => image
                .get("filepath")
                .or_else(|| image.get("name"))
                .and_then(Value::as_str),
            _ => None,
        };
        image
            .filter(|path| !path.is_empty())
            .ok_or_else(|| invalid_property(node, "image", "expected an image path"))
    }
}

impl NodeKind for TexImageNode {
    fn name(&self) -> &'static str {
        "tex_image"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .implicit_input("vector", SocketType::Vec3)
            .output("color", SocketType::Vec4)
            .output("alpha", SocketType::Float))
    }

    fn emit(&self, node: &Node, args: &Args, ctx: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let sampler = ctx.texture(Self::image(node)?);
        let vector = coordinates(args, || format!("vec3({}, 0.0)", ctx.uv()));
        let sample = ctx.local("sample");
        ctx.statement(format!("vec4 {sample} = texture({sampler}, {vector}.xy);"));
        Ok(vec![sample.clone(), format!("{sample}.a")])
    }
}

/// Fractal value noise.
struct TexNoiseNode;

impl NodeKind for TexNoiseNode {
    fn name(&self) -> &'static str {
        "tex_noise"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .implicit_input("vector", SocketType::Vec3)
            .input("scale", SocketType::Float, json!(5.0))
            .input("detail", SocketType::Float, json!(2.0))
            .input("roughness", SocketType::Float, json!(0.5))
            .output("fac", SocketType::Float)
            .output("color", SocketType::Vec4))
    }

    fn emit(&self, _: &Node, args: &Args, ctx: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        ctx.include(library::NOISE)?;
        let vector = coordinates(args, || ctx.object_position());
        let (detail, roughness) = (args.get("detail")?, args.get("roughness")?);

        let point = ctx.local("p");
        let fac = ctx.local("fac");
        ctx.statement(format!("vec3 {point} = {vector} * {};", args.get("scale")?));
        ctx.statement(format!("float {fac} = tessel_fbm({point}, {detail}, {roughness});"));
        Ok(vec![
            fac.clone(),
            format!(
                "vec4({fac}, tessel_fbm({point} + vec3(19.1, 33.4, 47.2), {detail}, {roughness}), \
                 tessel_fbm({point} + vec3(74.2, 12.5, 5.3), {detail}, {roughness}), 1.0)"
            ),
        ])
    }
}

/// Uncorrelated noise per input position.
struct TexWhiteNoiseNode;

impl NodeKind for TexWhiteNoiseNode {
    fn name(&self) -> &'static str {
        "tex_white_noise"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .implicit_input("vector", SocketType::Vec3)
            .output("value", SocketType::Float)
            .output("color", SocketType::Vec4))
    }

    fn emit(&self, _: &Node, args: &Args, ctx: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        ctx.include(library::HASH)?;
        let vector = coordinates(args, || ctx.object_position());
        Ok(vec![
            format!("tessel_hash13({vector})"),
            format!("vec4(tessel_hash33({vector}), 1.0)"),
        ])
    }
}
