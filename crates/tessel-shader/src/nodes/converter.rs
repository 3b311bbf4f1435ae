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

//! Arithmetic, mixing and vector plumbing nodes.

use serde_json::json;

use super::{enum_property, invalid_property, single_output, Args, EmitContext, NodeKind, NodeRegistry, Signature};
use crate::error::CompileError;
use crate::library;
use crate::tree::Node;
use crate::types::SocketType;

pub(super) fn register(registry: &mut NodeRegistry) {
    registry.register(MathNode);
    registry.register(VectorMathNode);
    registry.register(MixNode);
    registry.register(ClampNode);
    registry.register(MapRangeNode);
    registry.register(CombineXyzNode);
    registry.register(SeparateXyzNode);
    registry.register(RerouteNode);
}

/// Fills `$1`, `$2`, `$3` and `$S` in an operation template.
fn fill(template: &str, operands: &[&str]) -> String {
    let mut out = template.to_string();
    for (i, operand) in operands.iter().enumerate() {
        let placeholder = if i < 3 { format!("${}", i + 1) } else { "$S".to_string() };
        out = out.replace(&placeholder, operand);
    }
    out
}

fn math_template(operation: &str) -> Option<&'static str> {
    Some(match operation {
        "ADD" => "$1 + $2",
        "SUBTRACT" => "$1 - $2",
        "MULTIPLY" => "$1 * $2",
        "DIVIDE" => "$2 != 0.0 ? $1 / $2 : 0.0",
        "MULTIPLY_ADD" => "$1 * $2 + $3",
        "POWER" => "pow($1, $2)",
        "LOGARITHM" => "($1 > 0.0 && $2 > 0.0) ? log($1) / log($2) : 0.0",
        "SQRT" => "$1 > 0.0 ? sqrt($1) : 0.0",
        "INVERSE_SQRT" => "$1 > 0.0 ? inversesqrt($1) : 0.0",
        "ABSOLUTE" => "abs($1)",
        "EXPONENT" => "exp($1)",
        "MINIMUM" => "min($1, $2)",
        "MAXIMUM" => "max($1, $2)",
        "LESS_THAN" => "$1 < $2 ? 1.0 : 0.0",
        "GREATER_THAN" => "$1 > $2 ? 1.0 : 0.0",
        "SIGN" => "sign($1)",
        "COMPARE" => "abs($1 - $2) <= max($3, 1e-5) ? 1.0 : 0.0",
        "ROUND" => "floor($1 + 0.5)",
        "FLOOR" => "floor($1)",
        "CEIL" => "ceil($1)",
        "TRUNC" => "trunc($1)",
        "FRACT" => "fract($1)",
        "MODULO" => "$2 != 0.0 ? $1 - $2 * trunc($1 / $2) : 0.0",
        "FLOORED_MODULO" => "$2 != 0.0 ? $1 - floor($1 / $2) * $2 : 0.0",
        "SNAP" => "$2 != 0.0 ? floor($1 / $2) * $2 : 0.0",
        "PINGPONG" => "$2 != 0.0 ? abs(fract(($1 - $2) / ($2 * 2.0)) * $2 * 2.0 - $2) : 0.0",
        "SINE" => "sin($1)",
        "COSINE" => "cos($1)",
        "TANGENT" => "tan($1)",
        "ARCSINE" => "asin($1)",
        "ARCCOSINE" => "acos($1)",
        "ARCTANGENT" => "atan($1)",
        "ARCTAN2" => "atan($1, $2)",
        "RADIANS" => "radians($1)",
        "DEGREES" => "degrees($1)",
        _ => return None,
    })
}

/// Scalar arithmetic selected by the `operation` property.
struct MathNode;

impl NodeKind for MathNode {
    fn name(&self) -> &'static str {
        "math"
    }

    fn signature(&self, node: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .input("value", SocketType::Float, json!(0.5))
            .input("value_001", SocketType::Float, json!(0.5))
            .input("value_002", SocketType::Float, json!(0.5))
            .output(&single_output(node, "value"), SocketType::Float))
    }

    fn emit(&self, node: &Node, args: &Args, _: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let operation = enum_property(node, "operation", "ADD")?;
        let template = math_template(&operation)
            .ok_or_else(|| invalid_property(node, "operation", format!("unsupported operation {operation}")))?;
        let expr = format!(
            "({})",
            fill(template, &[args.get("value")?, args.get("value_001")?, args.get("value_002")?])
        );
        if node.bool_property("use_clamp").unwrap_or(false) {
            return Ok(vec![format!("clamp({expr}, 0.0, 1.0)")]);
        }
        Ok(vec![expr])
    }
}

/// `(vector, value)` templates; `None` marks the unused output.
fn vector_math_template(operation: &str) -> Option<(Option<&'static str>, Option<&'static str>)> {
    Some(match operation {
        "ADD" => (Some("$1 + $2"), None),
        "SUBTRACT" => (Some("$1 - $2"), None),
        "MULTIPLY" => (Some("$1 * $2"), None),
        "DIVIDE" => (Some("$1 / $2"), None),
        "MULTIPLY_ADD" => (Some("$1 * $2 + $3"), None),
        "CROSS_PRODUCT" => (Some("cross($1, $2)"), None),
        "REFLECT" => (Some("reflect($1, normalize($2))"), None),
        "SCALE" => (Some("$1 * $S"), None),
        "NORMALIZE" => (Some("normalize($1)"), None),
        "ABSOLUTE" => (Some("abs($1)"), None),
        "MINIMUM" => (Some("min($1, $2)"), None),
        "MAXIMUM" => (Some("max($1, $2)"), None),
        "FLOOR" => (Some("floor($1)"), None),
        "CEIL" => (Some("ceil($1)"), None),
        "FRACT" => (Some("fract($1)"), None),
        "MODULO" => (Some("mod($1, $2)"), None),
        "SNAP" => (Some("floor($1 / $2) * $2"), None),
        "SINE" => (Some("sin($1)"), None),
        "COSINE" => (Some("cos($1)"), None),
        "TANGENT" => (Some("tan($1)"), None),
        "DOT_PRODUCT" => (None, Some("dot($1, $2)")),
        "DISTANCE" => (None, Some("distance($1, $2)")),
        "LENGTH" => (None, Some("length($1)")),
        _ => return None,
    })
}

/// Vector arithmetic selected by the `operation` property.
struct VectorMathNode;

impl NodeKind for VectorMathNode {
    fn name(&self) -> &'static str {
        "vector_math"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .input("vector", SocketType::Vec3, json!([0.0, 0.0, 0.0]))
            .input("vector_001", SocketType::Vec3, json!([0.0, 0.0, 0.0]))
            .input("vector_002", SocketType::Vec3, json!([0.0, 0.0, 0.0]))
            .input("scale", SocketType::Float, json!(1.0))
            .output("vector", SocketType::Vec3)
            .output("value", SocketType::Float))
    }

    fn emit(&self, node: &Node, args: &Args, _: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let operation = enum_property(node, "operation", "ADD")?;
        let (vector, value) = vector_math_template(&operation)
            .ok_or_else(|| invalid_property(node, "operation", format!("unsupported operation {operation}")))?;
        let operands = [
            args.get("vector")?,
            args.get("vector_001")?,
            args.get("vector_002")?,
            args.get("scale")?,
        ];
        Ok(vec![
            vector.map_or_else(|| "vec3(0.0)".to_string(), |t| format!("({})", fill(t, &operands))),
            value.map_or_else(|| "0.0".to_string(), |t| format!("({})", fill(t, &operands))),
        ])
    }
}

fn mix_type(node: &Node) -> Result<SocketType, CompileError> {
    match enum_property(node, "data_type", "RGBA")?.as_str() {
        "FLOAT" => Ok(SocketType::Float),
        "VECTOR" => Ok(SocketType::Vec3),
        "RGBA" => Ok(SocketType::Vec4),
        other => Err(invalid_property(node, "data_type", format!("unsupported data type {other}"))),
    }
}

/// Interpolation between `a` and `b`; colors support blend modes.
struct MixNode;

impl NodeKind for MixNode {
    fn name(&self) -> &'static str {
        "mix"
    }

    fn signature(&self, node: &Node) -> Result<Signature, CompileError> {
        let ty = mix_type(node)?;
        let (a, b) = match ty {
            SocketType::Float => (json!(0.0), json!(0.0)),
            SocketType::Vec3 => (json!([0.0, 0.0, 0.0]), json!([0.0, 0.0, 0.0])),
            _ => (json!([0.5, 0.5, 0.5, 1.0]), json!([0.5, 0.5, 0.5, 1.0])),
        };
        Ok(Signature::new()
            .input("factor", SocketType::Float, json!(0.5))
            .input("a", ty, a)
            .input("b", ty, b)
            .output("result", ty))
    }

    fn emit(&self, node: &Node, args: &Args, ctx: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let ty = mix_type(node)?;
        let mut factor = args.get("factor")?.to_string();
        if node.bool_property("clamp_factor").unwrap_or(true) {
            factor = format!("clamp({factor}, 0.0, 1.0)");
        }
        let (a, b) = (args.get("a")?, args.get("b")?);

        let mut result = if ty == SocketType::Vec4 {
            let blend = enum_property(node, "blend_type", "MIX")?;
            match blend.as_str() {
                "MIX" | "ADD" | "SUBTRACT" | "MULTIPLY" | "SCREEN" | "DARKEN" | "LIGHTEN" | "DIFFERENCE" => {}
                other => {
                    return Err(invalid_property(node, "blend_type", format!("unsupported blend mode {other}")))
                }
            }
            ctx.include(library::BLEND)?;
            format!("tessel_blend_{}({factor}, {a}, {b})", blend.to_ascii_lowercase())
        } else {
            format!("mix({a}, {b}, {factor})")
        };

        if node.bool_property("clamp_result").unwrap_or(false) {
            result = format!("clamp({result}, 0.0, 1.0)");
        }
        Ok(vec![result])
    }
}

/// Clamps a value between two bounds.
struct ClampNode;

impl NodeKind for ClampNode {
    fn name(&self) -> &'static str {
        "clamp"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .input("value", SocketType::Float, json!(1.0))
            .input("min", SocketType::Float, json!(0.0))
            .input("max", SocketType::Float, json!(1.0))
            .output("result", SocketType::Float))
    }

    fn emit(&self, node: &Node, args: &Args, ctx: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let (value, min, max) = (args.get("value")?, args.get("min")?, args.get("max")?);
        match enum_property(node, "clamp_type", "MINMAX")?.as_str() {
            "MINMAX" => Ok(vec![format!("clamp({value}, {min}, {max})")]),
            "RANGE" => {
                ctx.include(library::CLAMP_RANGE)?;
                Ok(vec![format!("tessel_clamp_range({value}, {min}, {max})")])
            }
            other => Err(invalid_property(node, "clamp_type", format!("unsupported clamp type {other}"))),
        }
    }
}

/// Linear remapping from one range to another.
struct MapRangeNode;

impl NodeKind for MapRangeNode {
    fn name(&self) -> &'static str {
        "map_range"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .input("value", SocketType::Float, json!(1.0))
            .input("from_min", SocketType::Float, json!(0.0))
            .input("from_max", SocketType::Float, json!(1.0))
            .input("to_min", SocketType::Float, json!(0.0))
            .input("to_max", SocketType::Float, json!(1.0))
            .output("result", SocketType::Float))
    }

    fn emit(&self, node: &Node, args: &Args, ctx: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        ctx.include(library::MAP_RANGE)?;
        let (to_min, to_max) = (args.get("to_min")?, args.get("to_max")?);
        let mapped = format!(
            "tessel_map_range({}, {}, {}, {to_min}, {to_max})",
            args.get("value")?,
            args.get("from_min")?,
            args.get("from_max")?,
        );
        if node.bool_property("clamp").unwrap_or(true) {
            ctx.include(library::CLAMP_RANGE)?;
            return Ok(vec![format!("tessel_clamp_range({mapped}, {to_min}, {to_max})")]);
        }
        Ok(vec![mapped])
    }
}

/// Builds a vector from three scalars.
struct CombineXyzNode;

impl NodeKind for CombineXyzNode {
    fn name(&self) -> &'static str {
        "combine_xyz"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .input("x", SocketType::Float, json!(0.0))
            .input("y", SocketType::Float, json!(0.0))
            .input("z", SocketType::Float, json!(0.0))
            .output("vector", SocketType::Vec3))
    }

    fn emit(&self, _: &Node, args: &Args, _: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        Ok(vec![format!(
            "vec3({}, {}, {})",
            args.get("x")?,
            args.get("y")?,
            args.get("z")?
        )])
    }
}

/// Splits a vector into its components.
struct SeparateXyzNode;

impl NodeKind for SeparateXyzNode {
    fn name(&self) -> &'static str {
        "separate_xyz"
    }

    fn signature(&self, _: &Node) -> Result<Signature, CompileError> {
        Ok(Signature::new()
            .input("vector", SocketType::Vec3, json!([0.0, 0.0, 0.0]))
            .output("x", SocketType::Float)
            .output("y", SocketType::Float)
            .output("z", SocketType::Float))
    }

    fn emit(&self, _: &Node, args: &Args, _: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        let vector = args.get("vector")?;
        Ok(vec![
            format!("{vector}.x"),
            format!("{vector}.y"),
            format!("{vector}.z"),
        ])
    }
}

/// Passes its input through; typed by its declared output.
struct RerouteNode;

impl RerouteNode {
    fn socket_type(node: &Node) -> SocketType {
        node.outputs()
            .find_map(|(_, ty)| ty)
            .unwrap_or(SocketType::Vec4)
    }
}

impl NodeKind for RerouteNode {
    fn name(&self) -> &'static str {
        "reroute"
    }

    fn signature(&self, node: &Node) -> Result<Signature, CompileError> {
        let ty = Self::socket_type(node);
        Ok(Signature::new()
            .input("input", ty, json!(0.0))
            .output(&single_output(node, "output"), ty))
    }

    fn emit(&self, _: &Node, args: &Args, _: &mut EmitContext<'_>) -> Result<Vec<String>, CompileError> {
        Ok(vec![args.get("input")?.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_replaces_every_operand() {
        assert_eq!(fill("$1 * $2 + $3", &["a", "b", "c"]), "a * b + c");
        assert_eq!(fill("$1 * $S", &["v", "x", "y", "s"]), "v * s");
        assert_eq!(fill("$2 != 0.0 ? $1 / $2 : 0.0", &["a", "b"]), "b != 0.0 ? a / b : 0.0");
    }

    #[test]
    fn test_every_vector_operation_fills_one_output() {
        for op in ["ADD", "CROSS_PRODUCT", "DOT_PRODUCT", "LENGTH", "SCALE"] {
            let (vector, value) = vector_math_template(op).unwrap();
            assert!(vector.is_some() != value.is_some(), "{op} should fill exactly one output");
        }
        assert!(vector_math_template("WAVE").is_none());
    }
}
