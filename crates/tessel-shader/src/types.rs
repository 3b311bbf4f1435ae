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

//! Socket value types and the implicit conversions between them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Padding used when a vector is widened: missing components become
/// `0.0`, except `w` which becomes `1.0`.
const PAD: [&str; 4] = ["0.0", "0.0", "0.0", "1.0"];
const ACCESSORS: [&str; 4] = ["x", "y", "z", "w"];

/// The value type carried by a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketType {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`, also used for colors and shader closures.
    Vec4,
}

impl SocketType {
    /// Parses an authored type name. Matching is case-insensitive and
    /// accepts the aliases used by common authoring tools.
    pub fn parse(name: &str) -> Option<SocketType> {
        match name.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Some(SocketType::Bool),
            "int" | "integer" => Some(SocketType::Int),
            "float" | "value" => Some(SocketType::Float),
            "vec2" | "vector2" => Some(SocketType::Vec2),
            "vec3" | "vector" | "vector3" => Some(SocketType::Vec3),
            "vec4" | "vector4" | "rgba" | "color" | "shader" => Some(SocketType::Vec4),
            _ => None,
        }
    }

    /// The GLSL spelling of the type.
    pub fn glsl(self) -> &'static str {
        match self {
            SocketType::Bool => "bool",
            SocketType::Int => "int",
            SocketType::Float => "float",
            SocketType::Vec2 => "vec2",
            SocketType::Vec3 => "vec3",
            SocketType::Vec4 => "vec4",
        }
    }

    /// Number of float components, or `None` for non-vector types.
    pub fn width(self) -> Option<usize> {
        match self {
            SocketType::Vec2 => Some(2),
            SocketType::Vec3 => Some(3),
            SocketType::Vec4 => Some(4),
            _ => None,
        }
    }

    /// Converts the GLSL expression `expr` of this type into `to`.
    ///
    /// Allowed conversions: `int`/`bool` to `float`, `bool` to `int`,
    /// scalars broadcast to any vector, vectors padded or swizzled to
    /// another width, and vectors averaged down to a `float`. Anything else
    /// is a mismatch and yields `None`.
    pub fn convert(self, expr: &str, to: SocketType) -> Option<String> {
        use SocketType::*;
        if self == to {
            return Some(expr.to_string());
        }
        match (self, to) {
            (Int, Float) => Some(format!("float({expr})")),
            (Bool, Float) => Some(format!("({expr} ? 1.0 : 0.0)")),
            (Bool, Int) => Some(format!("({expr} ? 1 : 0)")),
            (Float, Vec2 | Vec3 | Vec4) => Some(format!("{}({expr})", to.glsl())),
            (Int | Bool, Vec2 | Vec3 | Vec4) => {
                let scalar = self.convert(expr, Float)?;
                Float.convert(&scalar, to)
            }
            (Vec2 | Vec3 | Vec4, Float) => {
                let n = self.width()?.min(3);
                let sum = ACCESSORS[..n]
                    .iter()
                    .map(|c| format!("{expr}.{c}"))
                    .collect::<Vec<_>>()
                    .join(" + ");
                Some(format!("(({sum}) / {n}.0)"))
            }
            (Vec2 | Vec3 | Vec4, Vec2 | Vec3 | Vec4) => {
                let (from_n, to_n) = (self.width()?, to.width()?);
                if to_n < from_n {
                    Some(format!("{expr}.{}", ACCESSORS[..to_n].concat()))
                } else {
                    let pad = PAD[from_n..to_n].join(", ");
                    Some(format!("{}({expr}, {pad})", to.glsl()))
                }
            }
            _ => None,
        }
    }

    /// Formats an authored literal as a GLSL constant of this type.
    ///
    /// Numbers broadcast to vectors; arrays shorter than the vector are
    /// padded like a conversion would, longer ones are truncated.
    pub fn literal(self, value: &Value) -> Option<String> {
        match (self, value) {
            (SocketType::Bool, Value::Bool(b)) => Some(b.to_string()),
            (SocketType::Bool, Value::Number(n)) => Some((n.as_f64()? != 0.0).to_string()),
            (SocketType::Int, Value::Number(n)) => Some(format!("{}", n.as_f64()?.round() as i64)),
            (SocketType::Int, Value::Bool(b)) => Some(if *b { "1" } else { "0" }.to_string()),
            (SocketType::Float, Value::Number(n)) => Some(float(n.as_f64()?)),
            (SocketType::Float, Value::Bool(b)) => Some(if *b { "1.0" } else { "0.0" }.to_string()),
            (ty, Value::Number(n)) => {
                ty.width()?;
                Some(format!("{}({})", ty.glsl(), float(n.as_f64()?)))
            }
            (ty, Value::Array(items)) => {
                let n = ty.width()?;
                let mut parts = Vec::with_capacity(n);
                for i in 0..n {
                    match items.get(i) {
                        Some(item) => parts.push(float(item.as_f64()?)),
                        None => parts.push(PAD[i].to_string()),
                    }
                }
                Some(format!("{}({})", ty.glsl(), parts.join(", ")))
            }
            _ => None,
        }
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl())
    }
}

/// Formats `value` as a GLSL float constant (always with a decimal point
/// or an exponent).
pub fn float(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let text = format!("{value:?}");
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}
