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

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tessel_core::math::{Vec2, Vec3, Vec4};

/// The value stored in one component slot of an entity.
///
/// The set of variants is closed: scalar and vector data for numeric
/// components, shared text, raw JSON payloads (node trees, scene
/// descriptions) and opaque shared resources such as compiled materials.
///
/// Cloning is cheap for every variant; the heap-backed ones share their
/// allocation through an `Arc`.
#[derive(Clone, Default)]
pub enum ComponentValue {
    /// Present, but carrying no data. Used for tag components.
    #[default]
    Null,
    /// A boolean flag.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A 2D vector.
    Vec2(Vec2),
    /// A 3D vector.
    Vec3(Vec3),
    /// A 4D vector or RGBA color.
    Vec4(Vec4),
    /// Shared immutable text.
    Text(Arc<str>),
    /// A raw JSON document.
    Json(Arc<serde_json::Value>),
    /// An opaque resource owned by another subsystem.
    Shared(Arc<dyn Any + Send + Sync>),
}

impl ComponentValue {
    /// Wraps text into a component value.
    pub fn text(value: impl Into<Arc<str>>) -> Self {
        Self::Text(value.into())
    }

    /// Wraps a JSON document into a component value.
    pub fn json(value: serde_json::Value) -> Self {
        Self::Json(Arc::new(value))
    }

    /// Wraps any shared resource into a component value.
    pub fn shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self::Shared(value)
    }

    /// Reference identity, the notion of "changed" used for version bumps.
    ///
    /// Inline values compare by value. Heap-backed values compare by pointer,
    /// so re-registering the same `Arc` is not a change while registering an
    /// equal but freshly allocated document is.
    pub fn same_as(&self, other: &ComponentValue) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Vec2(a), Self::Vec2(b)) => a == b,
            (Self::Vec3(a), Self::Vec3(b)) => a == b,
            (Self::Vec4(a), Self::Vec4(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => Arc::ptr_eq(a, b),
            (Self::Json(a), Self::Json(b)) => Arc::ptr_eq(a, b),
            (Self::Shared(a), Self::Shared(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns true for [`ComponentValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the boolean value, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer value, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the 2D vector, if any.
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the 3D vector, if any.
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the 4D vector, if any.
    pub fn as_vec4(&self) -> Option<Vec4> {
        match self {
            Self::Vec4(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    /// Returns the JSON document, if any.
    pub fn as_json(&self) -> Option<&Arc<serde_json::Value>> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Downcasts a shared resource to its concrete type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Shared(v) => Arc::clone(v).downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for ComponentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Vec2(v) => f.debug_tuple("Vec2").field(v).finish(),
            Self::Vec3(v) => f.debug_tuple("Vec3").field(v).finish(),
            Self::Vec4(v) => f.debug_tuple("Vec4").field(v).finish(),
            Self::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Self::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Self::Shared(_) => f.write_str("Shared(..)"),
        }
    }
}

impl From<bool> for ComponentValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ComponentValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ComponentValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec2> for ComponentValue {
    fn from(value: Vec2) -> Self {
        Self::Vec2(value)
    }
}

impl From<Vec3> for ComponentValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Vec4> for ComponentValue {
    fn from(value: Vec4) -> Self {
        Self::Vec4(value)
    }
}

impl From<&str> for ComponentValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for ComponentValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<serde_json::Value> for ComponentValue {
    fn from(value: serde_json::Value) -> Self {
        Self::json(value)
    }
}
