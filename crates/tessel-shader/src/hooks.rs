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

//! Uniform values and the hooks that refresh them before each draw.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tessel_core::math::{Vec2, Vec3, Vec4};

/// Elapsed time in seconds.
pub const TIME: &str = "uTime";
/// Frame counter.
pub const FRAME: &str = "uFrame";
/// World-space camera position.
pub const CAMERA_POSITION: &str = "uCameraPosition";
/// World-space camera forward direction.
pub const CAMERA_DIRECTION: &str = "uCameraDirection";
/// World-space origin of the drawn object.
pub const OBJECT_LOCATION: &str = "uObjectLocation";

/// The value of one uniform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UniformValue {
    /// `float`
    Float(f32),
    /// `int`
    Int(i32),
    /// `bool`
    Bool(bool),
    /// `vec2`
    Vec2(Vec2),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `sampler2D`, holding the image path to bind.
    Texture(String),
}

impl UniformValue {
    /// The GLSL type of the uniform.
    pub fn glsl(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Int(_) => "int",
            UniformValue::Bool(_) => "bool",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Texture(_) => "sampler2D",
        }
    }
}

/// Per-frame facts the hooks read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInfo {
    /// Seconds since the engine started.
    pub time: f64,
    /// Frames rendered so far.
    pub frame: u64,
    /// World-space camera position.
    pub camera_position: Vec3,
    /// World-space camera forward direction.
    pub camera_direction: Vec3,
    /// World-space origin of the object being drawn.
    pub object_location: Vec3,
}

/// Current uniform values of one material, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformTable {
    values: IndexMap<String, UniformValue>,
}

impl UniformTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a uniform, declaring it if needed.
    pub fn set(&mut self, name: &str, value: UniformValue) {
        match self.values.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.values.insert(name.to_string(), value);
            }
        }
    }

    /// The current value of a uniform.
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    /// Number of uniforms.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the table holds no uniform.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the uniforms in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, UniformValue)> for UniformTable {
    fn from_iter<I: IntoIterator<Item = (String, UniformValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Work a compiled material needs before every draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeforeRenderHook {
    /// Refresh [`TIME`] and [`FRAME`].
    UpdateTime,
    /// Refresh [`CAMERA_POSITION`] and [`CAMERA_DIRECTION`].
    UpdateCamera,
    /// Refresh [`OBJECT_LOCATION`].
    UpdateObjectLocation,
}

impl BeforeRenderHook {
    /// Writes the uniforms this hook owns.
    pub fn apply(self, table: &mut UniformTable, frame: &FrameInfo) {
        match self {
            BeforeRenderHook::UpdateTime => {
                table.set(TIME, UniformValue::Float(frame.time as f32));
                table.set(FRAME, UniformValue::Float(frame.frame as f32));
            }
            BeforeRenderHook::UpdateCamera => {
                table.set(CAMERA_POSITION, UniformValue::Vec3(frame.camera_position));
                table.set(CAMERA_DIRECTION, UniformValue::Vec3(frame.camera_direction));
            }
            BeforeRenderHook::UpdateObjectLocation => {
                table.set(OBJECT_LOCATION, UniformValue::Vec3(frame.object_location));
            }
        }
    }
}
