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

//! Plain `f32` vector value types used for numeric component data.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Index, Mul, Neg, Sub};

/// Implements the component-wise operators shared by every vector type.
macro_rules! impl_vector_ops {
    ($ty:ident, $len:literal, $($field:ident),+) => {
        impl $ty {
            /// Creates a new vector with the specified components.
            #[inline]
            pub const fn new($($field: f32),+) -> Self {
                Self { $($field),+ }
            }

            /// Creates a vector with every component set to `value`.
            #[inline]
            pub const fn splat(value: f32) -> Self {
                Self { $($field: value),+ }
            }

            /// Calculates the dot product of two vectors.
            #[inline]
            pub fn dot(&self, rhs: Self) -> f32 {
                0.0 $(+ self.$field * rhs.$field)+
            }

            /// Calculates the length (magnitude) of the vector.
            #[inline]
            pub fn length(&self) -> f32 {
                self.dot(*self).sqrt()
            }

            /// Returns a vector with the same direction and a length of 1.0.
            /// A vector shorter than [`EPSILON`](super::EPSILON) is returned unchanged.
            pub fn normalize(&self) -> Self {
                let len = self.length();
                if len > super::EPSILON {
                    *self * (1.0 / len)
                } else {
                    *self
                }
            }

            /// Performs a linear interpolation between two vectors.
            #[inline]
            pub fn lerp(start: Self, end: Self, t: f32) -> Self {
                start + (end - start) * t
            }

            /// Returns the components as an array.
            #[inline]
            pub fn to_array(self) -> [f32; $len] {
                [$(self.$field),+]
            }
        }

        impl From<[f32; $len]> for $ty {
            fn from(value: [f32; $len]) -> Self {
                let [$($field),+] = value;
                Self { $($field),+ }
            }
        }

        impl Add for $ty {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self { $($field: self.$field + rhs.$field),+ }
            }
        }

        impl Sub for $ty {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self { $($field: self.$field - rhs.$field),+ }
            }
        }

        impl Mul<f32> for $ty {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: f32) -> Self {
                Self { $($field: self.$field * rhs),+ }
            }
        }

        impl Neg for $ty {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                Self { $($field: -self.$field),+ }
            }
        }

        impl Index<usize> for $ty {
            type Output = f32;
            fn index(&self, index: usize) -> &f32 {
                let fields = [$(&self.$field),+];
                fields
                    .get(index)
                    .copied()
                    .unwrap_or_else(|| panic!("Index out of bounds for {}", stringify!($ty)))
            }
        }
    };
}

/// A 2-dimensional vector with `f32` components.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
)]
#[repr(C)]
pub struct Vec2 {
    /// The x component of the vector.
    pub x: f32,
    /// The y component of the vector.
    pub y: f32,
}

/// A 3-dimensional vector with `f32` components.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
)]
#[repr(C)]
pub struct Vec3 {
    /// The x component of the vector.
    pub x: f32,
    /// The y component of the vector.
    pub y: f32,
    /// The z component of the vector.
    pub z: f32,
}

/// A 4-dimensional vector with `f32` components, also used for RGBA colors.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
)]
#[repr(C)]
pub struct Vec4 {
    /// The x component of the vector.
    pub x: f32,
    /// The y component of the vector.
    pub y: f32,
    /// The z component of the vector.
    pub z: f32,
    /// The w component of the vector.
    pub w: f32,
}

impl_vector_ops!(Vec2, 2, x, y);
impl_vector_ops!(Vec3, 3, x, y, z);
impl_vector_ops!(Vec4, 4, x, y, z, w);

impl Vec2 {
    /// A vector with all components set to `0.0`.
    pub const ZERO: Self = Self::splat(0.0);
}

impl Vec3 {
    /// A vector with all components set to `0.0`.
    pub const ZERO: Self = Self::splat(0.0);
    /// The unit vector pointing along the positive Y-axis.
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Computes the cross product of two vectors.
    #[inline]
    pub fn cross(&self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }
}

impl Vec4 {
    /// A vector with all components set to `0.0`.
    pub const ZERO: Self = Self::splat(0.0);

    /// Creates a `Vec4` from a `Vec3` and a `w` component.
    #[inline]
    pub fn from_vec3(v: Vec3, w: f32) -> Self {
        Self::new(v.x, v.y, v.z, w)
    }

    /// Drops the `w` component.
    #[inline]
    pub fn truncate(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}
