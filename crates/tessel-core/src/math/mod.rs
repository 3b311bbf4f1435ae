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

//! Small numeric vector types and helpers.
//!
//! The vector types are plain values; extra behaviour (swizzles, damping) is
//! layered on through the traits in [`ext`] rather than baked into the types.

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

pub mod ext;
pub mod vector;

pub use self::ext::{damp, Damp, Swizzle2, Swizzle3};
pub use self::vector::{Vec2, Vec3, Vec4};

/// Clamps a value to a specified minimum and maximum range.
///
/// # Examples
///
/// ```
/// use tessel_core::math::clamp;
/// assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
/// assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
/// ```
#[inline]
pub fn clamp<T: PartialOrd>(value: T, min_val: T, max_val: T) -> T {
    if value < min_val {
        min_val
    } else if value > max_val {
        max_val
    } else {
        value
    }
}
