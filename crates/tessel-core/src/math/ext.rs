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

//! Extension traits adding swizzles and frame-rate independent damping to
//! the vector types.

use super::vector::{Vec2, Vec3};

/// Frame-rate independent interpolation of a scalar towards `target`.
///
/// `smoothing` is the fraction of the distance still left after one second,
/// so `0.0` snaps immediately and values close to `1.0` move slowly.
/// `delta_ms` is the frame time in milliseconds.
///
/// # Examples
///
/// ```
/// use tessel_core::math::damp;
/// assert_eq!(damp(0.0, 10.0, 0.5, 1000.0), 5.0);
/// ```
#[inline]
pub fn damp(source: f32, target: f32, smoothing: f32, delta_ms: f32) -> f32 {
    let t = 1.0 - smoothing.powf(delta_ms / 1000.0);
    source + (target - source) * t
}

/// Damped interpolation for vector values. See [`damp`].
pub trait Damp: Sized {
    /// Returns `self` moved towards `target` for a frame of `delta_ms`.
    fn damp(self, target: Self, smoothing: f32, delta_ms: f32) -> Self;
}

impl Damp for f32 {
    fn damp(self, target: Self, smoothing: f32, delta_ms: f32) -> Self {
        damp(self, target, smoothing, delta_ms)
    }
}

impl Damp for Vec2 {
    fn damp(self, target: Self, smoothing: f32, delta_ms: f32) -> Self {
        Vec2::new(
            damp(self.x, target.x, smoothing, delta_ms),
            damp(self.y, target.y, smoothing, delta_ms),
        )
    }
}

impl Damp for Vec3 {
    fn damp(self, target: Self, smoothing: f32, delta_ms: f32) -> Self {
        Vec3::new(
            damp(self.x, target.x, smoothing, delta_ms),
            damp(self.y, target.y, smoothing, delta_ms),
            damp(self.z, target.z, smoothing, delta_ms),
        )
    }
}

/// Planar projections of a 3D vector.
pub trait Swizzle3 {
    /// The `(x, y)` components.
    fn xy(&self) -> Vec2;
    /// The `(x, z)` components, i.e. the ground plane.
    fn xz(&self) -> Vec2;
}

impl Swizzle3 for Vec3 {
    #[inline]
    fn xy(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    fn xz(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }
}

/// Lifts a 2D vector back into 3D.
pub trait Swizzle2 {
    /// Places the vector on the ground plane: `(x, 0, y)`.
    fn x0y(&self) -> Vec3;
    /// Places the vector on the view plane: `(x, y, 0)`.
    fn xy0(&self) -> Vec3;
}

impl Swizzle2 for Vec2 {
    #[inline]
    fn x0y(&self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.y)
    }

    #[inline]
    fn xy0(&self) -> Vec3 {
        Vec3::new(self.x, self.y, 0.0)
    }
}
