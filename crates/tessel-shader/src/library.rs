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

//! The registry of named GLSL fragments node implementations can include.

use std::borrow::Cow;
use std::collections::HashMap;

use indexmap::IndexSet;

use crate::error::CompileError;

/// Hashing helpers.
pub const HASH: &str = "hash";
/// Value noise and fractal noise, built on [`HASH`].
pub const NOISE: &str = "noise";
/// Linear range remapping.
pub const MAP_RANGE: &str = "map_range";
/// Clamping between bounds given in any order.
pub const CLAMP_RANGE: &str = "clamp_range";
/// Color blend modes.
pub const BLEND: &str = "blend";

/// A named piece of GLSL source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFragment {
    /// The name nodes refer to it by.
    pub name: Cow<'static, str>,
    /// The source text.
    pub source: Cow<'static, str>,
    /// Fragments that must be emitted before this one.
    pub dependencies: Vec<Cow<'static, str>>,
}

impl LibraryFragment {
    /// Creates a fragment without dependencies.
    pub fn new(name: impl Into<Cow<'static, str>>, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            dependencies: Vec::new(),
        }
    }

    /// Declares a dependency.
    pub fn depends_on(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.dependencies.push(name.into());
        self
    }
}

/// A fixed mapping from include name to source.
#[derive(Debug, Clone, Default)]
pub struct LibraryRegistry {
    fragments: HashMap<Cow<'static, str>, LibraryFragment>,
}

impl LibraryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the fragments the built-in nodes use.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(LibraryFragment::new(HASH, HASH_GLSL));
        registry.register(LibraryFragment::new(NOISE, NOISE_GLSL).depends_on(HASH));
        registry.register(LibraryFragment::new(MAP_RANGE, MAP_RANGE_GLSL));
        registry.register(LibraryFragment::new(CLAMP_RANGE, CLAMP_RANGE_GLSL));
        registry.register(LibraryFragment::new(BLEND, BLEND_GLSL));
        registry
    }

    /// Adds or replaces a fragment.
    pub fn register(&mut self, fragment: LibraryFragment) {
        if self.fragments.contains_key(&fragment.name) {
            log::warn!("Library fragment '{}' replaced.", fragment.name);
        }
        self.fragments.insert(fragment.name.clone(), fragment);
    }

    /// Looks a fragment up by name.
    pub fn get(&self, name: &str) -> Option<&LibraryFragment> {
        self.fragments.get(name)
    }

    /// Appends `name` and, before it, everything it depends on, to
    /// `included`. Names already present are skipped.
    pub fn resolve_into(&self, name: &str, included: &mut IndexSet<String>) -> Result<(), CompileError> {
        let mut visiting = Vec::new();
        self.visit(name, included, &mut visiting)
    }

    fn visit(
        &self,
        name: &str,
        included: &mut IndexSet<String>,
        visiting: &mut Vec<String>,
    ) -> Result<(), CompileError> {
        if included.contains(name) || visiting.iter().any(|v| v == name) {
            return Ok(());
        }
        let fragment = self
            .get(name)
            .ok_or_else(|| CompileError::UnknownLibrary(name.to_string()))?;
        visiting.push(name.to_string());
        for dependency in &fragment.dependencies {
            self.visit(dependency, included, visiting)?;
        }
        visiting.pop();
        included.insert(name.to_string());
        Ok(())
    }
}

const HASH_GLSL: &str = r#"
float tessel_hash13(vec3 p3) {
    p3 = fract(p3 * 0.1031);
    p3 += dot(p3, p3.zyx + 31.32);
    return fract((p3.x + p3.y) * p3.z);
}

vec3 tessel_hash33(vec3 p3) {
    p3 = fract(p3 * vec3(0.1031, 0.1030, 0.0973));
    p3 += dot(p3, p3.yxz + 33.33);
    return fract((p3.xxy + p3.yxx) * p3.zyx);
}
"#;

const NOISE_GLSL: &str = r#"
float tessel_value_noise(vec3 p) {
    vec3 i = floor(p);
    vec3 f = fract(p);
    vec3 u = f * f * (3.0 - 2.0 * f);
    float n000 = tessel_hash13(i);
    float n100 = tessel_hash13(i + vec3(1.0, 0.0, 0.0));
    float n010 = tessel_hash13(i + vec3(0.0, 1.0, 0.0));
    float n110 = tessel_hash13(i + vec3(1.0, 1.0, 0.0));
    float n001 = tessel_hash13(i + vec3(0.0, 0.0, 1.0));
    float n101 = tessel_hash13(i + vec3(1.0, 0.0, 1.0));
    float n011 = tessel_hash13(i + vec3(0.0, 1.0, 1.0));
    float n111 = tessel_hash13(i + vec3(1.0, 1.0, 1.0));
    return mix(
        mix(mix(n000, n100, u.x), mix(n010, n110, u.x), u.y),
        mix(mix(n001, n101, u.x), mix(n011, n111, u.x), u.y),
        u.z);
}

float tessel_fbm(vec3 p, float detail, float roughness) {
    float value = 0.0;
    float amplitude = 1.0;
    float total = 0.0;
    int octaves = int(clamp(detail, 0.0, 15.0)) + 1;
    for (int i = 0; i < 16; i++) {
        if (i >= octaves) break;
        value += amplitude * tessel_value_noise(p);
        total += amplitude;
        amplitude *= clamp(roughness, 0.0, 1.0);
        p *= 2.0;
    }
    return value / max(total, 1e-5);
}
"#;

const MAP_RANGE_GLSL: &str = r#"
float tessel_map_range(float value, float fromMin, float fromMax, float toMin, float toMax) {
    if (fromMax == fromMin) return toMin;
    return toMin + (value - fromMin) * (toMax - toMin) / (fromMax - fromMin);
}
"#;

const CLAMP_RANGE_GLSL: &str = r#"
float tessel_clamp_range(float value, float a, float b) {
    return a > b ? clamp(value, b, a) : clamp(value, a, b);
}
"#;

const BLEND_GLSL: &str = r#"
vec4 tessel_blend_mix(float fac, vec4 a, vec4 b) { return vec4(mix(a.rgb, b.rgb, fac), a.a); }
vec4 tessel_blend_add(float fac, vec4 a, vec4 b) { return vec4(mix(a.rgb, a.rgb + b.rgb, fac), a.a); }
vec4 tessel_blend_subtract(float fac, vec4 a, vec4 b) { return vec4(mix(a.rgb, a.rgb - b.rgb, fac), a.a); }
vec4 tessel_blend_multiply(float fac, vec4 a, vec4 b) { return vec4(mix(a.rgb, a.rgb * b.rgb, fac), a.a); }
vec4 tessel_blend_screen(float fac, vec4 a, vec4 b) {
    return vec4(vec3(1.0) - (vec3(1.0 - fac) + fac * (vec3(1.0) - b.rgb)) * (vec3(1.0) - a.rgb), a.a);
}
vec4 tessel_blend_darken(float fac, vec4 a, vec4 b) { return vec4(mix(a.rgb, min(a.rgb, b.rgb), fac), a.a); }
vec4 tessel_blend_lighten(float fac, vec4 a, vec4 b) { return vec4(mix(a.rgb, max(a.rgb, b.rgb), fac), a.a); }
vec4 tessel_blend_difference(float fac, vec4 a, vec4 b) { return vec4(mix(a.rgb, abs(a.rgb - b.rgb), fac), a.a); }
"#;
