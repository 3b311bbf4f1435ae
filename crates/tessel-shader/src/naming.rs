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

//! Generation of GLSL identifiers from authored names.

use std::collections::HashSet;

/// Keywords and reserved words of GLSL ES 3.00 that could otherwise be
/// produced from an authored name.
const RESERVED: &[&str] = &[
    "attribute", "bool", "break", "bvec2", "bvec3", "bvec4", "case", "centroid", "const",
    "continue", "default", "discard", "do", "else", "false", "flat", "float", "for", "highp",
    "if", "in", "inout", "int", "invariant", "isampler2D", "ivec2", "ivec3", "ivec4", "layout",
    "lowp", "mat2", "mat3", "mat4", "mediump", "out", "precision", "return", "sampler2D",
    "sampler3D", "samplerCube", "smooth", "struct", "switch", "true", "uint", "uniform",
    "uvec2", "uvec3", "uvec4", "varying", "vec2", "vec3", "vec4", "void", "while", "asm",
    "class", "union", "enum", "typedef", "template", "this", "goto", "inline", "noinline",
    "volatile", "public", "static", "extern", "external", "interface", "long", "short",
    "double", "half", "fixed", "unsigned", "input", "output", "sizeof", "cast", "namespace",
    "using", "main",
];

/// Returns true if `name` cannot be used as a GLSL identifier.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with("gl_") || name.contains("__") || RESERVED.contains(&name)
}

/// Reduces an authored name to identifier characters.
///
/// Anything outside `[A-Za-z0-9_]` becomes `_`, runs of underscores
/// collapse, and leading or trailing underscores are dropped.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '_' };
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Normalizes a socket name: lower case, separators folded to `_`.
pub fn socket_key(name: &str) -> String {
    sanitize(name).to_ascii_lowercase()
}

/// Hands out unique identifiers within one compile.
#[derive(Debug, Default, Clone)]
pub struct NameAllocator {
    used: HashSet<String>,
}

impl NameAllocator {
    /// Creates an allocator with no names taken.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an identifier from `parts` and makes it unique.
    ///
    /// Parts are sanitized and joined with `_`; a numeric suffix is added if
    /// the result is taken or reserved.
    pub fn allocate(&mut self, parts: &[&str]) -> String {
        let base = parts
            .iter()
            .map(|p| sanitize(p))
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        let base = match base.chars().next() {
            Some(c) if !c.is_ascii_digit() && !base.starts_with("gl_") => base,
            _ => format!("v_{base}"),
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while is_reserved(&candidate) || self.used.contains(&candidate) {
            suffix += 1;
            candidate = format!("{base}_{suffix}");
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_folds_separators() {
        assert_eq!(sanitize("Math.001"), "Math_001");
        assert_eq!(sanitize("__a--b__"), "a_b");
        assert_eq!(socket_key("Emission Strength"), "emission_strength");
    }

    #[test]
    fn test_allocate_avoids_collisions_and_reserved_words() {
        let mut names = NameAllocator::new();
        assert_eq!(names.allocate(&["n", "a", "out"]), "n_a_out");
        assert_eq!(names.allocate(&["n", "a", "out"]), "n_a_out_2");
        assert_eq!(names.allocate(&["n", "a-b"]), "n_a_b");
        assert_eq!(names.allocate(&["n", "a_b"]), "n_a_b_2");
        assert_eq!(names.allocate(&["float"]), "float_2");
        assert_eq!(names.allocate(&["gl", "Position"]), "v_gl_Position");
        assert_eq!(names.allocate(&["1st"]), "v_1st");
    }

    #[test]
    fn test_reserved_identifiers() {
        assert!(is_reserved("gl_FragColor"));
        assert!(is_reserved("a__b"));
        assert!(is_reserved("uniform"));
        assert!(!is_reserved("n_uniform"));
    }
}
