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

//! GLSL ES 3.00 program assembly.

use indexmap::{IndexMap, IndexSet};

use crate::cache::{CompilationCache, Requirements};
use crate::compiler::NodeCode;

/// Fragments with a lower coverage are discarded.
const ALPHA_CUTOFF: &str = "0.3";

/// Declarations shared by every program built from one compile.
pub(crate) struct Program<'a> {
    pub(crate) cache: &'a CompilationCache,
    /// Library sources by name, in include order.
    pub(crate) includes: &'a IndexMap<String, String>,
}

#[derive(Default)]
struct Source {
    text: String,
}

impl Source {
    fn line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    fn body(&mut self, line: impl AsRef<str>) {
        self.text.push_str("    ");
        self.line(line);
    }

    fn blank(&mut self) {
        if !self.text.ends_with("\n\n") {
            self.text.push('\n');
        }
    }

    fn finish(self) -> String {
        self.text
    }
}

fn requirements(nodes: &[&NodeCode]) -> Requirements {
    let mut merged = Requirements::default();
    for node in nodes {
        merged.merge(&node.requires);
    }
    merged
}

impl Program<'_> {
    fn header(&self, out: &mut Source, defines: &IndexSet<String>) {
        out.line("#version 300 es");
        out.line("precision highp float;");
        out.line("precision highp int;");
        let mut any = false;
        for define in self.cache.defines().iter().filter(|d| defines.contains(*d)) {
            if !any {
                out.blank();
                any = true;
            }
            out.line(format!("#define {define}"));
        }
        out.blank();
    }

    fn uniforms(&self, out: &mut Source, wanted: &IndexSet<String>) {
        for (name, value) in self.cache.uniforms().iter().filter(|(n, _)| wanted.contains(*n)) {
            out.line(format!("uniform {} {name};", value.glsl()));
        }
    }

    fn varyings(&self, out: &mut Source, qualifier: &str, wanted: &IndexSet<String>) {
        let mut any = false;
        for (name, varying) in self.cache.varyings().iter().filter(|(n, _)| wanted.contains(*n)) {
            any = true;
            out.line(format!("{qualifier} {} {name};", varying.ty.glsl()));
        }
        if any {
            out.blank();
        }
    }

    /// Library code in include order. Two names resolving to the same text
    /// are emitted once.
    fn includes(&self, out: &mut Source, wanted: &IndexSet<String>) {
        let mut seen: IndexSet<&str> = IndexSet::new();
        for (_, source) in self.includes.iter().filter(|(n, _)| wanted.contains(*n)) {
            if seen.insert(source.as_str()) {
                out.line(source);
                out.blank();
            }
        }
    }

    /// The vertex stage. Declares the varyings the fragment nodes read and
    /// applies `displacement` in object space.
    pub(crate) fn vertex(&self, nodes: &[&NodeCode], fragment: &[&NodeCode], displacement: Option<&str>) -> String {
        let own = requirements(nodes);
        let downstream = requirements(fragment);

        let mut defines = own.defines.clone();
        defines.extend(downstream.defines.iter().cloned());
        let mut attributes = own.attributes.clone();
        attributes.extend(downstream.attributes.iter().cloned());

        let mut out = Source::default();
        self.header(&mut out, &defines);

        out.line("in vec3 position;");
        out.line("in vec3 normal;");
        out.line("in vec2 uv;");
        for (name, ty) in self.cache.attributes().iter().filter(|(n, _)| attributes.contains(*n)) {
            out.line(format!("in {} {name};", ty.glsl()));
        }
        out.blank();

        out.line("uniform mat4 modelMatrix;");
        out.line("uniform mat4 viewMatrix;");
        out.line("uniform mat4 projectionMatrix;");
        self.uniforms(&mut out, &own.uniforms);
        out.blank();

        self.varyings(&mut out, "out", &downstream.varyings);
        self.includes(&mut out, &own.includes);

        out.line("void main() {");
        for statement in nodes.iter().flat_map(|n| &n.statements) {
            out.body(statement);
        }
        match displacement {
            Some(offset) => out.body(format!("vec3 displaced = position + {offset};")),
            None => out.body("vec3 displaced = position;"),
        }
        out.body("vec4 worldPosition = modelMatrix * vec4(displaced, 1.0);");
        for (name, varying) in self
            .cache
            .varyings()
            .iter()
            .filter(|(n, _)| downstream.varyings.contains(*n))
        {
            out.body(format!("{name} = {};", varying.source));
        }
        out.body("gl_Position = projectionMatrix * viewMatrix * worldPosition;");
        out.line("}");
        out.finish()
    }

    /// The fragment stage. `depth` replaces the color output with the
    /// fragment depth.
    pub(crate) fn fragment(&self, nodes: &[&NodeCode], color: Option<&str>, alpha: Option<&str>, depth: bool) -> String {
        let own = requirements(nodes);

        let mut out = Source::default();
        self.header(&mut out, &own.defines);

        if !own.uniforms.is_empty() {
            self.uniforms(&mut out, &own.uniforms);
            out.blank();
        }
        self.varyings(&mut out, "in", &own.varyings);
        out.line("out vec4 fragColor;");
        out.blank();
        self.includes(&mut out, &own.includes);

        out.line("void main() {");
        for statement in nodes.iter().flat_map(|n| &n.statements) {
            out.body(statement);
        }
        if let Some(alpha) = alpha {
            out.body(format!("float coverage = {alpha};"));
            out.body(format!("if (coverage < {ALPHA_CUTOFF}) discard;"));
        }
        if depth {
            out.body("fragColor = vec4(vec3(gl_FragCoord.z), 1.0);");
        } else {
            out.body(format!("fragColor = {};", color.unwrap_or("vec4(1.0)")));
            if alpha.is_some() {
                out.body("fragColor.a = coverage;");
            }
        }
        out.line("}");
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_library_text_is_emitted_once() {
        let cache = CompilationCache::default();
        let includes: IndexMap<String, String> = [
            ("a", "float one() { return 1.0; }"),
            ("b", "float one() { return 1.0; }"),
            ("c", "float two() { return 2.0; }"),
        ]
        .into_iter()
        .map(|(name, source)| (name.to_string(), source.to_string()))
        .collect();
        let program = Program {
            cache: &cache,
            includes: &includes,
        };
        let wanted: IndexSet<String> = ["a", "b", "c"].into_iter().map(String::from).collect();

        let mut out = Source::default();
        program.includes(&mut out, &wanted);
        let text = out.finish();

        assert_eq!(text.matches("float one()").count(), 1);
        assert_eq!(text.matches("float two()").count(), 1);
    }
}
