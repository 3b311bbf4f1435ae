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

//! End-to-end compiles of authored node trees.

use serde_json::{json, Value};
use tessel_shader::{
    BeforeRenderHook, CompileError, FrameInfo, NodeTree, OutputRoot, RootTarget, ShaderCompiler, SocketType,
    UniformValue,
};

fn tree(value: Value) -> NodeTree {
    NodeTree::from_json(&value).expect("tree should parse")
}

fn color_root(path: &str) -> Vec<OutputRoot> {
    vec![OutputRoot::parse(RootTarget::Color, path).expect("valid root path")]
}

#[test]
fn test_single_constant_compiles_to_one_variable() {
    // --- 1. SETUP ---
    let compiler = ShaderCompiler::default();
    let tree = tree(json!({
        "nodes": [{ "id": "a", "type": "value", "outputs": { "out": "float" } }],
        "links": []
    }));

    // --- 2. ACTION ---
    let shader = compiler.compile(&tree, &color_root("a.out")).unwrap();

    // --- 3. ASSERTIONS ---
    assert_eq!(shader.fragment().matches("float n_a_out =").count(), 1);
    assert!(shader.fragment().contains("fragColor = vec4(n_a_out);"));
    assert!(shader.cache().includes().is_empty());
    assert!(shader.cache().uniforms().is_empty());
    assert!(shader.cache().hooks().is_empty());
}

#[test]
fn test_shared_producer_is_evaluated_once() {
    // --- 1. SETUP ---
    let compiler = ShaderCompiler::default();
    let tree = tree(json!({
        "nodes": [
            { "id": "a", "type": "value", "properties": { "value": 2.0 } },
            { "id": "b", "type": "math", "properties": { "operation": "ADD" },
              "inputs": { "Value": { "link": { "node": "a", "socket": "Value" } }, "Value_001": 1.0 } },
            { "id": "c", "type": "math", "properties": { "operation": "MULTIPLY" },
              "inputs": { "Value": { "link": { "node": "a", "socket": "Value" } } } },
            { "id": "d", "type": "math", "properties": { "operation": "ADD" } }
        ],
        "links": [
            { "from": { "node": "b", "socket": "Value" }, "to": { "node": "d", "socket": "Value" } },
            { "from": { "node": "c", "socket": "Value" }, "to": { "node": "d", "socket": "Value_001" } }
        ]
    }));

    // --- 2. ACTION ---
    let shader = compiler.compile(&tree, &color_root("d.value")).unwrap();

    // --- 3. ASSERTIONS ---
    let fragment = shader.fragment();
    assert_eq!(fragment.matches("float n_a_value = 2.0;").count(), 1);
    assert_eq!(fragment.matches("n_a_value").count(), 3, "declared once, read by b and c");
    let a = fragment.find("float n_a_value").unwrap();
    let b = fragment.find("float n_b_value").unwrap();
    let c = fragment.find("float n_c_value").unwrap();
    let d = fragment.find("float n_d_value").unwrap();
    assert!(a < b && a < c && b < d && c < d);
}

#[test]
fn test_unreachable_nodes_are_not_emitted() {
    let compiler = ShaderCompiler::default();
    let tree = tree(json!({
        "nodes": [
            { "id": "used", "type": "value" },
            { "id": "unused", "type": "tex_noise" }
        ]
    }));

    let shader = compiler.compile(&tree, &color_root("used.value")).unwrap();

    assert!(!shader.fragment().contains("n_unused"));
    assert!(shader.cache().includes().is_empty());
}

#[test]
fn test_cycle_names_its_participants() {
    // --- 1. SETUP ---
    let compiler = ShaderCompiler::default();
    let tree = tree(json!({
        "nodes": [
            { "id": "x", "type": "math", "inputs": { "Value": { "link": { "node": "y", "socket": "Value" } } } },
            { "id": "y", "type": "math", "inputs": { "Value": { "link": { "node": "x", "socket": "Value" } } } },
            { "id": "out", "type": "value" }
        ]
    }));

    // --- 2. ACTION ---
    let result = compiler.compile(&tree, &color_root("out.value"));

    // --- 3. ASSERTIONS ---
    match result {
        Err(CompileError::Cycle { nodes }) => {
            assert!(nodes.contains(&"x".to_string()));
            assert!(nodes.contains(&"y".to_string()));
            assert!(!nodes.contains(&"out".to_string()));
        }
        other => panic!("expected a cycle error, got {other:?}"),
    }
}

#[test]
fn test_incompatible_link_is_a_type_mismatch() {
    let compiler = ShaderCompiler::default();
    let tree = tree(json!({
        "nodes": [
            { "id": "v", "type": "combine_xyz" },
            { "id": "flag", "type": "reroute", "outputs": { "Output": "bool" },
              "inputs": { "Input": { "link": { "node": "v", "socket": "Vector" } } } }
        ]
    }));

    let result = compiler.compile(&tree, &color_root("v.vector"));

    assert_eq!(
        result.unwrap_err(),
        CompileError::TypeMismatch {
            node: "flag".into(),
            socket: "input".into(),
            from: SocketType::Vec3,
            to: SocketType::Bool,
        }
    );
}

#[test]
fn test_declared_output_type_must_match_the_node() {
    // --- 1. SETUP ---
    let compiler = ShaderCompiler::default();
    let wrong = tree(json!({
        "nodes": [{ "id": "a", "type": "value", "outputs": { "out": "vec3" } }],
        "links": []
    }));
    let aliased = tree(json!({
        "nodes": [{ "id": "a", "type": "value", "outputs": { "out": "value" } }],
        "links": []
    }));

    // --- 2. ACTION ---
    let result = compiler.compile(&wrong, &color_root("a.out"));

    // --- 3. ASSERTIONS ---
    assert_eq!(
        result.unwrap_err(),
        CompileError::TypeMismatch {
            node: "a".into(),
            socket: "out".into(),
            from: SocketType::Float,
            to: SocketType::Vec3,
        },
        "A value node cannot be declared as producing a vector"
    );
    assert!(compiler.compile(&aliased, &color_root("a.out")).is_ok());
}

#[test]
fn test_structural_errors() {
    let compiler = ShaderCompiler::default();

    let unknown = tree(json!({ "nodes": [{ "id": "a", "type": "bsdf_hair" }] }));
    assert_eq!(
        compiler.compile(&unknown, &color_root("a.out")).unwrap_err(),
        CompileError::UnknownNodeType {
            node: "a".into(),
            kind: "bsdf_hair".into()
        }
    );

    let dangling = tree(json!({
        "nodes": [{ "id": "a", "type": "math" }],
        "links": [{ "from": { "node": "ghost", "socket": "Value" }, "to": { "node": "a", "socket": "Value" } }]
    }));
    assert!(matches!(
        compiler.compile(&dangling, &color_root("a.value")),
        Err(CompileError::DanglingLink { .. })
    ));

    let bad_socket = tree(json!({
        "nodes": [{ "id": "a", "type": "value" }, { "id": "b", "type": "math" }],
        "links": [{ "from": { "node": "a", "socket": "Value" }, "to": { "node": "b", "socket": "Nope" } }]
    }));
    assert_eq!(
        compiler.compile(&bad_socket, &color_root("b.value")).unwrap_err(),
        CompileError::UnknownSocket {
            node: "b".into(),
            socket: "nope".into()
        }
    );

    let doubled = tree(json!({
        "nodes": [{ "id": "a", "type": "value" }, { "id": "b", "type": "value" }, { "id": "c", "type": "math" }],
        "links": [
            { "from": { "node": "a", "socket": "Value" }, "to": { "node": "c", "socket": "Value" } },
            { "from": { "node": "b", "socket": "Value" }, "to": { "node": "c", "socket": "Value" } }
        ]
    }));
    assert!(matches!(
        compiler.compile(&doubled, &color_root("c.value")),
        Err(CompileError::DuplicateLink { .. })
    ));

    let single = tree(json!({ "nodes": [{ "id": "a", "type": "value" }] }));
    assert_eq!(
        compiler.compile(&single, &color_root("missing.value")).unwrap_err(),
        CompileError::UnknownNode("missing".into())
    );
    assert_eq!(
        compiler.compile(&single, &[]).unwrap_err(),
        CompileError::MissingRoot
    );
    let twice = vec![
        OutputRoot::parse(RootTarget::Color, "a.value").unwrap(),
        OutputRoot::parse(RootTarget::Color, "a.value").unwrap(),
    ];
    assert_eq!(
        compiler.compile(&single, &twice).unwrap_err(),
        CompileError::DuplicateRoot(RootTarget::Color)
    );
}

#[test]
fn test_bad_literal_is_a_malformed_node() {
    let compiler = ShaderCompiler::default();
    let tree = tree(json!({
        "nodes": [{ "id": "m", "type": "math", "inputs": { "Value": "lots" } }]
    }));

    assert!(matches!(
        compiler.compile(&tree, &color_root("m.value")),
        Err(CompileError::MalformedNode { node, .. }) if node == "m"
    ));
}

#[test]
fn test_shared_library_code_is_included_once() {
    // --- 1. SETUP ---
    let compiler = ShaderCompiler::default();
    let tree = tree(json!({
        "nodes": [
            { "id": "n1", "type": "tex_noise" },
            { "id": "n2", "type": "tex_noise", "inputs": { "Scale": 12.0 } },
            { "id": "grain", "type": "tex_white_noise" },
            { "id": "sum", "type": "math", "properties": { "operation": "ADD" },
              "inputs": {
                  "Value": { "link": { "node": "n1", "socket": "Fac" } },
                  "Value_001": { "link": { "node": "n2", "socket": "Fac" } }
              } },
            { "id": "out", "type": "math", "properties": { "operation": "MULTIPLY" },
              "inputs": {
                  "Value": { "link": { "node": "sum", "socket": "Value" } },
                  "Value_001": { "link": { "node": "grain", "socket": "Value" } }
              } }
        ]
    }));

    // --- 2. ACTION ---
    let shader = compiler.compile(&tree, &color_root("out.value")).unwrap();

    // --- 3. ASSERTIONS ---
    let fragment = shader.fragment();
    assert_eq!(fragment.matches("float tessel_hash13(vec3 p3)").count(), 1);
    assert_eq!(fragment.matches("float tessel_fbm(").count(), 1);
    let includes: Vec<&str> = shader.cache().includes().iter().map(String::as_str).collect();
    assert_eq!(includes, vec!["hash", "noise"]);
    assert!(fragment.find("tessel_hash13(vec3 p3)").unwrap() < fragment.find("tessel_fbm(").unwrap());
}

#[test]
fn test_material_output_roots_and_depth_variant() {
    // --- 1. SETUP ---
    let compiler = ShaderCompiler::default();
    let tree = json!({
        "nodes": {
            "base": { "type": "rgb", "properties": { "color": [0.2, 0.4, 0.6, 1.0] } },
            "mask": { "type": "tex_noise" },
            "lift": { "type": "combine_xyz", "inputs": { "Z": 0.25 } },
            "out": { "type": "output_material", "properties": { "is_active_output": true },
                     "inputs": {
                         "Surface": { "link": { "node": "base", "socket": "Color" } },
                         "Alpha": { "link": { "node": "mask", "socket": "Fac" } },
                         "Displacement": { "link": { "node": "lift", "socket": "Vector" } }
                     } }
        }
    });

    // --- 2. ACTION ---
    let shader = compiler.compile_json(&tree).unwrap();
    let depth = shader.depth_variant();

    // --- 3. ASSERTIONS ---
    assert!(shader.has_root(RootTarget::Color));
    assert!(shader.has_root(RootTarget::Alpha));
    assert!(shader.has_root(RootTarget::Displacement));

    assert!(shader.fragment().contains("n_base_color"));
    assert!(shader.fragment().contains("discard;"));
    assert!(shader.vertex().contains("vec3 displaced = position + n_lift_vector;"));
    assert!(!shader.fragment().contains("n_lift_vector"));
    assert!(shader.vertex().contains("out vec3 vPosition;"));

    assert!(!depth.fragment.contains("n_base_color"));
    assert!(depth.fragment.contains("n_mask_fac"));
    assert!(depth.fragment.contains("discard;"));
    assert!(depth.fragment.contains("gl_FragCoord.z"));
    assert!(depth.vertex.contains("position + n_lift_vector"));
}

#[test]
fn test_depth_variant_without_alpha_is_opaque() {
    let compiler = ShaderCompiler::default();
    let tree = tree(json!({
        "nodes": [{ "id": "tex", "type": "tex_image", "properties": { "image": "bricks.png" } }]
    }));

    let shader = compiler.compile(&tree, &color_root("tex.color")).unwrap();
    let depth = shader.depth_variant();

    assert!(shader.fragment().contains("uniform sampler2D tex_bricks_png;"));
    assert!(!depth.fragment.contains("discard"));
    assert!(!depth.fragment.contains("sampler2D"));
    assert!(!depth.vertex.contains("vUv"));
}

#[test]
fn test_images_share_a_sampler() {
    let compiler = ShaderCompiler::default();
    let tree = tree(json!({
        "nodes": [
            { "id": "t1", "type": "tex_image", "properties": { "image": "rock.png" } },
            { "id": "t2", "type": "tex_image", "properties": { "image": { "filepath": "rock.png" } } },
            { "id": "m", "type": "mix", "properties": { "data_type": "RGBA", "blend_type": "MULTIPLY" },
              "inputs": {
                  "A": { "link": { "node": "t1", "socket": "Color" } },
                  "B": { "link": { "node": "t2", "socket": "Color" } }
              } }
        ]
    }));

    let shader = compiler.compile(&tree, &color_root("m.result")).unwrap();

    assert_eq!(shader.cache().uniforms().len(), 1);
    assert_eq!(shader.fragment().matches("uniform sampler2D").count(), 1);
    assert!(shader.fragment().contains("tessel_blend_multiply("));
}

#[test]
fn test_time_node_registers_its_hook() {
    // --- 1. SETUP ---
    let compiler = ShaderCompiler::default();
    let tree = tree(json!({
        "nodes": [
            { "id": "clock", "type": "time" },
            { "id": "pulse", "type": "math", "properties": { "operation": "SINE" },
              "inputs": { "Value": { "link": { "node": "clock", "socket": "Seconds" } } } }
        ]
    }));
    let shader = compiler.compile(&tree, &color_root("pulse.value")).unwrap();

    // --- 2. ACTION ---
    let mut table = shader.cache().uniform_table();
    shader.cache().apply_hooks(
        &mut table,
        &FrameInfo {
            time: 1.5,
            frame: 90,
            ..FrameInfo::default()
        },
    );

    // --- 3. ASSERTIONS ---
    assert_eq!(shader.cache().hooks(), &[BeforeRenderHook::UpdateTime]);
    assert_eq!(table.get("uTime"), Some(&UniformValue::Float(1.5)));
    assert!(shader.fragment().contains("uniform float uTime;"));
    assert!(!shader.vertex().contains("uTime"));
}
