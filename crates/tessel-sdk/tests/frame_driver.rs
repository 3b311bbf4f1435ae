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

//! Frame driver behaviour: link messages, material compiles, rendering.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::{json, Value};
use tessel_link::gate;
use tessel_sdk::components::{CAMERA, MATERIAL_NAME, POSITION};
use tessel_sdk::prelude::*;

#[derive(Default)]
struct Recorder {
    frames: Vec<(usize, FrameInfo)>,
}

impl RenderBackend for Recorder {
    fn render(&mut self, state: &StoreState, frame: &FrameInfo) -> anyhow::Result<()> {
        self.frames.push((state.len(), *frame));
        Ok(())
    }
}

fn red_material() -> Value {
    json!({
        "nodes": [
            { "id": "color", "type": "RGB", "properties": { "color": [1.0, 0.0, 0.0, 1.0] } },
            { "id": "out", "type": "OUTPUT_MATERIAL",
              "inputs": { "Surface": { "link": { "node": "color", "socket": "Color" } } } }
        ]
    })
}

fn broken_material() -> Value {
    json!({
        "nodes": [
            { "id": "a", "type": "math", "inputs": { "Value": { "link": { "node": "b", "socket": "Value" } } } },
            { "id": "b", "type": "math", "inputs": { "Value": { "link": { "node": "a", "socket": "Value" } } } },
            { "id": "out", "type": "output_material",
              "inputs": { "Surface": { "link": { "node": "a", "socket": "Value" } } } }
        ]
    })
}

fn shader_tree(name: &str, data: Value) -> LinkMessage {
    LinkMessage::ShaderTree {
        name: name.to_string(),
        data,
    }
}

#[test]
fn test_received_tree_is_compiled_in_the_same_frame() {
    // --- 1. SETUP ---
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let mut backend = Recorder::default();
    engine.inbox().push(shader_tree("Brick", red_material()));

    // --- 2. ACTION ---
    let stats = engine.frame(16.0, &mut backend).unwrap();

    // --- 3. ASSERTIONS ---
    assert_eq!(stats.messages, 1);
    assert_eq!(stats.tick.failures, 0);
    let material = engine.material("Brick").expect("material should be compiled");
    assert_eq!(material.name(), "Brick");
    assert!(material.sources().fragment.contains("fragColor"));
    assert!(material.depth().is_some(), "Depth variant is on by default");
    assert_eq!(backend.frames.len(), 1);
    assert_eq!(backend.frames[0].0, 1, "The renderer sees the material entity");
}

#[test]
fn test_failed_compile_keeps_the_tree_and_recovers() {
    // --- 1. SETUP ---
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let mut backend = Recorder::default();
    engine.inbox().push(shader_tree("Brick", red_material()));
    engine.frame(16.0, &mut backend).unwrap();

    // --- 2. ACTION ---
    engine.inbox().push(shader_tree("Brick", broken_material()));
    let failed = engine.frame(16.0, &mut backend).unwrap();
    let without_material = engine.material("Brick");

    engine.inbox().push(shader_tree("Brick", red_material()));
    let recovered = engine.frame(16.0, &mut backend).unwrap();

    // --- 3. ASSERTIONS ---
    assert_eq!(failed.tick.failures, 1);
    assert!(without_material.is_none(), "A stale material is not kept");
    assert_eq!(recovered.tick.failures, 0);
    assert!(engine.material("Brick").is_some());
    assert_eq!(engine.store().state().len(), 1, "Trees are replaced by name");
}

#[test]
fn test_renaming_does_not_recompile() {
    // --- 1. SETUP ---
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let mut backend = Recorder::default();
    engine.inbox().push(shader_tree("Brick", red_material()));
    engine.frame(16.0, &mut backend).unwrap();
    let before = engine.material("Brick").unwrap();

    // --- 2. ACTION ---
    let store = engine.store_mut();
    let id = store.state().entities().next().unwrap().id();
    let entity = store.get(id).unwrap().clone();
    let renamed = store.add_component(&entity, MATERIAL_NAME, ComponentValue::text("Stone"));
    store.register(renamed).unwrap();
    engine.frame(16.0, &mut backend).unwrap();

    // --- 3. ASSERTIONS ---
    let after = engine.material("Stone").expect("material follows the entity");
    assert!(Arc::ptr_eq(&before, &after));
    assert!(engine.material("Brick").is_none());
}

#[test]
fn test_gate_defers_trees_to_a_later_frame() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let mut backend = Recorder::default();
    let (handle, assets) = gate("assets");
    engine.inbox().hold_until(assets);
    engine.inbox().push(shader_tree("Brick", red_material()));

    let held = engine.frame(16.0, &mut backend).unwrap();
    assert_eq!(held.messages, 0);
    assert!(engine.material("Brick").is_none());

    handle.open();
    let released = engine.frame(16.0, &mut backend).unwrap();
    assert_eq!(released.messages, 1);
    assert!(engine.material("Brick").is_some());
}

#[test]
fn test_frame_order_and_listeners() {
    // --- 1. SETUP ---
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let mut backend = Recorder::default();
    let inputs = Rc::new(Cell::new(0));
    let changes = Rc::new(Cell::new(0));

    let counter = Rc::clone(&inputs);
    engine.on_input(move |_, _| {
        counter.set(counter.get() + 1);
        Ok(())
    });
    let counter = Rc::clone(&changes);
    engine
        .router()
        .on(MessageKind::SceneChange, move |_| counter.set(counter.get() + 1));

    let camera = {
        let store = engine.store_mut();
        store
            .quick_entity([(CAMERA, ComponentValue::Null), (POSITION, Vec3::new(0.0, 2.0, 5.0).into())])
            .unwrap()
    };

    // --- 2. ACTION ---
    engine.inbox().push(LinkMessage::SceneChange {
        name: "level".into(),
        data: json!({}),
    });
    let first = engine.frame(500.0, &mut backend).unwrap();
    let second = engine.frame(500.0, &mut backend).unwrap();

    // --- 3. ASSERTIONS ---
    assert_eq!((first.frame, second.frame), (0, 1));
    assert_eq!(inputs.get(), 2);
    assert_eq!(changes.get(), 1);
    let (_, info) = backend.frames[1];
    assert_eq!(info.frame, 1);
    assert_eq!(info.time, 1.0);
    assert_eq!(info.camera_position, Vec3::new(0.0, 2.0, 5.0));
    assert!(engine.store().get(camera).is_some());
}
