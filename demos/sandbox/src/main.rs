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

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use tessel_core::math::{clamp, Damp, Swizzle2, Swizzle3};
use tessel_link::{run_link, Connection, Connector, LinkError};
use tessel_sdk::components::{CAMERA, DIRECTION, POSITION};
use tessel_sdk::logging::init_logging;
use tessel_sdk::prelude::*;

const FRAMES: u64 = 120;
const FRAME_MS: f64 = 16.0;

/// Stands in for the authoring tool: frames pushed into a channel come out
/// of the connection.
struct Loopback {
    frames: flume::Receiver<String>,
}

struct LoopbackConnection {
    frames: flume::Receiver<String>,
}

#[async_trait]
impl Connection for LoopbackConnection {
    async fn recv(&mut self) -> Option<Result<String, LinkError>> {
        self.frames.recv_async().await.ok().map(Ok)
    }

    async fn ping(&mut self) -> Result<(), LinkError> {
        Ok(())
    }
}

#[async_trait]
impl Connector for Loopback {
    type Connection = LoopbackConnection;

    async fn connect(&self, _url: &str) -> Result<LoopbackConnection, LinkError> {
        Ok(LoopbackConnection {
            frames: self.frames.clone(),
        })
    }
}

/// Logs what would be drawn.
struct LogBackend;

impl RenderBackend for LogBackend {
    fn render(&mut self, state: &StoreState, frame: &FrameInfo) -> Result<()> {
        if frame.frame % 60 == 0 {
            log::info!(
                "Frame {}: {} entities, camera at {:?}",
                frame.frame,
                state.len(),
                frame.camera_position
            );
        }
        Ok(())
    }
}

/// Orbits the camera around the origin, easing towards the orbit point.
fn orbit_camera(store: &mut Store, delta_ms: f64) -> Result<()> {
    let Some(camera) = store.singleton_holder(CAMERA).map(|e| e.id()) else {
        return Ok(());
    };
    let current = store
        .get_component(camera, POSITION)
        .and_then(ComponentValue::as_vec3)
        .unwrap_or_default();

    let angle = current.xz().y.atan2(current.xz().x) + 0.5 * (delta_ms as f32 / 1000.0);
    let ground = Vec2::new(angle.cos(), angle.sin()) * 6.0;
    let target = ground.x0y() + Vec3::new(0.0, clamp(current.y, 1.0, 4.0), 0.0);
    let next = current.damp(target, 0.2, delta_ms as f32);

    store.update_in_place(camera, POSITION, |value| *value = next.into())?;
    store.update_in_place(camera, DIRECTION, |value| *value = (-next).normalize().into())?;
    Ok(())
}

/// A pulsing noise material, as the authoring tool would send it.
fn sample_tree() -> String {
    json!({
        "type": "shaderTree",
        "name": "Pulse",
        "data": {
            "nodes": [
                { "id": "time", "type": "SCENE_TIME" },
                { "id": "wave", "type": "MATH", "properties": { "operation": "SINE" },
                  "inputs": { "Value": { "link": { "node": "time", "socket": "Seconds" } } } },
                { "id": "noise", "type": "TEX_NOISE", "inputs": { "Scale": 3.0 } },
                { "id": "tint", "type": "MIX", "properties": { "data_type": "RGBA", "blend_type": "MULTIPLY" },
                  "inputs": {
                      "Factor": { "link": { "node": "wave", "socket": "Value" } },
                      "A": { "link": { "node": "noise", "socket": "Color" } },
                      "B": [0.9, 0.4, 0.1, 1.0]
                  } },
                { "id": "out", "type": "OUTPUT_MATERIAL", "properties": { "is_active_output": true },
                  "inputs": { "Surface": { "link": { "node": "tint", "socket": "Result" } } } }
            ],
            "links": []
        }
    })
    .to_string()
}

fn main() -> Result<()> {
    let config = EngineConfig::load("Tessel.toml")?;
    let _ = init_logging(&config.log.filter);

    let mut engine = Engine::new(config.clone())?;
    engine.store_mut().quick_entity([
        (CAMERA, ComponentValue::Null),
        (POSITION, Vec3::new(6.0, 2.0, 0.0).into()),
        (DIRECTION, Vec3::new(-1.0, 0.0, 0.0).into()),
    ])?;
    engine.on_input(orbit_camera);
    engine.router().on(MessageKind::Export, |message| {
        log::info!("Export finished: {}", message.name());
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()?;
    let (tool, frames) = flume::unbounded();
    let link = if config.link.enabled {
        let link = runtime.spawn(run_link(
            Loopback { frames },
            engine.inbox().sender(),
            config.link.clone(),
        ));
        tool.send(sample_tree())?;
        tool.send("not a message".to_string())?;
        Some(link)
    } else {
        log::info!("Live link disabled. Applying the sample tree directly.");
        engine.inbox().push(LinkMessage::parse(&sample_tree())?);
        None
    };

    let mut backend = LogBackend;
    for _ in 0..FRAMES {
        let stats = engine.frame(FRAME_MS, &mut backend)?;
        if stats.messages > 0 {
            log::info!("Frame {}: applied {} link messages.", stats.frame, stats.messages);
        }
        std::thread::sleep(Duration::from_millis(FRAME_MS as u64));
    }

    match engine.material("Pulse") {
        Some(material) => {
            let uniforms = material.uniforms(&engine.frame_info());
            log::info!(
                "Material '{}' uses {} uniforms and {} includes.",
                material.name(),
                uniforms.len(),
                material.shader().cache().includes().len()
            );
            log::debug!("Fragment source:\n{}", material.sources().fragment);
        }
        None => log::warn!("Material 'Pulse' never arrived."),
    }

    drop(engine);
    drop(tool);
    if let Some(link) = link {
        if let Ok(report) = runtime.block_on(link) {
            log::info!("Live link report: {report:?}");
        }
    }
    Ok(())
}
