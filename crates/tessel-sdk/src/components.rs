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

//! The standard component schema.

use tessel_core::math::Vec3;
use tessel_data::ecs::{ComponentSchema, ComponentSchemaBuilder, ComponentValue, SchemaError};

/// What an entity is, e.g. `"lamp"`. Seeded on every new entity.
pub const TYPE: &str = "type";
/// Geometry name.
pub const MESH: &str = "mesh";
/// Raw material node tree (JSON).
pub const SHADER_TREE: &str = "shaderTree";
/// Stable material name; replaces trees by name.
pub const MATERIAL_NAME: &str = "materialName";
/// The compiled material, written by the shader-tree system.
pub const MATERIAL: &str = "material";
/// Raw logic node tree (JSON).
pub const LOGIC_TREE: &str = "logicTree";
/// World-space position.
pub const POSITION: &str = "position";
/// World-space velocity.
pub const VELOCITY: &str = "velocity";
/// Forward direction.
pub const DIRECTION: &str = "direction";
/// The entity that owns this one.
pub const OWNER_ID: &str = "ownerId";
/// Tags the active camera. Held by at most one entity.
pub const CAMERA: &str = "camera";

/// The engine's components, open for extension.
pub fn schema_builder() -> ComponentSchemaBuilder {
    ComponentSchema::builder()
        .seeded(TYPE, "")
        .component(MESH, "")
        .component(SHADER_TREE, ComponentValue::Null)
        .component(MATERIAL_NAME, "")
        .component(MATERIAL, ComponentValue::Null)
        .component(LOGIC_TREE, ComponentValue::Null)
        .component(POSITION, Vec3::ZERO)
        .component(VELOCITY, Vec3::ZERO)
        .component(DIRECTION, Vec3::new(0.0, 0.0, -1.0))
        .component(OWNER_ID, "")
        .singleton(CAMERA, ComponentValue::Null)
}

/// The engine's components.
pub fn standard_schema() -> Result<ComponentSchema, SchemaError> {
    schema_builder().build()
}
