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

//! Compiles material node trees held by entities.

use std::sync::Arc;

use serde_json::Value;
use tessel_core::ecs::EntityId;
use tessel_data::ecs::{
    ComponentId, ComponentValue, Entity, IndexKey, QueryId, QuerySpec, Store, StoreError, System,
};
use tessel_shader::ShaderCompiler;

use crate::components::{MATERIAL, MATERIAL_NAME, SHADER_TREE};
use crate::config::ShaderConfig;
use crate::material::CompiledMaterial;

/// The `+materialName,+shaderTree` query, keyed by material name, and the
/// system compiling its entities.
///
/// An entity is compiled when it enters the query and whenever its tree
/// changes; renaming it alone does not recompile. A successful compile
/// writes the `material` component. A failed one logs the error, removes
/// any stale material and leaves the tree in place, so the next edit is
/// compiled again.
#[derive(Debug, Clone, Copy)]
pub struct ShaderTrees {
    query: QueryId,
    tree: ComponentId,
    material: ComponentId,
}

impl ShaderTrees {
    /// Registers the query.
    pub fn new(store: &mut Store) -> Result<Self, StoreError> {
        let spec = QuerySpec::new()
            .include(MATERIAL_NAME)
            .include(SHADER_TREE)
            .keyed_by(MATERIAL_NAME);
        Ok(Self {
            query: store.create_query(&spec)?,
            tree: store.component_id(SHADER_TREE)?,
            material: store.component_id(MATERIAL)?,
        })
    }

    /// The live query.
    pub fn query(&self) -> QueryId {
        self.query
    }

    /// Builds the compiling system.
    pub fn system(
        &self,
        store: &mut Store,
        compiler: Arc<ShaderCompiler>,
        config: ShaderConfig,
    ) -> Result<System, StoreError> {
        let consumer = store.create_consumer(self.query)?;
        let this = *self;
        Ok(System::new("shader_trees", consumer)
            .new_or_updated(move |store, entity, changed, _| {
                if changed.is_some_and(|changed| !changed.contains(this.tree)) {
                    return Ok(());
                }
                this.compile(store, entity, &compiler, &config)
            })
            .removed(move |store, entity, _| {
                this.drop_material(store, entity.id())?;
                Ok(())
            }))
    }

    fn compile(
        &self,
        store: &mut Store,
        entity: &Entity,
        compiler: &ShaderCompiler,
        config: &ShaderConfig,
    ) -> anyhow::Result<()> {
        let name = store
            .get_component(entity.id(), MATERIAL_NAME)
            .and_then(ComponentValue::as_text)
            .unwrap_or_default()
            .to_string();
        let Some(current) = store.get(entity.id()).cloned() else {
            return Ok(());
        };
        let Some(tree) = current.get(self.tree).and_then(ComponentValue::as_json).cloned() else {
            self.drop_material(store, entity.id())?;
            anyhow::bail!("material '{name}' has no node tree document");
        };

        match CompiledMaterial::compile(compiler, &name, &tree, config) {
            Ok(material) => {
                log::info!("Material '{name}' compiled.");
                let updated = current.with(self.material, ComponentValue::shared(Arc::new(material)));
                store.register(updated)?;
                Ok(())
            }
            Err(e) => {
                self.drop_material(store, entity.id())?;
                Err(anyhow::Error::new(e).context(format!("material '{name}' failed to compile")))
            }
        }
    }

    fn drop_material(&self, store: &mut Store, id: EntityId) -> Result<(), StoreError> {
        let Some(entity) = store.get(id) else {
            return Ok(());
        };
        if entity.has(self.material) {
            let stripped = entity.without(self.material);
            store.register(stripped)?;
        }
        Ok(())
    }

    /// Stores a node tree received for material `name`.
    ///
    /// Every entity already carrying that name gets the new tree; if there
    /// is none, a new entity is created. The last tree received wins.
    pub fn apply(&self, store: &mut Store, name: &str, tree: Value) -> Result<Vec<EntityId>, StoreError> {
        let tree = ComponentValue::json(tree);
        let existing = store.lookup(self.query, &IndexKey::from(name))?;
        if existing.is_empty() {
            let id = store.quick_entity([
                (MATERIAL_NAME, ComponentValue::text(name)),
                (SHADER_TREE, tree),
            ])?;
            log::debug!("Material '{name}' created as entity {id}.");
            return Ok(vec![id]);
        }
        for id in &existing {
            if let Some(entity) = store.get(*id) {
                let updated = entity.with(self.tree, tree.clone());
                store.register(updated)?;
            }
        }
        log::debug!("Material '{name}' tree replaced on {} entities.", existing.len());
        Ok(existing)
    }

    /// The compiled material of the first entity named `name`.
    pub fn material(&self, store: &Store, name: &str) -> Option<Arc<CompiledMaterial>> {
        let ids = store.lookup(self.query, &IndexKey::from(name)).ok()?;
        ids.iter()
            .find_map(|id| store.get(*id)?.get(self.material)?.downcast::<CompiledMaterial>())
    }
}
