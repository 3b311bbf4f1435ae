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

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tessel_core::ecs::EntityId;
use tessel_core::math::Vec3;

use super::*;

// --- TEST SCHEMA ---

fn schema() -> ComponentSchema {
    ComponentSchema::builder()
        .component("type", "")
        .component("mesh", ComponentValue::Null)
        .component("position", Vec3::ZERO)
        .component("velocity", Vec3::ZERO)
        .component("materialName", "")
        .singleton("camera", ComponentValue::Null)
        .build()
        .expect("Test schema should be valid")
}

fn cid(store: &Store, name: &str) -> ComponentId {
    store.component_id(name).expect("Component should exist")
}

/// Checks that every component index equals the set of entities holding it.
fn assert_index_invariant(state: &StoreState) {
    for (component, def) in state.schema().iter() {
        let mut expected: Vec<EntityId> = state
            .entities()
            .filter(|e| e.has(component))
            .map(|e| e.id())
            .collect();
        let mut actual: Vec<EntityId> = state.index(component).iter().copied().collect();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected, "Index of '{}' is out of sync", def.name);
    }
}

// --- STORE ---

#[test]
fn test_register_updates_component_indices() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let entity = store.create_entity(None);
    let entity = store.add_component(&entity, "type", "lamp");

    // --- 2. ACTION ---
    store.register(entity.clone()).unwrap();
    let with_mesh = store.add_component(&entity, "mesh", ComponentValue::Null);
    store.register(with_mesh.clone()).unwrap();
    let without_type = store.remove_component(&with_mesh, "type");
    store.register(without_type).unwrap();

    // --- 3. ASSERTIONS ---
    let state = store.state();
    assert_index_invariant(state);
    assert!(state.index(cid(&store, "mesh")).contains(&entity.id()));
    assert!(
        !state.index(cid(&store, "type")).contains(&entity.id()),
        "Removed component must leave its index"
    );
}

#[test]
fn test_versions_follow_value_identity() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let id = store
        .quick_entity([
            ("type", ComponentValue::from("lamp")),
            ("position", ComponentValue::from(Vec3::ZERO)),
        ])
        .unwrap();
    let type_id = cid(&store, "type");
    let position_id = cid(&store, "position");
    let v_type = store.state().component_version(id, type_id).unwrap();

    // --- 2. ACTION ---
    let entity = Entity::clone(store.get(id).unwrap());
    let moved = entity.with(position_id, Vec3::new(1.0, 0.0, 0.0).into());
    let commit = store.register(moved).unwrap();

    // --- 3. ASSERTIONS ---
    assert_eq!(commit.changed.iter().collect::<Vec<_>>(), vec![position_id]);
    assert_eq!(
        store.state().component_version(id, type_id),
        Some(v_type),
        "Untouched components keep their version"
    );
    assert!(store.state().component_version(id, position_id).unwrap() > v_type);

    // Re-registering the same value is a no-op.
    let version = store.state().version();
    let same = Entity::clone(store.get(id).unwrap());
    assert!(store.register(same).unwrap().is_noop());
    assert_eq!(store.state().version(), version);
}

#[test]
fn test_deregister_clears_every_index() {
    let mut store = Store::new(schema());
    let id = store
        .quick_entity([("type", ComponentValue::from("crate")), ("mesh", ComponentValue::Null)])
        .unwrap();

    let last = store.deregister(id).expect("Entity was registered");

    assert!(last.has(cid(&store, "mesh")), "Last value is returned intact");
    assert!(store.get(id).is_none());
    assert!(store.state().is_empty());
    assert_index_invariant(store.state());
    assert!(store.deregister(id).is_none(), "Second deregister is a no-op");
}

#[test]
fn test_functional_state_api_keeps_prior_snapshots() {
    // --- 1. SETUP ---
    let schema = Arc::new(schema());
    let type_id = schema.id("type").unwrap();
    let entity = schema.create_entity(None).with(type_id, "lamp".into());
    let empty = StoreState::new(Arc::clone(&schema));

    // --- 2. ACTION ---
    let one = empty.clone().register_entity(entity.clone()).unwrap();
    let two = one.clone().deregister_entity(entity.id());

    // --- 3. ASSERTIONS ---
    assert!(empty.is_empty());
    assert!(one.get_entity(entity.id()).is_some());
    assert!(two.get_entity(entity.id()).is_none());
    assert!(one.version() < two.version());
    for state in [&empty, &one, &two] {
        assert_index_invariant(state);
    }
}

#[test]
fn test_store_history_is_bounded() {
    let mut store = Store::with_history(schema(), 2);
    let first = store.snapshot();

    for i in 0..4 {
        store.quick_entity([("type", ComponentValue::from(format!("t{i}")))]).unwrap();
    }

    assert_eq!(store.history().count(), 2, "Only the newest snapshots are kept");
    assert!(first.is_empty(), "A held snapshot never changes");
    let oldest = store.history().next().unwrap();
    assert_eq!(oldest.len(), 2);
    assert_eq!(store.state().len(), 4);
}

#[test]
fn test_register_rejects_ids_from_a_wider_schema() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let wider = ComponentSchema::builder()
        .component("type", "")
        .component("mesh", ComponentValue::Null)
        .component("position", Vec3::ZERO)
        .component("velocity", Vec3::ZERO)
        .component("materialName", "")
        .singleton("camera", ComponentValue::Null)
        .component("health", 100.0)
        .build()
        .unwrap();
    let health = wider.id("health").unwrap();
    let entity = store.create_entity(None).with(health, ComponentValue::from(50.0));
    let id = entity.id();

    // --- 2. ACTION ---
    let result = store.register(entity);

    // --- 3. ASSERTIONS ---
    assert_eq!(
        result.unwrap_err(),
        StoreError::ForeignComponent {
            entity: id,
            component: health,
        }
    );
    assert!(store.get(id).is_none(), "A rejected entity is not stored");
    assert_index_invariant(store.state());
}

#[test]
fn test_singleton_component_is_exclusive() {
    let mut store = Store::new(schema());
    let holder = store.quick_entity([("camera", ComponentValue::Null)]).unwrap();

    let second = store.quick_entity([("camera", ComponentValue::Null)]);

    assert_eq!(
        second,
        Err(StoreError::SingletonViolation {
            component: "camera".to_string(),
            holder,
        })
    );
    assert_eq!(store.singleton_holder("camera").map(|e| e.id()), Some(holder));
    assert_eq!(store.state().len(), 1, "The failed registration left no trace");
}

#[test]
fn test_singleton_entity_has_well_known_id() {
    let mut store = Store::new(schema());
    let singleton = store.singleton_entity();
    assert_eq!(singleton.id(), EntityId::singleton());

    let singleton = store.add_component(&singleton, "type", "globals");
    store.register(singleton).unwrap();

    let again = store.singleton_entity();
    assert_eq!(
        again.get(cid(&store, "type")).and_then(|v| v.as_text()),
        Some("globals")
    );
}

#[test]
fn test_quick_entity_rejects_unknown_components() {
    let mut store = Store::new(schema());
    let result = store.quick_entity([("nope", ComponentValue::Null)]);
    assert_eq!(result, Err(StoreError::UnknownComponent("nope".to_string())));
}

#[test]
fn test_update_in_place_records_previous_value() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let id = store.quick_entity([("position", ComponentValue::from(Vec3::ZERO))]).unwrap();
    let position = cid(&store, "position");
    let before = store.state().component_version(id, position).unwrap();

    // --- 2. ACTION ---
    store
        .update_in_place(id, "position", |value| {
            if let ComponentValue::Vec3(v) = value {
                v.y += 2.0;
            }
        })
        .unwrap();

    // --- 3. ASSERTIONS ---
    assert_eq!(
        store.get_component(id, "position").and_then(|v| v.as_vec3()),
        Some(Vec3::new(0.0, 2.0, 0.0))
    );
    assert_eq!(
        store.previous_component(id, "position").and_then(|v| v.as_vec3()),
        Some(Vec3::ZERO)
    );
    assert!(store.state().component_version(id, position).unwrap() > before);

    // Flagging bumps the version without touching the value.
    let flagged_from = store.state().component_version(id, position).unwrap();
    store.flag_update(id, "position").unwrap();
    assert!(store.state().component_version(id, position).unwrap() > flagged_from);
    assert!(matches!(
        store.flag_update(id, "velocity"),
        Err(StoreError::MissingComponent { .. })
    ));
}

// --- QUERIES ---

#[test]
fn test_query_validation() {
    let schema = schema();
    let overlap = QuerySpec::new().include("type").exclude("type").resolve(&schema);
    assert_eq!(overlap, Err(QueryError::Overlap("type".to_string())));

    let unknown = QuerySpec::new().include("colour").resolve(&schema);
    assert_eq!(unknown, Err(QueryError::UnknownComponent("colour".to_string())));

    let query = QuerySpec::new()
        .include("type")
        .exclude("mesh")
        .resolve(&schema)
        .unwrap();
    assert_eq!(query.name(), "+type,-mesh");
}

#[test]
fn test_live_query_matches_set_computation() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let spec = QuerySpec::new().include("type").exclude("mesh");
    let qid = store.create_query(&spec).unwrap();
    let query = spec.resolve(store.schema()).unwrap();

    // --- 2. ACTION ---
    let lamp = store.quick_entity([("type", ComponentValue::from("lamp"))]).unwrap();
    let wall = store
        .quick_entity([("type", ComponentValue::from("wall")), ("mesh", ComponentValue::Null)])
        .unwrap();
    let _bare = store.quick_entity([("position", ComponentValue::from(Vec3::ZERO))]).unwrap();

    // --- 3. ASSERTIONS ---
    let view = store.query(qid).unwrap();
    assert_eq!(view.len(), 1);
    assert!(view.contains(lamp) && !view.contains(wall));
    assert_eq!(view.ids().collect::<Vec<_>>(), query.matching(store.state()));
    assert_eq!(
        view.find(|e| e.id() == lamp).map(|e| e.id()),
        Some(lamp),
        "find should see matching entities"
    );
    // Iteration is restartable.
    assert_eq!(view.iter().count(), view.iter().count());
}

#[test]
fn test_identical_queries_share_a_live_set() {
    let mut store = Store::new(schema());
    let a = store.create_query(&QuerySpec::new().include("type")).unwrap();
    let b = store.create_query(&QuerySpec::new().include("type")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_match_cache_reuses_results_until_commit() {
    let mut store = Store::new(schema());
    store.quick_entity([("type", ComponentValue::from("a"))]).unwrap();
    let query = QuerySpec::new().include("type").resolve(store.schema()).unwrap();

    let first = store.matching(&query);
    let second = store.matching(&query);
    assert!(Arc::ptr_eq(&first, &second), "Unchanged state should hit the cache");

    store.quick_entity([("type", ComponentValue::from("b"))]).unwrap();
    let third = store.matching(&query);
    assert_eq!(third.len(), 2);
}

#[test]
fn test_keyed_lookup_follows_key_changes() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let qid = store
        .create_query(&QuerySpec::new().include("materialName").keyed_by("materialName"))
        .unwrap();
    let id = store.quick_entity([("materialName", ComponentValue::from("Wood"))]).unwrap();

    // --- 2. ACTION ---
    let renamed = store.add_component(store.get(id).unwrap(), "materialName", "Oak");
    store.register(renamed).unwrap();

    // --- 3. ASSERTIONS ---
    assert!(store.lookup(qid, &IndexKey::from("Wood")).unwrap().is_empty());
    assert_eq!(store.lookup(qid, &IndexKey::from("Oak")).unwrap(), vec![id]);
}

// --- CONSUMERS ---

#[test]
fn test_consumer_new_then_updates_reports_one_new_and_one_update() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let qid = store.create_query(&QuerySpec::new().include("position")).unwrap();
    let consumer = store.create_consumer(qid).unwrap();

    // --- 2. ACTION ---
    let id = store.quick_entity([("position", ComponentValue::from(Vec3::ZERO))]).unwrap();
    for step in 1..=2 {
        store
            .update_in_place(id, "position", |v| *v = Vec3::splat(step as f32).into())
            .unwrap();
    }
    let delta = store.drain(consumer).unwrap();

    // --- 3. ASSERTIONS ---
    assert_eq!(delta.new.len(), 1, "forNew fires exactly once");
    assert_eq!(delta.updated.len(), 1, "forUpdated fires once for both writes");
    assert_eq!(delta.updated[0].entity.id(), id);
    assert!(delta.updated[0].changed.contains(cid(&store, "position")));
    assert_eq!(delta.new[0].get(cid(&store, "position")).and_then(|v| v.as_vec3()), Some(Vec3::splat(2.0)));
    assert!(store.drain(consumer).unwrap().is_empty(), "Drain is idempotent");
}

#[test]
fn test_system_hooks_for_entity_created_then_updated() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let qid = store
        .create_query(&QuerySpec::new().include("position").include("velocity"))
        .unwrap();
    let consumer = store.create_consumer(qid).unwrap();
    let id = store
        .quick_entity([
            ("position", ComponentValue::from(Vec3::ZERO)),
            ("velocity", ComponentValue::from(Vec3::ZERO)),
        ])
        .unwrap();
    store.flag_update(id, "position").unwrap();
    store.flag_update(id, "velocity").unwrap();

    let counts = Rc::new(RefCell::new((0, 0, 0)));
    let (c1, c2, c3) = (Rc::clone(&counts), Rc::clone(&counts), Rc::clone(&counts));
    let changed_seen = Rc::new(RefCell::new(None));
    let changed_hook = Rc::clone(&changed_seen);
    let mut system = System::new("created-then-updated", consumer)
        .for_new(move |_, _, _| {
            c1.borrow_mut().0 += 1;
            Ok(())
        })
        .for_updated(move |_, updated, _| {
            c2.borrow_mut().1 += 1;
            *changed_hook.borrow_mut() = Some(updated.changed);
            Ok(())
        })
        .new_or_updated(move |_, _, _, _| {
            c3.borrow_mut().2 += 1;
            Ok(())
        });

    // --- 2. ACTION ---
    let failures = system.run(&mut store, 16.0);

    // --- 3. ASSERTIONS ---
    assert_eq!(failures, 0);
    assert_eq!(*counts.borrow(), (1, 1, 1), "new, updated and new_or_updated each fire once");
    let changed = (*changed_seen.borrow()).expect("for_updated should have run");
    assert!(changed.contains(cid(&store, "position")));
    assert!(changed.contains(cid(&store, "velocity")));

    assert_eq!(system.run(&mut store, 16.0), 0);
    assert_eq!(*counts.borrow(), (1, 1, 1), "A second run without writes delivers nothing");
}

#[test]
fn test_consumer_unions_changed_components() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let qid = store
        .create_query(&QuerySpec::new().include("position").include("velocity"))
        .unwrap();
    let consumer = store.create_consumer(qid).unwrap();
    let id = store
        .quick_entity([
            ("position", ComponentValue::from(Vec3::ZERO)),
            ("velocity", ComponentValue::from(Vec3::ZERO)),
        ])
        .unwrap();
    store.drain(consumer).unwrap();

    // --- 2. ACTION ---
    store.flag_update(id, "position").unwrap();
    store.flag_update(id, "velocity").unwrap();
    store.flag_update(id, "position").unwrap();
    let entity = store.add_component(store.get(id).unwrap(), "type", "ignored");
    store.register(entity).unwrap();
    let delta = store.drain(consumer).unwrap();

    // --- 3. ASSERTIONS ---
    assert_eq!(delta.updated.len(), 1, "forUpdated fires once per drain");
    let changed = delta.updated[0].changed;
    assert!(changed.contains(cid(&store, "position")));
    assert!(changed.contains(cid(&store, "velocity")));
    assert!(
        !changed.contains(cid(&store, "type")),
        "Components outside the query are not reported"
    );
}

#[test]
fn test_consumer_reports_removal_with_last_value() {
    let mut store = Store::new(schema());
    let qid = store
        .create_query(&QuerySpec::new().include("type").exclude("mesh"))
        .unwrap();
    let consumer = store.create_consumer(qid).unwrap();
    let id = store.quick_entity([("type", ComponentValue::from("lamp"))]).unwrap();
    store.drain(consumer).unwrap();

    let with_mesh = store.add_component(store.get(id).unwrap(), "mesh", ComponentValue::Null);
    store.register(with_mesh).unwrap();
    let delta = store.drain(consumer).unwrap();

    assert_eq!(delta.removed.len(), 1);
    assert!(
        !delta.removed[0].has(cid(&store, "mesh")),
        "The removal carries the value as last seen by the query"
    );
    assert_eq!(delta.removed[0].get(cid(&store, "type")).and_then(|v| v.as_text()), Some("lamp"));
    assert!(store.drain(consumer).unwrap().is_empty());
}

#[test]
fn test_enter_and_leave_between_drains_is_silent() {
    let mut store = Store::new(schema());
    let qid = store.create_query(&QuerySpec::new().include("type")).unwrap();
    let consumer = store.create_consumer(qid).unwrap();

    let id = store.quick_entity([("type", ComponentValue::from("ghost"))]).unwrap();
    store.deregister(id);

    assert!(store.drain(consumer).unwrap().is_empty());
}

#[test]
fn test_leave_and_reenter_delivers_removed_then_new() {
    let mut store = Store::new(schema());
    let qid = store.create_query(&QuerySpec::new().include("type")).unwrap();
    let consumer = store.create_consumer(qid).unwrap();
    let id = store.quick_entity([("type", ComponentValue::from("a"))]).unwrap();
    store.drain(consumer).unwrap();

    let gone = store.remove_component(store.get(id).unwrap(), "type");
    store.register(gone.clone()).unwrap();
    store.register(store.add_component(&gone, "type", "b")).unwrap();
    let delta = store.drain(consumer).unwrap();

    assert_eq!(delta.removed.len(), 1);
    assert_eq!(delta.new.len(), 1);
    assert_eq!(delta.new[0].get(cid(&store, "type")).and_then(|v| v.as_text()), Some("b"));
}

#[test]
fn test_consumers_on_one_query_are_independent() {
    let mut store = Store::new(schema());
    let qid = store.create_query(&QuerySpec::new().include("type")).unwrap();
    let first = store.create_consumer(qid).unwrap();
    let second = store.create_consumer(qid).unwrap();
    store.quick_entity([("type", ComponentValue::from("a"))]).unwrap();

    assert_eq!(store.drain(first).unwrap().new.len(), 1);
    assert!(store.has_pending(second), "Draining one consumer leaves the other intact");
    assert_eq!(store.drain(second).unwrap().new.len(), 1);
}

// --- SYSTEMS & PIPELINES ---

#[test]
fn test_system_hook_order_is_removed_new_updated() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let qid = store.create_query(&QuerySpec::new().include("type")).unwrap();
    let consumer = store.create_consumer(qid).unwrap();
    let stays = store.quick_entity([("type", ComponentValue::from("stays"))]).unwrap();
    let leaves = store.quick_entity([("type", ComponentValue::from("leaves"))]).unwrap();
    store.drain(consumer).unwrap();

    store.flag_update(stays, "type").unwrap();
    store.deregister(leaves);
    store.quick_entity([("type", ComponentValue::from("arrives"))]).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    let (l1, l2, l3) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
    let mut system = System::new("order", consumer)
        .for_updated(move |_, _, _| {
            l1.borrow_mut().push("updated");
            Ok(())
        })
        .for_new(move |_, _, _| {
            l2.borrow_mut().push("new");
            Ok(())
        })
        .removed(move |_, _, _| {
            l3.borrow_mut().push("removed");
            Ok(())
        });

    // --- 2. ACTION ---
    let failures = system.run(&mut store, 16.0);

    // --- 3. ASSERTIONS ---
    assert_eq!(failures, 0);
    assert_eq!(*log.borrow(), vec!["removed", "new", "updated"]);
}

#[test]
fn test_failing_hook_does_not_halt_pipeline() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let qid = store.create_query(&QuerySpec::new().include("type")).unwrap();
    let failing = store.create_consumer(qid).unwrap();
    let healthy = store.create_consumer(qid).unwrap();
    store.quick_entity([("type", ComponentValue::from("a"))]).unwrap();

    let seen = Rc::new(RefCell::new(0));
    let seen_in_hook = Rc::clone(&seen);
    let mut pipeline = Pipeline::new()
        .with(System::new("failing", failing).for_new(|_, _, _| anyhow::bail!("boom")))
        .with(System::new("healthy", healthy).for_new(move |_, _, _| {
            *seen_in_hook.borrow_mut() += 1;
            Ok(())
        }));

    // --- 2. ACTION ---
    let report = pipeline.tick(&mut store, 16.0);
    let second = pipeline.tick(&mut store, 16.0);

    // --- 3. ASSERTIONS ---
    assert_eq!(report, TickReport { systems: 2, failures: 1 });
    assert_eq!(*seen.borrow(), 1, "Later systems still run");
    assert_eq!(second.failures, 0, "The failed delta counts as delivered");
}

#[test]
fn test_pipeline_flattens_and_preserves_order() {
    let mut store = Store::new(schema());
    let log = Rc::new(RefCell::new(Vec::new()));
    let tick = |name: &'static str| {
        let log = Rc::clone(&log);
        System::tick_only(name).on_tick(move |_, _| {
            log.borrow_mut().push(name);
            Ok(())
        })
    };

    let inner = Pipeline::new().with(tick("b")).with(tick("c"));
    let mut pipeline = Pipeline::new().with(tick("a")).with(inner).with(tick("d"));
    pipeline.tick(&mut store, 1.0);

    assert_eq!(pipeline.len(), 4);
    assert_eq!(pipeline.system_names().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    assert_eq!(*log.borrow(), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_pipeline_init_replays_matching_entities_as_new() {
    let mut store = Store::new(schema());
    let qid = store.create_query(&QuerySpec::new().include("type")).unwrap();
    let consumer = store.create_consumer(qid).unwrap();
    store.quick_entity([("type", ComponentValue::from("a"))]).unwrap();
    store.drain(consumer).unwrap();

    let count = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&count);
    let mut pipeline = Pipeline::new().with(System::new("count", consumer).new_or_updated(
        move |_, _, changed, _| {
            assert!(changed.is_none(), "init reports entities as new");
            *counter.borrow_mut() += 1;
            Ok(())
        },
    ));

    pipeline.init(&mut store).unwrap();
    pipeline.tick(&mut store, 16.0);

    assert_eq!(*count.borrow(), 1);
}

#[test]
fn test_pipeline_init_keeps_pending_removals() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let qid = store.create_query(&QuerySpec::new().include("type")).unwrap();
    let consumer = store.create_consumer(qid).unwrap();
    let kept = store.quick_entity([("type", ComponentValue::from("kept"))]).unwrap();
    let gone = store.quick_entity([("type", ComponentValue::from("gone"))]).unwrap();
    store.drain(consumer).unwrap();
    store.deregister(gone);

    let removed = Rc::new(RefCell::new(Vec::new()));
    let new = Rc::new(RefCell::new(Vec::new()));
    let (removed_hook, new_hook) = (Rc::clone(&removed), Rc::clone(&new));
    let mut pipeline = Pipeline::new().with(
        System::new("cleanup", consumer)
            .removed(move |_, entity, _| {
                removed_hook.borrow_mut().push(entity.id());
                Ok(())
            })
            .for_new(move |_, entity, _| {
                new_hook.borrow_mut().push(entity.id());
                Ok(())
            }),
    );

    // --- 2. ACTION ---
    pipeline.init(&mut store).unwrap();
    pipeline.tick(&mut store, 16.0);

    // --- 3. ASSERTIONS ---
    assert_eq!(*removed.borrow(), vec![gone], "Cleanup still runs after init");
    assert_eq!(*new.borrow(), vec![kept]);
}

#[test]
fn test_writes_from_hooks_surface_on_next_tick() {
    // --- 1. SETUP ---
    let mut store = Store::new(schema());
    let typed = store.create_query(&QuerySpec::new().include("type")).unwrap();
    let meshed = store.create_query(&QuerySpec::new().include("mesh")).unwrap();
    let add_mesh = store.create_consumer(typed).unwrap();
    let watch_mesh = store.create_consumer(meshed).unwrap();
    store.quick_entity([("type", ComponentValue::from("a"))]).unwrap();

    let seen = Rc::new(RefCell::new(0));
    let seen_hook = Rc::clone(&seen);
    let mut pipeline = Pipeline::new()
        .with(System::new("add-mesh", add_mesh).for_new(|store, entity, _| {
            let next = store.add_component(entity, "mesh", ComponentValue::Null);
            store.register(next)?;
            Ok(())
        }))
        .with(System::new("watch-mesh", watch_mesh).for_new(move |_, _, _| {
            *seen_hook.borrow_mut() += 1;
            Ok(())
        }));

    // --- 2. ACTION ---
    pipeline.tick(&mut store, 16.0);

    // --- 3. ASSERTIONS ---
    assert_eq!(*seen.borrow(), 1, "A later system sees writes from an earlier one");
}
