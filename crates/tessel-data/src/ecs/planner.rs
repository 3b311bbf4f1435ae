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

//! Internal caching of ad-hoc query results.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tessel_core::ecs::EntityId;

use crate::ecs::query::Query;
use crate::ecs::state::StoreState;

/// Caches matching sets per (query, state version).
///
/// A pipeline that evaluates the same query many times within a tick against
/// an unchanged state only pays for the set intersection once. Entries are
/// keyed by the query's canonical name and invalidated by a version change.
#[derive(Debug, Default)]
pub(crate) struct MatchCache {
    entries: RwLock<HashMap<Arc<str>, (u64, Arc<[EntityId]>)>>,
}

impl MatchCache {
    pub(crate) fn get_or_compute(&self, query: &Query, state: &StoreState) -> Arc<[EntityId]> {
        let version = state.version();
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some((cached_version, ids)) = entries.get(query.name()) {
                if *cached_version == version {
                    return Arc::clone(ids);
                }
            }
        }

        let ids: Arc<[EntityId]> = query.matching(state).into();
        log::trace!("Query '{}' recomputed at version {version}.", query.name());
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(Arc::from(query.name()), (version, Arc::clone(&ids)));
        ids
    }
}
