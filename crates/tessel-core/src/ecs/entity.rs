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

//! Defines the opaque identity carried by every entity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace used to derive deterministic ids from seeds.
const SEED_NAMESPACE: Uuid = Uuid::from_u128(0x7e55_e1a0_4c0f_4e2b_9d1c_51e6_7a1d_0b00);

/// Seed of the reserved entity holding process-wide shared components.
pub const SINGLETON_SEED: &str = "tessel.singleton";

/// A unique identifier for an entity in the store.
///
/// Ids are never recycled: a fresh id is a random v4 uuid, while a seeded id
/// is a v5 uuid derived from the seed, so the same seed always yields the same
/// id. No two live entities share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Allocates a fresh, random identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derives a deterministic identity from `seed`.
    pub fn from_seed(seed: &str) -> Self {
        Self(Uuid::new_v5(&SEED_NAMESPACE, seed.as_bytes()))
    }

    /// The well-known identity of the singleton entity.
    pub fn singleton() -> Self {
        Self::from_seed(SINGLETON_SEED)
    }

    /// Returns the underlying uuid.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl From<Uuid> for EntityId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}
