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

//! Connection settings.

use std::time::Duration;

use serde::Deserialize;

/// How to reach the authoring tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Whether the engine connects at all.
    pub enabled: bool,
    /// The endpoint.
    pub url: String,
    /// Fixed wait between a lost connection and the next attempt.
    pub reconnect_delay_ms: u64,
    /// Keep-alive period on an open connection.
    pub ping_interval_ms: u64,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "ws://localhost:9001".to_string(),
            reconnect_delay_ms: 1000,
            ping_interval_ms: 5000,
        }
    }
}

impl LinkSettings {
    /// [`Self::reconnect_delay_ms`] as a duration.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// [`Self::ping_interval_ms`] as a duration, never zero.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms.max(1))
    }
}
