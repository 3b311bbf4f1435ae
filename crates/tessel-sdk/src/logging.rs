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

//! Logger bootstrap for binaries.

use env_logger::{Builder, Env};

/// Installs the global logger. `RUST_LOG` overrides `filter`.
///
/// Fails if a logger is already installed, which callers may ignore.
pub fn init_logging(filter: &str) -> Result<(), log::SetLoggerError> {
    Builder::from_env(Env::default().default_filter_or(filter)).try_init()
}
