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

//! # Tessel Data
//!
//! The data layer of the engine: a copy-on-write entity store keyed by a
//! closed component schema, live queries over it, change consumers that turn
//! store commits into one-shot deltas, and the system pipeline that runs
//! those deltas through user hooks once per frame.

pub mod ecs;
