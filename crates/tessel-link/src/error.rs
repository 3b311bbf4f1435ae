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

//! Errors raised by the live link.

use thiserror::Error;

/// An error on the live link. None of them is fatal to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// An incoming frame is not a valid message. It is logged and dropped.
    #[error("malformed message: {0}")]
    Malformed(String),
    /// The authoring tool could not be reached.
    #[error("cannot connect to '{url}': {reason}")]
    Connect {
        /// The endpoint.
        url: String,
        /// Why the attempt failed.
        reason: String,
    },
    /// An established connection failed.
    #[error("connection lost: {0}")]
    Connection(String),
}
