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

//! # Tessel Link
//!
//! Brings node trees and scene changes authored in an external tool into a
//! running engine. The transport runs on its own task and only ever sends
//! parsed [`LinkMessage`]s into a channel; the engine takes them out of the
//! [`LinkInbox`] at frame boundaries, so a tick never sees a half-applied
//! change.

#![warn(missing_docs)]

pub mod error;
pub mod gate;
pub mod inbox;
pub mod message;
pub mod router;
pub mod settings;
pub mod transport;

pub use error::LinkError;
pub use gate::{gate, Gate, GateHandle, GateState};
pub use inbox::LinkInbox;
pub use message::{LinkMessage, MessageKind};
pub use router::LinkRouter;
pub use settings::LinkSettings;
pub use transport::{run_link, Connection, Connector, LinkReport};
