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

//! Fan-out of link messages to independent listeners.

use std::collections::HashMap;
use std::fmt;

use crate::message::{LinkMessage, MessageKind};

type Listener = Box<dyn FnMut(&LinkMessage)>;

/// An observer list per message kind.
///
/// Listeners are called in registration order and return nothing: a
/// listener cannot stop delivery to the others.
#[derive(Default)]
pub struct LinkRouter {
    listeners: HashMap<MessageKind, Vec<Listener>>,
}

impl LinkRouter {
    /// Creates a router without listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener for one kind of message.
    pub fn on(&mut self, kind: MessageKind, listener: impl FnMut(&LinkMessage) + 'static) {
        self.listeners.entry(kind).or_default().push(Box::new(listener));
    }

    /// Hands `message` to every listener of its kind. Returns how many ran.
    pub fn dispatch(&mut self, message: &LinkMessage) -> usize {
        let Some(listeners) = self.listeners.get_mut(&message.kind()) else {
            log::trace!("No listener for {:?} '{}'.", message.kind(), message.name());
            return 0;
        };
        for listener in listeners.iter_mut() {
            listener(message);
        }
        listeners.len()
    }
}

impl fmt::Debug for LinkRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&MessageKind, usize> = self.listeners.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("LinkRouter").field("listeners", &counts).finish()
    }
}
