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

//! Frame-boundary delivery of link messages.

use tessel_core::event::EventBus;

use crate::gate::{Gate, GateState};
use crate::message::LinkMessage;

/// Collects messages from the transport and releases them between ticks.
///
/// Messages are only taken out in [`LinkInbox::take`], which the frame loop
/// calls before running the pipeline. While a gate is held, messages keep
/// accumulating and are released together once it resolves.
#[derive(Debug, Default)]
pub struct LinkInbox {
    bus: EventBus<LinkMessage>,
    held: Vec<LinkMessage>,
    gate: Option<Gate>,
}

impl LinkInbox {
    /// Creates an empty inbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender for the transport. Dropping the inbox disconnects it.
    pub fn sender(&self) -> flume::Sender<LinkMessage> {
        self.bus.sender()
    }

    /// Queues a message directly, bypassing the transport.
    pub fn push(&self, message: LinkMessage) {
        self.bus.publish(message);
    }

    /// Holds every message until `gate` resolves.
    ///
    /// Only one gate is honored: a newer gate replaces an unresolved older
    /// one.
    pub fn hold_until(&mut self, gate: Gate) {
        if let Some(previous) = self.gate.replace(gate) {
            log::warn!(
                "Link gate '{}' replaced before it resolved.",
                previous.label()
            );
        }
    }

    /// Returns true while a gate holds messages back.
    pub fn is_held(&self) -> bool {
        self.gate
            .as_ref()
            .is_some_and(|gate| gate.poll() == GateState::Pending)
    }

    /// Messages ready to apply at this frame boundary, in arrival order.
    pub fn take(&mut self) -> Vec<LinkMessage> {
        self.held.extend(self.bus.drain());

        if let Some(gate) = &self.gate {
            match gate.poll() {
                GateState::Pending => return Vec::new(),
                GateState::Open => log::debug!("Link gate '{}' opened.", gate.label()),
                GateState::Abandoned => {
                    log::warn!("Link gate '{}' was dropped unresolved; releasing messages.", gate.label())
                }
            }
            self.gate = None;
        }

        std::mem::take(&mut self.held)
    }
}
