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

//! One-shot barriers that hold incoming messages back until loading work
//! has finished.

use std::cell::Cell;

use flume::TryRecvError;

/// The state of a [`Gate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Not resolved yet.
    Pending,
    /// Opened through its handle.
    Open,
    /// The handle was dropped without opening. Treated as resolved.
    Abandoned,
}

/// The waiting side of a barrier.
#[derive(Debug)]
pub struct Gate {
    label: String,
    receiver: flume::Receiver<()>,
    resolved: Cell<Option<GateState>>,
}

/// The resolving side of a barrier.
#[derive(Debug)]
pub struct GateHandle {
    sender: flume::Sender<()>,
}

/// Creates a barrier. `label` names it in logs.
pub fn gate(label: impl Into<String>) -> (GateHandle, Gate) {
    let (sender, receiver) = flume::bounded(1);
    (
        GateHandle { sender },
        Gate {
            label: label.into(),
            receiver,
            resolved: Cell::new(None),
        },
    )
}

impl GateHandle {
    /// Resolves the gate. Can be called from any thread.
    pub fn open(self) {
        if self.sender.send(()).is_err() {
            log::debug!("Gate opened after its waiter was dropped.");
        }
    }
}

impl Gate {
    /// The name given at creation.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Checks the gate without blocking. Once resolved, it stays resolved.
    pub fn poll(&self) -> GateState {
        if let Some(state) = self.resolved.get() {
            return state;
        }
        let state = match self.receiver.try_recv() {
            Ok(()) => GateState::Open,
            Err(TryRecvError::Empty) => GateState::Pending,
            Err(TryRecvError::Disconnected) => GateState::Abandoned,
        };
        if state != GateState::Pending {
            self.resolved.set(Some(state));
        }
        state
    }
}
