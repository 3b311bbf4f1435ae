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

/// Manages a generic, thread-safe event channel.
///
/// The bus owns both ends of an unbounded flume channel. Producers get cloned
/// senders through [`EventBus::sender`]; the owner drains the receiver, usually
/// once per frame through [`EventBus::drain`].
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a new EventBus with an unbounded channel for a specific event type.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("EventBus<{}> initialized.", std::any::type_name::<T>());
        Self { sender, receiver }
    }

    /// Attempts to send an event, logging an error if the receiver is disconnected.
    pub fn publish(&self, event: T) {
        log::trace!("Publishing an event.");

        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to send event: {e}. Receiver likely disconnected.");
        }
    }

    /// Returns a clone of the sender end of the channel.
    /// Use this to allow other parts of the system to send events.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns a reference to the receiver end of the channel.
    /// Intended for the owner of the bus to process events.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Takes every event currently queued, without blocking.
    ///
    /// Events published while the drain runs are left for the next call.
    pub fn drain(&self) -> Vec<T> {
        let pending = self.receiver.len();
        let mut events = Vec::with_capacity(pending);
        for _ in 0..pending {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(_) => break,
            }
        }
        events
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;
    use std::{thread, time::Duration};

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        TreeReceived { name: String, nodes: usize },
        Export(String),
        Disconnected,
    }

    #[test]
    fn try_receive_empty() {
        let bus = EventBus::<TestEvent>::new();
        assert_eq!(bus.receiver().try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn publish_then_drain_preserves_order() {
        let bus = EventBus::<TestEvent>::new();

        bus.publish(TestEvent::TreeReceived {
            name: "Pulse".to_string(),
            nodes: 4,
        });
        bus.publish(TestEvent::Export("scene".to_string()));
        bus.publish(TestEvent::Disconnected);

        let events = bus.drain();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], TestEvent::Export("scene".to_string()));
        assert_eq!(events[2], TestEvent::Disconnected);
        assert!(bus.drain().is_empty(), "A second drain should yield nothing");
    }

    #[test]
    fn send_from_thread() {
        let bus = EventBus::<TestEvent>::new();
        let sender = bus.sender();

        let handle = thread::spawn(move || {
            sender
                .send(TestEvent::Export("thread".to_string()))
                .expect("Send from thread should succeed");
        });
        handle.join().expect("Thread should not panic");

        let received = bus
            .receiver()
            .recv_timeout(Duration::from_millis(100))
            .expect("Event should arrive");
        assert_eq!(received, TestEvent::Export("thread".to_string()));
    }

    #[test]
    fn publish_after_receiver_dropped_does_not_panic() {
        let bus = EventBus::<TestEvent>::new();
        let sender = bus.sender();
        drop(bus);
        assert!(sender.send(TestEvent::Disconnected).is_err());
    }
}
