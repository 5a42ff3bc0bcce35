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

/// A generic, thread-safe event channel.
///
/// The bus keeps both ends of the channel. Producers publish through the bus;
/// consumers either hold a [`flume::Receiver`] clone or drain the bus directly
/// once per frame. A bounded bus never blocks its publisher: when it is full
/// the oldest waiting event is dropped to make room.
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a new bus backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    /// Creates a bus that holds at most `capacity` unconsumed events.
    ///
    /// A zero capacity is raised to one.
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Publishes an event. Never blocks.
    ///
    /// On a full bounded bus the oldest unconsumed event is evicted.
    pub fn publish(&self, event: T) {
        let mut event = event;
        loop {
            match self.sender.try_send(event) {
                Ok(()) => return,
                Err(flume::TrySendError::Full(rejected)) => {
                    if self.receiver.try_recv().is_ok() {
                        log::trace!("Event bus full, dropped the oldest event.");
                    }
                    event = rejected;
                }
                // The bus owns a receiver, so the channel cannot be disconnected here.
                Err(flume::TrySendError::Disconnected(_)) => {
                    log::error!("Failed to publish event: channel disconnected.");
                    return;
                }
            }
        }
    }

    /// Returns a clone of the receiving end of the channel.
    ///
    /// Receivers compete for events: each event is delivered to exactly one of them.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        self.receiver.clone()
    }

    /// Removes and returns every event published so far.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of events waiting to be consumed.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if no events are waiting.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
