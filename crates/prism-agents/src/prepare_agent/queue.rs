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

//! The preparation queue: pending items released for upload under a limiter.
//!
//! Items are queued with [`PreparationQueue::add`], resolved to their resources
//! by the first matching handler, and uploaded by [`PreparationQueue::tick`]
//! once every resource is valid. Each tick walks the pending items in
//! insertion order and asks the limiter before every item, so the first denial
//! defers the rest of the queue to the next frame.
//!
//! The queue is borrowed mutably for the whole tick. Items cannot be added
//! while a tick runs; anything added afterwards is seen by the next tick.

use super::handler::{FnHandler, PrepareHandler};
use super::limiter::UploadLimiter;
use prism_core::event::EventBus;
use prism_core::{ImageContentResource, LoadError, ResourceStatus};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Resolves once the queue has no pending items left.
///
/// The sender side is dropped without a value if the queue itself is dropped
/// first, in which case awaiting yields an error.
pub type Completion = oneshot::Receiver<()>;

/// Unconsumed events kept on the queue's bus. Older ones are dropped first.
pub const EVENT_CAPACITY: usize = 256;

/// An outcome published on the queue's event bus.
#[derive(Debug, Clone, PartialEq)]
pub enum PrepareEvent<I> {
    /// The item was uploaded by the named handler.
    Uploaded {
        /// The uploaded item.
        item: I,
        /// The handler that uploaded it.
        handler: String,
    },
    /// One of the item's resources failed to load. The item was dropped.
    LoadFailed {
        /// The dropped item.
        item: I,
        /// The failure reported by the resource.
        error: LoadError,
    },
    /// One of the item's resources was destroyed. The item was dropped.
    Discarded {
        /// The dropped item.
        item: I,
    },
}

/// What a single [`PreparationQueue::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Pending items when the tick started.
    pub pending_before: usize,
    /// Items uploaded during the tick.
    pub uploaded: usize,
    /// Items dropped because a resource failed to load.
    pub failed: usize,
    /// Items dropped because a resource was destroyed.
    pub discarded: usize,
    /// Pending items when the tick ended.
    pub pending_after: usize,
    /// `true` if the limiter stopped the tick before the end of the queue.
    pub budget_exhausted: bool,
}

impl TickReport {
    /// Returns `true` if any item left the queue during the tick.
    pub fn made_progress(&self) -> bool {
        self.uploaded + self.failed + self.discarded > 0
    }
}

struct PendingItem<I> {
    item: I,
    handler: usize,
    resources: Vec<Arc<ImageContentResource>>,
}

enum Readiness {
    Ready,
    Waiting,
    Failed(LoadError),
    Discarded,
}

fn readiness(resources: &[Arc<ImageContentResource>]) -> Readiness {
    let mut waiting = false;
    for resource in resources {
        match resource.status() {
            ResourceStatus::Ready => {}
            ResourceStatus::Destroyed => return Readiness::Discarded,
            ResourceStatus::Failed => {
                let error = resource.load_error().unwrap_or(LoadError::Destroyed);
                return Readiness::Failed(error);
            }
            ResourceStatus::Loading | ResourceStatus::Unloaded => waiting = true,
        }
    }
    if waiting {
        Readiness::Waiting
    } else {
        Readiness::Ready
    }
}

/// Schedules queued items for upload, a bounded amount per frame.
pub struct PreparationQueue<I: Send + 'static> {
    handlers: Vec<Box<dyn PrepareHandler<I>>>,
    pending: VecDeque<PendingItem<I>>,
    tracked: HashSet<I>,
    waiters: Vec<oneshot::Sender<()>>,
    events: EventBus<PrepareEvent<I>>,
    total_uploaded: u64,
    total_failed: u64,
    total_discarded: u64,
}

impl<I> PreparationQueue<I>
where
    I: Clone + Eq + Hash + fmt::Debug + Send + 'static,
{
    /// Creates an empty queue with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            pending: VecDeque::new(),
            tracked: HashSet::new(),
            waiters: Vec::new(),
            events: EventBus::bounded(EVENT_CAPACITY),
            total_uploaded: 0,
            total_failed: 0,
            total_discarded: 0,
        }
    }

    /// Registers a handler. Handlers registered earlier take priority.
    pub fn register(&mut self, handler: impl PrepareHandler<I> + 'static) -> &mut Self {
        log::debug!("Registered prepare handler '{}'", handler.name());
        self.handlers.push(Box::new(handler));
        self
    }

    /// Registers a handler built from closures.
    ///
    /// `matches` selects the items the handler is responsible for, `extract`
    /// returns the resources an item waits on, and `upload` performs the upload
    /// once they are all valid.
    pub fn register_handler<M, E, U>(
        &mut self,
        name: impl Into<String>,
        matches: M,
        extract: E,
        upload: U,
    ) -> &mut Self
    where
        M: Fn(&I) -> bool + Send + 'static,
        E: Fn(&I) -> Vec<Arc<ImageContentResource>> + Send + 'static,
        U: FnMut(&I, &[Arc<ImageContentResource>]) + Send + 'static,
    {
        self.register(FnHandler::new(name.into(), matches, extract, upload))
    }

    /// Queues `item` for upload.
    ///
    /// Returns `false` if the item is already pending or no handler matches it.
    /// Resources that have not started loading are started here.
    pub fn add(&mut self, item: I) -> bool {
        if self.tracked.contains(&item) {
            log::trace!("{item:?} is already queued");
            return false;
        }
        let Some(handler) = self.handlers.iter().position(|h| h.matches(&item)) else {
            log::debug!("No prepare handler matches {item:?}, ignoring it");
            return false;
        };

        let resources = self.handlers[handler].extract(&item);
        for resource in &resources {
            if resource.status() == ResourceStatus::Unloaded {
                if let Err(err) = resource.spawn_load() {
                    log::warn!("Could not start loading '{}': {err}", resource.url());
                }
            }
        }

        log::trace!(
            "Queued {item:?} with {} resource(s) for '{}'",
            resources.len(),
            self.handlers[handler].name()
        );
        self.tracked.insert(item.clone());
        self.pending.push_back(PendingItem {
            item,
            handler,
            resources,
        });
        true
    }

    /// Queues `item` and returns a [`Completion`] that resolves once the queue
    /// has drained, not just this item.
    pub fn upload(&mut self, item: I) -> Completion {
        self.add(item);
        let (sender, receiver) = oneshot::channel();
        if self.pending.is_empty() {
            let _ = sender.send(());
        } else {
            self.waiters.push(sender);
        }
        receiver
    }

    /// Uploads ready items while `limiter` allows, in insertion order.
    ///
    /// The limiter is consulted before every item. Items whose resources failed
    /// or were destroyed are dropped without being uploaded; items still
    /// loading keep their place.
    pub fn tick<L: UploadLimiter + ?Sized>(&mut self, limiter: &mut L) -> TickReport {
        let mut report = TickReport {
            pending_before: self.pending.len(),
            ..TickReport::default()
        };

        let mut index = 0;
        while index < self.pending.len() {
            if !limiter.allowed_to_upload() {
                report.budget_exhausted = true;
                break;
            }

            match readiness(&self.pending[index].resources) {
                Readiness::Waiting => index += 1,
                Readiness::Ready => {
                    let Some(entry) = self.pending.remove(index) else {
                        break;
                    };
                    let handler = &mut self.handlers[entry.handler];
                    handler.upload(&entry.item, &entry.resources);
                    limiter.record_upload();
                    self.tracked.remove(&entry.item);
                    report.uploaded += 1;

                    log::trace!("Uploaded {:?} via '{}'", entry.item, handler.name());
                    self.events.publish(PrepareEvent::Uploaded {
                        item: entry.item,
                        handler: handler.name().to_string(),
                    });
                }
                Readiness::Failed(error) => {
                    let Some(entry) = self.pending.remove(index) else {
                        break;
                    };
                    self.tracked.remove(&entry.item);
                    report.failed += 1;

                    log::warn!("Dropping {:?}: {error}", entry.item);
                    self.events.publish(PrepareEvent::LoadFailed {
                        item: entry.item,
                        error,
                    });
                }
                Readiness::Discarded => {
                    let Some(entry) = self.pending.remove(index) else {
                        break;
                    };
                    self.tracked.remove(&entry.item);
                    report.discarded += 1;

                    log::debug!("Discarding {:?}: a resource was destroyed", entry.item);
                    self.events.publish(PrepareEvent::Discarded { item: entry.item });
                }
            }
        }

        report.pending_after = self.pending.len();
        self.total_uploaded += report.uploaded as u64;
        self.total_failed += report.failed as u64;
        self.total_discarded += report.discarded as u64;

        if self.pending.is_empty() {
            self.resolve_waiters();
        }
        report
    }

    fn resolve_waiters(&mut self) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    /// Drops every pending item without uploading it and resolves all waiters.
    pub fn clear(&mut self) {
        let dropped = self.pending.len();
        self.pending.clear();
        self.tracked.clear();
        self.resolve_waiters();
        if dropped > 0 {
            log::debug!("Cleared {dropped} pending item(s)");
        }
    }

    /// Number of pending items.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns `true` if `item` is pending.
    pub fn contains(&self, item: &I) -> bool {
        self.tracked.contains(item)
    }

    /// The handler name of each pending item, in queue order.
    pub fn pending_names(&self) -> Vec<&str> {
        self.pending
            .iter()
            .map(|entry| self.handlers[entry.handler].name())
            .collect()
    }

    /// The name of the handler that will upload `item`, if it is pending.
    pub fn handler_name(&self, item: &I) -> Option<&str> {
        self.pending
            .iter()
            .find(|entry| &entry.item == item)
            .map(|entry| self.handlers[entry.handler].name())
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// A receiver for the events published by [`tick`](Self::tick).
    ///
    /// At most [`EVENT_CAPACITY`] unconsumed events are kept.
    pub fn events(&self) -> flume::Receiver<PrepareEvent<I>> {
        self.events.subscribe()
    }

    /// Removes and returns the events published so far.
    pub fn drain_events(&self) -> Vec<PrepareEvent<I>> {
        self.events.drain()
    }

    /// Items uploaded since the queue was created.
    pub fn total_uploaded(&self) -> u64 {
        self.total_uploaded
    }

    /// Items dropped after a failed load since the queue was created.
    pub fn total_failed(&self) -> u64 {
        self.total_failed
    }

    /// Items dropped after a resource was destroyed since the queue was created.
    pub fn total_discarded(&self) -> u64 {
        self.total_discarded
    }
}

impl<I> Default for PreparationQueue<I>
where
    I: Clone + Eq + Hash + fmt::Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Send + 'static> fmt::Debug for PreparationQueue<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers: Vec<&str> = self.handlers.iter().map(|h| h.name()).collect();
        f.debug_struct("PreparationQueue")
            .field("handlers", &handlers)
            .field("pending", &self.pending.len())
            .field("waiters", &self.waiters.len())
            .finish()
    }
}
