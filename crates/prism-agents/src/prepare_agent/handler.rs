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

//! The handler table entries that map queued items to resources and uploads.

use prism_core::ImageContentResource;
use std::sync::Arc;

/// Knows how to prepare one family of queued items.
///
/// The queue tries handlers in registration order and hands each item to the
/// first one whose [`matches`](PrepareHandler::matches) accepts it.
pub trait PrepareHandler<I>: Send {
    /// A display name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Returns `true` if this handler is responsible for `item`.
    fn matches(&self, item: &I) -> bool;

    /// Returns the resources that must be ready before `item` can be uploaded.
    fn extract(&self, item: &I) -> Vec<Arc<ImageContentResource>>;

    /// Uploads `item`. Called at most once per queued item, and only once every
    /// resource returned by [`extract`](PrepareHandler::extract) is valid.
    fn upload(&mut self, item: &I, resources: &[Arc<ImageContentResource>]);
}

/// Adapts a set of closures into a [`PrepareHandler`].
pub(crate) struct FnHandler<M, E, U> {
    name: String,
    matches: M,
    extract: E,
    upload: U,
}

impl<M, E, U> FnHandler<M, E, U> {
    pub(crate) fn new(name: String, matches: M, extract: E, upload: U) -> Self {
        Self {
            name,
            matches,
            extract,
            upload,
        }
    }
}

impl<I, M, E, U> PrepareHandler<I> for FnHandler<M, E, U>
where
    M: Fn(&I) -> bool + Send,
    E: Fn(&I) -> Vec<Arc<ImageContentResource>> + Send,
    U: FnMut(&I, &[Arc<ImageContentResource>]) + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, item: &I) -> bool {
        (self.matches)(item)
    }

    fn extract(&self, item: &I) -> Vec<Arc<ImageContentResource>> {
        (self.extract)(item)
    }

    fn upload(&mut self, item: &I, resources: &[Arc<ImageContentResource>]) {
        (self.upload)(item, resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_handler_forwards_to_closures() {
        let mut uploads = Vec::new();
        {
            let mut handler: Box<dyn PrepareHandler<u32> + '_> = Box::new(FnHandler::new(
                "even".to_string(),
                |item: &u32| item % 2 == 0,
                |_: &u32| -> Vec<Arc<ImageContentResource>> { Vec::new() },
                |item: &u32, resources: &[Arc<ImageContentResource>]| {
                    uploads.push((*item, resources.len()))
                },
            ));

            assert_eq!(handler.name(), "even");
            assert!(handler.matches(&4));
            assert!(!handler.matches(&3));
            assert!(handler.extract(&4).is_empty());
            handler.upload(&4, &[]);
        }
        assert_eq!(uploads, vec![(4, 0)]);
    }
}
