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

//! Acts as the **[A]gent** for texture preparation.
//!
//! Resources become ready asynchronously, but uploading them to the GPU has to
//! happen on the frame loop. This module decides how much of that upload work
//! a single frame may take:
//!
//! - [`limiter`] answers "may another item be uploaded this frame?",
//! - [`handler`] maps queued items to their resources and their uploader,
//! - [`queue`] holds pending items and releases them while the limiter allows,
//! - [`agent`] owns a queue and a limiter and drives them once per frame.

pub mod agent;
pub mod handler;
pub mod limiter;
pub mod queue;

pub use agent::{PrepareAgent, PrepareStatus};
pub use handler::PrepareHandler;
pub use limiter::{CountLimiter, FrameTimeBudget, UploadLimiter};
pub use queue::{Completion, PrepareEvent, PreparationQueue, TickReport, EVENT_CAPACITY};
