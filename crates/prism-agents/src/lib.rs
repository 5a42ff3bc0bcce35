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

//! # Prism Agents
//!
//! Per-frame drivers for the preparation pipeline. The [`prepare_agent`]
//! module holds the upload limiters, the handler table, the preparation queue
//! and the agent that ticks them once per frame.

#![warn(missing_docs)]

pub mod prepare_agent;

pub use prepare_agent::{
    CountLimiter, FrameTimeBudget, PrepareAgent, PrepareEvent, PrepareHandler, PrepareStatus,
    PreparationQueue, TickReport, UploadLimiter,
};
