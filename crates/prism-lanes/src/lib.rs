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

//! # Prism Lanes
//!
//! Hot-path implementations of the core image contracts. Each lane fetches
//! encoded bytes from somewhere and decodes them with the `image` crate off the
//! async executor.

#![warn(missing_docs)]

pub mod image_lane;

pub use image_lane::{FileImageSource, ImageLaneError, MemoryImageSource};
