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

//! # Prism Core
//!
//! Foundational crate containing the texture resource types, the process-wide
//! preparation settings, and the interface contracts shared by the image lanes
//! and the preparation agents.

#![warn(missing_docs)]

pub mod binding;
pub mod error;
pub mod event;
pub mod resource;
pub mod settings;
pub mod utils;

pub use binding::{AlphaMode, TextureBinding};
pub use error::{BindError, LoadError, ResourceError, SettingsError};
pub use resource::{
    CrossOrigin, ImageBitmap, ImageContentResource, ImageDimensions, ImageSource, LoadRequest,
    ResourceOptions, ResourceStatus,
};
pub use settings::PrepareSettings;
pub use utils::timer::Stopwatch;
