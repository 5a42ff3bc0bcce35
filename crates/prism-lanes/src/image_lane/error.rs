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

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching or decoding image bytes.
#[derive(Debug, Error)]
pub enum ImageLaneError {
    /// The image file could not be read.
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a decodable image.
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The decoded pixels did not fill the reported size.
    #[error("Decoded pixel buffer does not match {width}x{height}")]
    PixelBuffer {
        /// Expected width.
        width: u32,
        /// Expected height.
        height: u32,
    },

    /// The blocking decode task panicked or was cancelled.
    #[error("Decode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
