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

use super::options::LoadRequest;
use crate::error::LoadError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// The natural size of a loaded image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    /// Creates a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An upload-ready RGBA8 bitmap decoded from an image source.
///
/// Cloning is cheap; the pixel storage is shared.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBitmap {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl ImageBitmap {
    /// Wraps tightly packed RGBA8 pixels.
    ///
    /// Returns `None` if `pixels` does not hold exactly `width * height * 4` bytes.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if pixels.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw RGBA8 pixel data, row-major with no padding.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Size of the pixel data in bytes.
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

impl fmt::Debug for ImageBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// The external image handle behind an [`ImageContentResource`](super::ImageContentResource).
///
/// Implementations own the actual fetching and decoding of image bytes; the
/// resource only sequences the calls, records the outcome, and guards against
/// late completions after it has been destroyed.
///
/// A resource calls [`load`](ImageSource::load) at most once, and
/// [`decode_bitmap`](ImageSource::decode_bitmap) at most once after a
/// successful load.
#[async_trait]
pub trait ImageSource: Send + Sync + 'static {
    /// The address the image is loaded from. Empty when the source has none.
    fn url(&self) -> &str {
        ""
    }

    /// Loads the image and reports its natural size.
    async fn load(&self, request: &LoadRequest) -> Result<ImageDimensions, LoadError>;

    /// Decodes the loaded image into an upload-ready bitmap.
    async fn decode_bitmap(&self, request: &LoadRequest) -> Result<ImageBitmap, LoadError>;
}
