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

//! CPU decoding shared by every image lane.

use super::error::ImageLaneError;
use image::imageops::FilterType;
use image::DynamicImage;
use prism_core::{ImageBitmap, ImageDimensions, LoadRequest};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Decodes encoded bytes (PNG, JPEG, ...) into an image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ImageLaneError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Converts a decoded image into an RGBA8 bitmap, resized to `size_hint` if given.
pub fn into_bitmap(
    image: DynamicImage,
    size_hint: Option<ImageDimensions>,
) -> Result<ImageBitmap, ImageLaneError> {
    let mut image = image;
    if let Some(size) = size_hint {
        if (image.width(), image.height()) != (size.width, size.height) {
            image = image.resize_exact(size.width, size.height, FilterType::Triangle);
        }
    }

    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    ImageBitmap::from_rgba8(width, height, rgba.into_raw())
        .ok_or(ImageLaneError::PixelBuffer { width, height })
}

/// Decodes encoded bytes straight into an RGBA8 bitmap.
pub fn decode_bitmap(
    bytes: &[u8],
    size_hint: Option<ImageDimensions>,
) -> Result<ImageBitmap, ImageLaneError> {
    into_bitmap(decode_image(bytes)?, size_hint)
}

pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ImageLaneError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ImageLaneError> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// Decodes a source's bytes at most once per load.
///
/// The load decodes in full so corrupt data fails early. When the request says
/// a bitmap will follow, the decoded image is parked here until
/// [`bitmap`](Self::bitmap) takes it.
#[derive(Default)]
pub(crate) struct CachedDecoder {
    decoded: Mutex<Option<DynamicImage>>,
}

impl CachedDecoder {
    pub(crate) async fn load(
        &self,
        bytes: Arc<[u8]>,
        request: &LoadRequest,
    ) -> Result<ImageDimensions, ImageLaneError> {
        let image = blocking(move || decode_image(&bytes)).await?;
        let dimensions = ImageDimensions::new(image.width(), image.height());
        if request.create_bitmap {
            *self.lock() = Some(image);
        }
        Ok(dimensions)
    }

    pub(crate) async fn bitmap(
        &self,
        bytes: Arc<[u8]>,
        request: &LoadRequest,
    ) -> Result<ImageBitmap, ImageLaneError> {
        let size_hint = request.size_hint;
        let cached = self.lock().take();
        blocking(move || match cached {
            Some(image) => into_bitmap(image, size_hint),
            None => decode_bitmap(&bytes, size_hint),
        })
        .await
    }

    fn is_cached(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<DynamicImage>> {
        self.decoded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CachedDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedDecoder")
            .field("cached", &self.is_cached())
            .finish()
    }
}
