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

use super::decode::CachedDecoder;
use async_trait::async_trait;
use prism_core::{ImageBitmap, ImageDimensions, ImageSource, LoadError, LoadRequest};
use std::fmt;
use std::sync::Arc;

/// An image source over encoded bytes already held in memory.
pub struct MemoryImageSource {
    url: String,
    bytes: Arc<[u8]>,
    decoder: CachedDecoder,
}

impl MemoryImageSource {
    /// Wraps encoded image bytes (PNG, JPEG, ...). The url starts empty.
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            url: String::new(),
            bytes: bytes.into(),
            decoder: CachedDecoder::default(),
        }
    }

    /// Sets the url reported for this source.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl fmt::Debug for MemoryImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryImageSource")
            .field("url", &self.url)
            .field("bytes", &self.bytes.len())
            .field("decoder", &self.decoder)
            .finish()
    }
}

#[async_trait]
impl ImageSource for MemoryImageSource {
    fn url(&self) -> &str {
        &self.url
    }

    async fn load(&self, request: &LoadRequest) -> Result<ImageDimensions, LoadError> {
        self.decoder
            .load(Arc::clone(&self.bytes), request)
            .await
            .map_err(|err| LoadError::source(&self.url, err))
    }

    async fn decode_bitmap(&self, request: &LoadRequest) -> Result<ImageBitmap, LoadError> {
        self.decoder
            .bitmap(Arc::clone(&self.bytes), request)
            .await
            .map_err(|err| LoadError::source(&self.url, err))
    }
}
