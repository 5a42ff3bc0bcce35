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
use super::error::ImageLaneError;
use async_trait::async_trait;
use prism_core::{ImageBitmap, ImageDimensions, ImageSource, LoadError, LoadRequest};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// An image source that reads an encoded image file from disk.
///
/// The file is read at most once; the bitmap decode reuses the bytes read by
/// the load.
pub struct FileImageSource {
    path: PathBuf,
    url: String,
    bytes: OnceCell<Arc<[u8]>>,
    decoder: CachedDecoder,
}

impl FileImageSource {
    /// Creates a source for `path`. Nothing is read until the first load.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            url: path.display().to_string(),
            path,
            bytes: OnceCell::new(),
            decoder: CachedDecoder::default(),
        }
    }

    async fn bytes(&self) -> Result<Arc<[u8]>, ImageLaneError> {
        self.bytes
            .get_or_try_init(|| async {
                let data = tokio::fs::read(&self.path)
                    .await
                    .map_err(|source| ImageLaneError::Io {
                        path: self.path.clone(),
                        source,
                    })?;
                log::debug!("Read {} bytes from '{}'", data.len(), self.url);
                Ok::<_, ImageLaneError>(Arc::from(data))
            })
            .await
            .cloned()
    }
}

impl fmt::Debug for FileImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileImageSource")
            .field("path", &self.path)
            .field("read", &self.bytes.initialized())
            .field("decoder", &self.decoder)
            .finish()
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    fn url(&self) -> &str {
        &self.url
    }

    async fn load(&self, request: &LoadRequest) -> Result<ImageDimensions, LoadError> {
        let result = match self.bytes().await {
            Ok(bytes) => self.decoder.load(bytes, request).await,
            Err(err) => Err(err),
        };
        result.map_err(|err| LoadError::source(&self.url, err))
    }

    async fn decode_bitmap(&self, request: &LoadRequest) -> Result<ImageBitmap, LoadError> {
        let result = match self.bytes().await {
            Ok(bytes) => self.decoder.bitmap(bytes, request).await,
            Err(err) => Err(err),
        };
        result.map_err(|err| LoadError::source(&self.url, err))
    }
}
