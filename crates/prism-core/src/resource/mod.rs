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

//! Image-backed texture resources and their loading lifecycle.
//!
//! An [`ImageContentResource`] wraps one [`ImageSource`] and tracks whether it
//! has loaded, its natural size, and an optional decoded [`ImageBitmap`]. The
//! load runs at most once, in a task of its own; every caller of
//! [`ImageContentResource::load`] waits on that task's outcome, so dropping a
//! caller never cancels the load.

mod options;
mod source;

pub use options::{CrossOrigin, LoadRequest, ResourceOptions};
pub use source::{ImageBitmap, ImageDimensions, ImageSource};

use crate::binding::AlphaMode;
use crate::error::{LoadError, ResourceError};
use crate::settings::PrepareSettings;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};

const ACTIVE: u8 = 0;
const DESTROYING: u8 = 1;
const DESTROYED: u8 = 2;

/// The observable loading state of an [`ImageContentResource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceStatus {
    /// No load has been requested yet.
    Unloaded,
    /// A load is in flight.
    Loading,
    /// The image loaded with a non-zero size and can be uploaded.
    Ready,
    /// The load failed. The failure is final.
    Failed,
    /// The resource was destroyed.
    Destroyed,
}

#[derive(Debug, Default)]
struct ContentState {
    width: u32,
    height: u32,
    valid: bool,
    bitmap: Option<ImageBitmap>,
}

/// A texture source backed by a single external image.
///
/// Resources are shared through [`Arc`]: the preparation queue, texture
/// bindings and the caller may all hold the same one. Teardown through
/// [`destroy`](Self::destroy) is idempotent and wins over any load still in
/// flight.
pub struct ImageContentResource {
    url: String,
    source: Mutex<Option<Arc<dyn ImageSource>>>,
    lifecycle: AtomicU8,
    state: Mutex<ContentState>,
    create_bitmap: bool,
    alpha_mode: Option<AlphaMode>,
    request: LoadRequest,
    started: AtomicBool,
    outcome: watch::Sender<Option<Result<(), LoadError>>>,
    cancel: Notify,
}

impl ImageContentResource {
    /// Creates a resource using the process-wide [`PrepareSettings`].
    ///
    /// With `auto_load` set (the default) the load is spawned right away on the
    /// ambient tokio runtime.
    pub fn new(
        source: Arc<dyn ImageSource>,
        options: ResourceOptions,
    ) -> Result<Arc<Self>, ResourceError> {
        Self::with_settings(source, options, PrepareSettings::global())
    }

    /// Creates a resource, resolving unspecified options from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Configuration`] if the size hints are
    /// malformed, or if `auto_load` is requested outside a tokio runtime.
    pub fn with_settings(
        source: Arc<dyn ImageSource>,
        options: ResourceOptions,
        settings: &PrepareSettings,
    ) -> Result<Arc<Self>, ResourceError> {
        let request = options.to_request()?;
        if options.auto_load && Handle::try_current().is_err() {
            return Err(ResourceError::Configuration(
                "auto_load requires a running tokio runtime".to_string(),
            ));
        }

        let resource = Arc::new(Self {
            url: source.url().to_string(),
            source: Mutex::new(Some(source)),
            lifecycle: AtomicU8::new(ACTIVE),
            state: Mutex::new(ContentState::default()),
            create_bitmap: options
                .create_bitmap
                .unwrap_or(settings.create_image_bitmap),
            alpha_mode: options.alpha_mode,
            request,
            started: AtomicBool::new(false),
            outcome: watch::Sender::new(None),
            cancel: Notify::new(),
        });

        if options.auto_load {
            resource.spawn_load()?;
        }
        Ok(resource)
    }

    /// Loads the image, using the resource's own `create_bitmap` choice.
    pub async fn load(self: &Arc<Self>) -> Result<(), LoadError> {
        self.load_with(None).await
    }

    /// Loads the image, optionally overriding whether a bitmap is decoded.
    ///
    /// Only the first call starts the load. Concurrent and later callers get
    /// the same outcome, and the override is ignored once a load has started.
    /// Dropping the returned future stops waiting but leaves the load running.
    pub async fn load_with(self: &Arc<Self>, create_bitmap: Option<bool>) -> Result<(), LoadError> {
        let create_bitmap = create_bitmap.unwrap_or(self.create_bitmap);
        if let Err(err) = self.start(create_bitmap) {
            return Err(LoadError::source(&self.url, err));
        }

        let mut outcome = self.outcome.subscribe();
        let result = match outcome.wait_for(Option::is_some).await {
            Ok(done) => done.clone().unwrap_or(Err(LoadError::Destroyed)),
            // The sender lives in `self`, so the channel outlives this borrow.
            Err(_) => Err(LoadError::Destroyed),
        };
        result
    }

    /// Starts loading on the ambient tokio runtime if it has not started yet.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NoRuntime`] when called outside a runtime.
    pub fn spawn_load(self: &Arc<Self>) -> Result<(), ResourceError> {
        self.start(self.create_bitmap)
    }

    fn start(self: &Arc<Self>, create_bitmap: bool) -> Result<(), ResourceError> {
        let handle = Handle::try_current().map_err(|_| ResourceError::NoRuntime)?;
        if self.started.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let resource = Arc::clone(self);
        handle.spawn(async move {
            let result = resource.run_load(create_bitmap).await;
            if let Err(err) = &result {
                log::debug!("Load of '{}' ended: {err}", resource.url);
            }
            resource.outcome.send_replace(Some(result));
        });
        Ok(())
    }

    async fn run_load(&self, create_bitmap: bool) -> Result<(), LoadError> {
        let Some(source) = self.current_source() else {
            return Err(LoadError::Destroyed);
        };
        log::trace!("Loading image '{}'", self.url);

        let request = LoadRequest {
            create_bitmap,
            ..self.request
        };
        let work = async {
            let dimensions = source.load(&request).await?;
            if dimensions.is_empty() {
                return Err(LoadError::EmptyImage {
                    url: self.url.clone(),
                });
            }

            let bitmap = if create_bitmap {
                match source.decode_bitmap(&request).await {
                    Ok(bitmap) => Some(bitmap),
                    Err(err) => {
                        log::warn!("Bitmap decode failed for '{}': {err}", self.url);
                        None
                    }
                }
            } else {
                None
            };
            Ok((dimensions, bitmap))
        };

        let result = tokio::select! {
            biased;
            _ = self.cancel.notified() => Err(LoadError::Destroyed),
            result = work => result,
        };
        self.commit(result)
    }

    fn commit(
        &self,
        result: Result<(ImageDimensions, Option<ImageBitmap>), LoadError>,
    ) -> Result<(), LoadError> {
        let mut state = self.lock_state();
        if self.lifecycle.load(Ordering::Acquire) != ACTIVE {
            log::debug!("Dropping late load result for destroyed '{}'", self.url);
            return Err(LoadError::Destroyed);
        }

        match result {
            Ok((dimensions, bitmap)) => {
                state.width = dimensions.width;
                state.height = dimensions.height;
                state.valid = true;
                state.bitmap = bitmap;
                log::debug!(
                    "Image '{}' ready ({}x{}, bitmap: {})",
                    self.url,
                    dimensions.width,
                    dimensions.height,
                    state.bitmap.is_some()
                );
                Ok(())
            }
            Err(err) => {
                log::warn!("{err}");
                Err(err)
            }
        }
    }

    /// Releases the source and any decoded bitmap.
    ///
    /// Safe to call any number of times, before, during or after a load. A load
    /// still in flight resolves with [`LoadError::Destroyed`] and commits nothing.
    pub fn destroy(&self) {
        if self
            .lifecycle
            .compare_exchange(ACTIVE, DESTROYING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        self.cancel.notify_one();
        let source = self
            .source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(source);
        *self.lock_state() = ContentState::default();

        self.lifecycle.store(DESTROYED, Ordering::Release);
        log::debug!("Destroyed image resource '{}'", self.url);
    }

    fn current_source(&self) -> Option<Arc<dyn ImageSource>> {
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, ContentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Natural width in pixels, `0` until loaded.
    pub fn width(&self) -> u32 {
        self.lock_state().width
    }

    /// Natural height in pixels, `0` until loaded.
    pub fn height(&self) -> u32 {
        self.lock_state().height
    }

    /// `true` once the image loaded successfully with a non-zero size.
    pub fn valid(&self) -> bool {
        self.lock_state().valid
    }

    /// The source url, possibly empty.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The decoded bitmap, if the bitmap path ran and succeeded.
    pub fn bitmap(&self) -> Option<ImageBitmap> {
        self.lock_state().bitmap.clone()
    }

    /// The alpha mode override applied when the resource is bound.
    pub fn alpha_mode(&self) -> Option<AlphaMode> {
        self.alpha_mode
    }

    /// Whether a bitmap is decoded after loading.
    pub fn create_bitmap(&self) -> bool {
        self.create_bitmap
    }

    /// `true` once [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle.load(Ordering::Acquire) != ACTIVE
    }

    /// The load failure, if the load finished with one.
    pub fn load_error(&self) -> Option<LoadError> {
        match &*self.outcome.borrow() {
            Some(Err(err)) => Some(err.clone()),
            _ => None,
        }
    }

    /// The current loading state.
    pub fn status(&self) -> ResourceStatus {
        if self.is_destroyed() {
            return ResourceStatus::Destroyed;
        }
        match &*self.outcome.borrow() {
            Some(Ok(())) => ResourceStatus::Ready,
            Some(Err(_)) => ResourceStatus::Failed,
            None if self.started.load(Ordering::Acquire) => ResourceStatus::Loading,
            None => ResourceStatus::Unloaded,
        }
    }
}

impl fmt::Debug for ImageContentResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("ImageContentResource")
            .field("url", &self.url)
            .field("status", &self.status())
            .field("width", &state.width)
            .field("height", &state.height)
            .field("bitmap", &state.bitmap.is_some())
            .field("alpha_mode", &self.alpha_mode)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{FixedSource, GatedSource, SlowSource};
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn manual(options: ResourceOptions) -> ResourceOptions {
        options.with_auto_load(false)
    }

    #[test]
    fn never_loaded_resource_is_empty() {
        let resource = ImageContentResource::new(
            Arc::new(FixedSource::new(100, 100)),
            manual(ResourceOptions::default()),
        )
        .unwrap();

        assert_eq!(resource.width(), 0);
        assert_eq!(resource.height(), 0);
        assert!(!resource.valid());
        assert!(resource.bitmap().is_none());
        assert_eq!(resource.status(), ResourceStatus::Unloaded);
        assert_eq!(resource.url(), "fixed://100x100");
    }

    #[tokio::test]
    async fn successful_load_sets_dimensions() {
        let resource = ImageContentResource::new(
            Arc::new(FixedSource::new(100, 100)),
            manual(ResourceOptions::default()),
        )
        .unwrap();

        resource.load().await.unwrap();

        assert!(resource.valid());
        assert_eq!(resource.width(), 100);
        assert_eq!(resource.height(), 100);
        assert_eq!(resource.status(), ResourceStatus::Ready);
    }

    #[tokio::test]
    async fn load_runs_once_for_every_caller() {
        let source = Arc::new(FixedSource::new(8, 8));
        let resource =
            ImageContentResource::new(source.clone(), manual(ResourceOptions::default())).unwrap();

        let (first, second) = tokio::join!(resource.load(), resource.load());
        assert!(first.is_ok() && second.is_ok());
        resource.load().await.unwrap();

        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_is_final_and_shared() {
        let source = Arc::new(FixedSource::failing("404 not found"));
        let resource =
            ImageContentResource::new(source.clone(), manual(ResourceOptions::default())).unwrap();

        let first = resource.load().await.unwrap_err();
        let second = resource.load().await.unwrap_err();

        assert_eq!(first, second);
        assert!(!resource.valid());
        assert_eq!(resource.width(), 0);
        assert_eq!(resource.status(), ResourceStatus::Failed);
        assert_eq!(resource.load_error(), Some(first));
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_sized_image_is_a_load_error() {
        let resource = ImageContentResource::new(
            Arc::new(FixedSource::new(0, 16)),
            manual(ResourceOptions::default()),
        )
        .unwrap();

        let err = resource.load().await.unwrap_err();
        assert!(matches!(err, LoadError::EmptyImage { .. }));
        assert!(!resource.valid());
    }

    #[tokio::test]
    async fn bitmap_follows_create_bitmap_option() {
        let decoding = Arc::new(FixedSource::new(4, 4));
        let with_bitmap = ImageContentResource::new(
            decoding.clone(),
            manual(ResourceOptions::default().with_create_bitmap(true)),
        )
        .unwrap();
        with_bitmap.load().await.unwrap();
        let bitmap = with_bitmap.bitmap().expect("bitmap should be decoded");
        assert_eq!((bitmap.width(), bitmap.height()), (4, 4));
        assert!(decoding.bitmap_requested.load(Ordering::SeqCst));

        let source = Arc::new(FixedSource::new(4, 4));
        let without_bitmap = ImageContentResource::new(
            source.clone(),
            manual(ResourceOptions::default().with_create_bitmap(false)),
        )
        .unwrap();
        without_bitmap.load().await.unwrap();
        assert!(without_bitmap.bitmap().is_none());
        assert_eq!(source.decodes.load(Ordering::SeqCst), 0);
        assert!(!source.bitmap_requested.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn load_override_beats_resource_choice() {
        let resource = ImageContentResource::new(
            Arc::new(FixedSource::new(4, 4)),
            manual(ResourceOptions::default().with_create_bitmap(false)),
        )
        .unwrap();

        resource.load_with(Some(true)).await.unwrap();
        assert!(resource.bitmap().is_some());
    }

    #[tokio::test]
    async fn bitmap_failure_is_not_fatal() {
        let resource = ImageContentResource::new(
            Arc::new(FixedSource::new(4, 4).with_broken_bitmap()),
            manual(ResourceOptions::default().with_create_bitmap(true)),
        )
        .unwrap();

        resource.load().await.unwrap();
        assert!(resource.valid());
        assert!(resource.bitmap().is_none());
    }

    #[test]
    fn create_bitmap_defaults_to_settings() {
        let settings = PrepareSettings {
            create_image_bitmap: true,
            ..PrepareSettings::default()
        };

        let inherited = ImageContentResource::with_settings(
            Arc::new(FixedSource::new(1, 1)),
            manual(ResourceOptions::default()),
            &settings,
        )
        .unwrap();
        assert!(inherited.create_bitmap());

        let explicit = ImageContentResource::with_settings(
            Arc::new(FixedSource::new(1, 1)),
            manual(ResourceOptions::default().with_create_bitmap(false)),
            &settings,
        )
        .unwrap();
        assert!(!explicit.create_bitmap());
    }

    #[test]
    fn auto_load_without_runtime_is_rejected() {
        let result = ImageContentResource::new(
            Arc::new(FixedSource::new(1, 1)),
            ResourceOptions::default(),
        );
        assert!(matches!(result, Err(ResourceError::Configuration(_))));
    }

    #[test]
    fn spawn_load_without_runtime_fails() {
        let resource = ImageContentResource::new(
            Arc::new(FixedSource::new(1, 1)),
            manual(ResourceOptions::default()),
        )
        .unwrap();
        assert_eq!(resource.spawn_load(), Err(ResourceError::NoRuntime));
        assert_eq!(resource.status(), ResourceStatus::Unloaded);
    }

    #[tokio::test]
    async fn auto_load_starts_immediately() {
        let source = Arc::new(FixedSource::new(100, 100));
        let resource = ImageContentResource::new(source.clone(), ResourceOptions::default()).unwrap();
        assert_eq!(resource.status(), ResourceStatus::Loading);

        resource.load().await.unwrap();
        assert!(resource.valid());
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn destroy_is_idempotent() {
        let resource = ImageContentResource::new(
            Arc::new(FixedSource::new(1, 1)),
            manual(ResourceOptions::default()),
        )
        .unwrap();

        resource.destroy();
        resource.destroy();

        assert!(resource.is_destroyed());
        assert_eq!(resource.status(), ResourceStatus::Destroyed);
        assert!(resource.bitmap().is_none());
    }

    #[tokio::test]
    async fn destroy_before_load_skips_the_source() {
        let source = Arc::new(FixedSource::new(10, 10));
        let resource =
            ImageContentResource::new(source.clone(), manual(ResourceOptions::default())).unwrap();

        resource.destroy();
        assert_eq!(resource.load().await, Err(LoadError::Destroyed));
        assert_eq!(source.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn destroy_during_load_commits_nothing() {
        let gate = Arc::new(Notify::new());
        let resource = ImageContentResource::new(
            Arc::new(GatedSource { gate: gate.clone() }),
            manual(ResourceOptions::default()),
        )
        .unwrap();

        let pending = tokio::spawn({
            let resource = Arc::clone(&resource);
            async move { resource.load().await }
        });
        tokio::task::yield_now().await;

        resource.destroy();
        gate.notify_one();

        assert_eq!(pending.await.unwrap(), Err(LoadError::Destroyed));
        assert!(!resource.valid());
        assert_eq!(resource.width(), 0);
        assert_eq!(resource.status(), ResourceStatus::Destroyed);
    }

    #[tokio::test]
    async fn abandoned_load_keeps_running() {
        let source = Arc::new(SlowSource {
            delay: Duration::from_millis(50),
            loads: AtomicUsize::new(0),
        });
        let resource =
            ImageContentResource::new(source.clone(), manual(ResourceOptions::default())).unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(5), resource.load()).await;
        assert!(waited.is_err());
        assert_eq!(resource.status(), ResourceStatus::Loading);

        resource.load().await.unwrap();
        assert!(resource.valid());
        assert_eq!(resource.width(), 16);
        assert_eq!(resource.status(), ResourceStatus::Ready);
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_size_hint_is_a_configuration_error() {
        let mut options = manual(ResourceOptions::default());
        options.height = Some(12);
        let result = ImageContentResource::new(Arc::new(FixedSource::new(1, 1)), options);
        assert!(matches!(result, Err(ResourceError::Configuration(_))));
    }
}
