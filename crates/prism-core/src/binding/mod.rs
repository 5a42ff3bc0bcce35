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

//! Renderer-facing texture metadata coupled to an image resource.
//!
//! A [`TextureBinding`] is what the renderer looks at when it binds a texture:
//! the effective [`AlphaMode`] and the finalized size. The binding only shares
//! its resource; many bindings may point at the same one, and destroying the
//! resource never invalidates the binding's own fields.

mod alpha_mode;

pub use alpha_mode::AlphaMode;

use crate::error::BindError;
use crate::resource::{ImageContentResource, ImageDimensions};
use std::sync::Arc;

/// Texture metadata the renderer reads when binding a resource.
#[derive(Debug, Clone, Default)]
pub struct TextureBinding {
    resource: Option<Arc<ImageContentResource>>,
    alpha_mode: AlphaMode,
    size: Option<ImageDimensions>,
    bind_count: u64,
}

impl TextureBinding {
    /// Creates a binding with no resource and the default alpha mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a binding attached to `resource`. Nothing is applied until it is bound.
    pub fn from_resource(resource: Arc<ImageContentResource>) -> Self {
        Self {
            resource: Some(resource),
            ..Self::default()
        }
    }

    /// Attaches `resource` and binds it.
    ///
    /// If the resource carries an alpha mode override, it replaces the binding's
    /// alpha mode. Otherwise the value set by the owner is kept.
    pub fn bind(&mut self, resource: &Arc<ImageContentResource>) -> Result<(), BindError> {
        Self::check_usable(resource)?;
        self.resource = Some(Arc::clone(resource));
        self.apply(resource.as_ref());
        Ok(())
    }

    /// Binds the attached resource again, re-reading its override.
    pub fn rebind(&mut self) -> Result<(), BindError> {
        let resource = self
            .resource
            .clone()
            .ok_or_else(|| BindError::InvalidArgument("no resource attached".to_string()))?;
        Self::check_usable(&resource)?;
        self.apply(resource.as_ref());
        Ok(())
    }

    fn check_usable(resource: &ImageContentResource) -> Result<(), BindError> {
        if resource.is_destroyed() {
            return Err(BindError::InvalidArgument(format!(
                "resource '{}' has been destroyed",
                resource.url()
            )));
        }
        Ok(())
    }

    fn apply(&mut self, resource: &ImageContentResource) {
        if let Some(mode) = resource.alpha_mode() {
            self.alpha_mode = mode;
        }
        if resource.valid() {
            self.size = Some(ImageDimensions::new(resource.width(), resource.height()));
        }
        self.bind_count += 1;
        log::trace!(
            "Bound '{}' with alpha mode {:?}",
            resource.url(),
            self.alpha_mode
        );
    }

    /// Sets the alpha mode used when the resource has no override.
    pub fn set_alpha_mode(&mut self, mode: AlphaMode) {
        self.alpha_mode = mode;
    }

    /// Returns the effective alpha mode.
    pub fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    /// Returns the size finalized at the last bind of a valid resource.
    pub fn size(&self) -> Option<ImageDimensions> {
        self.size
    }

    /// Returns the attached resource, if any.
    pub fn resource(&self) -> Option<&Arc<ImageContentResource>> {
        self.resource.as_ref()
    }

    /// Returns how many times the binding was successfully bound.
    pub fn bind_count(&self) -> u64 {
        self.bind_count
    }
}
