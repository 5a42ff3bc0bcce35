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

use super::source::ImageDimensions;
use crate::binding::AlphaMode;
use crate::error::ResourceError;
use serde::{Deserialize, Serialize};

/// The credentials mode requested when fetching a cross-origin image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOrigin {
    /// Fetch without credentials.
    Anonymous,
    /// Fetch with credentials.
    UseCredentials,
}

/// Construction options for an [`ImageContentResource`](super::ImageContentResource).
///
/// Options deserialize from any serde format; unknown keys are ignored and the
/// camel-case spellings (`autoLoad`, `createBitmap`, `alphaMode`) are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceOptions {
    /// Start loading as soon as the resource is created.
    #[serde(alias = "autoLoad")]
    pub auto_load: bool,
    /// Decode into an upload-ready bitmap after loading.
    /// `None` falls back to the settings' `create_image_bitmap`.
    #[serde(alias = "createBitmap")]
    pub create_bitmap: Option<bool>,
    /// Alpha mode applied to a binding each time the resource is bound.
    #[serde(alias = "alphaMode")]
    pub alpha_mode: Option<AlphaMode>,
    /// Credentials mode for cross-origin fetches.
    pub crossorigin: Option<CrossOrigin>,
    /// Requested bitmap width. Must be given together with `height`.
    pub width: Option<u32>,
    /// Requested bitmap height. Must be given together with `width`.
    pub height: Option<u32>,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            auto_load: true,
            create_bitmap: None,
            alpha_mode: None,
            crossorigin: None,
            width: None,
            height: None,
        }
    }
}

impl ResourceOptions {
    /// Sets whether loading starts at construction.
    pub fn with_auto_load(mut self, auto_load: bool) -> Self {
        self.auto_load = auto_load;
        self
    }

    /// Forces the bitmap decode path on or off.
    pub fn with_create_bitmap(mut self, create_bitmap: bool) -> Self {
        self.create_bitmap = Some(create_bitmap);
        self
    }

    /// Sets the alpha mode override applied at bind time.
    pub fn with_alpha_mode(mut self, alpha_mode: AlphaMode) -> Self {
        self.alpha_mode = Some(alpha_mode);
        self
    }

    /// Sets the cross-origin credentials mode.
    pub fn with_crossorigin(mut self, crossorigin: CrossOrigin) -> Self {
        self.crossorigin = Some(crossorigin);
        self
    }

    /// Requests a bitmap of the given size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Checks the option combination and builds the request handed to the source.
    pub(crate) fn to_request(&self) -> Result<LoadRequest, ResourceError> {
        let size_hint = match (self.width, self.height) {
            (None, None) => None,
            (Some(0), _) | (_, Some(0)) => {
                return Err(ResourceError::Configuration(
                    "size hint must be non-zero".to_string(),
                ))
            }
            (Some(width), Some(height)) => Some(ImageDimensions::new(width, height)),
            _ => {
                return Err(ResourceError::Configuration(
                    "width and height hints must be given together".to_string(),
                ))
            }
        };

        Ok(LoadRequest {
            crossorigin: self.crossorigin,
            size_hint,
            create_bitmap: false,
        })
    }
}

/// Loading hints passed from a resource to its [`ImageSource`](super::ImageSource).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadRequest {
    /// Credentials mode for cross-origin fetches.
    pub crossorigin: Option<CrossOrigin>,
    /// Requested bitmap size, if any.
    pub size_hint: Option<ImageDimensions>,
    /// A bitmap decode will follow a successful load. Sources may keep the
    /// decoded image around for it instead of decoding twice.
    pub create_bitmap: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ResourceOptions::default();
        assert!(options.auto_load);
        assert_eq!(options.create_bitmap, None);
        assert_eq!(options.alpha_mode, None);
    }

    #[test]
    fn test_options_ignore_unknown_keys() {
        let options: ResourceOptions = serde_json::from_str(
            r#"{ "autoLoad": false, "createBitmap": true, "scaleMode": "linear" }"#,
        )
        .unwrap();
        assert!(!options.auto_load);
        assert_eq!(options.create_bitmap, Some(true));
    }

    #[test]
    fn test_options_parse_alpha_mode_and_crossorigin() {
        let options: ResourceOptions = serde_json::from_str(
            r#"{ "alpha_mode": "PremultipliedAlpha", "crossorigin": "use-credentials" }"#,
        )
        .unwrap();
        assert_eq!(options.alpha_mode, Some(AlphaMode::PremultipliedAlpha));
        assert_eq!(options.crossorigin, Some(CrossOrigin::UseCredentials));
    }

    #[test]
    fn test_size_hint_requires_both_sides() {
        let mut options = ResourceOptions::default();
        options.width = Some(64);
        assert!(matches!(
            options.to_request(),
            Err(ResourceError::Configuration(_))
        ));

        let options = ResourceOptions::default().with_size(64, 0);
        assert!(options.to_request().is_err());

        let request = ResourceOptions::default()
            .with_size(64, 32)
            .with_crossorigin(CrossOrigin::Anonymous)
            .to_request()
            .unwrap();
        assert_eq!(request.size_hint, Some(ImageDimensions::new(64, 32)));
        assert_eq!(request.crossorigin, Some(CrossOrigin::Anonymous));
        assert!(!request.create_bitmap);
    }
}
