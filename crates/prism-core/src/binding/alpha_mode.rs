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

//! Defines how a texture's color channels relate to its alpha channel.

use serde::{Deserialize, Serialize};

/// Specifies whether texel colors are, or should become, premultiplied by alpha.
///
/// The renderer uses this to pick the blend equation for a texture and to decide
/// whether the upload must premultiply on the way to the GPU.
///
/// # Examples
///
/// ```
/// use prism_core::AlphaMode;
///
/// // Most decoded images are straight alpha and get premultiplied on upload.
/// assert_eq!(AlphaMode::default(), AlphaMode::PremultiplyOnUpload);
///
/// // Numeric codes are accepted for interop with serialized scenes.
/// assert_eq!(AlphaMode::try_from(2), Ok(AlphaMode::PremultipliedAlpha));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AlphaMode {
    /// Colors are straight alpha and are uploaded as-is.
    NoPremultipliedAlpha = 0,

    /// Colors are straight alpha and are premultiplied while uploading.
    #[default]
    PremultiplyOnUpload = 1,

    /// Colors are already premultiplied by alpha in the source data.
    PremultipliedAlpha = 2,
}

impl AlphaMode {
    /// Returns `true` if the texture is premultiplied once it reaches the GPU.
    pub fn is_premultiplied_on_gpu(self) -> bool {
        !matches!(self, AlphaMode::NoPremultipliedAlpha)
    }
}

impl TryFrom<u8> for AlphaMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AlphaMode::NoPremultipliedAlpha),
            1 => Ok(AlphaMode::PremultiplyOnUpload),
            2 => Ok(AlphaMode::PremultipliedAlpha),
            other => Err(other),
        }
    }
}

impl From<AlphaMode> for u8 {
    fn from(mode: AlphaMode) -> Self {
        mode as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_mode_default() {
        assert_eq!(AlphaMode::default(), AlphaMode::PremultiplyOnUpload);
    }

    #[test]
    fn test_alpha_mode_numeric_codes() {
        assert_eq!(AlphaMode::try_from(0), Ok(AlphaMode::NoPremultipliedAlpha));
        assert_eq!(AlphaMode::try_from(1), Ok(AlphaMode::PremultiplyOnUpload));
        assert_eq!(u8::from(AlphaMode::PremultipliedAlpha), 2);
        assert_eq!(AlphaMode::try_from(3), Err(3));
    }

    #[test]
    fn test_alpha_mode_gpu_premultiplication() {
        assert!(!AlphaMode::NoPremultipliedAlpha.is_premultiplied_on_gpu());
        assert!(AlphaMode::PremultiplyOnUpload.is_premultiplied_on_gpu());
        assert!(AlphaMode::PremultipliedAlpha.is_premultiplied_on_gpu());
    }
}
