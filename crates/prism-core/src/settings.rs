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

//! Process-wide settings for the preparation pipeline.
//!
//! Settings are an explicit value that can be threaded through construction.
//! A single process-scoped default is kept for callers that do not pass one:
//! it is installed once at startup with [`PrepareSettings::install`] and only
//! read afterwards. Reading it before installation freezes the defaults.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

static GLOBAL_SETTINGS: OnceLock<PrepareSettings> = OnceLock::new();

/// A collection of settings that affect how resources are prepared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareSettings {
    /// Default for [`ResourceOptions::create_bitmap`](crate::ResourceOptions::create_bitmap)
    /// when a resource does not specify it.
    pub create_image_bitmap: bool,
    /// Uploads allowed per frame by a count-based limiter.
    pub uploads_per_frame: usize,
    /// Per-frame upload time budget in milliseconds. `0.0` disables time limiting.
    pub frame_time_limit_ms: f64,
    /// Frames without progress after which a non-empty queue is reported as stalled.
    /// `0` disables stall detection.
    pub stall_frames: u64,
}

impl Default for PrepareSettings {
    fn default() -> Self {
        Self {
            create_image_bitmap: false,
            uploads_per_frame: 4,
            frame_time_limit_ms: 0.0,
            stall_frames: 600,
        }
    }
}

impl PrepareSettings {
    /// Parses settings from a RON document. Missing fields keep their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(text)?)
    }

    /// Reads and parses a RON settings file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_ron_str(&text)?;
        log::info!("Loaded preparation settings from {}", path.display());
        Ok(settings)
    }

    /// Installs these settings as the process-wide default.
    ///
    /// Fails if settings were already installed, or if the defaults were
    /// already frozen by a call to [`PrepareSettings::global`].
    pub fn install(self) -> Result<(), SettingsError> {
        GLOBAL_SETTINGS
            .set(self)
            .map_err(|_| SettingsError::AlreadyInstalled)?;
        log::debug!("Installed process-wide preparation settings");
        Ok(())
    }

    /// Returns the process-wide settings, freezing the defaults if none were installed.
    pub fn global() -> &'static PrepareSettings {
        GLOBAL_SETTINGS.get_or_init(PrepareSettings::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PrepareSettings::default();
        assert!(!settings.create_image_bitmap);
        assert_eq!(settings.uploads_per_frame, 4);
        assert_eq!(settings.frame_time_limit_ms, 0.0);
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let settings =
            PrepareSettings::from_ron_str("(create_image_bitmap: true, uploads_per_frame: 8)")
                .unwrap();
        assert!(settings.create_image_bitmap);
        assert_eq!(settings.uploads_per_frame, 8);
        assert_eq!(settings.stall_frames, PrepareSettings::default().stall_frames);
    }

    #[test]
    fn test_invalid_ron_is_a_parse_error() {
        let result = PrepareSettings::from_ron_str("(uploads_per_frame: \"many\")");
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = PrepareSettings::load_from_file("does/not/exist/prism.ron");
        assert!(matches!(result, Err(SettingsError::Io { .. })));
    }
}
