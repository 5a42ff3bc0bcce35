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

//! Defines the hierarchy of error types for texture resources and their settings.

use std::fmt;

/// An error produced while loading an image-backed resource.
///
/// Load errors are shared by every caller awaiting the same resource, so they
/// carry owned, cloneable context instead of the underlying error object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The underlying source failed to fetch or decode the image.
    Source {
        /// The url of the failing source, possibly empty.
        url: String,
        /// The rendered message of the underlying error.
        message: String,
    },
    /// The source finished loading but reported an empty image.
    EmptyImage {
        /// The url of the failing source, possibly empty.
        url: String,
    },
    /// The resource was destroyed before its load could complete.
    Destroyed,
}

impl LoadError {
    /// Builds a [`LoadError::Source`] from any displayable error.
    pub fn source(url: impl Into<String>, error: impl fmt::Display) -> Self {
        LoadError::Source {
            url: url.into(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Source { url, message } => {
                write!(f, "Failed to load image '{url}': {message}")
            }
            LoadError::EmptyImage { url } => {
                write!(f, "Image '{url}' loaded with a zero width or height")
            }
            LoadError::Destroyed => {
                write!(f, "The resource was destroyed before its load completed.")
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// An error raised synchronously while constructing or driving a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The resource options contain a structurally invalid combination.
    Configuration(String),
    /// A load was requested but no async runtime is available to run it.
    NoRuntime,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Configuration(msg) => {
                write!(f, "Invalid resource configuration: {msg}")
            }
            ResourceError::NoRuntime => {
                write!(f, "No async runtime is available to load the resource.")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// An error raised when binding a resource to a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The binding has no resource, or the resource is no longer usable.
    InvalidArgument(String),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::InvalidArgument(msg) => write!(f, "Invalid binding argument: {msg}"),
        }
    }
}

impl std::error::Error for BindError {}

/// An error related to loading or installing the preparation settings.
#[derive(Debug)]
pub enum SettingsError {
    /// The process-wide settings were already installed or read.
    AlreadyInstalled,
    /// The settings file could not be read.
    Io {
        /// The path that failed to read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The settings text is not valid RON for [`PrepareSettings`](crate::PrepareSettings).
    Parse(ron::error::SpannedError),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::AlreadyInstalled => {
                write!(f, "Preparation settings were already installed for this process.")
            }
            SettingsError::Io { path, source } => {
                write!(f, "Failed to read settings from '{path}': {source}")
            }
            SettingsError::Parse(err) => write!(f, "Failed to parse settings: {err}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io { source, .. } => Some(source),
            SettingsError::Parse(err) => Some(err),
            SettingsError::AlreadyInstalled => None,
        }
    }
}

impl From<ron::error::SpannedError> for SettingsError {
    fn from(err: ron::error::SpannedError) -> Self {
        SettingsError::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_display() {
        let err = LoadError::source("assets/slug.png", "unexpected end of file");
        assert_eq!(
            format!("{err}"),
            "Failed to load image 'assets/slug.png': unexpected end of file"
        );

        let err = LoadError::EmptyImage {
            url: "blank.png".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Image 'blank.png' loaded with a zero width or height"
        );
    }

    #[test]
    fn load_errors_are_shared_by_value() {
        let err = LoadError::source("", "boom");
        let shared = err.clone();
        assert_eq!(err, shared);
    }

    #[test]
    fn resource_and_bind_error_display() {
        let err = ResourceError::Configuration("width given without height".to_string());
        assert_eq!(
            format!("{err}"),
            "Invalid resource configuration: width given without height"
        );

        let err = BindError::InvalidArgument("resource destroyed".to_string());
        assert_eq!(format!("{err}"), "Invalid binding argument: resource destroyed");
    }

    #[test]
    fn settings_io_error_exposes_source() {
        use std::error::Error;

        let err = SettingsError::Io {
            path: "missing.ron".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.source().is_some());
        assert!(SettingsError::AlreadyInstalled.source().is_none());
    }
}
