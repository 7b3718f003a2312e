//! Error types for frame-dataset crate.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while organizing a frame dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Split ratios are negative, non-finite, or do not sum to 1.0.
    #[error(
        "invalid split ratios {train}/{val}/{test} (sum {sum}, must be non-negative and sum to 1.0)"
    )]
    InvalidRatio {
        /// Training ratio.
        train: f64,
        /// Validation ratio.
        val: f64,
        /// Test ratio.
        test: f64,
        /// Sum of the three ratios.
        sum: f64,
    },

    /// No resolution folders were found under the dataset root.
    #[error("no resolution folders found under {}", .0.display())]
    EmptyDataset(PathBuf),

    /// A name does not match the pattern required for synthesis.
    #[error("malformed name {name:?}: expected {expected}")]
    MalformedName {
        /// The offending name.
        name: String,
        /// Description of the expected pattern.
        expected: &'static str,
    },

    /// A tool key has no folder at one of the discovered resolutions.
    #[error("tool {key} has no folder at resolution {resolution}")]
    MissingToolFolder {
        /// Normalized tool key.
        key: String,
        /// Resolution tag.
        resolution: String,
    },

    /// A configured resolution was not discovered on disk.
    #[error("resolution {0} was not found in the dataset")]
    UnknownResolution(String),

    /// A resolution tag has no parseable dimensions.
    #[error("invalid resolution tag: {0} (expected <width>x<height>p)")]
    InvalidResolution(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Image decode/encode error.
    #[error("image error: {0}")]
    Image(String),
}

impl DatasetError {
    /// Creates an invalid ratio error.
    #[must_use]
    pub fn invalid_ratio(train: f64, val: f64, test: f64) -> Self {
        Self::InvalidRatio {
            train,
            val,
            test,
            sum: train + val + test,
        }
    }

    /// Creates an empty dataset error.
    #[must_use]
    pub fn empty_dataset(root: impl Into<PathBuf>) -> Self {
        Self::EmptyDataset(root.into())
    }

    /// Creates a malformed name error.
    #[must_use]
    pub fn malformed_name(name: impl Into<String>, expected: &'static str) -> Self {
        Self::MalformedName {
            name: name.into(),
            expected,
        }
    }

    /// Creates a missing tool folder error.
    #[must_use]
    pub fn missing_tool_folder(key: impl Into<String>, resolution: impl Into<String>) -> Self {
        Self::MissingToolFolder {
            key: key.into(),
            resolution: resolution.into(),
        }
    }

    /// Creates an unknown resolution error.
    #[must_use]
    pub fn unknown_resolution(tag: impl Into<String>) -> Self {
        Self::UnknownResolution(tag.into())
    }

    /// Creates an invalid resolution error.
    #[must_use]
    pub fn invalid_resolution(tag: impl Into<String>) -> Self {
        Self::InvalidResolution(tag.into())
    }

    /// Creates an IO error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io(reason.into())
    }

    /// Creates an IO error that names the path involved.
    #[must_use]
    pub fn io_at(path: &Path, err: &std::io::Error) -> Self {
        Self::Io(format!("{}: {err}", path.display()))
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization(reason.into())
    }

    /// Creates an image error.
    #[must_use]
    pub fn image(reason: impl Into<String>) -> Self {
        Self::Image(reason.into())
    }

    /// Returns `true` for errors that must abort a run before the output
    /// tree is touched.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InvalidRatio { .. }
                | Self::EmptyDataset(_)
                | Self::UnknownResolution(_)
                | Self::InvalidResolution(_)
        )
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for DatasetError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

/// Result type for frame-dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_ratio() {
        let err = DatasetError::invalid_ratio(0.5, 0.2, 0.2);
        let msg = err.to_string();
        assert!(msg.contains("0.5/0.2/0.2"));
        assert!(msg.contains("sum"));
    }

    #[test]
    fn error_empty_dataset() {
        let err = DatasetError::empty_dataset("/data/images");
        assert!(err.to_string().contains("/data/images"));
    }

    #[test]
    fn error_malformed_name() {
        let err = DatasetError::malformed_name("notes", "<video>_<w>x<h>p_<n>tool");
        assert!(err.to_string().contains("\"notes\""));
        assert!(err.to_string().contains("<n>tool"));
    }

    #[test]
    fn error_missing_tool_folder() {
        let err = DatasetError::missing_tool_folder("vid_001_3tool", "960x540p");
        assert!(err.to_string().contains("vid_001_3tool"));
        assert!(err.to_string().contains("960x540p"));
    }

    #[test]
    fn error_unknown_resolution() {
        let err = DatasetError::unknown_resolution("1920x1080p");
        assert!(err.to_string().contains("1920x1080p"));
    }

    #[test]
    fn error_io_at_names_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err = DatasetError::io_at(Path::new("/tmp/x"), &io_err);
        assert!(err.to_string().contains("/tmp/x"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: DatasetError = io_err.into();
        assert!(matches!(err, DatasetError::Io(_)));
    }

    #[test]
    fn error_from_serde_error() {
        let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: DatasetError = json_err.into();
        assert!(matches!(err, DatasetError::Serialization(_)));
    }

    #[test]
    fn structural_errors() {
        assert!(DatasetError::invalid_ratio(1.0, 1.0, 1.0).is_structural());
        assert!(DatasetError::empty_dataset("/x").is_structural());
        assert!(!DatasetError::io("disk full").is_structural());
        assert!(!DatasetError::malformed_name("x", "y").is_structural());
    }
}
