//! Run configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::ResolutionTag;
use crate::error::{DatasetError, Result};
use crate::project::StageMode;
use crate::splits::SplitRatios;

/// Default seed for reproducible splits.
pub const DEFAULT_SEED: u64 = 42;

/// File name of the per-tool split report.
pub const SPLIT_INFO_FILE: &str = "split_info.csv";

/// File name of the JSON run summary.
pub const SUMMARY_FILE: &str = "split_summary.json";

/// Configuration for organizing a dataset into splits.
///
/// # Example
///
/// ```
/// use frame_dataset::SplitConfig;
///
/// let config = SplitConfig::new("data/images", "data/organized").with_seed(7);
/// assert_eq!(config.seed, 7);
/// assert!(!config.dry_run);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Dataset root containing the resolution folders.
    pub input_dir: PathBuf,

    /// Root of the organized output.
    pub output_dir: PathBuf,

    /// Train/val/test ratios.
    #[serde(default)]
    pub ratios: SplitRatios,

    /// Seed for the per-tool shuffle.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Resolution to partition at; defaults to the largest discovered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_resolution: Option<String>,

    /// Resolve and count without writing.
    #[serde(default)]
    pub dry_run: bool,
}

const fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl SplitConfig {
    /// Creates a config with default ratios and seed.
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ratios: SplitRatios::default(),
            seed: DEFAULT_SEED,
            reference_resolution: None,
            dry_run: false,
        }
    }

    /// Loads a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Io`] if the file cannot be read and
    /// [`DatasetError::Serialization`] if it is not a valid config
    /// (including invalid ratios).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| DatasetError::io_at(path, &e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sets the ratios.
    #[must_use]
    pub const fn with_ratios(mut self, ratios: SplitRatios) -> Self {
        self.ratios = ratios;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the reference resolution.
    #[must_use]
    pub fn with_reference(mut self, resolution: impl Into<String>) -> Self {
        self.reference_resolution = Some(resolution.into());
        self
    }

    /// Enables dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Stage mode implied by `dry_run`.
    #[must_use]
    pub const fn stage_mode(&self) -> StageMode {
        if self.dry_run {
            StageMode::DryRun
        } else {
            StageMode::Copy
        }
    }
}

/// Configuration for the down-sampling step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownsampleConfig {
    /// Source resolution directory, e.g. `data/images/3840x2160p`.
    pub source_dir: PathBuf,

    /// Target resolutions, written next to the source directory.
    #[serde(default = "default_targets")]
    pub targets: Vec<ResolutionTag>,

    /// Count work without writing.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_targets() -> Vec<ResolutionTag> {
    vec![ResolutionTag::new(960, 540), ResolutionTag::new(480, 270)]
}

impl DownsampleConfig {
    /// Creates a config with the default 960x540p and 480x270p targets.
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            targets: default_targets(),
            dry_run: false,
        }
    }

    /// Replaces the targets.
    #[must_use]
    pub fn with_targets(mut self, targets: Vec<ResolutionTag>) -> Self {
        self.targets = targets;
        self
    }

    /// Enables dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolution tag of the source directory, taken from its name.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidResolution`] if the directory name is
    /// not a `<width>x<height>p` tag.
    pub fn source_resolution(&self) -> Result<ResolutionTag> {
        let name = self
            .source_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let tag: ResolutionTag = name.parse()?;
        if tag.as_str() == name {
            Ok(tag)
        } else {
            Err(DatasetError::invalid_resolution(name))
        }
    }

    /// Directory the target resolution folders are written into.
    #[must_use]
    pub fn output_base(&self) -> PathBuf {
        self.source_dir
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_config_defaults() {
        let config = SplitConfig::new("in", "out");
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.ratios, SplitRatios::default());
        assert_eq!(config.stage_mode(), StageMode::Copy);
        assert!(config.reference_resolution.is_none());
    }

    #[test]
    fn split_config_builders() {
        let ratios = SplitRatios::new(0.8, 0.1, 0.1).unwrap();
        let config = SplitConfig::new("in", "out")
            .with_ratios(ratios)
            .with_seed(1)
            .with_reference("960x540p")
            .with_dry_run(true);
        assert_eq!(config.ratios, ratios);
        assert_eq!(config.seed, 1);
        assert_eq!(config.reference_resolution.as_deref(), Some("960x540p"));
        assert_eq!(config.stage_mode(), StageMode::DryRun);
    }

    #[test]
    fn split_config_from_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("split.json");
        fs::write(&path, r#"{"input_dir":"a","output_dir":"b","seed":3}"#).unwrap();

        let config = SplitConfig::from_json_file(&path).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("a"));
        assert_eq!(config.seed, 3);
        assert_eq!(config.ratios, SplitRatios::default());
    }

    #[test]
    fn split_config_rejects_bad_ratios() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("split.json");
        fs::write(
            &path,
            r#"{"input_dir":"a","output_dir":"b","ratios":{"train":0.5,"val":0.1,"test":0.1}}"#,
        )
        .unwrap();
        let err = SplitConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, DatasetError::Serialization(_)));
    }

    #[test]
    fn split_config_missing_file() {
        let err = SplitConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, DatasetError::Io(_)));
    }

    #[test]
    fn downsample_config_paths() {
        let config = DownsampleConfig::new("data/images/3840x2160p");
        assert_eq!(config.source_resolution().unwrap(), ResolutionTag::new(3840, 2160));
        assert_eq!(config.output_base(), PathBuf::from("data/images"));
        assert_eq!(config.targets.len(), 2);
    }

    #[test]
    fn downsample_config_bad_source_name() {
        assert!(DownsampleConfig::new("data/images/raw").source_resolution().is_err());
        assert!(DownsampleConfig::new("data/images/3840x2160").source_resolution().is_err());
    }
}
