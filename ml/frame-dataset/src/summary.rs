//! Run statistics and per-tool split records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::{ResolutionTag, ToolKey};
use crate::project::ProjectionCounts;
use crate::splits::{Partition, Split};

/// One row of the split report: how one tool key was partitioned.
///
/// # Example
///
/// ```
/// use frame_dataset::{Partition, ToolSplitRecord, normalize_tool_folder};
///
/// let key = normalize_tool_folder("vid_001_3840x2160p_2tool");
/// let partition = Partition { train: vec![1, 2, 3], val: vec![4], test: vec![5] };
/// let record = ToolSplitRecord::new(&key, "vid_001_3840x2160p_2tool", &partition);
/// assert_eq!(record.total_frames, 5);
/// assert_eq!(record.train_frames, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSplitRecord {
    /// Resolution-independent tool key.
    pub normalized_tool_folder: String,

    /// Folder name at the reference resolution.
    pub reference_folder: String,

    /// Frames found at the reference resolution.
    pub total_frames: usize,

    /// Frames assigned to train.
    pub train_frames: usize,

    /// Frames assigned to val.
    pub val_frames: usize,

    /// Frames assigned to test.
    pub test_frames: usize,
}

impl ToolSplitRecord {
    /// Builds the record for `key` from its partition.
    #[must_use]
    pub fn new<T>(key: &ToolKey, reference_folder: &str, partition: &Partition<T>) -> Self {
        Self {
            normalized_tool_folder: key.to_string(),
            reference_folder: reference_folder.to_string(),
            total_frames: partition.len(),
            train_frames: partition.train.len(),
            val_frames: partition.val.len(),
            test_frames: partition.test.len(),
        }
    }

    /// Frames assigned to `split`.
    #[must_use]
    pub const fn frames(&self, split: Split) -> usize {
        match split {
            Split::Train => self.train_frames,
            Split::Val => self.val_frames,
            Split::Test => self.test_frames,
        }
    }
}

/// A tool key that was dropped during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTool {
    /// Tool key.
    pub key: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Per-split, per-resolution frame counts for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    /// Resolutions in discovery order.
    pub resolutions: Vec<ResolutionTag>,

    /// Staged frames per split and resolution.
    pub frames: BTreeMap<Split, BTreeMap<ResolutionTag, usize>>,

    /// Tool keys that were partitioned and projected.
    pub processed_tool_keys: usize,

    /// Source files missing at some resolution.
    pub missing_files: usize,

    /// Reference files without a frame index.
    pub skipped_frames: usize,

    /// Tool keys skipped entirely.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_tool_keys: Vec<SkippedTool>,
}

impl DatasetStats {
    /// Zeroed statistics over `resolutions`.
    #[must_use]
    pub fn new(resolutions: &[ResolutionTag]) -> Self {
        let frames = Split::ALL
            .into_iter()
            .map(|split| {
                let per_res = resolutions.iter().map(|r| (r.clone(), 0)).collect();
                (split, per_res)
            })
            .collect();
        Self {
            resolutions: resolutions.to_vec(),
            frames,
            ..Self::default()
        }
    }

    /// Adds the counts of one tool key's projection.
    pub fn record(&mut self, counts: &ProjectionCounts) {
        for (split, per_res) in &counts.staged {
            let totals = self.frames.entry(*split).or_default();
            for (resolution, count) in per_res {
                *totals.entry(resolution.clone()).or_insert(0) += count;
            }
        }
        self.missing_files += counts.missing;
        self.skipped_frames += counts.skipped_frames;
        self.processed_tool_keys += 1;
    }

    /// Records a skipped tool key.
    pub fn skip(&mut self, key: &ToolKey, reason: impl Into<String>) {
        self.skipped_tool_keys.push(SkippedTool {
            key: key.to_string(),
            reason: reason.into(),
        });
    }

    /// Frames staged for `split` at `resolution`.
    #[must_use]
    pub fn count(&self, split: Split, resolution: &ResolutionTag) -> usize {
        self.frames
            .get(&split)
            .and_then(|per_res| per_res.get(resolution))
            .copied()
            .unwrap_or(0)
    }

    /// Frames staged for `split` across resolutions.
    #[must_use]
    pub fn split_total(&self, split: Split) -> usize {
        self.frames.get(&split).map_or(0, |per_res| per_res.values().sum())
    }

    /// Frames staged overall.
    #[must_use]
    pub fn grand_total(&self) -> usize {
        Split::ALL.into_iter().map(|s| self.split_total(s)).sum()
    }

    /// Fraction of all staged frames that went to `split`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn split_fraction(&self, split: Split) -> f64 {
        let total = self.grand_total();
        if total == 0 {
            0.0
        } else {
            self.split_total(split) as f64 / total as f64
        }
    }

    /// Returns true if nothing was staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grand_total() == 0
    }

    /// Returns a human-readable summary string.
    #[must_use]
    // String::write_fmt is infallible
    #[allow(clippy::let_underscore_must_use, clippy::cast_precision_loss)]
    pub fn to_report(&self) -> String {
        use std::fmt::Write;

        let mut report = String::new();
        let _ = writeln!(report, "Dataset Organization Summary");
        let _ = writeln!(report, "============================");

        for split in Split::ALL {
            let split_total = self.split_total(split);
            let _ = writeln!(report, "\n{} split:", split.as_str().to_uppercase());
            let _ = writeln!(report, "  Total frames: {split_total}");
            for resolution in &self.resolutions {
                let count = self.count(split, resolution);
                let pct = if split_total > 0 {
                    count as f64 / split_total as f64 * 100.0
                } else {
                    0.0
                };
                let _ = writeln!(report, "  {resolution}: {count} frames ({pct:.1}%)");
            }
        }

        let _ = writeln!(report, "\nGrand total: {} frames", self.grand_total());
        if !self.is_empty() {
            let _ = writeln!(report, "\nActual split ratios:");
            for split in Split::ALL {
                let _ = writeln!(report, "  {split}: {:.1}%", self.split_fraction(split) * 100.0);
            }
        }

        let _ = writeln!(report, "\nTool keys processed: {}", self.processed_tool_keys);
        if self.missing_files > 0 {
            let _ = writeln!(report, "Missing source files: {}", self.missing_files);
        }
        if self.skipped_frames > 0 {
            let _ = writeln!(report, "Unparseable reference frames: {}", self.skipped_frames);
        }
        if !self.skipped_tool_keys.is_empty() {
            let _ = writeln!(report, "Skipped tool keys:");
            for skipped in &self.skipped_tool_keys {
                let _ = writeln!(report, "  {}: {}", skipped.key, skipped.reason);
            }
        }

        report
    }
}
