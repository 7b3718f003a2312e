//! Post-run verification of an organized output tree.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::codec::{
    ResolutionTag, ToolKey, extract_frame_index, is_frame_file, normalize_tool_folder,
};
use crate::discover::subdirectories;
use crate::error::{DatasetError, Result};
use crate::splits::Split;
use crate::summary::{DatasetStats, ToolSplitRecord};

/// Counts for one `<split>/<resolution>` directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionCount {
    /// Tool folders present.
    pub tool_folders: usize,
    /// Frame files across those folders.
    pub frames: usize,
}

/// Result of [`verify_organization`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Counts per split and resolution folder.
    pub counts: BTreeMap<Split, BTreeMap<ResolutionTag, ResolutionCount>>,
    /// Tool keys found anywhere in the tree.
    pub tool_keys: BTreeSet<ToolKey>,
    /// Structural or cross-resolution problems found.
    pub issues: Vec<String>,
}

impl VerificationReport {
    /// Counts for `split` at `resolution`.
    #[must_use]
    pub fn count(&self, split: Split, resolution: &ResolutionTag) -> ResolutionCount {
        self.counts
            .get(&split)
            .and_then(|per_res| per_res.get(resolution))
            .copied()
            .unwrap_or_default()
    }

    /// Returns `true` if no issues were found.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }

    /// Differences between the tree and the counts a run reported.
    #[must_use]
    pub fn compare_with(&self, stats: &DatasetStats) -> Vec<String> {
        let mut mismatches = Vec::new();
        for split in Split::ALL {
            for resolution in &stats.resolutions {
                let expected = stats.count(split, resolution);
                let actual = self.count(split, resolution).frames;
                if expected != actual {
                    mismatches.push(format!(
                        "{split}/{resolution}: expected {expected} frames, found {actual}"
                    ));
                }
            }
        }
        mismatches
    }

    /// Differences between the tree and the rows of `split_info.csv`.
    ///
    /// Each row's split counts must add up to its total, and every row with
    /// frames must have staged folders in the tree.
    #[must_use]
    pub fn compare_with_records(&self, records: &[ToolSplitRecord]) -> Vec<String> {
        let mut mismatches = Vec::new();
        for record in records {
            let key = &record.normalized_tool_folder;
            let split_sum = record.train_frames + record.val_frames + record.test_frames;
            if split_sum != record.total_frames {
                mismatches.push(format!(
                    "{key}: split counts add up to {split_sum}, total is {}",
                    record.total_frames
                ));
            }
            if record.total_frames > 0 && !self.tool_keys.iter().any(|k| k.as_str() == key) {
                mismatches.push(format!("{key}: recorded but not found in output"));
            }
        }
        mismatches
    }

    /// Returns a human-readable summary string.
    #[must_use]
    #[allow(clippy::let_underscore_must_use)] // String::write_fmt is infallible
    pub fn to_report(&self) -> String {
        use std::fmt::Write;

        let mut report = String::new();
        for (split, per_res) in &self.counts {
            for (resolution, count) in per_res {
                let _ = writeln!(
                    report,
                    "{split}/{resolution}: {} tool folders, {} frames",
                    count.tool_folders, count.frames
                );
            }
        }
        for issue in &self.issues {
            let _ = writeln!(report, "issue: {issue}");
        }
        report
    }
}

/// Frame indices found in one tool folder, plus the raw frame count.
fn scan_tool_folder(dir: &Path) -> Result<(usize, BTreeSet<u64>)> {
    let entries = fs::read_dir(dir).map_err(|e| DatasetError::io_at(dir, &e))?;
    let mut frames = 0;
    let mut indices = BTreeSet::new();
    for entry in entries.filter_map(std::result::Result::ok) {
        let path = entry.path();
        if !path.is_file() || !is_frame_file(&path) {
            continue;
        }
        frames += 1;
        let name = path.file_name().and_then(|n| n.to_str());
        if let Some(index) = name.and_then(extract_frame_index) {
            indices.insert(index);
        }
    }
    Ok((frames, indices))
}

/// Recounts an organized tree and checks cross-resolution consistency.
///
/// For every split, each tool key must hold the same set of frame indices
/// at every resolution. Missing split directories are reported as issues.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if `output_root` or a directory inside it
/// cannot be read.
pub fn verify_organization(output_root: impl AsRef<Path>) -> Result<VerificationReport> {
    let root = output_root.as_ref();
    if !root.is_dir() {
        return Err(DatasetError::io(format!("{} is not a directory", root.display())));
    }

    let mut report = VerificationReport::default();
    for split in Split::ALL {
        let split_dir = root.join(split.as_str());
        if !split_dir.is_dir() {
            warn!("{split} directory not found");
            report.issues.push(format!("{split} directory not found"));
            continue;
        }

        let resolutions: Vec<ResolutionTag> = subdirectories(&split_dir)?
            .iter()
            .filter_map(|name| ResolutionTag::from_folder_name(name))
            .collect();
        let mut indices: BTreeMap<ToolKey, BTreeMap<&ResolutionTag, BTreeSet<u64>>> =
            BTreeMap::new();

        for resolution in &resolutions {
            let res_dir = split_dir.join(resolution.as_str());
            let tool_folders = subdirectories(&res_dir)?;
            let mut count = ResolutionCount {
                tool_folders: tool_folders.len(),
                frames: 0,
            };
            for folder in &tool_folders {
                let (frames, found) = scan_tool_folder(&res_dir.join(folder))?;
                count.frames += frames;
                indices
                    .entry(normalize_tool_folder(folder))
                    .or_default()
                    .insert(resolution, found);
            }
            info!(
                "{split}/{resolution}: {} tool folders, {} frames",
                count.tool_folders, count.frames
            );
            report
                .counts
                .entry(split)
                .or_default()
                .insert(resolution.clone(), count);
        }

        report.tool_keys.extend(indices.keys().cloned());
        for (key, per_res) in &indices {
            if per_res.len() != resolutions.len() {
                report.issues.push(format!(
                    "{split}/{key}: present at {} of {} resolutions",
                    per_res.len(),
                    resolutions.len()
                ));
                continue;
            }
            let mut sets = per_res.iter();
            if let Some((first_res, first)) = sets.next() {
                for (resolution, set) in sets {
                    if set != first {
                        report.issues.push(format!(
                            "{split}/{key}: {resolution} has {} frames, {first_res} has {}",
                            set.len(),
                            first.len()
                        ));
                    }
                }
            }
        }
    }

    for issue in &report.issues {
        warn!("{issue}");
    }
    Ok(report)
}
