//! Projection of a reference partition onto every resolution.
//!
//! A partition is computed once per tool key from the reference resolution's
//! file names. The projector rebuilds each frame's name at every resolution
//! from its index and stages the files into
//! `<output>/<split>/<resolution>/<tool-folder>/`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::{
    ResolutionTag, SYNTHESIZED_EXTENSION, TOOL_FOLDER_PATTERN, ToolFolder, ToolKey,
    parse_frame_name,
};
use crate::discover::DatasetStructure;
use crate::error::{DatasetError, Result};
use crate::splits::{Partition, Split};

/// What to do when a destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingFilePolicy {
    /// Replace the existing file. Used by [`project`].
    Overwrite,
    /// Leave the existing file untouched. Used by [`crate::downsample()`].
    Skip,
}

impl ExistingFilePolicy {
    /// Returns `true` if `dest` should be (re)written.
    #[must_use]
    pub fn should_write(self, dest: &Path) -> bool {
        match self {
            Self::Overwrite => true,
            Self::Skip => !dest.exists(),
        }
    }
}

/// Whether files are actually written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageMode {
    /// Copy files into the output tree.
    #[default]
    Copy,
    /// Resolve and count only; the output tree is not touched.
    DryRun,
}

/// Policy used when staging copies.
pub const COPY_POLICY: ExistingFilePolicy = ExistingFilePolicy::Overwrite;

/// Inputs for one tool key's projection.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionRequest<'a> {
    /// Tool key being projected.
    pub key: &'a ToolKey,
    /// Resolution the partition was computed at.
    pub reference: &'a ResolutionTag,
    /// Reference-resolution file names per split.
    pub partition: &'a Partition<String>,
    /// Discovered input structure (root, resolutions, mapping).
    pub structure: &'a DatasetStructure,
    /// Output root.
    pub output_root: &'a Path,
    /// Copy or dry run.
    pub mode: StageMode,
}

/// Files staged per split and resolution for one tool key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectionCounts {
    /// Staged file count per `(split, resolution)`.
    pub staged: BTreeMap<Split, BTreeMap<ResolutionTag, usize>>,
    /// Source files that did not exist.
    pub missing: usize,
    /// Reference names without an extractable frame index.
    pub skipped_frames: usize,
}

impl ProjectionCounts {
    /// Files staged for `split` at `resolution`.
    #[must_use]
    pub fn get(&self, split: Split, resolution: &ResolutionTag) -> usize {
        self.staged
            .get(&split)
            .and_then(|per_res| per_res.get(resolution))
            .copied()
            .unwrap_or(0)
    }

    /// Files staged across all splits and resolutions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.staged.values().flat_map(BTreeMap::values).sum()
    }

    fn add(&mut self, split: Split, resolution: &ResolutionTag, count: usize) {
        *self
            .staged
            .entry(split)
            .or_default()
            .entry(resolution.clone())
            .or_insert(0) += count;
    }
}

/// Resolves the parsed tool folder of `key` at every resolution.
fn resolve_folders<'s>(
    key: &ToolKey,
    structure: &'s DatasetStructure,
) -> Result<Vec<(&'s ResolutionTag, &'s str, ToolFolder)>> {
    structure
        .resolutions
        .iter()
        .map(|resolution| -> Result<(&'s ResolutionTag, &'s str, ToolFolder)> {
            let name = structure
                .mapping
                .folder(resolution, key)
                .ok_or_else(|| {
                    DatasetError::missing_tool_folder(key.as_str(), resolution.as_str())
                })?;
            let folder = ToolFolder::parse(name)
                .ok_or_else(|| DatasetError::malformed_name(name, TOOL_FOLDER_PATTERN))?;
            Ok((resolution, name, folder))
        })
        .collect()
}

/// Frame indices of one split's reference names.
///
/// Names that do not decode, or that are not `.png`, cannot be rebuilt at
/// other resolutions and are counted in `skipped_frames`. `seen` maps each
/// index to the first name that claimed it across all splits; later names
/// with the same index (`_7` and `_07`) are skipped too.
fn reference_indices<'n>(
    frames: &'n [String],
    reference: &ResolutionTag,
    seen: &mut BTreeMap<u64, &'n str>,
    counts: &mut ProjectionCounts,
) -> Vec<u64> {
    let mut indices = Vec::with_capacity(frames.len());
    for name in frames {
        let Some(frame) = parse_frame_name(name) else {
            warn!("Could not extract a frame index from {name} ({reference}); skipping");
            counts.skipped_frames += 1;
            continue;
        };
        if frame.extension() != SYNTHESIZED_EXTENSION {
            warn!(
                "Could not generate names for {name}: only .{SYNTHESIZED_EXTENSION} frames \
                 are projected"
            );
            counts.skipped_frames += 1;
            continue;
        }
        if let Some(first) = seen.get(&frame.index()) {
            warn!("{name} and {first} share frame index {}; skipping {name}", frame.index());
            counts.skipped_frames += 1;
            continue;
        }
        seen.insert(frame.index(), name.as_str());
        indices.push(frame.index());
    }
    indices
}

/// Stages every frame of `request.partition` at every resolution.
///
/// Missing source files are logged and counted, never fatal. Existing
/// destination files are overwritten. Only `.png` reference names with a
/// unique frame index are projected; the rest are counted as skipped.
///
/// # Errors
///
/// - [`DatasetError::UnknownResolution`] if the reference was not discovered.
/// - [`DatasetError::MissingToolFolder`] / [`DatasetError::MalformedName`] if
///   the key cannot be resolved at some resolution. Nothing is written then.
/// - [`DatasetError::Io`] if a directory cannot be created or a copy fails.
pub fn project(request: &ProjectionRequest<'_>) -> Result<ProjectionCounts> {
    let ProjectionRequest {
        key,
        reference,
        partition,
        structure,
        output_root,
        mode,
    } = *request;

    if structure.resolution(reference.as_str()).is_none() {
        return Err(DatasetError::unknown_resolution(reference.as_str()));
    }
    let folders = resolve_folders(key, structure)?;
    let mut counts = ProjectionCounts::default();

    let mut seen = BTreeMap::new();
    for (split, frames) in partition.iter() {
        let indices = reference_indices(frames, reference, &mut seen, &mut counts);
        if indices.is_empty() {
            continue;
        }

        for (resolution, folder_name, folder) in &folders {
            let source_dir = structure.root.join(resolution.as_str()).join(folder_name);
            let target_dir = output_root
                .join(split.as_str())
                .join(resolution.as_str())
                .join(folder_name);
            if mode == StageMode::Copy {
                fs::create_dir_all(&target_dir)
                    .map_err(|e| DatasetError::io_at(&target_dir, &e))?;
            }

            let mut staged = 0;
            for &index in &indices {
                let file_name = folder.frame_name(resolution, index);
                let source = source_dir.join(&file_name);
                if !source.is_file() {
                    warn!("{} not found", source.display());
                    counts.missing += 1;
                    continue;
                }
                let target = target_dir.join(&file_name);
                if mode == StageMode::Copy && COPY_POLICY.should_write(&target) {
                    fs::copy(&source, &target).map_err(|e| DatasetError::io_at(&source, &e))?;
                }
                staged += 1;
            }
            debug!("{key} {split}/{resolution}: {staged} of {} frames", indices.len());
            counts.add(split, resolution, staged);
        }
    }

    Ok(counts)
}
