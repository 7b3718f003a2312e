//! Down-sampling of the source resolution into the lower resolutions.
//!
//! Each `.png` under the source directory is resized with a Lanczos3 filter
//! and written to `<base>/<target>/<retagged folder>/<retagged file>`.
//! Destinations that already exist are left untouched, unlike the split
//! step which overwrites.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::codec::{ResolutionTag, retag};
use crate::config::DownsampleConfig;
use crate::error::{DatasetError, Result};
use crate::project::ExistingFilePolicy;

/// Policy used when writing resized frames.
pub const RESIZE_POLICY: ExistingFilePolicy = ExistingFilePolicy::Skip;

/// Per-target counts of one down-sampling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOutcome {
    /// Target resolution.
    pub target: ResolutionTag,
    /// Images resized and written (or that would be, in a dry run).
    pub written: usize,
    /// Images skipped because the destination exists.
    pub skipped_existing: usize,
    /// Images that failed to decode, resize, or save.
    pub failed: usize,
}

impl TargetOutcome {
    /// Zeroed counts for `target`.
    #[must_use]
    pub fn new(target: ResolutionTag) -> Self {
        Self {
            target,
            written: 0,
            skipped_existing: 0,
            failed: 0,
        }
    }
}

/// Result of a down-sampling run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownsampleOutcome {
    /// Source images found.
    pub source_images: usize,
    /// Per-target counts, in configuration order.
    pub targets: Vec<TargetOutcome>,
}

/// Collects every `.png` below `dir`, sorted.
fn collect_pngs(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {e}", dir.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
        .collect();
    files.sort();
    files
}

/// Output path of `relative` (relative to the source directory) at `target`.
///
/// Every path component is re-tagged, so both the tool folder and the file
/// name carry the target resolution.
#[must_use]
pub fn target_path(
    output_base: &Path,
    relative: &Path,
    source: &ResolutionTag,
    target: &ResolutionTag,
) -> PathBuf {
    let mut path = output_base.join(target.as_str());
    for component in relative.components() {
        let name = component.as_os_str().to_string_lossy();
        path.push(retag(&name, source, target));
    }
    path
}

/// Resizes one image to `width`×`height` and saves it as PNG.
///
/// # Errors
///
/// Returns [`DatasetError::Image`] or [`DatasetError::Io`].
pub fn resize_image(input: &Path, output: &Path, width: u32, height: u32) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| DatasetError::io_at(parent, &e))?;
    }
    let img = image::open(input)?;
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);
    resized.save_with_format(output, image::ImageFormat::Png)?;
    Ok(())
}

/// Runs the down-sampling step.
///
/// # Errors
///
/// - [`DatasetError::InvalidResolution`] if the source directory name or a
///   target tag has no dimensions.
/// - [`DatasetError::Io`] if the source directory does not exist.
///
/// Failures on individual images are logged and counted instead.
pub fn downsample(config: &DownsampleConfig) -> Result<DownsampleOutcome> {
    let source = config.source_resolution()?;
    let targets = config
        .targets
        .iter()
        .map(|tag| {
            tag.dimensions()
                .map(|dims| (tag, dims))
                .ok_or_else(|| DatasetError::invalid_resolution(tag.as_str()))
        })
        .collect::<Result<Vec<_>>>()?;

    if !config.source_dir.is_dir() {
        return Err(DatasetError::io(format!(
            "source directory {} does not exist",
            config.source_dir.display()
        )));
    }

    let images = collect_pngs(&config.source_dir);
    let mut outcome = DownsampleOutcome {
        source_images: images.len(),
        targets: Vec::with_capacity(targets.len()),
    };
    if images.is_empty() {
        info!("No PNG files found in {}", config.source_dir.display());
        return Ok(outcome);
    }
    info!("Found {} images to process", images.len());

    let base = config.output_base();
    for (target, (width, height)) in targets {
        let mut counts = TargetOutcome::new(target.clone());
        for image_path in &images {
            let Ok(relative) = image_path.strip_prefix(&config.source_dir) else {
                continue;
            };
            let output = target_path(&base, relative, &source, target);
            if !RESIZE_POLICY.should_write(&output) {
                counts.skipped_existing += 1;
                continue;
            }
            if config.dry_run {
                counts.written += 1;
                continue;
            }
            match resize_image(image_path, &output, width, height) {
                Ok(()) => {
                    debug!("{} -> {}", image_path.display(), output.display());
                    counts.written += 1;
                }
                Err(e) => {
                    warn!("Error processing {}: {e}", image_path.display());
                    counts.failed += 1;
                }
            }
        }
        info!(
            "{target}: {} written, {} already present, {} failed",
            counts.written, counts.skipped_existing, counts.failed
        );
        outcome.targets.push(counts);
    }

    Ok(outcome)
}
