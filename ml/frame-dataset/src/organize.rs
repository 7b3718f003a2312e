//! End-to-end organization of a dataset into train/val/test.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::codec::{ResolutionTag, is_frame_file};
use crate::config::{SPLIT_INFO_FILE, SUMMARY_FILE, SplitConfig};
use crate::discover::{DatasetStructure, discover};
use crate::error::{DatasetError, Result};
use crate::project::{ProjectionRequest, StageMode, project};
use crate::report::{RunSummary, write_split_info_csv, write_summary_json};
use crate::splits::{Split, partition_seeded};
use crate::summary::{DatasetStats, ToolSplitRecord};

/// Result of [`organize`].
#[derive(Debug, Clone)]
pub struct OrganizeOutcome {
    /// Discovered input structure.
    pub structure: DatasetStructure,
    /// Resolution the partitions were computed at.
    pub reference: ResolutionTag,
    /// One record per processed tool key, in key order.
    pub records: Vec<ToolSplitRecord>,
    /// Aggregated counts.
    pub stats: DatasetStats,
}

/// Sorted frame file names directly inside `dir`.
fn list_frames(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| DatasetError::io_at(dir, &e))?;
    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_frame_file(path))
        .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
        .collect();
    names.sort();
    Ok(names)
}

fn resolve_reference(
    structure: &DatasetStructure,
    configured: Option<&str>,
) -> Result<ResolutionTag> {
    match configured {
        Some(name) => structure
            .resolution(name)
            .cloned()
            .ok_or_else(|| DatasetError::unknown_resolution(name)),
        None => structure
            .reference()
            .cloned()
            .ok_or_else(|| DatasetError::empty_dataset(&structure.root)),
    }
}

/// Partitions every common tool key and stages it at every resolution.
///
/// Ratios are validated by [`crate::SplitRatios`] construction; discovery
/// and reference resolution errors abort before the output tree is touched.
/// Per-tool problems are logged, counted in the returned stats, and skipped.
/// Unless `config.dry_run` is set, `split_info.csv` and `split_summary.json`
/// are written to the output root.
///
/// # Errors
///
/// - [`DatasetError::EmptyDataset`] / [`DatasetError::Io`] from discovery.
/// - [`DatasetError::UnknownResolution`] for a bad configured reference.
/// - [`DatasetError::Io`] if the output root or report cannot be written.
pub fn organize(config: &SplitConfig) -> Result<OrganizeOutcome> {
    let structure = discover(&config.input_dir)?;
    let reference = resolve_reference(&structure, config.reference_resolution.as_deref())?;
    let mode = config.stage_mode();

    if mode == StageMode::Copy {
        fs::create_dir_all(&config.output_dir)
            .map_err(|e| DatasetError::io_at(&config.output_dir, &e))?;
    }

    let mut stats = DatasetStats::new(&structure.resolutions);
    let mut records = Vec::with_capacity(structure.common_tool_keys.len());

    info!(
        "Processing {} tool folders (reference {reference}, seed {})",
        structure.common_tool_keys.len(),
        config.seed
    );

    for key in &structure.common_tool_keys {
        let Some(reference_folder) = structure.mapping.folder(&reference, key) else {
            warn!("Reference tool folder for {key} not found");
            stats.skip(key, "reference folder missing");
            continue;
        };
        let reference_dir = structure.root.join(reference.as_str()).join(reference_folder);
        if !reference_dir.is_dir() {
            warn!("Reference tool folder not found: {}", reference_dir.display());
            stats.skip(key, "reference folder missing");
            continue;
        }

        let frames = match list_frames(&reference_dir) {
            Ok(frames) if frames.is_empty() => {
                warn!("No frames found in {}", reference_dir.display());
                stats.skip(key, "no frames");
                continue;
            }
            Ok(frames) => frames,
            Err(e) => {
                warn!("Could not list {}: {e}", reference_dir.display());
                stats.skip(key, e.to_string());
                continue;
            }
        };

        let partition = partition_seeded(&frames, config.ratios, config.seed);
        let request = ProjectionRequest {
            key,
            reference: &reference,
            partition: &partition,
            structure: &structure,
            output_root: &config.output_dir,
            mode,
        };
        match project(&request) {
            Ok(counts) => {
                stats.record(&counts);
                records.push(ToolSplitRecord::new(key, reference_folder, &partition));
                info!(
                    "{key}: {} frames -> train {}, val {}, test {}",
                    partition.len(),
                    partition.get(Split::Train).len(),
                    partition.get(Split::Val).len(),
                    partition.get(Split::Test).len()
                );
            }
            Err(e) => {
                warn!("Skipping {key}: {e}");
                stats.skip(key, e.to_string());
            }
        }
    }

    if mode == StageMode::Copy {
        let csv_path = config.output_dir.join(SPLIT_INFO_FILE);
        write_split_info_csv(&csv_path, &records)?;
        info!("Split information saved to {}", csv_path.display());

        let summary = RunSummary {
            input_dir: config.input_dir.clone(),
            output_dir: config.output_dir.clone(),
            seed: config.seed,
            ratios: config.ratios,
            reference: reference.clone(),
            resolutions: structure.resolutions.clone(),
            stats: stats.clone(),
            excluded_tool_keys: structure
                .excluded_tool_keys
                .iter()
                .map(|(key, present)| (key.to_string(), present.clone()))
                .collect(),
        };
        write_summary_json(&config.output_dir.join(SUMMARY_FILE), &summary)?;
    }

    Ok(OrganizeOutcome {
        structure,
        reference,
        records,
        stats,
    })
}
