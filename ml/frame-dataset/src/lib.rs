//! Cross-resolution dataset splitting for CortenForge.
//!
//! Reorganizes a multi-resolution video-frame dataset into reproducible
//! train/val/test partitions while keeping every frame's copies at all
//! resolutions in the same split.
//!
//! # Input Layout
//!
//! ```text
//! <root>/<resolution>/<video>_<resolution>_<n>tool/<video>_<resolution>_<n>tool_<index>.png
//! ```
//!
//! # Pipeline
//!
//! - [`discover`] - Find resolutions, tool folders, and the tool keys common
//!   to every resolution
//! - [`partition`] - Seeded three-way split of one tool's reference frames
//! - [`project`] - Rebuild each frame's name at every resolution and stage it
//! - [`organize`] - Run the whole thing and write `split_info.csv`
//! - [`verify_organization`] - Recount the output and check consistency
//! - [`downsample()`] - Produce lower resolutions from the source frames
//!
//! # Name Codec
//!
//! - [`normalize_tool_folder`] - Folder name to resolution-independent [`ToolKey`]
//! - [`extract_frame_index`] - Frame index from a file name
//! - [`synthesize_frame_name`] - File name for an index at a resolution
//!
//! # Example
//!
//! ```
//! use frame_dataset::{SplitRatios, partition_seeded};
//!
//! let frames: Vec<String> = (0..10)
//!     .map(|i| format!("vid_001_3840x2160p_1tool_{i}.png"))
//!     .collect();
//!
//! let ratios = SplitRatios::new(0.7, 0.15, 0.15).unwrap();
//! let split = partition_seeded(&frames, ratios, 42);
//!
//! assert_eq!(split.train.len(), 7);
//! assert_eq!(split.val.len(), 1);
//! assert_eq!(split.test.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod codec;
mod config;
mod discover;
mod downsample;
mod error;
mod organize;
mod project;
mod report;
mod splits;
mod summary;
mod verify;

// Re-export codec types
pub use codec::{
    FRAME_EXTENSIONS, FrameRef, ResolutionTag, SYNTHESIZED_EXTENSION, ToolFolder, ToolKey,
    extract_frame_index, is_frame_file, normalize_tool_folder, parse_frame_name, retag,
    synthesize_frame_name,
};

// Re-export configuration
pub use config::{DEFAULT_SEED, DownsampleConfig, SPLIT_INFO_FILE, SUMMARY_FILE, SplitConfig};

// Re-export discovery
pub use discover::{DatasetStructure, ToolFolderMapping, discover};

// Re-export split utilities
pub use splits::{Partition, RATIO_TOLERANCE, Split, SplitRatios, partition, partition_seeded};

// Re-export projection
pub use project::{
    COPY_POLICY, ExistingFilePolicy, ProjectionCounts, ProjectionRequest, StageMode, project,
};

// Re-export orchestration and reporting
pub use organize::{OrganizeOutcome, organize};
pub use report::{
    RunSummary, SPLIT_INFO_COLUMNS, read_split_info_csv, read_summary_json,
    write_split_info_csv, write_summary_json,
};
pub use summary::{DatasetStats, SkippedTool, ToolSplitRecord};
pub use verify::{ResolutionCount, VerificationReport, verify_organization};

// Re-export down-sampling
pub use downsample::{DownsampleOutcome, RESIZE_POLICY, TargetOutcome, downsample};

// Re-export error types
pub use error::{DatasetError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        DatasetError, DatasetStats, DatasetStructure, Partition, ResolutionTag, Split,
        SplitConfig, SplitRatios, ToolKey, discover, organize, partition, partition_seeded,
        project, verify_organization,
    };
}
