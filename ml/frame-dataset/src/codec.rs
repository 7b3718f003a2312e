//! Name codec for resolution-tagged folders and frame files.
//!
//! Every name in the dataset embeds a resolution tag:
//!
//! - tool folder: `<video-id>_<w>x<h>p_<n>tool` (e.g. `vid_014_3840x2160p_3tool`)
//! - frame file: `<video-id>_<w>x<h>p_<n>tool_<index>.<ext>`
//!
//! All pattern matching lives in this module. The rest of the crate works
//! with [`ResolutionTag`], [`ToolKey`], [`ToolFolder`] and [`FrameRef`].
//!
//! # Example
//!
//! ```
//! use frame_dataset::{
//!     ResolutionTag, extract_frame_index, normalize_tool_folder, synthesize_frame_name,
//! };
//!
//! let key = normalize_tool_folder("vid_014_3840x2160p_3tool");
//! assert_eq!(key.as_str(), "vid_014_3tool");
//!
//! let low = ResolutionTag::new(960, 540);
//! let name = synthesize_frame_name("vid_014_3840x2160p_3tool", &low, 17).unwrap();
//! assert_eq!(name, "vid_014_960x540p_3tool_17.png");
//! assert_eq!(extract_frame_index(&name), Some(17));
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// File extensions recognized as frames.
pub const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Extension used for synthesized frame names.
pub const SYNTHESIZED_EXTENSION: &str = "png";

pub(crate) const TOOL_FOLDER_PATTERN: &str = "<video-id>_<w>x<h>p_<n>tool";

#[allow(clippy::expect_used)] // literal pattern
static TOOL_FOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<video>.+?)_(?P<width>\d+)x(?P<height>\d+)p_(?P<tool>\d+tool)$")
        .expect("tool folder pattern")
});

#[allow(clippy::expect_used)] // literal pattern
static FRAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<video>.+?)_(?P<width>\d+)x(?P<height>\d+)p_(?P<tool>\d+tool)",
        r"_(?P<index>\d+)\.(?P<ext>png|jpe?g)$",
    ))
    .expect("frame pattern")
});

#[allow(clippy::expect_used)] // literal pattern
static RESOLUTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<width>\d+)x(?P<height>\d+)p?$").expect("resolution pattern")
});

/// A resolution tag such as `960x540p`.
///
/// Used both as a folder name and as a substring of tool-folder and frame
/// names. Tags read from disk are accepted as long as they contain `x`;
/// [`ResolutionTag::dimensions`] is `None` for tags that do not parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionTag(String);

impl ResolutionTag {
    /// Creates the canonical tag `<width>x<height>p`.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self(format!("{width}x{height}p"))
    }

    /// Accepts a resolution folder name found on disk.
    ///
    /// Any name containing `x` qualifies; dimensions are not validated.
    #[must_use]
    pub fn from_folder_name(name: &str) -> Option<Self> {
        name.contains('x').then(|| Self(name.to_string()))
    }

    /// Returns the tag as it appears in names.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses `<width>x<height>` out of the tag.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let caps = RESOLUTION_RE.captures(&self.0)?;
        let width = caps["width"].parse().ok()?;
        let height = caps["height"].parse().ok()?;
        Some((width, height))
    }

    /// Total pixel count, if the tag has dimensions.
    #[must_use]
    pub fn pixel_count(&self) -> Option<u64> {
        self.dimensions()
            .map(|(w, h)| u64::from(w) * u64::from(h))
    }
}

impl fmt::Display for ResolutionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResolutionTag {
    type Err = DatasetError;

    /// Parses a tag with dimensions; `960x540` is normalized to `960x540p`.
    fn from_str(s: &str) -> Result<Self> {
        let caps = RESOLUTION_RE
            .captures(s)
            .ok_or_else(|| DatasetError::invalid_resolution(s))?;
        let width = caps["width"]
            .parse()
            .map_err(|_| DatasetError::invalid_resolution(s))?;
        let height = caps["height"]
            .parse()
            .map_err(|_| DatasetError::invalid_resolution(s))?;
        Ok(Self::new(width, height))
    }
}

/// Resolution-independent identity of a tool folder, e.g. `vid_014_3tool`.
///
/// Only produced by [`normalize_tool_folder`] and [`ToolFolder::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ToolKey(String);

impl ToolKey {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed, conforming tool-folder name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolFolder {
    video_id: String,
    resolution: ResolutionTag,
    tool_id: String,
}

impl ToolFolder {
    /// Parses `<video-id>_<w>x<h>p_<n>tool`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let caps = TOOL_FOLDER_RE.captures(name)?;
        Some(Self {
            video_id: caps["video"].to_string(),
            resolution: ResolutionTag(format!("{}x{}p", &caps["width"], &caps["height"])),
            tool_id: caps["tool"].to_string(),
        })
    }

    /// Video identifier, e.g. `vid_014`.
    #[must_use]
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Tool identifier, e.g. `3tool`.
    #[must_use]
    pub fn tool_id(&self) -> &str {
        &self.tool_id
    }

    /// Resolution tag embedded in the folder name.
    #[must_use]
    pub const fn resolution(&self) -> &ResolutionTag {
        &self.resolution
    }

    /// The resolution-independent key.
    #[must_use]
    pub fn key(&self) -> ToolKey {
        ToolKey(format!("{}_{}", self.video_id, self.tool_id))
    }

    /// Renders the folder name for another resolution.
    #[must_use]
    pub fn with_resolution(&self, resolution: &ResolutionTag) -> String {
        format!("{}_{}_{}", self.video_id, resolution, self.tool_id)
    }

    /// Renders the frame file name for `index` at `resolution`.
    #[must_use]
    pub fn frame_name(&self, resolution: &ResolutionTag, index: u64) -> String {
        format!(
            "{}_{}_{}_{index}.{SYNTHESIZED_EXTENSION}",
            self.video_id, resolution, self.tool_id
        )
    }
}

/// One frame file: tool, resolution and frame index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameRef {
    video_id: String,
    tool_id: String,
    resolution: ResolutionTag,
    index: u64,
    extension: String,
}

impl FrameRef {
    /// The resolution-independent tool key.
    #[must_use]
    pub fn key(&self) -> ToolKey {
        ToolKey(format!("{}_{}", self.video_id, self.tool_id))
    }

    /// Resolution tag embedded in the file name.
    #[must_use]
    pub const fn resolution(&self) -> &ResolutionTag {
        &self.resolution
    }

    /// Frame index.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.index
    }

    /// File extension without the dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The same frame at another resolution.
    #[must_use]
    pub fn with_resolution(&self, resolution: &ResolutionTag) -> Self {
        Self {
            resolution: resolution.clone(),
            ..self.clone()
        }
    }

    /// Renders the file name.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}_{}.{}",
            self.video_id, self.resolution, self.tool_id, self.index, self.extension
        )
    }
}

/// Strips the resolution tag from a tool-folder name.
///
/// Non-conforming names are returned unchanged and act as their own key.
#[must_use]
pub fn normalize_tool_folder(name: &str) -> ToolKey {
    ToolFolder::parse(name).map_or_else(|| ToolKey(name.to_string()), |folder| folder.key())
}

/// Decodes a frame file name.
#[must_use]
pub fn parse_frame_name(file_name: &str) -> Option<FrameRef> {
    let caps = FRAME_RE.captures(file_name)?;
    Some(FrameRef {
        video_id: caps["video"].to_string(),
        tool_id: caps["tool"].to_string(),
        resolution: ResolutionTag(format!("{}x{}p", &caps["width"], &caps["height"])),
        index: caps["index"].parse().ok()?,
        extension: caps["ext"].to_string(),
    })
}

/// Returns the trailing frame index, or `None` if the name does not conform.
#[must_use]
pub fn extract_frame_index(file_name: &str) -> Option<u64> {
    parse_frame_name(file_name).map(|frame| frame.index)
}

/// Builds the frame file name for `index` inside `tool_folder` at `resolution`.
///
/// # Errors
///
/// Returns [`DatasetError::MalformedName`] if `tool_folder` does not match
/// `<video-id>_<w>x<h>p_<n>tool`.
pub fn synthesize_frame_name(
    tool_folder: &str,
    resolution: &ResolutionTag,
    index: u64,
) -> Result<String> {
    let folder = ToolFolder::parse(tool_folder)
        .ok_or_else(|| DatasetError::malformed_name(tool_folder, TOOL_FOLDER_PATTERN))?;
    Ok(folder.frame_name(resolution, index))
}

/// Replaces the resolution tag `from` with `to` in a folder or frame name.
///
/// Conforming names are re-rendered through the codec; anything else falls
/// back to plain substring replacement.
#[must_use]
pub fn retag(name: &str, from: &ResolutionTag, to: &ResolutionTag) -> String {
    if let Some(folder) = ToolFolder::parse(name) {
        if folder.resolution() == from {
            return folder.with_resolution(to);
        }
    }
    if let Some(frame) = parse_frame_name(name) {
        if frame.resolution() == from {
            return frame.with_resolution(to).file_name();
        }
    }
    name.replace(from.as_str(), to.as_str())
}

/// Returns `true` if the path has a frame extension.
#[must_use]
pub fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext))
}
