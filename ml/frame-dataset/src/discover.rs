//! Discovery of the resolution/tool folder hierarchy.
//!
//! Expected layout: `<root>/<resolution>/<tool-folder>/<frames>`.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::{ResolutionTag, ToolKey, normalize_tool_folder};
use crate::error::{DatasetError, Result};

/// Per-resolution mapping from [`ToolKey`] to the folder name on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolFolderMapping {
    folders: BTreeMap<ResolutionTag, BTreeMap<ToolKey, String>>,
}

impl ToolFolderMapping {
    /// Actual folder name of `key` at `resolution`.
    #[must_use]
    pub fn folder(&self, resolution: &ResolutionTag, key: &ToolKey) -> Option<&str> {
        self.folders
            .get(resolution)
            .and_then(|keys| keys.get(key))
            .map(String::as_str)
    }

    /// Keys present at `resolution`.
    pub fn keys(&self, resolution: &ResolutionTag) -> impl Iterator<Item = &ToolKey> {
        self.folders.get(resolution).into_iter().flat_map(BTreeMap::keys)
    }

    /// Number of tool folders recorded at `resolution`.
    #[must_use]
    pub fn folder_count(&self, resolution: &ResolutionTag) -> usize {
        self.folders.get(resolution).map_or(0, BTreeMap::len)
    }

    /// Records `folder` for `key`; returns the folder already recorded, if any.
    fn insert(
        &mut self,
        resolution: &ResolutionTag,
        key: ToolKey,
        folder: String,
    ) -> Option<String> {
        let keys = self.folders.entry(resolution.clone()).or_default();
        if let Some(existing) = keys.get(&key) {
            return Some(existing.clone());
        }
        keys.insert(key, folder);
        None
    }
}

/// The discovered dataset hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetStructure {
    /// Dataset root.
    pub root: PathBuf,

    /// Resolutions, largest first. The first is the default reference.
    pub resolutions: Vec<ResolutionTag>,

    /// Tool keys present at every resolution.
    pub common_tool_keys: BTreeSet<ToolKey>,

    /// Tool folder names per resolution.
    pub mapping: ToolFolderMapping,

    /// Keys missing from at least one resolution, with the resolutions
    /// where they were found.
    pub excluded_tool_keys: BTreeMap<ToolKey, Vec<ResolutionTag>>,
}

impl DatasetStructure {
    /// The default reference resolution.
    #[must_use]
    pub fn reference(&self) -> Option<&ResolutionTag> {
        self.resolutions.first()
    }

    /// Looks up a discovered resolution by name.
    #[must_use]
    pub fn resolution(&self, name: &str) -> Option<&ResolutionTag> {
        self.resolutions.iter().find(|tag| tag.as_str() == name)
    }

    /// Directory of `key` at `resolution` under the root.
    #[must_use]
    pub fn tool_dir(&self, resolution: &ResolutionTag, key: &ToolKey) -> Option<PathBuf> {
        self.mapping
            .folder(resolution, key)
            .map(|folder| self.root.join(resolution.as_str()).join(folder))
    }
}

/// Orders resolutions by descending pixel count, then by name.
/// Tags without dimensions sort last.
fn compare_resolutions(a: &ResolutionTag, b: &ResolutionTag) -> Ordering {
    match (a.pixel_count(), b.pixel_count()) {
        (Some(pa), Some(pb)) => pb.cmp(&pa).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Sorted names of the immediate subdirectories of `dir`.
pub(crate) fn subdirectories(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| DatasetError::io_at(dir, &e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DatasetError::io_at(dir, &e))?;
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!("Skipping non UTF-8 directory name {:?} in {}", raw, dir.display()),
        }
    }
    names.sort();
    Ok(names)
}

/// Walks `root` and builds the [`DatasetStructure`].
///
/// # Errors
///
/// - [`DatasetError::Io`] if `root` or a resolution folder cannot be read.
/// - [`DatasetError::EmptyDataset`] if no resolution folder is found.
pub fn discover(root: impl AsRef<Path>) -> Result<DatasetStructure> {
    let root = root.as_ref();

    let mut resolutions: Vec<ResolutionTag> = subdirectories(root)?
        .iter()
        .filter_map(|name| ResolutionTag::from_folder_name(name))
        .collect();
    if resolutions.is_empty() {
        return Err(DatasetError::empty_dataset(root));
    }
    resolutions.sort_by(compare_resolutions);
    info!(
        "Found resolution folders: {}",
        resolutions.iter().map(ResolutionTag::as_str).collect::<Vec<_>>().join(", ")
    );

    let mut mapping = ToolFolderMapping::default();
    for resolution in &resolutions {
        let tool_folders = subdirectories(&root.join(resolution.as_str()))?;
        for folder in tool_folders {
            let key = normalize_tool_folder(&folder);
            debug!("{resolution}: {folder} -> {key}");
            if let Some(existing) = mapping.insert(resolution, key.clone(), folder.clone()) {
                warn!(
                    "{resolution}: folders {existing} and {folder} both map to {key}; \
                     keeping {existing}"
                );
            }
        }
        info!("Resolution {resolution}: {} tool folders", mapping.folder_count(resolution));
    }

    let mut all_keys: BTreeMap<ToolKey, Vec<ResolutionTag>> = BTreeMap::new();
    for resolution in &resolutions {
        for key in mapping.keys(resolution) {
            all_keys.entry(key.clone()).or_default().push(resolution.clone());
        }
    }

    let (common, partial): (BTreeMap<_, _>, BTreeMap<_, _>) = all_keys
        .into_iter()
        .partition(|(_, present)| present.len() == resolutions.len());
    let common_tool_keys: BTreeSet<ToolKey> = common.into_keys().collect();

    info!("Common tool folders across all resolutions: {}", common_tool_keys.len());
    for (key, present) in &partial {
        warn!(
            "Excluding {key}: only present at {}",
            present.iter().map(ResolutionTag::as_str).collect::<Vec<_>>().join(", ")
        );
    }

    Ok(DatasetStructure {
        root: root.to_path_buf(),
        resolutions,
        common_tool_keys,
        mapping,
        excluded_tool_keys: partial,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mkdirs(root: &Path, dirs: &[&str]) {
        for dir in dirs {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
    }

    #[test]
    fn discover_basic() {
        let tmp = tempfile::tempdir().unwrap();
        mkdirs(
            tmp.path(),
            &[
                "960x540p/vid_001_960x540p_1tool",
                "960x540p/vid_002_960x540p_4tool",
                "3840x2160p/vid_001_3840x2160p_1tool",
                "3840x2160p/vid_002_3840x2160p_4tool",
            ],
        );

        let structure = discover(tmp.path()).unwrap();
        let names: Vec<_> = structure.resolutions.iter().map(ResolutionTag::as_str).collect();
        assert_eq!(names, ["3840x2160p", "960x540p"]);
        assert_eq!(structure.common_tool_keys.len(), 2);
        assert!(structure.excluded_tool_keys.is_empty());

        let key = normalize_tool_folder("vid_002_960x540p_4tool");
        let low = ResolutionTag::new(960, 540);
        assert_eq!(structure.mapping.folder(&low, &key), Some("vid_002_960x540p_4tool"));
        assert_eq!(
            structure.tool_dir(&low, &key),
            Some(tmp.path().join("960x540p").join("vid_002_960x540p_4tool"))
        );
    }

    #[test]
    fn discover_ignores_files_and_untagged_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        mkdirs(tmp.path(), &["480x270p/vid_001_480x270p_1tool", "metadata"]);
        fs::write(tmp.path().join("3840x2160p.txt"), b"not a dir").unwrap();
        fs::write(tmp.path().join("480x270p").join("readme.md"), b"x").unwrap();

        let structure = discover(tmp.path()).unwrap();
        assert_eq!(structure.resolutions, vec![ResolutionTag::new(480, 270)]);
        assert_eq!(structure.common_tool_keys.len(), 1);
    }

    #[test]
    fn discover_empty_dataset() {
        let tmp = tempfile::tempdir().unwrap();
        mkdirs(tmp.path(), &["logs", "metadata"]);
        let err = discover(tmp.path()).unwrap_err();
        assert!(matches!(err, DatasetError::EmptyDataset(_)));
    }

    #[test]
    fn discover_missing_root() {
        let tmp = tempfile::tempdir().unwrap();
        let err = discover(tmp.path().join("absent")).unwrap_err();
        assert!(matches!(err, DatasetError::Io(_)));
    }

    #[test]
    fn discover_excludes_partial_keys() {
        let tmp = tempfile::tempdir().unwrap();
        mkdirs(
            tmp.path(),
            &[
                "960x540p/vid_001_960x540p_1tool",
                "960x540p/vid_009_960x540p_2tool",
                "480x270p/vid_001_480x270p_1tool",
            ],
        );

        let structure = discover(tmp.path()).unwrap();
        let partial = normalize_tool_folder("vid_009_960x540p_2tool");
        assert!(!structure.common_tool_keys.contains(&partial));
        assert_eq!(
            structure.excluded_tool_keys.get(&partial),
            Some(&vec![ResolutionTag::new(960, 540)])
        );
    }

    #[test]
    fn discover_non_conforming_folder_is_own_key() {
        let tmp = tempfile::tempdir().unwrap();
        mkdirs(tmp.path(), &["960x540p/extras", "480x270p/extras"]);

        let structure = discover(tmp.path()).unwrap();
        let key = normalize_tool_folder("extras");
        assert!(structure.common_tool_keys.contains(&key));
    }

    #[test]
    fn discover_key_collision_keeps_first() {
        let tmp = tempfile::tempdir().unwrap();
        mkdirs(
            tmp.path(),
            &["960x540p/vid_001_960x540p_1tool", "960x540p/vid_001_961x540p_1tool"],
        );

        let structure = discover(tmp.path()).unwrap();
        let key = normalize_tool_folder("vid_001_960x540p_1tool");
        let tag = ResolutionTag::new(960, 540);
        assert_eq!(structure.mapping.folder(&tag, &key), Some("vid_001_960x540p_1tool"));
        assert_eq!(structure.mapping.folder_count(&tag), 1);
    }

    #[test]
    fn resolution_order() {
        let mut tags = vec![
            ResolutionTag::new(480, 270),
            ResolutionTag::from_folder_name("proxy").unwrap(),
            ResolutionTag::new(3840, 2160),
            ResolutionTag::new(960, 540),
        ];
        tags.sort_by(compare_resolutions);
        let names: Vec<_> = tags.iter().map(ResolutionTag::as_str).collect();
        assert_eq!(names, ["3840x2160p", "960x540p", "480x270p", "proxy"]);
    }
}
