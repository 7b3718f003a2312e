//! Persisted run artifacts: `split_info.csv` and `split_summary.json`.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::ResolutionTag;
use crate::error::{DatasetError, Result};
use crate::splits::SplitRatios;
use crate::summary::{DatasetStats, ToolSplitRecord};

/// Column order of `split_info.csv`.
pub const SPLIT_INFO_COLUMNS: [&str; 6] = [
    "normalized_tool_folder",
    "reference_folder",
    "total_frames",
    "train_frames",
    "val_frames",
    "test_frames",
];

/// Everything needed to audit a run after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Dataset root.
    pub input_dir: PathBuf,

    /// Output root.
    pub output_dir: PathBuf,

    /// Seed used for every tool key.
    pub seed: u64,

    /// Ratios used.
    pub ratios: SplitRatios,

    /// Resolution the partitions were computed at.
    pub reference: ResolutionTag,

    /// Discovered resolutions.
    pub resolutions: Vec<ResolutionTag>,

    /// Frame counts.
    pub stats: DatasetStats,

    /// Tool keys missing from some resolution, with where they were found.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub excluded_tool_keys: BTreeMap<String, Vec<ResolutionTag>>,
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Splits CSV text into records, honoring double-quoted fields.
///
/// Quoted fields may span lines. Blank lines are dropped.
fn parse_csv_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', _) => in_quotes = !in_quotes,
            (',', false) => fields.push(std::mem::take(&mut current)),
            ('\r', false) if chars.peek() == Some(&'\n') => {}
            ('\n', false) => {
                fields.push(std::mem::take(&mut current));
                records.push(std::mem::take(&mut fields));
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() || !fields.is_empty() {
        fields.push(current);
        records.push(fields);
    }
    records.retain(|record| !(record.len() == 1 && record[0].trim().is_empty()));
    records
}

/// Writes one row per processed tool key.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if the file cannot be written.
pub fn write_split_info_csv(path: &Path, records: &[ToolSplitRecord]) -> Result<()> {
    let file = File::create(path).map_err(|e| DatasetError::io_at(path, &e))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{}", SPLIT_INFO_COLUMNS.join(","))?;
    for record in records {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            csv_field(&record.normalized_tool_folder),
            csv_field(&record.reference_folder),
            record.total_frames,
            record.train_frames,
            record.val_frames,
            record.test_frames
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Reads `split_info.csv` back into records.
///
/// # Errors
///
/// - [`DatasetError::Io`] if the file cannot be read.
/// - [`DatasetError::Serialization`] if the header or a row is malformed.
pub fn read_split_info_csv(path: &Path) -> Result<Vec<ToolSplitRecord>> {
    let text = fs::read_to_string(path).map_err(|e| DatasetError::io_at(path, &e))?;
    let mut records = parse_csv_records(&text).into_iter();

    let header = records.next().unwrap_or_default();
    if header != SPLIT_INFO_COLUMNS {
        return Err(DatasetError::serialization(format!(
            "unexpected header in {}: {}",
            path.display(),
            header.join(",")
        )));
    }

    let parse_count = |row: usize, value: &str| -> Result<usize> {
        value.trim().parse().map_err(|_| {
            DatasetError::serialization(format!("row {row}: invalid count {value:?}"))
        })
    };

    records
        .enumerate()
        .map(|(i, fields)| {
            let row = i + 1;
            if fields.len() != SPLIT_INFO_COLUMNS.len() {
                return Err(DatasetError::serialization(format!(
                    "row {row}: expected {} fields, got {}",
                    SPLIT_INFO_COLUMNS.len(),
                    fields.len()
                )));
            }
            Ok(ToolSplitRecord {
                normalized_tool_folder: fields[0].clone(),
                reference_folder: fields[1].clone(),
                total_frames: parse_count(row, &fields[2])?,
                train_frames: parse_count(row, &fields[3])?,
                val_frames: parse_count(row, &fields[4])?,
                test_frames: parse_count(row, &fields[5])?,
            })
        })
        .collect()
}

/// Writes the run summary as pretty JSON.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] or [`DatasetError::Serialization`].
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<()> {
    let file = File::create(path).map_err(|e| DatasetError::io_at(path, &e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, summary)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Reads a run summary written by [`write_summary_json`].
///
/// # Errors
///
/// Returns [`DatasetError::Io`] or [`DatasetError::Serialization`].
pub fn read_summary_json(path: &Path) -> Result<RunSummary> {
    let text = fs::read_to_string(path).map_err(|e| DatasetError::io_at(path, &e))?;
    Ok(serde_json::from_str(&text)?)
}
