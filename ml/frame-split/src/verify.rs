//! `frame-split verify`.

use std::path::Path;

use anyhow::{Context, Result, bail};
use frame_dataset::{
    SPLIT_INFO_FILE, SUMMARY_FILE, read_split_info_csv, read_summary_json, verify_organization,
};
use owo_colors::OwoColorize;

/// Recounts `output_dir` and, when a run summary is present, compares with it.
pub fn run(output_dir: &Path) -> Result<()> {
    println!();
    println!("{}", "Verifying Organization".bold());
    println!("{}", "======================".bold());
    println!();

    let report = verify_organization(output_dir)
        .with_context(|| format!("Failed to verify {}", output_dir.display()))?;
    print!("{}", report.to_report());

    let mut problems = report.issues.clone();
    let summary_path = output_dir.join(SUMMARY_FILE);
    if summary_path.is_file() {
        let summary = read_summary_json(&summary_path)
            .with_context(|| format!("Failed to read {}", summary_path.display()))?;
        problems.extend(report.compare_with(&summary.stats));
    } else {
        println!("{}", format!("No {SUMMARY_FILE}; skipping count comparison").dimmed());
    }

    let split_info_path = output_dir.join(SPLIT_INFO_FILE);
    if split_info_path.is_file() {
        let records = read_split_info_csv(&split_info_path)
            .with_context(|| format!("Failed to read {}", split_info_path.display()))?;
        println!("Tool keys recorded in {SPLIT_INFO_FILE}: {}", records.len());
        problems.extend(report.compare_with_records(&records));
    } else {
        println!("{}", format!("No {SPLIT_INFO_FILE}; skipping per-tool comparison").dimmed());
    }

    println!();
    if problems.is_empty() {
        println!("{}", "✓ Organization is consistent.".green().bold());
        Ok(())
    } else {
        for problem in &problems {
            println!("  {} {problem}", "✗".red());
        }
        bail!("verification found {} problems", problems.len())
    }
}
