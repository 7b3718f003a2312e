//! `frame-split downsample`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use frame_dataset::{DownsampleConfig, ResolutionTag, downsample};
use owo_colors::OwoColorize;
use tracing::debug;

/// Resizes `source` into each target, or the default targets if none given.
pub fn run(source: PathBuf, targets: Vec<ResolutionTag>, dry_run: bool) -> Result<()> {
    let mut config = DownsampleConfig::new(source).with_dry_run(dry_run);
    if !targets.is_empty() {
        config = config.with_targets(targets);
    }
    debug!(?config, "Resolved downsample configuration");

    println!();
    println!("{}", "Downsampling Frames".bold());
    println!("{}", "===================".bold());
    println!();

    let outcome = downsample(&config)
        .with_context(|| format!("Failed to downsample {}", config.source_dir.display()))?;

    println!("Source images: {}", outcome.source_images);
    let mut failed = 0;
    for target in &outcome.targets {
        println!(
            "  {}: {} written, {} already present, {} failed",
            target.target.cyan(),
            target.written,
            target.skipped_existing,
            target.failed
        );
        failed += target.failed;
    }
    println!();

    if failed == 0 {
        println!("{}", "✓ Downsampling complete.".green().bold());
    } else {
        println!("{}", format!("⚠ {failed} images failed.").yellow());
    }
    Ok(())
}
