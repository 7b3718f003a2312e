//! Command-line front end for frame dataset organization.
//!
//! # Commands
//!
//! - `frame-split split` - Partition a dataset into train/val/test
//! - `frame-split verify` - Recount an organized tree and check consistency
//! - `frame-split downsample` - Produce lower resolutions from source frames
//!
//! Logging goes through `tracing`; set `RUST_LOG=debug` for per-file output.

mod downsample;
mod split;
mod verify;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use frame_dataset::ResolutionTag;
use tracing_subscriber::EnvFilter;

/// Multi-resolution frame dataset splitter
#[derive(Parser)]
#[command(name = "frame-split")]
#[command(
    about = "Organize multi-resolution frame datasets into train/val/test",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Partition every tool folder and stage it at all resolutions
    Split(split::SplitArgs),

    /// Check an organized output tree
    Verify {
        /// Root of the organized output
        #[arg(long)]
        output_dir: PathBuf,
    },

    /// Resize a source resolution folder into lower resolutions
    Downsample {
        /// Source resolution folder, e.g. data/images/3840x2160p
        #[arg(long)]
        source: PathBuf,

        /// Target resolutions (repeatable)
        #[arg(long = "target", value_name = "WxHp")]
        targets: Vec<ResolutionTag>,

        /// Count the work without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Split(args) => split::run(&args),
        Commands::Verify { output_dir } => verify::run(&output_dir),
        Commands::Downsample {
            source,
            targets,
            dry_run,
        } => downsample::run(source, targets, dry_run),
    }
}
