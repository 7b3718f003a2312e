//! `frame-split split`.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use frame_dataset::{SplitConfig, SplitRatios, organize, verify_organization};
use owo_colors::OwoColorize;
use tracing::debug;

/// Arguments for the split command. Flags override values from `--config`.
#[derive(Args)]
pub struct SplitArgs {
    /// Dataset root containing the resolution folders
    #[arg(long, required_unless_present = "config")]
    input_dir: Option<PathBuf>,

    /// Root of the organized output
    #[arg(long, required_unless_present = "config")]
    output_dir: Option<PathBuf>,

    /// Fraction of frames for training [default: 0.7]
    #[arg(long)]
    train_ratio: Option<f64>,

    /// Fraction of frames for validation [default: 0.15]
    #[arg(long)]
    val_ratio: Option<f64>,

    /// Fraction of frames for testing [default: 0.15]
    #[arg(long)]
    test_ratio: Option<f64>,

    /// Shuffle seed [default: 42]
    #[arg(long)]
    seed: Option<u64>,

    /// Resolution to partition at (defaults to the largest)
    #[arg(long, value_name = "WxHp")]
    reference: Option<String>,

    /// JSON run configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Resolve and count without writing
    #[arg(long)]
    dry_run: bool,

    /// Recount the output afterwards and compare with the run
    #[arg(long)]
    verify: bool,
}

impl SplitArgs {
    /// Builds the run configuration, validating ratios before any I/O.
    fn to_config(&self) -> Result<SplitConfig> {
        let mut config = match &self.config {
            Some(path) => SplitConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SplitConfig::new(PathBuf::new(), PathBuf::new()),
        };

        if let Some(input_dir) = &self.input_dir {
            config.input_dir.clone_from(input_dir);
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir.clone_from(output_dir);
        }

        let defaults = config.ratios;
        let ratios = SplitRatios::new(
            self.train_ratio.unwrap_or(defaults.train()),
            self.val_ratio.unwrap_or(defaults.val()),
            self.test_ratio.unwrap_or(defaults.test()),
        )?;
        config = config.with_ratios(ratios);

        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(reference) = &self.reference {
            config = config.with_reference(reference.clone());
        }
        if self.dry_run {
            config = config.with_dry_run(true);
        }
        Ok(config)
    }
}

/// Runs the split and prints the summary.
pub fn run(args: &SplitArgs) -> Result<()> {
    let config = args.to_config()?;
    debug!(?config, "Resolved run configuration");

    println!();
    println!("{}", "Frame Dataset Split".bold());
    println!("{}", "===================".bold());
    println!(
        "{}",
        format!(
            "{} -> {} (seed {})",
            config.input_dir.display(),
            config.output_dir.display(),
            config.seed
        )
        .dimmed()
    );
    if config.dry_run {
        println!("{}", "Dry run: nothing will be written".yellow());
    }
    println!();

    let outcome = organize(&config)
        .with_context(|| format!("Failed to organize {}", config.input_dir.display()))?;

    println!("Reference resolution: {}", outcome.reference.cyan());
    if !outcome.structure.excluded_tool_keys.is_empty() {
        println!(
            "{}",
            format!(
                "{} tool keys not present at every resolution were excluded",
                outcome.structure.excluded_tool_keys.len()
            )
            .yellow()
        );
    }
    println!();
    print!("{}", outcome.stats.to_report());
    println!();

    if outcome.stats.is_empty() {
        println!("{}", "⚠ No frames were staged.".yellow());
    } else {
        println!("{}", "✓ Split complete.".green().bold());
    }

    if args.verify && !config.dry_run {
        let report = verify_organization(&config.output_dir)
            .with_context(|| format!("Failed to verify {}", config.output_dir.display()))?;
        let mut problems = report.issues.clone();
        problems.extend(report.compare_with(&outcome.stats));
        problems.extend(report.compare_with_records(&outcome.records));
        if !problems.is_empty() {
            for problem in &problems {
                println!("  {} {problem}", "✗".red());
            }
            bail!("verification found {} problems", problems.len());
        }
        println!("{}", "✓ Output verified.".green().bold());
    }

    Ok(())
}
