//! mesh-planes classify command - count samples per orientation class.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use mesh_planes::{AnalyzerConfig, analyze_fragments, load_fragments};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct ClassificationResult {
    path: String,
    fragments_processed: usize,
    skipped_fragments: usize,
    up: usize,
    down: usize,
    horizontal: usize,
    discarded: usize,
    duplicates: usize,
    vertical_tolerance_deg: f64,
}

pub fn run(input: &Path, config: &AnalyzerConfig, cli: &Cli) -> Result<()> {
    let fragments =
        load_fragments(input).with_context(|| format!("Failed to load scan from {:?}", input))?;

    let analysis = analyze_fragments(fragments, config)
        .with_context(|| format!("Failed to classify {:?}", input))?;

    for skipped in &analysis.skipped_fragments {
        output::warning(
            &format!("Skipped fragment {}: {}", skipped.index, skipped.reason),
            cli.format,
            cli.quiet,
        );
    }

    let result = ClassificationResult {
        path: input.display().to_string(),
        fragments_processed: analysis.fragments_processed,
        skipped_fragments: analysis.skipped_fragments.len(),
        up: analysis.up.len(),
        down: analysis.down.len(),
        horizontal: analysis.horizontal.len(),
        discarded: analysis.discarded,
        duplicates: analysis.duplicates,
        vertical_tolerance_deg: config.thresholds.vertical_tolerance_deg,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&result, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                let total = result.up + result.down + result.horizontal + result.discarded;
                let share = |n: usize| {
                    if total == 0 {
                        0.0
                    } else {
                        100.0 * n as f64 / total as f64
                    }
                };

                println!("{}", "Normal Classification".bold().underline());
                println!("  {}: {}", "File".cyan(), input.display());
                println!(
                    "  {}: {} ({} skipped)",
                    "Fragments".cyan(),
                    result.fragments_processed,
                    result.skipped_fragments
                );
                println!(
                    "  {}: ±{:.1}°",
                    "Tolerance".cyan(),
                    result.vertical_tolerance_deg
                );
                println!("  {}: {} ({:.1}%)", "Up".cyan(), result.up, share(result.up));
                println!("  {}: {} ({:.1}%)", "Down".cyan(), result.down, share(result.down));
                println!(
                    "  {}: {} ({:.1}%)",
                    "Wall candidates".cyan(),
                    result.horizontal,
                    share(result.horizontal)
                );
                println!(
                    "  {}: {} ({:.1}%)",
                    "Discarded".cyan(),
                    result.discarded,
                    share(result.discarded)
                );
                if result.duplicates > 0 {
                    println!("  {}: {}", "Duplicates".cyan(), result.duplicates);
                }
            }
        }
    }

    Ok(())
}
