//! mesh-planes: command-line wall, floor and ceiling detection for room scans.
//!
//! Loads a scanned room mesh, classifies its surface normals by orientation
//! and reports the dominant wall planes, suitable for scripting and batch
//! processing of captured scans.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=mesh_planes=info` - Basic operation logging
//! - `RUST_LOG=mesh_planes=debug` - Per-fragment and per-plane details
//! - `RUST_LOG=mesh_planes::timing=info` - Performance timing
//! - `RUST_LOG=debug` - All debug output
//!
//! # Example
//!
//! ```bash
//! # Find the four main walls with info logging
//! RUST_LOG=mesh_planes=info mesh-planes detect room.obj --planes 4
//!
//! # JSON output for scripting
//! mesh-planes --format json classify room.obj
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use mesh_planes::{AnalyzerConfig, AngleThresholds, AzimuthCollision, SampleSource};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{classify, detect, info};

/// mesh-planes - Detect walls, floors and ceilings in scanned room meshes.
#[derive(Parser)]
#[command(name = "mesh-planes")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Display fragment and vertex statistics of a scan
    Info {
        /// Input mesh file (OBJ)
        input: PathBuf,
    },

    /// Classify surface normals into up, down, wall and oblique
    Classify {
        /// Input mesh file (OBJ)
        input: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Find the dominant wall planes and the room's wall orientation
    Detect {
        /// Input mesh file (OBJ)
        input: PathBuf,

        /// Number of wall planes to extract
        #[arg(long, short = 'n')]
        planes: Option<usize>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

/// Analysis settings shared by `classify` and `detect`.
///
/// Flags override values loaded with `--config`.
#[derive(Args)]
pub struct AnalysisArgs {
    /// JSON analyzer configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Angular tolerance in degrees for up/down/wall classification
    #[arg(long)]
    vertical_tolerance: Option<f64>,

    /// Maximum distance of a sample from a plane, in scene units
    #[arg(long)]
    plane_tolerance: Option<f64>,

    /// Treat the data as Z-up instead of Y-up
    #[arg(long)]
    z_up: bool,

    /// Sample triangle centroids instead of vertices
    #[arg(long)]
    faces: bool,

    /// Keep every sample in the orientation histogram, not one per azimuth
    #[arg(long)]
    keep_all_azimuths: bool,

    /// Process fragments in parallel
    #[arg(long)]
    parallel: bool,
}

impl AnalysisArgs {
    /// Build the analyzer configuration from `--config` and the flags.
    pub fn to_config(&self, planes: Option<usize>) -> Result<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config from {:?}", path))?;
                AnalyzerConfig::from_json(&json)
                    .with_context(|| format!("Failed to parse config {:?}", path))?
            }
            None if self.z_up => AnalyzerConfig::for_z_up(),
            None => AnalyzerConfig::default(),
        };

        if self.config.is_some() && self.z_up {
            let z_up = AnalyzerConfig::for_z_up();
            config = config.with_axes(z_up.up_axis, z_up.reference_axis);
        }

        if self.vertical_tolerance.is_some() || self.plane_tolerance.is_some() {
            let current = config.thresholds;
            let thresholds = AngleThresholds::new(
                self.vertical_tolerance.unwrap_or(current.vertical_tolerance_deg),
                self.plane_tolerance.unwrap_or(current.planar_distance_tolerance),
            )
            .with_parallel_tolerance(
                self.vertical_tolerance.unwrap_or(current.parallel_tolerance_deg),
            );
            config = config.with_thresholds(thresholds);
        }

        if let Some(count) = planes {
            config = config.with_target_plane_count(count);
        }
        if self.faces {
            config = config.with_sample_source(SampleSource::Faces);
        }
        if self.keep_all_azimuths {
            config = config.with_azimuth_collision(AzimuthCollision::KeepAll);
        }
        if self.parallel {
            config = config.with_parallel(true);
        }

        config.validate()?;
        tracing::debug!(target: "mesh_planes::cli", ?config, "Analyzer configuration");
        Ok(config)
    }
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "mesh_planes=info",
            2 => "mesh_planes=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Info { input } => info::run(input, &cli),
        Commands::Classify { input, analysis } => analysis
            .to_config(None)
            .and_then(|config| classify::run(input, &config, &cli)),
        Commands::Detect {
            input,
            planes,
            analysis,
        } => analysis
            .to_config(*planes)
            .and_then(|config| detect::run(input, &config, &cli)),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            if let Some(plane_err) = e.downcast_ref::<mesh_planes::PlaneError>() {
                eprintln!("{}: {}", "Error".red().bold(), plane_err);
                eprintln!("  {}: {}", "Code".cyan(), plane_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    plane_err.recovery_suggestion()
                );
                if let Some(location) = plane_err.location() {
                    eprintln!("  {}: {}", "Location".yellow(), location);
                }
            } else {
                eprintln!("{}: {}", "Error".red().bold(), e);
                for cause in e.chain().skip(1) {
                    eprintln!("  {}: {}", "Caused by".yellow(), cause);
                }
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    fn detect_config(args: &[&str]) -> Result<AnalyzerConfig> {
        let mut argv = vec!["mesh-planes", "detect", "room.obj"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Detect {
                planes, analysis, ..
            } => analysis.to_config(planes),
            _ => panic!("expected detect"),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let config = detect_config(&[]).unwrap();
        assert_eq!(config, AnalyzerConfig::default());
    }

    #[test]
    fn test_flag_overrides() {
        let config = detect_config(&[
            "--planes",
            "2",
            "--vertical-tolerance",
            "10",
            "--faces",
            "--keep-all-azimuths",
            "--parallel",
        ])
        .unwrap();

        assert_eq!(config.target_plane_count, 2);
        assert_eq!(config.thresholds.vertical_tolerance_deg, 10.0);
        assert_eq!(config.thresholds.parallel_tolerance_deg, 10.0);
        assert_eq!(config.thresholds.planar_distance_tolerance, 0.05);
        assert_eq!(config.sample_source, SampleSource::Faces);
        assert_eq!(config.azimuth_collision, AzimuthCollision::KeepAll);
        assert!(config.parallel);
    }

    #[test]
    fn test_z_up_flag() {
        let config = detect_config(&["--z-up"]).unwrap();
        assert_eq!(config.up_axis, AnalyzerConfig::for_z_up().up_axis);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(detect_config(&["--planes", "0"]).is_err());
        assert!(detect_config(&["--vertical-tolerance", "120"]).is_err());
    }

    #[test]
    fn test_config_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(br#"{ "target_plane_count": 6 }"#).unwrap();
        file.flush().unwrap();

        let path = file.path().to_str().unwrap();
        let config = detect_config(&["--config", path]).unwrap();
        assert_eq!(config.target_plane_count, 6);

        // Flags win over the file
        let config = detect_config(&["--config", path, "--planes", "3"]).unwrap();
        assert_eq!(config.target_plane_count, 3);
    }
}
