//! mesh-planes detect command - extract wall planes and the room orientation.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use mesh_planes::geometry::{azimuth_deg, try_normalize};
use mesh_planes::{AnalyzerConfig, PlaneDescriptor, analyze_fragments, load_fragments};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct DetectionResult {
    path: String,
    requested_planes: usize,
    planes: Vec<PlaneInfo>,
    wall_candidates: usize,
    up: usize,
    down: usize,
    orientation: OrientationInfo,
}

#[derive(Serialize)]
struct PlaneInfo {
    members: usize,
    origin: [f64; 3],
    normal: [f64; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    azimuth_deg: Option<f64>,
}

#[derive(Serialize)]
struct OrientationInfo {
    members: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    window_start_deg: Option<f64>,
}

fn plane_info(plane: &PlaneDescriptor, config: &AnalyzerConfig) -> PlaneInfo {
    let azimuth = try_normalize(&config.up_axis)
        .and_then(|up| azimuth_deg(&plane.normal, &up, &config.reference_axis));
    PlaneInfo {
        members: plane.member_count(),
        origin: [plane.origin.x, plane.origin.y, plane.origin.z],
        normal: [plane.normal.x, plane.normal.y, plane.normal.z],
        azimuth_deg: azimuth,
    }
}

pub fn run(input: &Path, config: &AnalyzerConfig, cli: &Cli) -> Result<()> {
    let fragments =
        load_fragments(input).with_context(|| format!("Failed to load scan from {:?}", input))?;

    output::info(
        &format!(
            "Searching {} fragment(s) for {} wall plane(s)...",
            fragments.len(),
            config.target_plane_count
        ),
        cli.format,
        cli.quiet,
    );

    let analysis = analyze_fragments(fragments, config)
        .with_context(|| format!("Failed to analyze {:?}", input))?;

    for skipped in &analysis.skipped_fragments {
        output::warning(
            &format!("Skipped fragment {}: {}", skipped.index, skipped.reason),
            cli.format,
            cli.quiet,
        );
    }

    let result = DetectionResult {
        path: input.display().to_string(),
        requested_planes: config.target_plane_count,
        planes: analysis.planes.iter().map(|p| plane_info(p, config)).collect(),
        wall_candidates: analysis.horizontal.len(),
        up: analysis.up.len(),
        down: analysis.down.len(),
        orientation: OrientationInfo {
            members: analysis.dominant_orientation.len(),
            window_start_deg: analysis.dominant_window_deg,
        },
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&result, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                if result.planes.is_empty() {
                    output::warning("No wall planes found", cli.format, cli.quiet);
                } else {
                    output::success(
                        &format!(
                            "Found {} of {} requested wall plane(s)",
                            result.planes.len(),
                            result.requested_planes
                        ),
                        cli.format,
                        cli.quiet,
                    );
                }

                for (i, plane) in result.planes.iter().enumerate() {
                    let azimuth = plane
                        .azimuth_deg
                        .map(|a| format!("{:.1}°", a))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "  {} {}: {} samples, azimuth {}, origin ({:.2}, {:.2}, {:.2})",
                        "Plane".cyan(),
                        i + 1,
                        plane.members,
                        azimuth,
                        plane.origin[0],
                        plane.origin[1],
                        plane.origin[2]
                    );
                }

                println!(
                    "  {}: {} (up {}, down {})",
                    "Wall candidates".cyan(),
                    result.wall_candidates,
                    result.up,
                    result.down
                );
                match result.orientation.window_start_deg {
                    Some(start) => println!(
                        "  {}: {} samples in window starting at {:.0}°",
                        "Dominant orientation".cyan(),
                        result.orientation.members,
                        start
                    ),
                    None => println!("  {}: none", "Dominant orientation".cyan()),
                }
            }
        }
    }

    Ok(())
}
