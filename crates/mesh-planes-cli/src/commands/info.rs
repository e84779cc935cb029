//! mesh-planes info command - display scan statistics.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use mesh_planes::load_fragments;
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct ScanInfo {
    path: String,
    fragments: usize,
    empty_fragments: usize,
    vertices: usize,
    faces: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    bounds: Option<BoundsInfo>,
    has_normals: bool,
}

#[derive(Serialize)]
struct BoundsInfo {
    min: [f64; 3],
    max: [f64; 3],
    dimensions: [f64; 3],
}

pub fn run(input: &Path, cli: &Cli) -> Result<()> {
    let fragments =
        load_fragments(input).with_context(|| format!("Failed to load scan from {:?}", input))?;

    let mut min: Option<[f64; 3]> = None;
    let mut max: Option<[f64; 3]> = None;
    for (lo, hi) in fragments.iter().filter_map(|f| f.mesh.bounds()) {
        let lo = [lo.x, lo.y, lo.z];
        let hi = [hi.x, hi.y, hi.z];
        min = Some(match min {
            Some(m) => std::array::from_fn(|i| m[i].min(lo[i])),
            None => lo,
        });
        max = Some(match max {
            Some(m) => std::array::from_fn(|i| m[i].max(hi[i])),
            None => hi,
        });
    }
    let bounds = min.zip(max).map(|(min, max)| BoundsInfo {
        min,
        max,
        dimensions: std::array::from_fn(|i| max[i] - min[i]),
    });

    let info = ScanInfo {
        path: input.display().to_string(),
        fragments: fragments.len(),
        empty_fragments: fragments.iter().filter(|f| f.mesh.is_empty()).count(),
        vertices: fragments.iter().map(|f| f.mesh.vertex_count()).sum(),
        faces: fragments.iter().map(|f| f.mesh.face_count()).sum(),
        bounds,
        has_normals: fragments
            .iter()
            .any(|f| f.mesh.vertices.iter().any(|v| v.normal.is_some())),
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&info, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Scan Information".bold().underline());
                println!("  {}: {}", "File".cyan(), input.display());
                println!("  {}: {}", "Fragments".cyan(), info.fragments);
                if info.empty_fragments > 0 {
                    println!("  {}: {}", "Empty fragments".cyan(), info.empty_fragments);
                }
                println!("  {}: {}", "Vertices".cyan(), info.vertices);
                println!("  {}: {}", "Faces".cyan(), info.faces);

                if let Some(ref b) = info.bounds {
                    println!(
                        "  {}: {:.2} x {:.2} x {:.2}",
                        "Dimensions".cyan(),
                        b.dimensions[0],
                        b.dimensions[1],
                        b.dimensions[2]
                    );
                    println!(
                        "  {}: ({:.2}, {:.2}, {:.2})",
                        "Min bounds".cyan(),
                        b.min[0],
                        b.min[1],
                        b.min[2]
                    );
                    println!(
                        "  {}: ({:.2}, {:.2}, {:.2})",
                        "Max bounds".cyan(),
                        b.max[0],
                        b.max[1],
                        b.max[2]
                    );
                }

                println!(
                    "  {}: {}",
                    "Has normals".cyan(),
                    if info.has_normals { "yes (recomputed during analysis)" } else { "no" }
                );
            }
        }
    }

    Ok(())
}
