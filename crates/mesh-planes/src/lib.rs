//! Wall, floor and ceiling detection for scanned room meshes.
//!
//! Given the triangle mesh of a scanned environment, this crate classifies
//! surface normals by orientation and clusters the wall-facing samples into a
//! small number of dominant planes.
//!
//! # Pipeline
//!
//! ```text
//! MeshScanDriver ─> Sample ─> NormalClassifier ─> {Up, Down, HorizontalCandidate}
//!                                                         │
//!                          PlaneClusterFinder <───────────┤
//!                        OrientationHistogram <───────────┘
//! ```
//!
//! - **Classification** ([`classify`]): each (origin, normal) sample is Up,
//!   Down, a horizontal (wall) candidate, or discarded as oblique.
//! - **Plane extraction** ([`cluster`]): greedy search for the most populated
//!   co-planar, co-oriented subsets of the wall candidates.
//! - **Dominant orientation** ([`histogram`]): a 90°-periodic azimuth
//!   histogram finds the samples that agree on the room's wall orientation.
//! - **Scan session** ([`scan`]): gates analysis on scan time, walks the mesh
//!   fragments once, and runs the two clustering passes.
//!
//! # Coordinate System
//!
//! Defaults follow a **Y-up** frame with azimuths measured from **+Z**,
//! counter-clockwise about the up axis. Use [`AnalyzerConfig::for_z_up`] for
//! Z-up data. Distances are in scene units (meters for most scanners); the
//! default co-planarity tolerance of `0.05` assumes meters.
//!
//! # Quick Start
//!
//! ```no_run
//! use mesh_planes::{AnalyzerConfig, analyze_fragments, load_fragments};
//! use std::path::Path;
//!
//! let fragments = load_fragments(Path::new("room.obj")).unwrap();
//! let analysis = analyze_fragments(fragments, &AnalyzerConfig::default()).unwrap();
//!
//! for plane in &analysis.planes {
//!     println!("{} samples, normal {:?}", plane.member_count(), plane.normal);
//! }
//! ```
//!
//! # Driving a Live Scan
//!
//! ```no_run
//! use mesh_planes::{AnalyzerConfig, MeshScanDriver, ScanState, StaticMeshSource};
//!
//! let mut source = StaticMeshSource::new(Vec::new());
//! let mut driver = MeshScanDriver::new(AnalyzerConfig::default()).unwrap();
//!
//! // Called once per frame by the host
//! loop {
//!     if let ScanState::Done(analysis) = driver.poll(&mut source) {
//!         println!("{} planes", analysis.planes.len());
//!         break;
//!     }
//! }
//! ```

mod error;
mod types;

pub mod classify;
pub mod cluster;
pub mod config;
pub mod geometry;
pub mod histogram;
pub mod io;
pub mod progress;
pub mod sample;
pub mod scan;
pub mod tracing_ext;
pub mod transform;

pub use error::{ErrorCode, ErrorLocation, PlaneError, PlaneResult, RecoverySuggestion};
pub use types::{Mesh, MeshFragment, Triangle, Vertex};

pub use classify::{ClassifiedSamples, NormalClassifier, OrientationClass};
pub use cluster::{PlaneClusterFinder, PlaneDescriptor};
pub use config::{AnalyzerConfig, AngleThresholds, AzimuthCollision, SampleSource};
pub use geometry::{Plane, angle_deg, in_acceptable_range};
pub use histogram::{DominantOrientation, OrientationHistogram};
pub use io::{MeshFormat, load_fragments, load_mesh};
pub use progress::{Progress, ProgressCallback, ProgressTracker};
pub use sample::{Sample, SampleKey};
pub use scan::{
    MeshScanDriver, MeshSource, PlaneAnalysis, ScanState, SkippedFragment, StaticMeshSource,
    analyze_fragments, analyze_fragments_with_progress, fragment_samples,
};
pub use tracing_ext::OperationTimer;
pub use transform::RigidTransform;
