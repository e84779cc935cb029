//! Tracing helpers for the analysis passes.
//!
//! The library only emits events; installing a subscriber is up to the host:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=mesh_planes=debug for per-fragment and per-plane output
//! ```
//!
//! # Targets
//!
//! - `mesh_planes::timing`: operation start/finish with elapsed time
//! - `mesh_planes::mesh_state`: fragment dimensions and normal recomputation
//! - `mesh_planes::classify`: per-class sample counts
//! - `mesh_planes::cluster`: extracted planes
//! - `mesh_planes::histogram`: dominant orientation windows
//! - `mesh_planes::scan`: driver state transitions and skipped fragments
//! - `mesh_planes::io`: file loading
//! - `mesh_planes::progress`, `mesh_planes::perf`

use std::time::Instant;
use tracing::{Span, debug, info, trace, warn};

use crate::classify::ClassifiedSamples;
use crate::cluster::PlaneDescriptor;
use crate::types::Mesh;

/// A performance timer that logs duration on drop.
///
/// ```rust,ignore
/// use mesh_planes::tracing_ext::OperationTimer;
///
/// fn cluster_walls() {
///     let _timer = OperationTimer::new("cluster_walls");
///     // ...
/// } // logs elapsed_ms here
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Create a new operation timer.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("plane_operation", operation = name);
        debug!(target: "mesh_planes::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Create a timer that also records how many samples the operation sees.
    pub fn with_samples(name: &'static str, sample_count: usize) -> Self {
        let span = tracing::info_span!(
            "plane_operation",
            operation = name,
            samples = sample_count
        );
        debug!(
            target: "mesh_planes::timing",
            operation = name,
            samples = sample_count,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Get the elapsed time.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Get the span for this timer.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        info!(
            target: "mesh_planes::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", elapsed_ms),
            "Operation completed"
        );
    }
}

/// Log fragment dimensions at debug level.
pub fn log_mesh_stats(mesh: &Mesh, context: &str) {
    let (min_bounds, max_bounds) = mesh.bounds().unwrap_or_default();
    let dims = max_bounds - min_bounds;

    debug!(
        target: "mesh_planes::mesh_state",
        context = context,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        dimensions = format!("{:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z),
        "Mesh state"
    );
}

/// Log per-class sample counts after classification.
pub fn log_classification_stats(samples: &ClassifiedSamples, context: &str) {
    info!(
        target: "mesh_planes::classify",
        context = context,
        up = samples.up().len(),
        down = samples.down().len(),
        horizontal = samples.horizontal().len(),
        discarded = samples.discarded(),
        duplicates = samples.duplicates(),
        "Normals categorized"
    );
}

/// Log the outcome of plane extraction.
pub fn log_plane_result(planes: &[PlaneDescriptor], requested: usize, elapsed_ms: f64) {
    if planes.len() < requested {
        debug!(
            target: "mesh_planes::cluster",
            found = planes.len(),
            requested = requested,
            "Candidate pool exhausted before reaching the target plane count"
        );
    }

    for (rank, plane) in planes.iter().enumerate() {
        trace!(
            target: "mesh_planes::cluster",
            rank = rank,
            members = plane.member_count(),
            origin = format!("({:.3}, {:.3}, {:.3})", plane.origin.x, plane.origin.y, plane.origin.z),
            normal = format!("({:.3}, {:.3}, {:.3})", plane.normal.x, plane.normal.y, plane.normal.z),
            "Plane extracted"
        );
    }

    info!(
        target: "mesh_planes::cluster",
        planes = planes.len(),
        largest = planes.first().map(|p| p.member_count()).unwrap_or(0),
        elapsed_ms = format!("{:.2}", elapsed_ms),
        "Plane extraction completed"
    );
}

/// Log progress for a long-running operation.
pub fn log_progress(operation: &str, current: usize, total: usize, stage: Option<&str>) {
    let percent = if total > 0 {
        (current as f64 / total as f64 * 100.0) as u32
    } else {
        0
    };

    debug!(
        target: "mesh_planes::progress",
        operation = operation,
        current = current,
        total = total,
        percent = percent,
        stage = stage.unwrap_or("processing"),
        "Progress update"
    );
}

/// Log a file I/O operation.
pub fn log_io_operation(operation: &str, path: &std::path::Path, success: bool) {
    if success {
        info!(
            target: "mesh_planes::io",
            operation = operation,
            path = path.display().to_string(),
            "I/O operation completed"
        );
    } else {
        warn!(
            target: "mesh_planes::io",
            operation = operation,
            path = path.display().to_string(),
            "I/O operation failed"
        );
    }
}

/// Log a performance-critical section at trace level.
///
/// Returns a guard that logs when dropped.
#[must_use]
pub fn log_perf_section(name: &'static str) -> impl Drop {
    struct PerfGuard {
        name: &'static str,
        start: Instant,
    }
    impl Drop for PerfGuard {
        fn drop(&mut self) {
            let elapsed = self.start.elapsed();
            trace!(
                target: "mesh_planes::perf",
                section = self.name,
                elapsed_us = elapsed.as_micros(),
                "Performance section completed"
            );
        }
    }
    PerfGuard {
        name,
        start: Instant::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::with_samples("test_operation", 12);
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10.0);
    }

    #[test]
    fn test_log_helpers_on_empty_inputs() {
        log_mesh_stats(&Mesh::new(), "test");
        log_classification_stats(&ClassifiedSamples::new(Some(4)), "test");
        log_plane_result(&[], 4, 0.0);
        log_progress("test", 0, 0, None);
    }
}
