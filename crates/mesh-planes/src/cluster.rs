//! Greedy extraction of dominant wall planes.
//!
//! Every wall candidate in the pool is tried as a seed. The seed's plane
//! passes through its origin with its direction as normal; its cluster is the
//! seed plus every other pool sample lying within `planar_distance_tolerance`
//! of that plane whose direction is co-oriented with the seed's (anti-parallel
//! counts). The largest cluster wins, ties going to the earliest seed in pool
//! order. Its members leave the pool and the search repeats until `k` planes
//! are found or the pool is empty.
//!
//! This is a single-pass greedy heuristic: no refitting, no random sampling,
//! and no guarantee of a global optimum. Cost is `O(k * n^2)`.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::config::{AnalyzerConfig, AngleThresholds};
use crate::geometry::{Plane, in_acceptable_range, try_normalize};
use crate::sample::Sample;
use crate::tracing_ext::{OperationTimer, log_plane_result};

/// One detected planar cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneDescriptor {
    /// Origin of the seed sample.
    pub origin: Point3<f64>,
    /// Unit normal taken from the seed direction (zero for a degenerate seed).
    pub normal: Vector3<f64>,
    /// Cluster members, seed first, then pool order.
    pub members: Vec<Sample>,
}

impl PlaneDescriptor {
    /// Number of samples in the cluster.
    #[inline]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// The plane through `origin` with `normal`, if the normal is usable.
    pub fn plane(&self) -> Option<Plane> {
        Plane::new(self.origin, self.normal)
    }

    /// Check the cluster post-condition against `thresholds`.
    ///
    /// Every member must lie within the planar distance tolerance of the
    /// seed plane (`origin`, `normal`) and be co-oriented with the seed
    /// normal. The check is relative to the seed, not pairwise: two members
    /// on opposite sides of the plane may be up to twice the tolerance apart,
    /// and two tilted members up to twice the parallel tolerance. A
    /// descriptor without a usable normal may only hold its seed.
    pub fn satisfies(&self, thresholds: &AngleThresholds) -> bool {
        let Some(plane) = self.plane() else {
            return self.members.len() <= 1;
        };

        self.members.iter().all(|m| {
            plane.is_inlier(&m.origin, thresholds.planar_distance_tolerance)
                && in_acceptable_range(&plane.normal, &m.direction, thresholds.parallel_tolerance_deg)
        })
    }
}

/// Greedy co-planar, co-oriented cluster search.
#[derive(Debug, Clone, Default)]
pub struct PlaneClusterFinder {
    thresholds: AngleThresholds,
    parallel: bool,
}

impl PlaneClusterFinder {
    /// Create a sequential finder with the given thresholds.
    pub fn new(thresholds: AngleThresholds) -> Self {
        Self {
            thresholds,
            parallel: false,
        }
    }

    /// Create a finder from an analysis configuration.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.thresholds).with_parallel(config.parallel)
    }

    /// Score seeds on the rayon thread pool. Results are identical to the
    /// sequential search.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The thresholds in use.
    pub fn thresholds(&self) -> &AngleThresholds {
        &self.thresholds
    }

    /// Extract up to `k` planes from `candidates`, most populated first.
    ///
    /// Returned clusters are disjoint. An empty input, or `k == 0`, yields an
    /// empty result.
    pub fn find_top_planes(&self, candidates: &[Sample], k: usize) -> Vec<PlaneDescriptor> {
        let timer = OperationTimer::with_samples("find_top_planes", candidates.len());
        let mut pool: Vec<Sample> = candidates.to_vec();
        let mut planes = Vec::with_capacity(k.min(pool.len()));

        while planes.len() < k && !pool.is_empty() {
            let seed = self.best_seed(&pool);
            let members = self.cluster_indices(&pool, seed);

            debug!(
                target: "mesh_planes::cluster",
                pool = pool.len(),
                seed = seed,
                members = members.len(),
                "Most populated plane found"
            );

            let mut in_cluster = vec![false; pool.len()];
            for &i in &members {
                in_cluster[i] = true;
            }

            let seed_sample = pool[seed];
            planes.push(PlaneDescriptor {
                origin: seed_sample.origin,
                normal: try_normalize(&seed_sample.direction).unwrap_or_else(Vector3::zeros),
                members: members.iter().map(|&i| pool[i]).collect(),
            });

            let mut index = 0;
            pool.retain(|_| {
                let keep = !in_cluster[index];
                index += 1;
                keep
            });
        }

        log_plane_result(&planes, k, timer.elapsed_ms());
        planes
    }

    /// Index of the seed with the largest cluster; lowest index on ties.
    fn best_seed(&self, pool: &[Sample]) -> usize {
        if self.parallel {
            pool.par_iter()
                .enumerate()
                .map(|(i, _)| (i, self.cluster_size(pool, i)))
                .reduce_with(|a, b| {
                    if b.1 > a.1 || (b.1 == a.1 && b.0 < a.0) {
                        b
                    } else {
                        a
                    }
                })
                .map(|(i, _)| i)
                .unwrap_or(0)
        } else {
            let mut best = 0;
            let mut best_size = 0;
            for i in 0..pool.len() {
                let size = self.cluster_size(pool, i);
                if size > best_size {
                    best = i;
                    best_size = size;
                }
            }
            best
        }
    }

    fn cluster_size(&self, pool: &[Sample], seed: usize) -> usize {
        match Plane::new(pool[seed].origin, pool[seed].direction) {
            Some(plane) => {
                1 + pool
                    .iter()
                    .enumerate()
                    .filter(|&(j, t)| j != seed && self.joins(&plane, t))
                    .count()
            }
            None => 1,
        }
    }

    fn cluster_indices(&self, pool: &[Sample], seed: usize) -> Vec<usize> {
        let mut members = vec![seed];
        if let Some(plane) = Plane::new(pool[seed].origin, pool[seed].direction) {
            members.extend(
                pool.iter()
                    .enumerate()
                    .filter(|&(j, t)| j != seed && self.joins(&plane, t))
                    .map(|(j, _)| j),
            );
        }
        members
    }

    /// Whether `t` is co-planar and co-oriented with the seed plane.
    #[inline]
    fn joins(&self, plane: &Plane, t: &Sample) -> bool {
        plane.is_inlier(&t.origin, self.thresholds.planar_distance_tolerance)
            && in_acceptable_range(
                &plane.normal,
                &t.direction,
                self.thresholds.parallel_tolerance_deg,
            )
    }
}
