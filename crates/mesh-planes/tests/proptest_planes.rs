//! Property-based tests for classification and clustering.
//!
//! Run with: cargo test -p mesh-planes -- proptest

use mesh_planes::{
    AnalyzerConfig, AngleThresholds, Mesh, MeshFragment, NormalClassifier, OrientationClass,
    OrientationHistogram, PlaneClusterFinder, Sample, Vertex, analyze_fragments, angle_deg,
};
use nalgebra::{Point3, Vector3};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// A non-degenerate direction, not necessarily unit length.
fn arb_direction() -> impl Strategy<Value = Vector3<f64>> {
    prop::array::uniform3(-1.0..1.0f64)
        .prop_map(|[x, y, z]| Vector3::new(x, y, z))
        .prop_filter("direction must not be zero", |v| v.norm() > 1e-3)
}

fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-10.0..10.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

/// A sample with a mostly horizontal direction.
fn arb_wall_sample() -> impl Strategy<Value = Sample> {
    (arb_point(), 0.0..360.0f64, -0.2..0.2f64).prop_map(|(origin, azimuth, tilt)| {
        let r = azimuth.to_radians();
        Sample::new(origin, Vector3::new(r.sin(), tilt, r.cos()))
    })
}

/// A random triangle soup in a 10 m box.
fn arb_mesh(max_vertices: usize, max_faces: usize) -> impl Strategy<Value = Mesh> {
    prop::collection::vec(arb_point(), 3..=max_vertices).prop_flat_map(move |points| {
        let n = points.len() as u32;
        prop::collection::vec(prop::array::uniform3(0..n), 1..=max_faces).prop_map(move |faces| {
            Mesh {
                vertices: points.iter().map(|&p| Vertex::new(p)).collect(),
                faces,
            }
        })
    })
}

// =============================================================================
// Property Tests: Angles and Classification
// =============================================================================

proptest! {
    /// The angle between two directions does not depend on argument order.
    #[test]
    fn proptest_angle_symmetric(a in arb_direction(), b in arb_direction()) {
        prop_assert_eq!(angle_deg(&a, &b), angle_deg(&b, &a));
    }

    /// Angles stay within [0, 180].
    #[test]
    fn proptest_angle_range(a in arb_direction(), b in arb_direction()) {
        let angle = angle_deg(&a, &b).unwrap();
        prop_assert!((0.0..=180.0).contains(&angle));
    }

    /// Classification is deterministic and agrees with the angle to the up axis.
    #[test]
    fn proptest_classify_deterministic(d in arb_direction(), tol in 1.0..45.0f64) {
        let classifier = NormalClassifier::new(Vector3::y(), tol);
        let class = classifier.classify(&d);
        prop_assert_eq!(class, classifier.classify(&d));

        let to_up = angle_deg(&Vector3::y(), &d).unwrap();
        match class {
            OrientationClass::Up => prop_assert!(to_up <= tol),
            OrientationClass::Down => prop_assert!(to_up >= 180.0 - tol - 1e-9),
            OrientationClass::HorizontalCandidate => {
                prop_assert!((to_up - 90.0).abs() <= tol + 1e-9)
            }
            OrientationClass::Discard => {
                prop_assert!(to_up > tol && to_up < 180.0 - tol + 1e-9);
                prop_assert!((to_up - 90.0).abs() > tol - 1e-9);
            }
        }
    }

    /// Scaling a direction never changes its class.
    #[test]
    fn proptest_classify_ignores_length(d in arb_direction(), scale in 0.01..100.0f64) {
        let classifier = NormalClassifier::from_config(&AnalyzerConfig::default());
        prop_assert_eq!(classifier.classify(&d), classifier.classify(&(d * scale)));
    }
}

// =============================================================================
// Property Tests: Plane Extraction
// =============================================================================

proptest! {
    /// At most k planes, disjoint, drawn from the input, each within tolerance.
    #[test]
    fn proptest_find_top_planes_bounded_disjoint(
        samples in prop::collection::vec(arb_wall_sample(), 0..60),
        k in 0usize..6,
    ) {
        let thresholds = AngleThresholds::default();
        let planes = PlaneClusterFinder::new(thresholds).find_top_planes(&samples, k);

        prop_assert!(planes.len() <= k);

        let total: usize = planes.iter().map(|p| p.member_count()).sum();
        prop_assert!(total <= samples.len());

        let mut used = vec![false; samples.len()];
        for plane in &planes {
            prop_assert!(plane.member_count() >= 1);
            prop_assert!(plane.satisfies(&thresholds));
            for member in &plane.members {
                // Match by position in the input so repeated samples count separately
                let slot = samples
                    .iter()
                    .enumerate()
                    .position(|(i, s)| s == member && !used[i]);
                prop_assert!(slot.is_some(), "member not in input or used twice");
                if let Some(i) = slot {
                    used[i] = true;
                }
            }
        }
    }

    /// Planes come out largest first.
    #[test]
    fn proptest_planes_non_increasing(samples in prop::collection::vec(arb_wall_sample(), 1..40)) {
        let planes = PlaneClusterFinder::default().find_top_planes(&samples, 8);
        for pair in planes.windows(2) {
            // Later pools are subsets of earlier ones, so clusters cannot grow
            prop_assert!(pair[0].member_count() >= pair[1].member_count());
        }
    }

    /// n samples on one plane with one direction form a single cluster.
    #[test]
    fn proptest_shared_plane_single_cluster(
        n in 1usize..50,
        normal in arb_direction(),
        seed_point in arb_point(),
    ) {
        let normal = normal.normalize();
        // Two in-plane axes
        let helper = if normal.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
        let u = normal.cross(&helper).normalize();
        let v = normal.cross(&u);

        let samples: Vec<Sample> = (0..n)
            .map(|i| {
                let a = (i % 7) as f64 * 0.3;
                let b = (i / 7) as f64 * 0.3;
                Sample::new(seed_point + u * a + v * b, normal)
            })
            .collect();

        let planes = PlaneClusterFinder::default().find_top_planes(&samples, 1);
        prop_assert_eq!(planes.len(), 1);
        prop_assert_eq!(planes[0].member_count(), n);
    }
}

// =============================================================================
// Property Tests: Orientation Histogram
// =============================================================================

proptest! {
    /// Four walls of a rotated rectangular room, with small noise, are one cluster.
    #[test]
    fn proptest_rectangular_room_orientation(
        phase in 0.0..360.0f64,
        noise in prop::array::uniform4(-0.4..0.4f64),
    ) {
        let samples: Vec<Sample> = (0..4)
            .map(|i| {
                let r = (phase + 90.0 * i as f64 + noise[i]).to_radians();
                Sample::new(Point3::origin(), Vector3::new(r.sin(), 0.0, r.cos()))
            })
            .collect();

        let cluster = OrientationHistogram::default().dominant_orientation_cluster(&samples);
        prop_assert_eq!(cluster.len(), 4);
    }

    /// The dominant cluster is a subset of the input, in input order.
    #[test]
    fn proptest_dominant_cluster_subset(samples in prop::collection::vec(arb_wall_sample(), 0..40)) {
        let cluster = OrientationHistogram::default().dominant_orientation_cluster(&samples);
        prop_assert!(cluster.len() <= samples.len());

        let mut cursor = 0;
        for member in &cluster {
            let offset = samples[cursor..].iter().position(|s| s == member);
            prop_assert!(offset.is_some());
            if let Some(offset) = offset {
                cursor += offset + 1;
            }
        }
    }
}

// =============================================================================
// Property Tests: Whole Analysis
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Analysis never fails on arbitrary geometry and partitions the samples.
    #[test]
    fn proptest_analysis_accounts_for_every_vertex(mesh in arb_mesh(30, 40)) {
        let vertex_count = mesh.vertex_count();
        let config = AnalyzerConfig::default().with_dedup_decimals(None);
        let analysis = analyze_fragments(vec![MeshFragment::in_world_space(mesh)], &config).unwrap();

        let classified = analysis.up.len() + analysis.down.len() + analysis.horizontal.len();
        prop_assert_eq!(classified + analysis.discarded, vertex_count);
        prop_assert!(analysis.planes.len() <= config.target_plane_count);
    }
}
