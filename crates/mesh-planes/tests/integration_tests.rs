//! End-to-end tests for mesh-planes.
//!
//! These run whole scans through classification, plane extraction and the
//! orientation histogram, from in-memory fragments and from OBJ files.

use mesh_planes::{
    AnalyzerConfig, AzimuthCollision, Mesh, MeshFragment, MeshScanDriver, NormalClassifier,
    OrientationClass, OrientationHistogram, PlaneClusterFinder, RigidTransform, SampleSource,
    ScanState, StaticMeshSource, Vertex, analyze_fragments, load_fragments,
};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use std::io::Write;
use tempfile::NamedTempFile;

/// Create an axis-aligned cube centered at the origin.
///
/// Every face has its own 4 vertices so recomputed normals stay flat.
/// Triangles are wound CCW seen from outside.
fn create_room_cube(size: f64) -> Mesh {
    let h = size / 2.0;
    let x = Vector3::x();
    let y = Vector3::y();
    let z = Vector3::z();
    // (normal, u, v) with u x v = normal
    let faces = [(x, y, z), (-x, z, y), (y, z, x), (-y, x, z), (z, x, y), (-z, y, x)];

    let mut mesh = Mesh::new();
    for (n, u, v) in faces {
        let base = mesh.vertices.len() as u32;
        let center = n * h;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = center + u * (su * h) + v * (sv * h);
            mesh.vertices.push(Vertex::new(Point3::from(p)));
        }
        mesh.faces.push([base, base + 1, base + 2]);
        mesh.faces.push([base, base + 2, base + 3]);
    }
    mesh
}

fn cube_to_obj(mesh: &Mesh) -> String {
    let mut obj = String::from("o room\n");
    for v in &mesh.vertices {
        obj.push_str(&format!("v {} {} {}\n", v.position.x, v.position.y, v.position.z));
    }
    for f in &mesh.faces {
        obj.push_str(&format!("f {} {} {}\n", f[0] + 1, f[1] + 1, f[2] + 1));
    }
    obj
}

fn unit(v: &Vector3<f64>) -> Vector3<f64> {
    v.normalize()
}

#[test]
fn test_cube_classification() {
    let analysis = analyze_fragments(
        vec![MeshFragment::in_world_space(create_room_cube(1.0))],
        &AnalyzerConfig::default(),
    )
    .unwrap();

    assert_eq!(analysis.up.len(), 4);
    assert_eq!(analysis.down.len(), 4);
    assert_eq!(analysis.horizontal.len(), 16);
    assert_eq!(analysis.discarded, 0);

    assert!(analysis.up.iter().all(|s| (unit(&s.direction) - Vector3::y()).norm() < 1e-10));
    assert!(analysis.down.iter().all(|s| (unit(&s.direction) + Vector3::y()).norm() < 1e-10));
    assert!(analysis.horizontal.iter().all(|s| s.direction.y.abs() < 1e-10));
}

#[test]
fn test_cube_classification_direct() {
    // Same scenario without the driver: classify the face normals one by one
    let classifier = NormalClassifier::from_config(&AnalyzerConfig::default());
    let mesh = create_room_cube(1.0);

    let mut counts = [0usize; 4];
    for tri in mesh.triangles() {
        let class = classifier.classify(&tri.normal().unwrap());
        let slot = match class {
            OrientationClass::Up => 0,
            OrientationClass::Down => 1,
            OrientationClass::HorizontalCandidate => 2,
            OrientationClass::Discard => 3,
        };
        counts[slot] += 1;
    }
    assert_eq!(counts, [2, 2, 8, 0]);
}

#[test]
fn test_cube_four_wall_planes() {
    let config = AnalyzerConfig::default();
    let analysis =
        analyze_fragments(vec![MeshFragment::in_world_space(create_room_cube(1.0))], &config)
            .unwrap();

    assert_eq!(analysis.planes.len(), 4);
    for plane in &analysis.planes {
        assert_eq!(plane.member_count(), 4);
        assert!(plane.satisfies(&config.thresholds));
        assert!(plane.normal.y.abs() < 1e-10);
    }

    // One plane per vertical face
    let mut normals: Vec<Vector3<f64>> = analysis.planes.iter().map(|p| p.normal).collect();
    normals.sort_by(|a, b| (a.x, a.z).partial_cmp(&(b.x, b.z)).unwrap());
    let expected = [-Vector3::x(), -Vector3::z(), Vector3::z(), Vector3::x()];
    for (got, want) in normals.iter().zip(expected.iter()) {
        assert!((got - want).norm() < 1e-10, "got {:?} want {:?}", got, want);
    }
}

#[test]
fn test_clusters_are_disjoint_subsets() {
    let analysis = analyze_fragments(
        vec![MeshFragment::in_world_space(create_room_cube(2.0))],
        &AnalyzerConfig::default(),
    )
    .unwrap();

    let mut seen = Vec::new();
    for plane in &analysis.planes {
        for member in &plane.members {
            assert!(analysis.horizontal.contains(member));
            assert!(!seen.contains(member), "sample in two clusters");
            seen.push(*member);
        }
    }
}

#[test]
fn test_cube_dominant_orientation() {
    let fragments = vec![MeshFragment::in_world_space(create_room_cube(1.0))];

    let first = analyze_fragments(fragments.clone(), &AnalyzerConfig::default()).unwrap();
    // Four samples per face share an azimuth; only the first of each survives
    assert_eq!(first.dominant_orientation.len(), 4);
    assert_eq!(first.dominant_window_deg, Some(0.0));

    let config = AnalyzerConfig::default().with_azimuth_collision(AzimuthCollision::KeepAll);
    let all = analyze_fragments(fragments, &config).unwrap();
    assert_eq!(all.dominant_orientation.len(), 16);
}

#[test]
fn test_rotated_room_through_driver() {
    let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 30f64.to_radians());
    let transform =
        RigidTransform::from_rotation_translation(rotation, Vector3::new(4.0, 1.5, -2.0));
    let mut source =
        StaticMeshSource::new(vec![MeshFragment::new(create_room_cube(3.0), transform)]);

    let mut driver = MeshScanDriver::new(AnalyzerConfig::default()).unwrap();
    let mut polls = 0;
    while !driver.poll(&mut source).is_done() {
        polls += 1;
        assert!(polls < 10, "driver did not finish");
    }

    let ScanState::Done(analysis) = driver.state() else {
        panic!("expected Done");
    };
    assert_eq!(analysis.planes.len(), 4);
    assert!(analysis.planes.iter().all(|p| p.member_count() == 4));
    assert_eq!(analysis.up.len(), 4);
    assert_eq!(analysis.down.len(), 4);

    // Walls at 30, 120, 210, 300 degrees: all four fall in one window
    assert_eq!(analysis.dominant_orientation.len(), 4);
    let start = analysis.dominant_window_deg.unwrap();
    assert!((11.0..=30.0).contains(&start), "window start {}", start);
}

#[test]
fn test_z_up_room() {
    // Rotate the Y-up cube so its +Y face points along +Z
    let rotation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 90f64.to_radians());
    let fragment = MeshFragment::new(create_room_cube(1.0), RigidTransform::from_rotation(rotation));

    let analysis = analyze_fragments(vec![fragment], &AnalyzerConfig::for_z_up()).unwrap();
    assert_eq!(analysis.up.len(), 4);
    assert!(analysis.up.iter().all(|s| (s.direction - Vector3::z()).norm() < 1e-10));
    assert_eq!(analysis.planes.len(), 4);
}

#[test]
fn test_face_sampling_on_cube() {
    let config = AnalyzerConfig::default().with_sample_source(SampleSource::Faces);
    let analysis =
        analyze_fragments(vec![MeshFragment::in_world_space(create_room_cube(1.0))], &config)
            .unwrap();

    assert_eq!(analysis.up.len(), 2);
    assert_eq!(analysis.horizontal.len(), 8);
    assert!(analysis.planes.iter().all(|p| p.member_count() == 2));
}

#[test]
fn test_parallel_matches_sequential() {
    let fragments: Vec<MeshFragment> = (0..4)
        .map(|i| {
            let offset = Vector3::new(i as f64 * 5.0, 0.0, 0.0);
            MeshFragment::new(create_room_cube(1.0), RigidTransform::from_translation(offset))
        })
        .collect();

    let sequential = analyze_fragments(fragments.clone(), &AnalyzerConfig::default()).unwrap();
    let parallel =
        analyze_fragments(fragments, &AnalyzerConfig::default().with_parallel(true)).unwrap();

    assert_eq!(sequential.horizontal, parallel.horizontal);
    assert_eq!(sequential.planes, parallel.planes);
    assert_eq!(sequential.dominant_orientation, parallel.dominant_orientation);
}

#[test]
fn test_obj_room_end_to_end() {
    let mut file = NamedTempFile::with_suffix(".obj").unwrap();
    file.write_all(cube_to_obj(&create_room_cube(1.0)).as_bytes()).unwrap();
    file.flush().unwrap();

    let fragments = load_fragments(file.path()).unwrap();
    assert_eq!(fragments.len(), 1);

    let analysis = analyze_fragments(fragments, &AnalyzerConfig::default()).unwrap();
    assert_eq!(analysis.horizontal.len(), 16);
    assert_eq!(analysis.planes.len(), 4);
}

#[test]
fn test_components_compose() {
    // The building blocks give the same planes as the one-call helper
    let config = AnalyzerConfig::default();
    let analysis =
        analyze_fragments(vec![MeshFragment::in_world_space(create_room_cube(1.0))], &config)
            .unwrap();

    let planes = PlaneClusterFinder::from_config(&config)
        .find_top_planes(&analysis.horizontal, config.target_plane_count);
    assert_eq!(planes, analysis.planes);

    let cluster = OrientationHistogram::from_config(&config)
        .dominant_orientation_cluster(&analysis.horizontal);
    assert_eq!(cluster, analysis.dominant_orientation);
}
