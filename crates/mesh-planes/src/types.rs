//! Core mesh data types.
//!
//! A scan arrives as a list of [`MeshFragment`]s, each an indexed triangle
//! [`Mesh`] in local coordinates plus the [`RigidTransform`] that places it
//! in the world.

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::error::{PlaneError, PlaneResult};
use crate::transform::RigidTransform;

/// A vertex with an optional normal.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,

    /// Unit normal vector, computed from adjacent faces.
    pub normal: Option<Vector3<f64>>,
}

impl Vertex {
    /// Create a new vertex with only position set.
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: None,
        }
    }

    /// Create a vertex from raw coordinates.
    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Create a vertex with position and normal.
    #[inline]
    pub fn with_normal(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            normal: Some(normal),
        }
    }
}

/// A triangle mesh with indexed vertices and faces.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is [v0, v1, v2] with counter-clockwise winding.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (triangles) in the mesh.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if mesh is empty (no vertices or faces).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Compute the axis-aligned bounding box.
    /// Returns (min_corner, max_corner) or None if mesh is empty.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?;

        let mut min = first.position;
        let mut max = first.position;

        for vertex in &self.vertices[1..] {
            let p = &vertex.position;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Iterate over triangles, yielding Triangle structs with actual vertex data.
    ///
    /// Call [`Mesh::validate`] first; out-of-range indices panic here.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }

    /// Check that the mesh has vertices, that every face index is in range and
    /// that every coordinate is finite.
    pub fn validate(&self) -> PlaneResult<()> {
        if self.vertices.is_empty() {
            return Err(PlaneError::empty_mesh("fragment has no vertices"));
        }

        for (vertex_index, vertex) in self.vertices.iter().enumerate() {
            let p = &vertex.position;
            for (coordinate, value) in [("x", p.x), ("y", p.y), ("z", p.z)] {
                if !value.is_finite() {
                    return Err(PlaneError::invalid_coordinate(
                        vertex_index,
                        coordinate,
                        value,
                    ));
                }
            }
        }

        let vertex_count = self.vertices.len();
        for (face_index, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(PlaneError::invalid_vertex_index(
                    face_index,
                    bad,
                    vertex_count,
                ));
            }
        }

        Ok(())
    }

    /// Recompute vertex normals from the face geometry.
    ///
    /// Normals are the area-weighted average of adjacent face normals. Vertices
    /// not referenced by any non-degenerate face end up with `normal = None`.
    pub fn compute_vertex_normals(&mut self) {
        for vertex in &mut self.vertices {
            vertex.normal = None;
        }

        let mut normal_accum: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];

        for face in &self.faces {
            let tri = Triangle::new(
                self.vertices[face[0] as usize].position,
                self.vertices[face[1] as usize].position,
                self.vertices[face[2] as usize].position,
            );

            // Unnormalized normal has length 2*area, which gives the weighting
            let weighted_normal = tri.normal_unnormalized();

            normal_accum[face[0] as usize] += weighted_normal;
            normal_accum[face[1] as usize] += weighted_normal;
            normal_accum[face[2] as usize] += weighted_normal;
        }

        for (idx, accum) in normal_accum.into_iter().enumerate() {
            let len_sq = accum.norm_squared();
            if len_sq > f64::EPSILON {
                self.vertices[idx].normal = Some(accum / len_sq.sqrt());
            }
        }

        debug!(
            target: "mesh_planes::mesh_state",
            vertices = self.vertices.len(),
            "Recomputed vertex normals"
        );
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// One piece of a scanned environment: local geometry plus its placement.
#[derive(Debug, Clone, Default)]
pub struct MeshFragment {
    /// Geometry in fragment-local coordinates.
    pub mesh: Mesh,
    /// Local-to-world transform.
    pub transform: RigidTransform,
}

impl MeshFragment {
    /// Create a fragment from a mesh and its local-to-world transform.
    pub fn new(mesh: Mesh, transform: RigidTransform) -> Self {
        Self { mesh, transform }
    }

    /// Create a fragment whose local coordinates are already world coordinates.
    pub fn in_world_space(mesh: Mesh) -> Self {
        Self::new(mesh, RigidTransform::identity())
    }
}

/// A triangle with concrete vertex positions.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Compute the (unnormalized) face normal via cross product.
    /// The direction follows the right-hand rule with CCW winding.
    #[inline]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2)
    }

    /// Compute the unit face normal.
    /// Returns None for degenerate triangles (zero area).
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len_sq = n.norm_squared();
        if len_sq > f64::EPSILON {
            Some(n / len_sq.sqrt())
        } else {
            None
        }
    }

    /// Compute the area of the triangle.
    #[inline]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Compute the centroid (center of mass).
    #[inline]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::new(
            (self.v0.x + self.v1.x + self.v2.x) / 3.0,
            (self.v0.y + self.v1.y + self.v2.y) / 3.0,
            (self.v0.z + self.v1.z + self.v2.z) / 3.0,
        )
    }
}
