//! Loading scan fragments from mesh files.

use std::path::Path;

use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use crate::error::{PlaneError, PlaneResult};
use crate::tracing_ext::log_io_operation;
use crate::types::{Mesh, MeshFragment, Vertex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
}

impl MeshFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "obj" => Some(MeshFormat::Obj),
                _ => None,
            })
    }
}

/// Load every model in a mesh file as one fragment.
///
/// Coordinates are taken as world space (identity transform). Fragments are
/// not validated here; the analysis skips broken ones individually.
///
/// # Errors
///
/// Fails if the extension is not supported, the file cannot be read or
/// parsed, or it contains no geometry at all.
pub fn load_fragments(path: &Path) -> PlaneResult<Vec<MeshFragment>> {
    let format = MeshFormat::from_path(path).ok_or_else(|| PlaneError::UnsupportedFormat {
        extension: path.extension().and_then(|e| e.to_str()).map(String::from),
    })?;

    std::fs::metadata(path).map_err(|e| PlaneError::io_read(path, e))?;

    let result = match format {
        MeshFormat::Obj => load_obj(path),
    };
    log_io_operation("load_fragments", path, result.is_ok());
    let fragments = result?;

    if fragments.iter().all(|f| f.mesh.is_empty()) {
        return Err(PlaneError::empty_mesh("file contains no vertices"));
    }

    Ok(fragments)
}

/// Load all fragments of a file merged into a single mesh.
///
/// Used for summaries; analysis works on the separate fragments.
///
/// # Errors
///
/// See [`load_fragments`].
pub fn load_mesh(path: &Path) -> PlaneResult<Mesh> {
    let mut merged = Mesh::new();
    for fragment in load_fragments(path)? {
        append_mesh(&mut merged, fragment.mesh)?;
    }
    Ok(merged)
}

/// Append `mesh` to `merged`, shifting its face indices.
fn append_mesh(merged: &mut Mesh, mesh: Mesh) -> PlaneResult<()> {
    let offset = index_offset(merged.vertices.len())?;
    let total = merged.vertices.len() + mesh.vertices.len();

    let mut faces = Vec::with_capacity(mesh.faces.len());
    for face in &mesh.faces {
        let shifted = offset_face(face, offset)
            .ok_or(PlaneError::MeshTooLarge { vertex_count: total })?;
        faces.push(shifted);
    }

    merged.vertices.extend(mesh.vertices);
    merged.faces.extend(faces);
    Ok(())
}

fn index_offset(vertex_count: usize) -> PlaneResult<u32> {
    u32::try_from(vertex_count).map_err(|_| PlaneError::MeshTooLarge { vertex_count })
}

fn offset_face(face: &[u32; 3], offset: u32) -> Option<[u32; 3]> {
    Some([
        face[0].checked_add(offset)?,
        face[1].checked_add(offset)?,
        face[2].checked_add(offset)?,
    ])
}

fn load_obj(path: &Path) -> PlaneResult<Vec<MeshFragment>> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| PlaneError::parse_error(path, e.to_string()))?;

    let mut fragments = Vec::with_capacity(models.len());
    for model in &models {
        let obj_mesh = &model.mesh;
        let mut mesh = Mesh::with_capacity(obj_mesh.positions.len() / 3, obj_mesh.indices.len() / 3);
        let has_normals = obj_mesh.normals.len() == obj_mesh.positions.len();

        for (i, chunk) in obj_mesh.positions.chunks_exact(3).enumerate() {
            let position = Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            let vertex = if has_normals {
                let n = &obj_mesh.normals[i * 3..i * 3 + 3];
                Vertex::with_normal(position, Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64))
            } else {
                Vertex::new(position)
            };
            mesh.vertices.push(vertex);
        }

        for chunk in obj_mesh.indices.chunks_exact(3) {
            mesh.faces.push([chunk[0], chunk[1], chunk[2]]);
        }

        if mesh.faces.is_empty() {
            warn!(
                target: "mesh_planes::io",
                model = %model.name,
                "OBJ model has no faces"
            );
        }
        debug!(
            target: "mesh_planes::io",
            model = %model.name,
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "OBJ model loaded"
        );

        fragments.push(MeshFragment::in_world_space(mesh));
    }

    Ok(fragments)
}
