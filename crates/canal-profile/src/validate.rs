//! Mesh data validation.
//!
//! Decoders hand back whatever the file contained; this module rejects data
//! the analysis cannot use before any geometry is computed on it.

use crate::Mesh;
use crate::error::{MeshError, MeshResult};

/// Check that a mesh is non-empty, has finite coordinates and only
/// references existing vertices.
///
/// # Example
/// ```
/// use canal_profile::{Mesh, Vertex, validate_mesh_data};
///
/// let mut mesh = Mesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
/// assert!(validate_mesh_data(&mesh).is_ok());
///
/// mesh.faces.push([0, 1, 7]);
/// assert!(validate_mesh_data(&mesh).is_err());
/// ```
pub fn validate_mesh_data(mesh: &Mesh) -> MeshResult<()> {
    if mesh.vertices.is_empty() || mesh.faces.is_empty() {
        return Err(MeshError::empty_mesh("mesh has no vertices or faces"));
    }

    for (vertex_index, vertex) in mesh.vertices.iter().enumerate() {
        let coords = [
            ("x", vertex.position.x),
            ("y", vertex.position.y),
            ("z", vertex.position.z),
        ];

        for (coordinate, value) in coords {
            if !value.is_finite() {
                return Err(MeshError::InvalidCoordinate {
                    vertex_index,
                    coordinate,
                    value,
                });
            }
        }
    }

    let vertex_count = mesh.vertices.len();
    for (face_index, face) in mesh.faces.iter().enumerate() {
        if let Some(&vertex_index) = face.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::InvalidVertexIndex {
                face_index,
                vertex_index,
                vertex_count,
            });
        }
    }

    Ok(())
}
