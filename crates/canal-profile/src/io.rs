//! Mesh decoding for STL, OBJ and PLY.
//!
//! Meshes arrive either as files on disk (CLI) or as raw upload bytes with a
//! declared format (request handler). Both paths share the same decoders and
//! the same validation.

use std::io::Cursor;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{MeshError, MeshResult};
use crate::validate::validate_mesh_data;
use crate::{Mesh, Vertex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
    Obj,
    Ply,
}

impl MeshFormat {
    /// Parse a declared format name or file extension (case-insensitive,
    /// with or without a leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "stl" => Some(MeshFormat::Stl),
            "obj" => Some(MeshFormat::Obj),
            "ply" => Some(MeshFormat::Ply),
            _ => None,
        }
    }

    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Detect format from an upload filename such as `right_ear.STL`.
    pub fn from_filename(filename: &str) -> MeshResult<Self> {
        let extension = filename.rsplit_once('.').map(|(_, ext)| ext);
        extension
            .and_then(Self::from_extension)
            .ok_or_else(|| MeshError::UnsupportedFormat {
                extension: extension.map(String::from),
            })
    }

    /// Short lowercase name of the format.
    pub fn name(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "stl",
            MeshFormat::Obj => "obj",
            MeshFormat::Ply => "ply",
        }
    }
}

/// Load a mesh from file, auto-detecting format from extension.
pub fn load_mesh(path: &Path) -> MeshResult<Mesh> {
    let format = MeshFormat::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path.extension().and_then(|e| e.to_str()).map(String::from),
    })?;

    info!("Loading mesh from {:?} (format: {:?})", path, format);

    let bytes = std::fs::read(path).map_err(|e| MeshError::io_read(path, e))?;
    load_mesh_from_bytes(&bytes, format)
}

/// Decode a mesh from raw bytes in the given format.
///
/// The result is validated: empty meshes, non-finite coordinates and
/// out-of-range face indices are rejected.
pub fn load_mesh_from_bytes(bytes: &[u8], format: MeshFormat) -> MeshResult<Mesh> {
    let mesh = match format {
        MeshFormat::Stl => decode_stl(bytes)?,
        MeshFormat::Obj => decode_obj(bytes)?,
        MeshFormat::Ply => decode_ply(bytes)?,
    };

    if let Some((min, max)) = mesh.bounds() {
        let dims = max - min;
        info!(
            "Decoded mesh: {} vertices, {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        );
        debug!("Dimensions: {:.1} x {:.1} x {:.1}", dims.x, dims.y, dims.z);

        // Ear canal scans are a few centimeters long in mm units
        let max_dim = dims.x.max(dims.y).max(dims.z);
        if max_dim < 0.1 {
            warn!(
                "Mesh largest dimension is {:.6} - may need scaling to millimeters",
                max_dim
            );
        }
    }

    validate_mesh_data(&mesh)?;

    Ok(mesh)
}

/// Decode an STL payload (binary or ASCII).
fn decode_stl(bytes: &[u8]) -> MeshResult<Mesh> {
    let mut reader = Cursor::new(bytes);

    // stl_io merges coincident corners into an indexed mesh
    let stl = stl_io::read_stl(&mut reader)
        .map_err(|e| MeshError::parse_error("stl", e.to_string()))?;

    debug!(
        "STL contains {} vertices, {} triangles",
        stl.vertices.len(),
        stl.faces.len()
    );

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());

    for v in &stl.vertices {
        mesh.vertices.push(Vertex::from_coords(
            v.0[0] as f64,
            v.0[1] as f64,
            v.0[2] as f64,
        ));
    }

    for face in &stl.faces {
        let indices = [
            face.vertices[0] as u32,
            face.vertices[1] as u32,
            face.vertices[2] as u32,
        ];

        // Skip triangles collapsed to an edge or a point
        if indices[0] != indices[1] && indices[1] != indices[2] && indices[0] != indices[2] {
            mesh.faces.push(indices);
        }
    }

    Ok(mesh)
}

/// Decode an OBJ payload, merging all models into a single mesh.
///
/// Material libraries are ignored.
fn decode_obj(bytes: &[u8]) -> MeshResult<Mesh> {
    let mut reader = Cursor::new(bytes);
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Err(tobj::LoadError::OpenFileFailed),
    )
    .map_err(|e| MeshError::parse_error("obj", e.to_string()))?;

    if models.is_empty() {
        return Err(MeshError::empty_mesh("OBJ file contains no models"));
    }

    let mut mesh = Mesh::new();
    let mut vertex_offset = 0u32;

    for model in &models {
        let obj_mesh = &model.mesh;

        for chunk in obj_mesh.positions.chunks_exact(3) {
            mesh.vertices.push(Vertex::from_coords(
                chunk[0] as f64,
                chunk[1] as f64,
                chunk[2] as f64,
            ));
        }

        // Indices are per-model
        for chunk in obj_mesh.indices.chunks_exact(3) {
            mesh.faces.push([
                chunk[0] + vertex_offset,
                chunk[1] + vertex_offset,
                chunk[2] + vertex_offset,
            ]);
        }

        vertex_offset = mesh.vertices.len() as u32;
    }

    debug!(
        "OBJ decoded: {} vertices, {} faces from {} models",
        mesh.vertices.len(),
        mesh.faces.len(),
        models.len()
    );

    Ok(mesh)
}

/// Decode a PLY payload (ASCII, binary little- or big-endian).
///
/// Expects `vertex` elements with `x`, `y`, `z` properties and `face`
/// elements with a `vertex_indices` (or `vertex_index`) list. Polygons are
/// fan-triangulated.
fn decode_ply(bytes: &[u8]) -> MeshResult<Mesh> {
    use ply_rs::parser::Parser;
    use ply_rs::ply::Property;

    let mut reader = Cursor::new(bytes);
    let parser = Parser::<ply_rs::ply::DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| MeshError::parse_error("ply", format!("{:?}", e)))?;

    let mut mesh = Mesh::new();

    if let Some(vertices) = ply.payload.get("vertex") {
        for vertex_element in vertices {
            let x = ply_float(vertex_element.get("x"), "x")?;
            let y = ply_float(vertex_element.get("y"), "y")?;
            let z = ply_float(vertex_element.get("z"), "z")?;
            mesh.vertices.push(Vertex::from_coords(x, y, z));
        }
    }

    if let Some(faces) = ply.payload.get("face") {
        for face_element in faces {
            let indices: Option<Vec<u32>> = match face_element
                .get("vertex_indices")
                .or_else(|| face_element.get("vertex_index"))
            {
                Some(Property::ListInt(list)) => Some(list.iter().map(|&i| i as u32).collect()),
                Some(Property::ListUInt(list)) => Some(list.clone()),
                Some(Property::ListShort(list)) => Some(list.iter().map(|&i| i as u32).collect()),
                Some(Property::ListUShort(list)) => Some(list.iter().map(|&i| i as u32).collect()),
                Some(Property::ListUChar(list)) => Some(list.iter().map(|&i| i as u32).collect()),
                _ => None,
            };

            if let Some(indices) = indices {
                for i in 1..indices.len().saturating_sub(1) {
                    mesh.faces.push([indices[0], indices[i], indices[i + 1]]);
                }
            }
        }
    }

    debug!(
        "PLY decoded: {} vertices, {} faces",
        mesh.vertices.len(),
        mesh.faces.len()
    );

    Ok(mesh)
}

/// Extract a float value from a PLY property.
fn ply_float(prop: Option<&ply_rs::ply::Property>, name: &str) -> MeshResult<f64> {
    use ply_rs::ply::Property;

    match prop {
        Some(Property::Float(v)) => Ok(*v as f64),
        Some(Property::Double(v)) => Ok(*v),
        Some(Property::Int(v)) => Ok(*v as f64),
        Some(Property::UInt(v)) => Ok(*v as f64),
        Some(Property::Short(v)) => Ok(*v as f64),
        Some(Property::UShort(v)) => Ok(*v as f64),
        Some(Property::Char(v)) => Ok(*v as f64),
        Some(Property::UChar(v)) => Ok(*v as f64),
        _ => Err(MeshError::parse_error(
            "ply",
            format!("missing or invalid vertex property: {}", name),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_STL_TETRA: &str = "solid tetra
facet normal 0 0 -1
  outer loop
    vertex 0 0 0
    vertex 0 10 0
    vertex 10 0 0
  endloop
endfacet
facet normal 0 -1 0
  outer loop
    vertex 0 0 0
    vertex 10 0 0
    vertex 0 0 10
  endloop
endfacet
facet normal -1 0 0
  outer loop
    vertex 0 0 0
    vertex 0 0 10
    vertex 0 10 0
  endloop
endfacet
facet normal 1 1 1
  outer loop
    vertex 10 0 0
    vertex 0 10 0
    vertex 0 0 10
  endloop
endfacet
endsolid tetra
";

    const OBJ_TETRA: &str = "o tetra
v 0 0 0
v 10 0 0
v 0 10 0
v 0 0 10
f 1 3 2
f 1 2 4
f 1 4 3
f 2 3 4
";

    const PLY_QUAD: &str = "ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
1 1 0
0 1 0
4 0 1 2 3
";

    #[test]
    fn test_format_detection() {
        assert_eq!(MeshFormat::from_extension("STL"), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_extension(".obj"), Some(MeshFormat::Obj));
        assert_eq!(MeshFormat::from_extension("ply"), Some(MeshFormat::Ply));
        assert_eq!(MeshFormat::from_extension("fbx"), None);
        assert_eq!(
            MeshFormat::from_path(Path::new("scans/left.Stl")),
            Some(MeshFormat::Stl)
        );
        assert_eq!(
            MeshFormat::from_filename("right.ear.obj").unwrap(),
            MeshFormat::Obj
        );
    }

    #[test]
    fn test_filename_without_extension() {
        let err = MeshFormat::from_filename("scan").unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFormat { extension: None }));

        let err = MeshFormat::from_filename("scan.gltf").unwrap_err();
        match err {
            MeshError::UnsupportedFormat { extension } => {
                assert_eq!(extension.as_deref(), Some("gltf"));
            }
            other => panic!("Expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_ascii_stl() {
        let mesh = load_mesh_from_bytes(ASCII_STL_TETRA.as_bytes(), MeshFormat::Stl).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 4);
    }

    #[test]
    fn test_decode_obj() {
        let mesh = load_mesh_from_bytes(OBJ_TETRA.as_bytes(), MeshFormat::Obj).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 4);
        assert!((mesh.enclosed_volume() - 1000.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_ply_fan_triangulates() {
        let mesh = load_mesh_from_bytes(PLY_QUAD.as_bytes(), MeshFormat::Ply).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.faces[0], [0, 1, 2]);
        assert_eq!(mesh.faces[1], [0, 2, 3]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = load_mesh_from_bytes(b"definitely not a mesh", MeshFormat::Ply);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_mesh(Path::new("/nonexistent/canal.stl")).unwrap_err();
        assert!(matches!(err, MeshError::IoRead { .. }));
    }
}
