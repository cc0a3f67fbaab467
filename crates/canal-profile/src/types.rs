//! Surface mesh of a scanned canal impression.
//!
//! Coordinates are millimeters; every derived length, area and volume
//! inherits that unit.

use nalgebra::{Isometry3, Point3, Rotation3, Vector3};

/// A scan point.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub position: Point3<f64>,
}

impl Vertex {
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// Indexed triangle mesh.
///
/// The profiler only reads meshes. Decoding, simplification and cleanup
/// are the only stages that mutate one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    /// Index triples into `vertices`.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// True when there is nothing to section: no points or no faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// The point cloud the principal axis is fitted to.
    pub fn positions(&self) -> impl ExactSizeIterator<Item = &Point3<f64>> + '_ {
        self.vertices.iter().map(|v| &v.position)
    }

    /// Axis-aligned `(min, max)` corners, `None` without vertices.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut points = self.positions();
        let first = *points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p))))
    }

    /// Bounding box diagonal; sets the scale of the weld tolerance.
    pub fn extent(&self) -> f64 {
        self.bounds().map_or(0.0, |(min, max)| (max - min).norm())
    }

    /// Faces resolved to positions. Indices must be in range, which the
    /// loaders in [`crate::io`] check on decode.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }

    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    /// Rotation about the origin.
    pub fn rotate(&mut self, rotation: &Rotation3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position = rotation * vertex.position;
        }
    }

    /// A copy placed elsewhere in space, as a second scan of the same
    /// canal would be.
    pub fn transformed(&self, isometry: &Isometry3<f64>) -> Self {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex::new(isometry * v.position))
                .collect(),
            faces: self.faces.clone(),
        }
    }

    /// Volume by the divergence theorem, unsigned.
    ///
    /// Exact for closed meshes, so it serves as the reference the
    /// sectional estimate is checked against.
    pub fn enclosed_volume(&self) -> f64 {
        let signed: f64 = self
            .triangles()
            .map(|tri| tri.v0.coords.dot(&tri.v1.coords.cross(&tri.v2.coords)))
            .sum();
        (signed / 6.0).abs()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Face normal scaled by twice the area.
    #[inline]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    #[inline]
    pub fn area(&self) -> f64 {
        0.5 * self.normal_unnormalized().norm()
    }
}
