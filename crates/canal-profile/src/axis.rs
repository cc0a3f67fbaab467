//! Principal axis estimation.
//!
//! The canal's long axis is taken to be the direction of maximal variance
//! of the vertex cloud. Its sign is whatever the eigen solver returns;
//! nothing downstream depends on it.

use nalgebra::{Matrix3, Point3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Mesh;
use crate::error::{AnalysisError, AnalysisResult};

/// Relative eigenvalue floor below which a cloud has no usable direction.
const DEGENERATE_VARIANCE: f64 = 1e-12;

/// Centroid and unit direction of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Coordinate-wise mean of the points.
    pub center: Point3<f64>,
    /// Unit principal direction.
    pub axis: Unit<Vector3<f64>>,
}

impl Axis {
    /// Signed distance of `p` along the axis, measured from the centre.
    #[inline]
    pub fn project(&self, p: &Point3<f64>) -> f64 {
        (p - self.center).dot(&self.axis)
    }

    /// The point at signed distance `s` along the axis.
    #[inline]
    pub fn point_at(&self, s: f64) -> Point3<f64> {
        self.center + self.axis.into_inner() * s
    }

    /// Two unit vectors spanning the plane orthogonal to the axis.
    pub fn plane_basis(&self) -> (Vector3<f64>, Vector3<f64>) {
        let normal = self.axis.into_inner();
        let u = if normal.x.abs() < 0.9 {
            Vector3::x().cross(&normal).normalize()
        } else {
            Vector3::y().cross(&normal).normalize()
        };
        let v = normal.cross(&u);
        (u, v)
    }
}

/// Estimate the principal axis of a mesh's vertices.
///
/// # Errors
/// [`AnalysisError::DegenerateGeometry`] for fewer than four vertices or a
/// cloud with no direction of non-negligible variance.
///
/// # Example
/// ```
/// use canal_profile::{Mesh, Vertex, principal_axis};
///
/// let mut mesh = Mesh::new();
/// for i in 0..10 {
///     let x = i as f64;
///     mesh.vertices.push(Vertex::from_coords(x, 0.1 * (i % 2) as f64, 0.0));
/// }
/// let axis = principal_axis(&mesh).unwrap();
/// assert!(axis.axis.x.abs() > 0.99);
/// ```
pub fn principal_axis(mesh: &Mesh) -> AnalysisResult<Axis> {
    if mesh.vertex_count() < 4 {
        return Err(AnalysisError::degenerate(format!(
            "{} vertices, at least 4 required",
            mesh.vertex_count()
        )));
    }

    let center = compute_centroid(mesh);
    let cov = compute_covariance_matrix(mesh, &center);
    let eigen = cov.symmetric_eigen();

    let imax = eigen.eigenvalues.imax();
    let max_variance = eigen.eigenvalues[imax];
    let extent = mesh.extent();

    if !max_variance.is_finite() || max_variance <= DEGENERATE_VARIANCE * extent * extent {
        return Err(AnalysisError::degenerate(
            "vertex cloud has no direction of variance",
        ));
    }

    let axis = Unit::new_normalize(eigen.eigenvectors.column(imax).into_owned());

    debug!(
        center = ?center,
        axis = ?axis.into_inner(),
        variance = max_variance,
        "Principal axis"
    );

    Ok(Axis { center, axis })
}

fn compute_centroid(mesh: &Mesh) -> Point3<f64> {
    let sum = mesh
        .positions()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / mesh.vertex_count() as f64)
}

fn compute_covariance_matrix(mesh: &Mesh, centroid: &Point3<f64>) -> Matrix3<f64> {
    let cov = mesh.positions().fold(Matrix3::zeros(), |acc, p| {
        let d = p - centroid;
        acc + d * d.transpose()
    });
    cov / mesh.vertex_count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vertex;
    use crate::test_meshes::cylinder;
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Rotation3};

    #[test]
    fn test_cylinder_axis_is_z() {
        let mesh = cylinder(2.0, 20.0, 20, 24);
        let axis = principal_axis(&mesh).unwrap();
        assert_relative_eq!(axis.axis.z.abs(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(axis.axis.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(axis.center.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(axis.center.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_axis_follows_rotation() {
        let mesh = cylinder(2.0, 20.0, 20, 24);
        let rotation = Rotation3::from_euler_angles(0.4, -0.9, 0.2);
        let moved = mesh.transformed(&Isometry3::from_parts(
            Vector3::new(3.0, 4.0, 5.0).into(),
            rotation.into(),
        ));

        let axis = principal_axis(&moved).unwrap();
        let expected = rotation * Vector3::z();
        assert_relative_eq!(axis.axis.dot(&expected).abs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_projection_roundtrip() {
        let mesh = cylinder(1.0, 10.0, 10, 16);
        let axis = principal_axis(&mesh).unwrap();
        let p = axis.point_at(2.5);
        assert_relative_eq!(axis.project(&p), 2.5, epsilon = 1e-12);

        let (u, v) = axis.plane_basis();
        assert_relative_eq!(u.dot(&axis.axis), 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.dot(&axis.axis), 0.0, epsilon = 1e-12);
        assert_relative_eq!(u.dot(&v), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_too_few_points() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        assert!(matches!(
            principal_axis(&mesh),
            Err(AnalysisError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn test_coincident_points() {
        let mut mesh = Mesh::new();
        for _ in 0..6 {
            mesh.vertices.push(Vertex::from_coords(1.0, 2.0, 3.0));
        }
        assert!(matches!(
            principal_axis(&mesh),
            Err(AnalysisError::DegenerateGeometry { .. })
        ));
    }
}
