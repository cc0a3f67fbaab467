//! Plane sweeps along the principal axis.
//!
//! Each section is the set of distinct points where the mesh surface meets
//! a plane orthogonal to the axis. Sections with too few distinct points are
//! treated as noise and dropped.

use hashbrown::HashSet;
use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::Mesh;
use crate::axis::Axis;
use crate::tracing_ext::OperationTimer;

/// Relative tolerance under which two intersection points are the same.
const WELD_TOLERANCE: f64 = 1e-9;

/// The boundary points of one plane cut.
#[derive(Debug, Clone)]
pub struct CrossSection {
    /// Signed position along the axis.
    pub s: f64,
    /// Distinct intersection points, in 3D.
    pub points: Vec<Point3<f64>>,
}

/// Result of sweeping planes along an axis.
#[derive(Debug, Clone)]
pub struct SectionSampling {
    /// Smallest vertex projection onto the axis.
    pub s_min: f64,
    /// Largest vertex projection onto the axis.
    pub s_max: f64,
    /// Number of planes swept.
    pub planes: usize,
    /// Sections that met the point threshold, in increasing `s`.
    pub sections: Vec<CrossSection>,
}

impl SectionSampling {
    /// Length of the vertex projection range.
    pub fn canal_length(&self) -> f64 {
        self.s_max - self.s_min
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
///
/// ```
/// use canal_profile::section::linspace;
///
/// assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(linspace(2.0, 9.0, 1), vec![2.0]);
/// assert!(linspace(0.0, 1.0, 0).is_empty());
/// ```
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Sweep `n_sections` planes across the mesh's extent along `axis`.
///
/// Sections with fewer than `min_points` distinct boundary points are
/// dropped; the rest are returned in sweep order.
pub fn sample_sections(
    mesh: &Mesh,
    axis: &Axis,
    n_sections: usize,
    min_points: usize,
) -> SectionSampling {
    let _timer = OperationTimer::with_mesh("sample_sections", mesh);

    let projections: Vec<f64> = mesh.positions().map(|p| axis.project(p)).collect();
    let (s_min, s_max) = projections
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s), hi.max(s))
        });

    let tolerance = (WELD_TOLERANCE * mesh.extent()).max(f64::MIN_POSITIVE);

    let sections: Vec<CrossSection> = linspace(s_min, s_max, n_sections)
        .into_par_iter()
        .filter_map(|s| {
            let points = plane_intersection(mesh, &projections, s, tolerance);
            if points.len() < min_points {
                trace!(s, points = points.len(), "Section dropped");
                None
            } else {
                Some(CrossSection { s, points })
            }
        })
        .collect();

    debug!(
        "Sampled {} of {} sections over [{:.3}, {:.3}]",
        sections.len(),
        n_sections,
        s_min,
        s_max
    );

    SectionSampling {
        s_min,
        s_max,
        planes: n_sections,
        sections,
    }
}

/// Distinct points where the mesh meets the plane `projection == s`.
///
/// `projections` holds each vertex's signed distance along the axis.
/// Vertices on the plane are included; every edge strictly crossing it
/// contributes its interpolated crossing point.
pub fn plane_intersection(
    mesh: &Mesh,
    projections: &[f64],
    s: f64,
    tolerance: f64,
) -> Vec<Point3<f64>> {
    let mut seen: HashSet<[i64; 3]> = HashSet::new();
    let mut points = Vec::new();
    let mut push = |p: Point3<f64>| {
        let key = [
            (p.x / tolerance).round() as i64,
            (p.y / tolerance).round() as i64,
            (p.z / tolerance).round() as i64,
        ];
        if seen.insert(key) {
            points.push(p);
        }
    };

    for face in &mesh.faces {
        let d = face.map(|vi| projections[vi as usize] - s);
        if d.iter().all(|&di| di > 0.0) || d.iter().all(|&di| di < 0.0) {
            continue;
        }

        for k in 0..3 {
            let (a, b) = (face[k], face[(k + 1) % 3]);
            let (da, db) = (d[k], d[(k + 1) % 3]);

            if da == 0.0 {
                push(mesh.vertices[a as usize].position);
            }
            if da * db < 0.0 {
                // Interpolate from the lower index so shared edges agree exactly
                let (lo, hi, dlo, dhi) = if a < b { (a, b, da, db) } else { (b, a, db, da) };
                let p_lo = mesh.vertices[lo as usize].position;
                let p_hi = mesh.vertices[hi as usize].position;
                let t = dlo / (dlo - dhi);
                push(p_lo + (p_hi - p_lo) * t);
            }
        }
    }

    points
}
