//! Convex hull area of a cross-section.
//!
//! Boundary points from a plane cut are noisy and rarely form a simple
//! polygon, so the area of their convex hull stands in for the lumen area.

use nalgebra::{Point2, Point3};

use crate::axis::Axis;
use crate::config::PlaneProjection;

/// Map section points to 2D.
pub fn project_points(
    points: &[Point3<f64>],
    axis: &Axis,
    projection: PlaneProjection,
) -> Vec<Point2<f64>> {
    match projection {
        PlaneProjection::CoordinateXY => points.iter().map(|p| Point2::new(p.x, p.y)).collect(),
        PlaneProjection::AxisFrame => {
            let (u, v) = axis.plane_basis();
            points
                .iter()
                .map(|p| {
                    let d = p - axis.center;
                    Point2::new(d.dot(&u), d.dot(&v))
                })
                .collect()
        }
    }
}

/// Convex hull in counter-clockwise order, without collinear points.
///
/// Uses Andrew's monotone chain. Fewer than three input points, or a
/// collinear set, yields fewer than three hull vertices.
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut sorted: Vec<Point2<f64>> = points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<Point2<f64>> = Vec::with_capacity(sorted.len() * 2);

    for &p in &sorted {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], &p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }

    let lower_len = hull.len() + 1;
    for &p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], &p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }

    // Last point repeats the first
    hull.pop();
    hull
}

fn cross(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Absolute shoelace area of a polygon.
pub fn polygon_area(polygon: &[Point2<f64>]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let twice: f64 = polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice.abs() * 0.5
}

/// Hull area of a section, or `None` when the hull is degenerate.
pub fn section_area(points: &[Point3<f64>], axis: &Axis, projection: PlaneProjection) -> Option<f64> {
    let hull = convex_hull(&project_points(points, axis, projection));
    if hull.len() < 3 {
        return None;
    }
    let area = polygon_area(&hull);
    (area.is_finite() && area > 0.0).then_some(area)
}
