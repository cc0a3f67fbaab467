//! Synthetic closed meshes shared by unit tests.

use std::f64::consts::PI;

use crate::{Mesh, Vertex};

/// UV sphere centred at the origin.
pub fn uv_sphere(radius: f64, rings: u32, segments: u32) -> Mesh {
    let mut mesh = Mesh::new();
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, radius));
    for r in 1..rings {
        let phi = PI * r as f64 / rings as f64;
        for s in 0..segments {
            let theta = 2.0 * PI * s as f64 / segments as f64;
            mesh.vertices.push(Vertex::from_coords(
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            ));
        }
    }
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, -radius));
    let south = mesh.vertices.len() as u32 - 1;

    let ring = |r: u32, s: u32| 1 + (r - 1) * segments + (s % segments);
    for s in 0..segments {
        mesh.faces.push([0, ring(1, s), ring(1, s + 1)]);
        mesh.faces.push([south, ring(rings - 1, s + 1), ring(rings - 1, s)]);
    }
    for r in 1..rings - 1 {
        for s in 0..segments {
            let (a, b) = (ring(r, s), ring(r, s + 1));
            let (c, d) = (ring(r + 1, s), ring(r + 1, s + 1));
            mesh.faces.push([a, c, d]);
            mesh.faces.push([a, d, b]);
        }
    }
    mesh
}

/// Capped surface of revolution about +z from `z = 0` to `z = length`.
pub fn revolve(length: f64, rings: u32, segments: u32, radius: impl Fn(f64) -> f64) -> Mesh {
    let mut mesh = Mesh::new();
    for i in 0..=rings {
        let z = length * i as f64 / rings as f64;
        let r = radius(z);
        for s in 0..segments {
            let theta = 2.0 * PI * s as f64 / segments as f64;
            mesh.vertices
                .push(Vertex::from_coords(r * theta.cos(), r * theta.sin(), z));
        }
    }
    let bottom = mesh.vertices.len() as u32;
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
    let top = bottom + 1;
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, length));

    let at = |i: u32, s: u32| i * segments + (s % segments);
    for i in 0..rings {
        for s in 0..segments {
            let (a, b) = (at(i, s), at(i, s + 1));
            let (c, d) = (at(i + 1, s), at(i + 1, s + 1));
            mesh.faces.push([a, b, d]);
            mesh.faces.push([a, d, c]);
        }
    }
    for s in 0..segments {
        mesh.faces.push([bottom, at(0, s + 1), at(0, s)]);
        mesh.faces.push([top, at(rings, s), at(rings, s + 1)]);
    }
    mesh
}

/// Capped cylinder of radius `r` along +z.
pub fn cylinder(r: f64, length: f64, rings: u32, segments: u32) -> Mesh {
    revolve(length, rings, segments, |_| r)
}

/// Area of the regular `segments`-gon inscribed in a circle of radius `r`.
pub fn polygon_area(r: f64, segments: u32) -> f64 {
    0.5 * segments as f64 * r * r * (2.0 * PI / segments as f64).sin()
}
