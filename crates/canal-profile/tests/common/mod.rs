//! Synthetic canal-like meshes for integration tests.

#![allow(dead_code)]

use std::f64::consts::PI;
use std::fmt::Write;

use canal_profile::{Mesh, Vertex};

/// Route library logs to the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
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

/// Barrel: widest at mid-length, narrowest at the ends.
pub fn barrel(length: f64, rings: u32, segments: u32) -> Mesh {
    revolve(length, rings, segments, |z| 2.0 + 1.5 * (PI * z / length).sin())
}

/// Hourglass: narrowest at mid-length.
pub fn hourglass(length: f64, rings: u32, segments: u32) -> Mesh {
    revolve(length, rings, segments, |z| 3.5 - 1.5 * (PI * z / length).sin())
}

/// Spindle with `r(z) = k·sqrt(z·(length - z))`, closed by an apex at each
/// end. The section area is quadratic in `z`, so the solid with inscribed
/// `segments`-gon sections has volume `polygon_area(k, segments)·length³/6`.
pub fn spindle(length: f64, k: f64, rings: u32, segments: u32) -> Mesh {
    revolve(length, rings, segments, |z| k * (z * (length - z)).max(0.0).sqrt())
}

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

/// Axis-aligned cube of side `size`, 12 triangles.
pub fn cube(size: f64) -> Mesh {
    let mut mesh = Mesh::new();
    for &(x, y, z) in &[
        (0.0, 0.0, 0.0),
        (size, 0.0, 0.0),
        (size, size, 0.0),
        (0.0, size, 0.0),
        (0.0, 0.0, size),
        (size, 0.0, size),
        (size, size, size),
        (0.0, size, size),
    ] {
        mesh.vertices.push(Vertex::from_coords(x, y, z));
    }
    mesh.faces.extend_from_slice(&[
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [3, 7, 6],
        [3, 6, 2],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ]);
    mesh
}

/// Area of the regular `segments`-gon inscribed in a circle of radius `r`.
pub fn polygon_area(r: f64, segments: u32) -> f64 {
    0.5 * segments as f64 * r * r * (2.0 * PI / segments as f64).sin()
}

/// Serialize as ASCII STL.
pub fn to_ascii_stl(mesh: &Mesh) -> String {
    let mut out = String::from("solid test\n");
    for tri in mesh.triangles() {
        let n = tri.normal_unnormalized();
        let n = if n.norm() > 0.0 { n.normalize() } else { n };
        let _ = writeln!(out, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z);
        out.push_str("    outer loop\n");
        for v in [tri.v0, tri.v1, tri.v2] {
            let _ = writeln!(out, "      vertex {:e} {:e} {:e}", v.x, v.y, v.z);
        }
        out.push_str("    endloop\n  endfacet\n");
    }
    out.push_str("endsolid test\n");
    out
}

/// Serialize as Wavefront OBJ.
pub fn to_obj(mesh: &Mesh) -> String {
    let mut out = String::new();
    for v in &mesh.vertices {
        let _ = writeln!(out, "v {} {} {}", v.position.x, v.position.y, v.position.z);
    }
    for f in &mesh.faces {
        let _ = writeln!(out, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1);
    }
    out
}
