//! Quadric edge-collapse decimation for dense canal scans.
//!
//! Large scans are simplified before sectioning to keep the cost of the
//! plane sweeps bounded. Collapses merge the cheaper endpoint of an edge
//! into its partner at the quadric-optimal position.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::{Mesh, Vertex};

/// How far to decimate. [`crate::SimplifyPolicy`] fills this in from
/// its ratio and floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecimateParams {
    /// Absolute face budget; takes precedence over `target_ratio`.
    pub target_triangles: Option<usize>,
    /// Share of faces to keep, in `(0, 1]`. Default: 0.5
    pub target_ratio: f64,
    /// Leave open rims alone so the canal opening keeps its outline.
    /// Default: true
    pub preserve_boundary: bool,
    /// Stop once the cheapest collapse costs more than this.
    pub max_error: Option<f64>,
}

impl Default for DecimateParams {
    fn default() -> Self {
        Self {
            target_triangles: None,
            target_ratio: 0.5,
            preserve_boundary: true,
            max_error: None,
        }
    }
}

impl DecimateParams {
    /// Decimate down to `count` faces.
    pub fn with_target_triangles(count: usize) -> Self {
        Self {
            target_triangles: Some(count),
            ..Default::default()
        }
    }

    /// Keep `ratio` of the input faces.
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_ratio: ratio,
            ..Default::default()
        }
    }
}

/// Decimated mesh plus collapse counts for logging.
#[derive(Debug, Clone)]
pub struct DecimateResult {
    pub mesh: Mesh,
    pub original_triangles: usize,
    pub final_triangles: usize,
    pub collapses_performed: usize,
    /// Candidates skipped by the link condition or the rim rule.
    pub collapses_rejected: usize,
}

/// Upper triangle of a symmetric 4x4 plane-distance quadric.
#[derive(Debug, Clone, Copy, Default)]
struct Quadric {
    // [a b c d]
    // [  e f g]
    // [    h i]
    // [      j]
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    g: f64,
    h: f64,
    i: f64,
    j: f64,
}

impl Quadric {
    /// Squared distance to the plane `ax + by + cz + d = 0`.
    fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            a: a * a,
            b: a * b,
            c: a * c,
            d: a * d,
            e: b * b,
            f: b * c,
            g: b * d,
            h: c * c,
            i: c * d,
            j: d * d,
        }
    }

    fn add(&mut self, other: &Quadric) {
        self.a += other.a;
        self.b += other.b;
        self.c += other.c;
        self.d += other.d;
        self.e += other.e;
        self.f += other.f;
        self.g += other.g;
        self.h += other.h;
        self.i += other.i;
        self.j += other.j;
    }

    /// Evaluate v^T Q v for v = [x, y, z, 1].
    fn evaluate(&self, p: &Point3<f64>) -> f64 {
        let (x, y, z) = (p.x, p.y, p.z);
        self.a * x * x
            + 2.0 * self.b * x * y
            + 2.0 * self.c * x * z
            + 2.0 * self.d * x
            + self.e * y * y
            + 2.0 * self.f * y * z
            + 2.0 * self.g * y
            + self.h * z * z
            + 2.0 * self.i * z
            + self.j
    }

    /// Find the point minimizing the error, or None if the system is singular.
    fn optimal_point(&self) -> Option<Point3<f64>> {
        let det = self.a * (self.e * self.h - self.f * self.f)
            - self.b * (self.b * self.h - self.f * self.c)
            + self.c * (self.b * self.f - self.e * self.c);

        if det.abs() < 1e-10 {
            return None;
        }

        let inv_det = 1.0 / det;

        let m00 = (self.e * self.h - self.f * self.f) * inv_det;
        let m01 = (self.c * self.f - self.b * self.h) * inv_det;
        let m02 = (self.b * self.f - self.c * self.e) * inv_det;
        let m11 = (self.a * self.h - self.c * self.c) * inv_det;
        let m12 = (self.b * self.c - self.a * self.f) * inv_det;
        let m22 = (self.a * self.e - self.b * self.b) * inv_det;

        Some(Point3::new(
            -(m00 * self.d + m01 * self.g + m02 * self.i),
            -(m01 * self.d + m11 * self.g + m12 * self.i),
            -(m02 * self.d + m12 * self.g + m22 * self.i),
        ))
    }
}

/// Heap entry; the cheapest collapse pops first.
#[derive(Debug, Clone)]
struct EdgeCollapse {
    v1: u32,
    v2: u32,
    cost: f64,
    target: Point3<f64>,
}

impl PartialEq for EdgeCollapse {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EdgeCollapse {}

impl PartialOrd for EdgeCollapse {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeCollapse {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for the max-heap
        other.cost.total_cmp(&self.cost)
    }
}

/// Working state of a decimation run.
struct Decimator {
    positions: Vec<Option<Point3<f64>>>,
    faces: Vec<Option<[u32; 3]>>,
    vertex_faces: Vec<Vec<usize>>,
    quadrics: Vec<Quadric>,
    boundary_edges: HashSet<(u32, u32)>,
    active_faces: usize,
}

impl Decimator {
    fn new(mesh: &Mesh) -> Self {
        let positions: Vec<Option<Point3<f64>>> =
            mesh.vertices.iter().map(|v| Some(v.position)).collect();
        let faces: Vec<Option<[u32; 3]>> = mesh.faces.iter().copied().map(Some).collect();

        let mut vertex_faces = vec![Vec::new(); mesh.vertices.len()];
        let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();
        for (fi, face) in mesh.faces.iter().enumerate() {
            for k in 0..3 {
                vertex_faces[face[k] as usize].push(fi);
                *edge_counts
                    .entry(normalize_edge(face[k], face[(k + 1) % 3]))
                    .or_insert(0) += 1;
            }
        }

        let boundary_edges = edge_counts
            .into_iter()
            .filter(|&(_, count)| count == 1)
            .map(|(edge, _)| edge)
            .collect();

        Self {
            quadrics: compute_vertex_quadrics(mesh),
            active_faces: faces.len(),
            positions,
            faces,
            vertex_faces,
            boundary_edges,
        }
    }

    fn live_faces(&self, v: u32) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.vertex_faces[v as usize]
            .iter()
            .filter_map(|&fi| self.faces[fi])
            .filter(move |face| face.contains(&v))
    }

    fn neighbors(&self, v: u32) -> HashSet<u32> {
        self.live_faces(v)
            .flat_map(|face| face.into_iter())
            .filter(|&vi| vi != v)
            .collect()
    }

    fn candidate(&self, v1: u32, v2: u32, params: &DecimateParams) -> Option<EdgeCollapse> {
        if params.preserve_boundary && self.boundary_edges.contains(&normalize_edge(v1, v2)) {
            return None;
        }

        let p1 = self.positions[v1 as usize]?;
        let p2 = self.positions[v2 as usize]?;

        let mut combined = self.quadrics[v1 as usize];
        combined.add(&self.quadrics[v2 as usize]);

        let target = combined
            .optimal_point()
            .unwrap_or_else(|| nalgebra::center(&p1, &p2));

        Some(EdgeCollapse {
            v1,
            v2,
            cost: combined.evaluate(&target),
            target,
        })
    }

    /// Link condition: the edge may be collapsed only if the endpoints share
    /// at most the two opposite vertices of its adjacent triangles.
    fn is_collapse_valid(&self, v1: u32, v2: u32) -> bool {
        let n1 = self.neighbors(v1);
        let n2 = self.neighbors(v2);
        n1.contains(&v2) && n1.intersection(&n2).count() <= 2
    }

    /// Merge v2 into v1.
    fn collapse(&mut self, v1: u32, v2: u32, target: Point3<f64>) {
        self.positions[v1 as usize] = Some(target);
        self.positions[v2 as usize] = None;

        let q2 = self.quadrics[v2 as usize];
        self.quadrics[v1 as usize].add(&q2);

        let moved = std::mem::take(&mut self.vertex_faces[v2 as usize]);
        for &fi in &moved {
            let Some(face) = self.faces[fi].as_mut() else {
                continue;
            };
            for idx in face.iter_mut() {
                if *idx == v2 {
                    *idx = v1;
                }
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                self.faces[fi] = None;
                self.active_faces -= 1;
            }
        }
        self.vertex_faces[v1 as usize].extend(moved);
        let faces = &self.faces;
        self.vertex_faces[v1 as usize].retain(|&fi| faces[fi].is_some());
    }

    fn into_mesh(self) -> Mesh {
        let mut remap = vec![u32::MAX; self.positions.len()];
        let mut mesh = Mesh::with_capacity(self.positions.len(), self.active_faces);

        for (old, position) in self.positions.iter().enumerate() {
            if let Some(p) = position {
                remap[old] = mesh.vertices.len() as u32;
                mesh.vertices.push(Vertex::new(*p));
            }
        }

        for face in self.faces.into_iter().flatten() {
            mesh.faces.push(face.map(|vi| remap[vi as usize]));
        }

        mesh
    }
}

/// Collapse the cheapest edges until the face budget is met.
///
/// # Errors
/// Returns [`MeshError::DecimationFailed`] when the target ratio is outside
/// `(0, 1]` or when the collapses leave no faces behind.
///
/// # Example
/// ```
/// use canal_profile::{DecimateParams, Mesh, Vertex, decimate_mesh};
///
/// let mut mesh = Mesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.5, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// let result = decimate_mesh(&mesh, &DecimateParams::with_target_ratio(0.5)).unwrap();
/// assert!(result.final_triangles <= result.original_triangles);
/// ```
pub fn decimate_mesh(mesh: &Mesh, params: &DecimateParams) -> MeshResult<DecimateResult> {
    let original_triangles = mesh.faces.len();

    if params.target_triangles.is_none()
        && !(params.target_ratio > 0.0 && params.target_ratio <= 1.0)
    {
        return Err(MeshError::decimation_failed(format!(
            "target ratio {} outside (0, 1]",
            params.target_ratio
        )));
    }

    let target = params
        .target_triangles
        .unwrap_or_else(|| ((original_triangles as f64) * params.target_ratio).ceil() as usize);

    if original_triangles <= target {
        return Ok(DecimateResult {
            mesh: mesh.clone(),
            original_triangles,
            final_triangles: original_triangles,
            collapses_performed: 0,
            collapses_rejected: 0,
        });
    }

    let mut state = Decimator::new(mesh);

    let mut heap = BinaryHeap::new();
    let mut seen_edges = HashSet::new();
    for face in &mesh.faces {
        for k in 0..3 {
            let (v1, v2) = (face[k], face[(k + 1) % 3]);
            if seen_edges.insert(normalize_edge(v1, v2)) {
                heap.extend(state.candidate(v1, v2, params));
            }
        }
    }

    let mut collapses_performed = 0;
    let mut collapses_rejected = 0;

    while state.active_faces > target {
        let Some(collapse) = heap.pop() else {
            break;
        };
        let (v1, v2) = (collapse.v1, collapse.v2);

        // Entries go stale once either endpoint has been merged away
        if state.positions[v1 as usize].is_none() || state.positions[v2 as usize].is_none() {
            continue;
        }

        if !state.is_collapse_valid(v1, v2) {
            collapses_rejected += 1;
            continue;
        }

        if params.max_error.is_some_and(|max_error| collapse.cost > max_error) {
            collapses_rejected += 1;
            continue;
        }

        state.collapse(v1, v2, collapse.target);
        collapses_performed += 1;

        for neighbor in state.neighbors(v1) {
            heap.extend(state.candidate(v1, neighbor, params));
        }
    }

    let final_triangles = state.active_faces;
    if final_triangles == 0 {
        return Err(MeshError::decimation_failed("all faces collapsed"));
    }

    debug!(
        "Decimated {} -> {} triangles ({} collapses, {} rejected)",
        original_triangles, final_triangles, collapses_performed, collapses_rejected
    );

    Ok(DecimateResult {
        mesh: state.into_mesh(),
        original_triangles,
        final_triangles,
        collapses_performed,
        collapses_rejected,
    })
}

/// Sum of incident face-plane quadrics per vertex. Slivers contribute nothing.
fn compute_vertex_quadrics(mesh: &Mesh) -> Vec<Quadric> {
    let mut quadrics = vec![Quadric::default(); mesh.vertices.len()];

    for (face, tri) in mesh.faces.iter().zip(mesh.triangles()) {
        let normal = tri.normal_unnormalized();
        let len = normal.norm();
        if len < 1e-10 {
            continue;
        }
        let n = normal / len;
        let d = -n.dot(&tri.v0.coords);
        let q = Quadric::from_plane(n.x, n.y, n.z, d);

        for &vi in face {
            quadrics[vi as usize].add(&q);
        }
    }

    quadrics
}

/// Undirected edge key.
fn normalize_edge(v1: u32, v2: u32) -> (u32, u32) {
    (v1.min(v2), v1.max(v2))
}
