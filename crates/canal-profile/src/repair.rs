//! Cleanup after decimation.
//!
//! Edge collapses leave orphaned vertices behind and can fold a face down
//! to a sliver. Neither changes the enclosed volume, but orphans inflate
//! the point cloud the principal axis is fitted to, so they are removed
//! before a simplified mesh reaches the profiler.

use tracing::debug;

use crate::{Mesh, Triangle};

/// Counts from one [`cleanup_after_decimation`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub collapsed_faces: usize,
    pub orphan_vertices: usize,
}

impl CleanupStats {
    pub fn is_clean(&self) -> bool {
        self.collapsed_faces == 0 && self.orphan_vertices == 0
    }
}

/// Drop faces that repeat a vertex or whose area is at most `min_area`,
/// then drop the vertices no remaining face uses.
pub fn cleanup_after_decimation(mesh: &mut Mesh, min_area: f64) -> CleanupStats {
    let stats = CleanupStats {
        collapsed_faces: drop_collapsed_faces(mesh, min_area),
        orphan_vertices: compact_vertices(mesh),
    };
    if !stats.is_clean() {
        debug!(
            collapsed_faces = stats.collapsed_faces,
            orphan_vertices = stats.orphan_vertices,
            "Cleaned simplified mesh"
        );
    }
    stats
}

/// Remove faces with a repeated index or an area at most `min_area`.
/// Returns how many were removed.
pub fn drop_collapsed_faces(mesh: &mut Mesh, min_area: f64) -> usize {
    let before = mesh.faces.len();
    let vertices = &mesh.vertices;

    mesh.faces.retain(|&[a, b, c]| {
        let distinct = a != b && b != c && a != c;
        distinct
            && Triangle::new(
                vertices[a as usize].position,
                vertices[b as usize].position,
                vertices[c as usize].position,
            )
            .area()
                > min_area
    });

    before - mesh.faces.len()
}

/// Remove vertices that no face references and renumber the faces.
/// Surviving vertices keep their relative order. Returns how many were removed.
pub fn compact_vertices(mesh: &mut Mesh) -> usize {
    let mut new_index: Vec<Option<u32>> = vec![None; mesh.vertices.len()];
    for &vi in mesh.faces.iter().flatten() {
        new_index[vi as usize] = Some(0);
    }

    let mut next = 0u32;
    for slot in new_index.iter_mut().filter(|slot| slot.is_some()) {
        *slot = Some(next);
        next += 1;
    }

    let before = mesh.vertices.len();
    if next as usize == before {
        return 0;
    }

    let mut kept = 0usize;
    mesh.vertices.retain(|_| {
        let keep = new_index[kept].is_some();
        kept += 1;
        keep
    });
    for vi in mesh.faces.iter_mut().flatten() {
        // Every face index was marked above
        if let Some(mapped) = new_index[*vi as usize] {
            *vi = mapped;
        }
    }

    before - mesh.vertices.len()
}
