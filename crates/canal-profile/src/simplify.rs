//! Optional pre-analysis simplification and the mesh source seam.
//!
//! Scanned canals often carry hundreds of thousands of faces. Large inputs
//! are decimated before sectioning; small ones are left alone. A failed
//! simplification never aborts an analysis: [`SimplifyOutcome::into_mesh`]
//! falls back to the unsimplified input.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Mesh;
use crate::decimate::{DecimateParams, decimate_mesh};
use crate::error::{ConfigError, MeshError, MeshResult};
use crate::io::{MeshFormat, load_mesh_from_bytes};
use crate::repair::cleanup_after_decimation;
use crate::tracing_ext::OperationTimer;

/// When and how far to simplify an input mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyPolicy {
    /// Whether simplification is attempted at all. Default: true
    pub enabled: bool,
    /// Fraction of faces to keep. Default: 0.05
    pub ratio: f64,
    /// Decimation runs only if the target face count exceeds this. Default: 5000
    pub min_target_faces: usize,
}

impl Default for SimplifyPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            ratio: 0.05,
            min_target_faces: 5000,
        }
    }
}

impl SimplifyPolicy {
    /// A policy that never simplifies.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Target face count for a mesh with `face_count` faces.
    pub fn target_faces(&self, face_count: usize) -> usize {
        (face_count as f64 * self.ratio).floor() as usize
    }

    /// Check the ratio lies in (0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ratio > 0.0 && self.ratio <= 1.0 {
            Ok(())
        } else {
            Err(ConfigError::invalid(
                "simplify.ratio",
                format!("{} is outside (0, 1]", self.ratio),
            ))
        }
    }

    /// Apply the policy to a mesh.
    pub fn apply(&self, mesh: &Mesh) -> SimplifyOutcome {
        if !self.enabled {
            return SimplifyOutcome::Skipped {
                reason: "simplification disabled".into(),
            };
        }

        let original_faces = mesh.face_count();
        let target = self.target_faces(original_faces);
        if target <= self.min_target_faces {
            return SimplifyOutcome::Skipped {
                reason: format!(
                    "target of {target} faces does not exceed {}",
                    self.min_target_faces
                ),
            };
        }

        let _timer = OperationTimer::with_mesh("simplify", mesh);
        match decimate_and_clean(mesh, target) {
            Ok(simplified) => {
                let final_faces = simplified.face_count();
                info!(
                    "Simplified mesh from {} to {} faces",
                    original_faces, final_faces
                );
                SimplifyOutcome::Simplified {
                    mesh: simplified,
                    original_faces,
                    final_faces,
                }
            }
            Err(error) => SimplifyOutcome::Failed { error },
        }
    }
}

fn decimate_and_clean(mesh: &Mesh, target: usize) -> MeshResult<Mesh> {
    let result = decimate_mesh(mesh, &DecimateParams::with_target_triangles(target))?;
    let mut simplified = result.mesh;

    cleanup_after_decimation(&mut simplified, 0.0);

    if simplified.is_empty() {
        return Err(MeshError::decimation_failed(
            "no faces left after cleanup",
        ));
    }
    Ok(simplified)
}

/// What happened when a [`SimplifyPolicy`] was applied.
#[derive(Debug)]
pub enum SimplifyOutcome {
    /// The mesh was decimated and cleaned.
    Simplified {
        mesh: Mesh,
        original_faces: usize,
        final_faces: usize,
    },
    /// Simplification was not attempted.
    Skipped { reason: String },
    /// Decimation or cleanup failed.
    Failed { error: MeshError },
}

impl SimplifyOutcome {
    /// The mesh to analyse: the simplified one, otherwise `original`.
    pub fn into_mesh(self, original: Mesh) -> Mesh {
        match self {
            SimplifyOutcome::Simplified { mesh, .. } => mesh,
            SimplifyOutcome::Skipped { reason } => {
                debug!("Simplification skipped: {}", reason);
                original
            }
            SimplifyOutcome::Failed { error } => {
                warn!(
                    code = %error.code(),
                    "Simplification failed, using unsimplified mesh: {}", error
                );
                original
            }
        }
    }

    /// Whether a simplified mesh was produced.
    pub fn is_simplified(&self) -> bool {
        matches!(self, SimplifyOutcome::Simplified { .. })
    }
}

/// Produces meshes for analysis from raw uploads.
///
/// Implementations must be shareable across the two concurrent side
/// analyses of a request.
pub trait SurfaceMeshSource: Send + Sync {
    /// Decode raw file bytes in a declared format.
    fn decode(&self, bytes: &[u8], format: MeshFormat) -> MeshResult<Mesh>;

    /// Optionally reduce the face count while preserving shape.
    fn simplify(&self, mesh: &Mesh) -> SimplifyOutcome;

    /// Decode then simplify, falling back to the decoded mesh.
    fn load(&self, bytes: &[u8], format: MeshFormat) -> MeshResult<Mesh> {
        let mesh = self.decode(bytes, format)?;
        let outcome = self.simplify(&mesh);
        Ok(outcome.into_mesh(mesh))
    }
}

/// The built-in source: STL/OBJ/PLY decoding plus QEM simplification.
#[derive(Debug, Clone, Default)]
pub struct DecodingMeshSource {
    policy: SimplifyPolicy,
}

impl DecodingMeshSource {
    /// Create a source applying `policy` after decoding.
    pub fn new(policy: SimplifyPolicy) -> Self {
        Self { policy }
    }

    /// The simplification policy in use.
    pub fn policy(&self) -> &SimplifyPolicy {
        &self.policy
    }
}

impl SurfaceMeshSource for DecodingMeshSource {
    fn decode(&self, bytes: &[u8], format: MeshFormat) -> MeshResult<Mesh> {
        load_mesh_from_bytes(bytes, format)
    }

    fn simplify(&self, mesh: &Mesh) -> SimplifyOutcome {
        self.policy.apply(mesh)
    }
}
