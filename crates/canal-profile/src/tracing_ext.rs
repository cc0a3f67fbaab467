//! Tracing helpers for the analysis pipeline.
//!
//! The library only emits events; installing a subscriber is left to the
//! application:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=canal_profile=debug for per-stage detail
//! ```
//!
//! # Targets
//!
//! - `canal_profile::timing`: operation start and elapsed time
//! - `canal_profile::mesh_state`: mesh dimensions at pipeline boundaries
//! - `canal_profile::profile`: per-specimen profile summaries

use std::time::Instant;
use tracing::span::EnteredSpan;
use tracing::{debug, info};

use crate::Mesh;
use crate::profile::VolumeProfile;

/// Enters a `canal_operation` span for its lifetime and reports the
/// elapsed time under `canal_profile::timing` when dropped.
///
/// ```rust,ignore
/// let _timer = OperationTimer::with_mesh("sample_sections", mesh);
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    _span: EnteredSpan,
}

impl OperationTimer {
    pub fn new(name: &'static str) -> Self {
        Self::start(name, tracing::info_span!("canal_operation", operation = name))
    }

    /// Same as [`OperationTimer::new`], with the mesh size on the span.
    pub fn with_mesh(name: &'static str, mesh: &Mesh) -> Self {
        Self::start(
            name,
            tracing::info_span!(
                "canal_operation",
                operation = name,
                faces = mesh.face_count(),
                vertices = mesh.vertex_count()
            ),
        )
    }

    fn start(name: &'static str, span: tracing::Span) -> Self {
        let entered = span.entered();
        debug!(target: "canal_profile::timing", operation = name, "started");
        Self {
            name,
            start: Instant::now(),
            _span: entered,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1e3
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        info!(
            target: "canal_profile::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", self.elapsed_ms()),
            "finished"
        );
    }
}

/// Mesh size and bounding-box dimensions at debug level.
pub fn log_mesh_stats(mesh: &Mesh, context: &str) {
    let dims = mesh
        .bounds()
        .map(|(lo, hi)| hi - lo)
        .unwrap_or_default();

    debug!(
        target: "canal_profile::mesh_state",
        context = context,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        dimensions = format!("{:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z),
        "Mesh state"
    );
}

/// Log the headline numbers of a finished profile.
pub fn log_profile_summary(profile: &VolumeProfile, n_sections: usize) {
    info!(
        target: "canal_profile::profile",
        sections_used = profile.sections_used(),
        n_sections = n_sections,
        volume_mm3 = format!("{:.3}", profile.volume_total),
        canal_length_mm = format!("{:.3}", profile.canal_length),
        isthmus_norm = format!("{:.3}", profile.isthmus_position_norm),
        "Volume profile built"
    );
}
