//! Ear canal volume profiling from surface meshes.
//!
//! This crate estimates the internal volume profile of an ear canal scan and
//! compares a left and a right canal. The pipeline:
//!
//! 1. **Axis**: principal direction of the vertex cloud ([`principal_axis`])
//! 2. **Sections**: planes swept along the axis ([`section::sample_sections`])
//! 3. **Areas**: convex hull area of each section ([`area::section_area`])
//! 4. **Profile**: trapezoidal volume, isthmus, normalised curves ([`VolumeProfile`])
//! 5. **Split**: cartilaginous and bony volumes at a percentile
//! 6. **Convergence**: volume discrepancy between two resolutions
//!
//! [`EarAnalyzer`] runs all of it on one mesh; [`compare`] combines two
//! results; [`AnalysisService`] handles a complete upload request.
//!
//! # Units and Scale
//!
//! **Coordinates are assumed to be millimeters.** Lengths are reported in mm,
//! areas in mm² and volumes in mm³ (convergence also in cm³).
//!
//! # Axis Orientation
//!
//! The sign of the principal axis is not fixed. Volumes and areas do not
//! depend on it; positional results are reported against the observed
//! projection range of each mesh, so left and right axes are not aligned.
//!
//! # Quick Start
//!
//! ```no_run
//! use canal_profile::{EarAnalyzer, load_mesh};
//! use std::path::Path;
//!
//! let mesh = load_mesh(Path::new("right_ear.stl")).unwrap();
//! let result = EarAnalyzer::default().analyze(&mesh).unwrap();
//! println!(
//!     "volume {:.1} mm³, isthmus at {:.2}",
//!     result.volume_total_mm3, result.isthmus_position_norm
//! );
//! ```
//!
//! ## Bilateral Request
//!
//! ```no_run
//! use canal_profile::{AnalysisService, AnalyzeRequest, MeshUpload, ServiceConfig};
//!
//! let service = AnalysisService::from_config(ServiceConfig::default()).unwrap();
//! let request = AnalyzeRequest::new(
//!     MeshUpload::new("right.stl", std::fs::read("right.stl").unwrap()),
//!     MeshUpload::new("left.stl", std::fs::read("left.stl").unwrap()),
//! );
//! match service.handle(&request) {
//!     Ok(response) => println!("{}", serde_json::to_string(&response).unwrap()),
//!     Err(err) => eprintln!("{}: {}", err.status_code(), err),
//! }
//! ```

mod error;
pub mod tracing_ext;
mod types;

pub mod analyze;
pub mod area;
pub mod axis;
pub mod compare;
pub mod config;
pub mod convergence;
pub mod decimate;
pub mod io;
pub mod profile;
pub mod repair;
pub mod section;
pub mod service;
pub mod simplify;
pub mod validate;

#[cfg(test)]
mod test_meshes;

pub use error::{
    AnalysisError, AnalysisResult, ConfigError, ErrorCode, MeshError, MeshResult,
    RecoverySuggestion,
};
pub use types::{Mesh, Triangle, Vertex};

pub use analyze::{EarAnalysisResult, EarAnalyzer};
pub use axis::{Axis, principal_axis};
pub use compare::{ComparisonResult, compare, pct_diff};
pub use config::{AnalysisParams, PlaneProjection, ServiceConfig};
pub use convergence::{ConvergenceReport, estimate_convergence};
pub use decimate::{DecimateParams, DecimateResult, decimate_mesh};
pub use io::{MeshFormat, load_mesh, load_mesh_from_bytes};
pub use profile::{ProfileSample, RegionalVolumes, VolumeProfile, build_profile};
pub use repair::{CleanupStats, cleanup_after_decimation, compact_vertices, drop_collapsed_faces};
pub use section::{CrossSection, SectionSampling, sample_sections};
pub use service::{
    AnalysisService, AnalyzeRequest, AnalyzeResponse, ErrorBody, MeshUpload, RequestError, Side,
};
pub use simplify::{DecodingMeshSource, SimplifyOutcome, SimplifyPolicy, SurfaceMeshSource};
pub use validate::validate_mesh_data;
