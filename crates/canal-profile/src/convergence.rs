//! Sampling-density self-check.
//!
//! The profile is rebuilt at a coarse and a fine resolution and the volume
//! discrepancy is reported as an error budget for the primary estimate.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Mesh;
use crate::config::AnalysisParams;
use crate::error::AnalysisResult;
use crate::profile::{VolumeProfile, build_profile};

/// Volume discrepancy between two sampling resolutions.
///
/// All fields are `None` when either resolution fails to produce a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    /// |V_fine − V_coarse| in mm³.
    pub error_mm3: Option<f64>,
    /// The same discrepancy in cm³.
    pub error_cm3: Option<f64>,
    /// Discrepancy as a percentage of the coarse volume; `None` if that is zero.
    pub relative_error_percent: Option<f64>,
}

impl ConvergenceReport {
    /// Compare a coarse and a fine volume estimate.
    pub fn from_volumes(coarse: f64, fine: f64) -> Self {
        let err = (fine - coarse).abs();
        Self {
            error_mm3: Some(err),
            error_cm3: Some(err / 1000.0),
            relative_error_percent: (coarse != 0.0).then(|| err / coarse * 100.0),
        }
    }

    /// Build from the outcomes of the two resolution runs.
    pub fn from_runs(
        coarse: &AnalysisResult<VolumeProfile>,
        fine: &AnalysisResult<VolumeProfile>,
    ) -> Self {
        match (coarse, fine) {
            (Ok(coarse), Ok(fine)) => Self::from_volumes(coarse.volume_total, fine.volume_total),
            (coarse, fine) => {
                for err in [coarse.as_ref().err(), fine.as_ref().err()].into_iter().flatten() {
                    warn!("Convergence run failed: {}", err);
                }
                Self::default()
            }
        }
    }
}

/// Estimate convergence at `params.convergence_sections`.
///
/// `primary` is reused for whichever resolution matches `params.n_sections`,
/// so only the missing runs are computed. The remaining runs execute
/// concurrently.
pub fn estimate_convergence(
    mesh: &Mesh,
    params: &AnalysisParams,
    primary: &VolumeProfile,
) -> ConvergenceReport {
    let (coarse_n, fine_n) = params.convergence_sections;

    let run = |n: usize| -> AnalysisResult<VolumeProfile> {
        if n == params.n_sections {
            debug!("Reusing primary profile for {} sections", n);
            Ok(primary.clone())
        } else {
            build_profile(mesh, params, n)
        }
    };

    let (coarse, fine) = rayon::join(|| run(coarse_n), || run(fine_n));
    let report = ConvergenceReport::from_runs(&coarse, &fine);

    debug!(
        coarse_sections = coarse_n,
        fine_sections = fine_n,
        error_mm3 = ?report.error_mm3,
        relative_percent = ?report.relative_error_percent,
        "Convergence estimate"
    );
    report
}
