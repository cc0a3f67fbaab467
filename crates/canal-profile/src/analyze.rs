//! Per-ear analysis.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::info;

use crate::Mesh;
use crate::config::AnalysisParams;
use crate::convergence::{ConvergenceReport, estimate_convergence};
use crate::error::{AnalysisResult, ConfigError};
use crate::profile::{ProfileSample, VolumeProfile, build_profile};
use crate::tracing_ext::{OperationTimer, log_mesh_stats};

/// Volume profile, regional volumes and convergence of one ear canal.
///
/// Serializes with the field names of the analysis payload. Non-finite
/// values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarAnalysisResult {
    /// Trapezoidal volume over all valid sections (mm³).
    pub volume_total_mm3: f64,
    /// Isthmus position along the principal axis (mm).
    #[serde(rename = "istmo_position_mm")]
    pub isthmus_position_mm: f64,
    /// Isthmus position over the canal length, NaN for a zero-length canal.
    #[serde(
        rename = "istmo_position_norm",
        serialize_with = "finite_or_null",
        deserialize_with = "null_as_nan"
    )]
    pub isthmus_position_norm: f64,
    /// Vertex projection range along the axis (mm).
    pub canal_length_mm: f64,
    /// Section positions rescaled to [0, 1].
    pub s_norm: Vec<f64>,
    /// Section areas over the largest area.
    pub a_norm: Vec<f64>,
    /// Number of valid sections.
    pub sections_used: usize,
    /// Volume below the split percentile (mm³).
    pub volume_cartilaginous_mm3: f64,
    /// Volume at or above the split percentile (mm³).
    pub volume_bony_mm3: f64,
    /// Volume discrepancy between the convergence resolutions (mm³).
    pub convergence_error_mm3: Option<f64>,
    /// The same discrepancy in cm³.
    pub convergence_error_cm3: Option<f64>,
    /// Discrepancy relative to the coarse volume (%).
    pub relative_error_percent: Option<f64>,
    /// Raw `(s, area)` samples behind the normalised curves.
    #[serde(skip)]
    pub samples: Vec<ProfileSample>,
}

impl EarAnalysisResult {
    /// Assemble a result from a profile, splitting it at `split_percentile`.
    pub fn from_profile(
        profile: VolumeProfile,
        split_percentile: f64,
        convergence: ConvergenceReport,
    ) -> Self {
        let regional = profile.regional_volumes(split_percentile);
        Self {
            volume_total_mm3: profile.volume_total,
            isthmus_position_mm: profile.isthmus_position,
            isthmus_position_norm: profile.isthmus_position_norm,
            canal_length_mm: profile.canal_length,
            sections_used: profile.sections_used(),
            s_norm: profile.s_norm,
            a_norm: profile.a_norm,
            volume_cartilaginous_mm3: regional.cartilaginous,
            volume_bony_mm3: regional.bony,
            convergence_error_mm3: convergence.error_mm3,
            convergence_error_cm3: convergence.error_cm3,
            relative_error_percent: convergence.relative_error_percent,
            samples: profile.samples,
        }
    }
}

fn finite_or_null<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

fn null_as_nan<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Runs the full profile analysis on one mesh.
#[derive(Debug, Clone, Default)]
pub struct EarAnalyzer {
    params: AnalysisParams,
}

impl EarAnalyzer {
    /// Create an analyzer after validating `params`.
    pub fn new(params: AnalysisParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The parameters in use.
    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    /// Analyse one ear canal mesh.
    ///
    /// The profile is sampled once; the isthmus, the regional split and the
    /// primary convergence run all reuse it.
    ///
    /// # Errors
    /// Fails when no profile can be built at `n_sections`. Convergence runs
    /// that fail only null the convergence fields.
    pub fn analyze(&self, mesh: &Mesh) -> AnalysisResult<EarAnalysisResult> {
        let _timer = OperationTimer::with_mesh("analyze_ear", mesh);
        log_mesh_stats(mesh, "analysis input");

        let params = &self.params;
        let profile = build_profile(mesh, params, params.n_sections)?;
        let convergence = estimate_convergence(mesh, params, &profile);
        let result = EarAnalysisResult::from_profile(profile, params.split_percentile, convergence);

        info!(
            "Ear analysed: volume {:.2} mm³ (cartilaginous {:.2}, bony {:.2}), {} sections",
            result.volume_total_mm3,
            result.volume_cartilaginous_mm3,
            result.volume_bony_mm3,
            result.sections_used
        );

        Ok(result)
    }
}
