//! Volume profiles: areas integrated along the axis.
//!
//! A profile is built once per resolution from the valid `(s, area)`
//! samples. The isthmus, the regional split and the normalised curves are
//! all derived from that single sample set.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Mesh;
use crate::area::section_area;
use crate::axis::{Axis, principal_axis};
use crate::config::AnalysisParams;
use crate::error::{AnalysisError, AnalysisResult};
use crate::section::sample_sections;
use crate::validate::validate_mesh_data;
use crate::tracing_ext::{OperationTimer, log_profile_summary};

/// One valid section of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSample {
    /// Position along the axis (mm).
    pub s: f64,
    /// Convex hull area (mm²).
    pub area: f64,
}

/// Trapezoidal integral of `area` over `s`. Zero for fewer than two samples.
///
/// ```
/// use canal_profile::profile::{ProfileSample, trapezoid};
///
/// let samples = [
///     ProfileSample { s: 0.0, area: 1.0 },
///     ProfileSample { s: 2.0, area: 3.0 },
/// ];
/// assert_eq!(trapezoid(&samples), 4.0);
/// assert_eq!(trapezoid(&samples[..1]), 0.0);
/// ```
pub fn trapezoid(samples: &[ProfileSample]) -> f64 {
    samples
        .windows(2)
        .map(|w| 0.5 * (w[0].area + w[1].area) * (w[1].s - w[0].s))
        .sum()
}

/// Percentile `q` (0 to 100) of ascending `sorted`, linearly interpolated.
///
/// Returns NaN for an empty slice.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
        }
    }
}

/// Position of the smallest area strictly inside the percentile window.
///
/// Ties go to the first sample. If the window holds no samples the global
/// minimum is used. Returns `None` only for an empty profile.
pub fn locate_isthmus(samples: &[ProfileSample], window: (f64, f64)) -> Option<ProfileSample> {
    let positions: Vec<f64> = samples.iter().map(|x| x.s).collect();
    let low = percentile(&positions, window.0);
    let high = percentile(&positions, window.1);

    let first_min = |acc: Option<ProfileSample>, x: &ProfileSample| match acc {
        Some(best) if best.area <= x.area => Some(best),
        _ => Some(*x),
    };

    samples
        .iter()
        .filter(|x| x.s > low && x.s < high)
        .fold(None, first_min)
        .or_else(|| samples.iter().fold(None, first_min))
}

/// Volumes either side of a percentile of the valid positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionalVolumes {
    /// Position of the split (mm).
    pub threshold: f64,
    /// Volume of samples below the threshold (mm³).
    pub cartilaginous: f64,
    /// Volume of samples at or above the threshold (mm³).
    pub bony: f64,
}

/// Split a profile at `split_percentile` and integrate each side.
///
/// Each side is integrated on its own samples only; the interval that
/// straddles the threshold belongs to neither. An empty side is zero.
pub fn split_volumes(samples: &[ProfileSample], split_percentile: f64) -> RegionalVolumes {
    let positions: Vec<f64> = samples.iter().map(|x| x.s).collect();
    let threshold = percentile(&positions, split_percentile);
    let cut = samples.partition_point(|x| x.s < threshold);
    let (outer, inner) = samples.split_at(cut);

    RegionalVolumes {
        threshold,
        cartilaginous: trapezoid(outer),
        bony: trapezoid(inner),
    }
}

/// The area profile of one mesh at one resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeProfile {
    /// Axis the planes were swept along.
    pub axis: Axis,
    /// Valid samples in increasing `s`.
    pub samples: Vec<ProfileSample>,
    /// Smallest vertex projection on the axis (mm).
    pub s_min: f64,
    /// Vertex projection range (mm).
    pub canal_length: f64,
    /// Trapezoidal volume over all samples (mm³).
    pub volume_total: f64,
    /// Position of the isthmus on the axis (mm).
    pub isthmus_position: f64,
    /// Isthmus position relative to the projection range, NaN for zero length.
    pub isthmus_position_norm: f64,
    /// Positions rescaled to [0, 1] over the valid samples.
    pub s_norm: Vec<f64>,
    /// Areas divided by the largest area.
    pub a_norm: Vec<f64>,
}

impl VolumeProfile {
    /// Assemble a profile from valid samples.
    ///
    /// # Errors
    /// [`AnalysisError::InsufficientSections`] when fewer than
    /// `min_valid_sections` samples are given.
    pub fn from_samples(
        axis: Axis,
        s_min: f64,
        s_max: f64,
        samples: Vec<ProfileSample>,
        params: &AnalysisParams,
    ) -> AnalysisResult<Self> {
        let required = params.min_valid_sections.max(2);
        if samples.len() < required {
            return Err(AnalysisError::InsufficientSections {
                found: samples.len(),
                required,
            });
        }

        let canal_length = s_max - s_min;
        let volume_total = trapezoid(&samples);

        let isthmus = locate_isthmus(&samples, params.isthmus_window)
            .ok_or(AnalysisError::InsufficientSections {
                found: 0,
                required,
            })?;
        let isthmus_position_norm = if canal_length > 0.0 {
            (isthmus.s - s_min) / canal_length
        } else {
            f64::NAN
        };

        let (used_min, used_max) = (samples[0].s, samples[samples.len() - 1].s);
        let used_span = used_max - used_min;
        let s_norm = samples
            .iter()
            .map(|x| {
                if used_span > 0.0 {
                    (x.s - used_min) / used_span
                } else {
                    f64::NAN
                }
            })
            .collect();

        let max_area = samples.iter().map(|x| x.area).fold(0.0_f64, f64::max);
        let a_norm = samples.iter().map(|x| x.area / max_area).collect();

        Ok(Self {
            axis,
            samples,
            s_min,
            canal_length,
            volume_total,
            isthmus_position: isthmus.s,
            isthmus_position_norm,
            s_norm,
            a_norm,
        })
    }

    /// Number of valid sections.
    pub fn sections_used(&self) -> usize {
        self.samples.len()
    }

    /// Cartilaginous and bony volumes at `split_percentile`.
    pub fn regional_volumes(&self, split_percentile: f64) -> RegionalVolumes {
        split_volumes(&self.samples, split_percentile)
    }
}

/// Build the volume profile of a mesh with `n_sections` planes.
///
/// # Errors
/// [`AnalysisError::InvalidMesh`] for an empty mesh, non-finite coordinates
/// or out-of-range face indices,
/// [`AnalysisError::DegenerateGeometry`] if no axis can be estimated,
/// [`AnalysisError::InsufficientSections`] if too few sections survive.
pub fn build_profile(
    mesh: &Mesh,
    params: &AnalysisParams,
    n_sections: usize,
) -> AnalysisResult<VolumeProfile> {
    let _timer = OperationTimer::with_mesh("build_profile", mesh);

    // Section sweeps index vertices unchecked
    validate_mesh_data(mesh).map_err(|err| AnalysisError::invalid_mesh(&err))?;
    let axis = principal_axis(mesh)?;
    let sampling = sample_sections(mesh, &axis, n_sections, params.min_boundary_points);

    let samples: Vec<ProfileSample> = sampling
        .sections
        .par_iter()
        .filter_map(|section| {
            section_area(&section.points, &axis, params.projection)
                .map(|area| ProfileSample { s: section.s, area })
        })
        .collect();

    debug!(
        "{} of {} sampled sections have a valid hull",
        samples.len(),
        sampling.sections.len()
    );
    if samples.len() * 2 < n_sections {
        warn!(
            kept = samples.len(),
            n_sections,
            "More than half of the sections were discarded"
        );
    }

    let profile = VolumeProfile::from_samples(axis, sampling.s_min, sampling.s_max, samples, params)?;
    log_profile_summary(&profile, n_sections);
    Ok(profile)
}
