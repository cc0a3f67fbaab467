//! Left-versus-right comparison.
//!
//! The right ear is the reference: percentages are `100 · (left − right) /
//! right` and shifts are `left − right`.

use serde::{Deserialize, Serialize};

use crate::analyze::EarAnalysisResult;

/// Signed percentage change from `reference` to `other`.
///
/// `None` when the reference is zero.
///
/// ```
/// use canal_profile::compare::pct_diff;
///
/// assert_eq!(pct_diff(200.0, 150.0), Some(-25.0));
/// assert_eq!(pct_diff(0.0, 150.0), None);
/// ```
pub fn pct_diff(reference: f64, other: f64) -> Option<f64> {
    (reference != 0.0).then(|| 100.0 * (other - reference) / reference)
}

/// Bilateral difference metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Total volume change (%).
    pub total_volume_diff_percent: Option<f64>,
    /// Cartilaginous volume change (%).
    pub cartilaginous_volume_diff_percent: Option<f64>,
    /// Bony volume change (%).
    pub bony_volume_diff_percent: Option<f64>,
    /// Isthmus position difference (mm).
    #[serde(rename = "istmo_shift_mm")]
    pub isthmus_shift_mm: f64,
    /// Normalised isthmus position difference; null if either side is undefined.
    #[serde(rename = "istmo_shift_norm")]
    pub isthmus_shift_norm: Option<f64>,
    /// Canal length difference (mm).
    pub canal_length_diff_mm: f64,
}

/// Compare two ears, `reference` being the right one.
pub fn compare(reference: &EarAnalysisResult, other: &EarAnalysisResult) -> ComparisonResult {
    let shift_norm = other.isthmus_position_norm - reference.isthmus_position_norm;

    ComparisonResult {
        total_volume_diff_percent: pct_diff(reference.volume_total_mm3, other.volume_total_mm3),
        cartilaginous_volume_diff_percent: pct_diff(
            reference.volume_cartilaginous_mm3,
            other.volume_cartilaginous_mm3,
        ),
        bony_volume_diff_percent: pct_diff(reference.volume_bony_mm3, other.volume_bony_mm3),
        isthmus_shift_mm: other.isthmus_position_mm - reference.isthmus_position_mm,
        isthmus_shift_norm: shift_norm.is_finite().then_some(shift_norm),
        canal_length_diff_mm: other.canal_length_mm - reference.canal_length_mm,
    }
}
