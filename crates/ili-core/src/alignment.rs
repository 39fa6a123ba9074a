// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::IliError;

/// Minimum acceptable fraction of reference points matched, in percent.
pub const MIN_MATCH_RATE_PCT: f64 = 95.0;

/// Maximum acceptable root-mean-square error between matched points, in feet.
pub const MAX_RMSE_FT: f64 = 10.0;

/// Accepted result of a DTW alignment between two reference-point sequences.
///
/// Construction is the quality gate: an alignment whose `match_rate` or
/// `rmse` is outside the acceptance window never becomes an
/// `AlignmentResult`. Callers that can degrade (the three-way orchestrator)
/// catch [`IliError::QualityThreshold`] and fall back to uncorrected
/// distances.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentResult {
    pub run1_id: String,
    pub run2_id: String,
    /// Ordered (run1 point id, run2 point id) pairs along the warping path.
    pub matched_points: Vec<(String, String)>,
    /// Matched pairs over the longer sequence, 0-100.
    pub match_rate: f64,
    /// Root-mean-square distance discrepancy across matched pairs, feet.
    pub rmse: f64,
    /// Source-run odometer distances of the matched pairs, path order.
    pub source_distances: Vec<f64>,
    /// Target-run odometer distances of the matched pairs, path order.
    pub target_distances: Vec<f64>,
}

impl AlignmentResult {
    /// Constructs a validated, threshold-checked alignment result.
    pub fn new(
        run1_id: impl Into<String>,
        run2_id: impl Into<String>,
        matched_points: Vec<(String, String)>,
        match_rate: f64,
        rmse: f64,
        source_distances: Vec<f64>,
        target_distances: Vec<f64>,
    ) -> Result<Self, IliError> {
        if matched_points.is_empty() {
            return Err(IliError::invalid_input(
                "alignment must contain at least one matched pair",
            ));
        }
        if source_distances.len() != matched_points.len()
            || target_distances.len() != matched_points.len()
        {
            return Err(IliError::invalid_input(format!(
                "correction arrays must parallel matched pairs: pairs={}, source={}, target={}",
                matched_points.len(),
                source_distances.len(),
                target_distances.len()
            )));
        }
        if !match_rate.is_finite() || !(0.0..=100.0).contains(&match_rate) {
            return Err(IliError::invalid_input(format!(
                "match rate must be within 0-100, got {match_rate}"
            )));
        }
        if !rmse.is_finite() || rmse < 0.0 {
            return Err(IliError::invalid_input(format!(
                "rmse must be finite and >= 0, got {rmse}"
            )));
        }
        if match_rate < MIN_MATCH_RATE_PCT {
            return Err(IliError::quality_threshold(format!(
                "match rate {match_rate:.1}% below {MIN_MATCH_RATE_PCT}% threshold"
            )));
        }
        if rmse > MAX_RMSE_FT {
            return Err(IliError::quality_threshold(format!(
                "rmse {rmse:.2} ft exceeds {MAX_RMSE_FT} ft threshold"
            )));
        }

        Ok(Self {
            run1_id: run1_id.into(),
            run2_id: run2_id.into(),
            matched_points,
            match_rate,
            rmse,
            source_distances,
            target_distances,
        })
    }

    /// Number of matched reference-point pairs.
    pub fn matched_pair_count(&self) -> usize {
        self.matched_points.len()
    }
}
