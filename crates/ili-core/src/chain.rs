// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::IliError;

/// Growth-rate acceleration above which a chain counts as accelerating,
/// in percentage points per year squared.
pub const ACCELERATION_THRESHOLD: f64 = 0.1;

/// The same physical defect linked across three inspection runs via two
/// successive matches sharing the middle-run anomaly.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AnomalyChain {
    pub chain_id: String,
    pub first_anomaly_id: String,
    pub middle_anomaly_id: String,
    pub last_anomaly_id: String,
    /// Similarity of the first-to-middle match.
    pub match_confidence_early: f64,
    /// Similarity of the middle-to-last match.
    pub match_confidence_late: f64,
    pub depth_first: f64,
    pub depth_middle: f64,
    pub depth_last: f64,
    /// Depth growth over the first interval, pp/yr.
    pub early_growth_rate: f64,
    /// Depth growth over the second interval, pp/yr.
    pub late_growth_rate: f64,
    /// Late rate minus early rate, pp/yr².
    pub acceleration: f64,
    pub is_accelerating: bool,
    pub risk_score: f64,
    /// Projected years until 80% wall-thickness depth; `None` when the
    /// defect is not growing.
    pub years_to_80pct: Option<f64>,
}

impl AnomalyChain {
    /// Constructs a validated chain; the accelerating flag derives from
    /// the acceleration value.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain_id: impl Into<String>,
        first_anomaly_id: impl Into<String>,
        middle_anomaly_id: impl Into<String>,
        last_anomaly_id: impl Into<String>,
        match_confidence_early: f64,
        match_confidence_late: f64,
        depths: (f64, f64, f64),
        early_growth_rate: f64,
        late_growth_rate: f64,
        risk_score: f64,
        years_to_80pct: Option<f64>,
    ) -> Result<Self, IliError> {
        let chain_id = chain_id.into();
        if chain_id.is_empty() {
            return Err(IliError::invalid_input("chain id must be non-empty"));
        }
        for (name, value) in [
            ("early match confidence", match_confidence_early),
            ("late match confidence", match_confidence_late),
            ("risk score", risk_score),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(IliError::invalid_input(format!(
                    "{name} must be within 0-1, got {value}"
                )));
            }
        }
        let (depth_first, depth_middle, depth_last) = depths;
        for (name, depth) in [
            ("first depth", depth_first),
            ("middle depth", depth_middle),
            ("last depth", depth_last),
        ] {
            if !depth.is_finite() || !(0.0..=100.0).contains(&depth) {
                return Err(IliError::invalid_input(format!(
                    "{name} must be within 0-100%, got {depth}"
                )));
            }
        }
        if !early_growth_rate.is_finite() || !late_growth_rate.is_finite() {
            return Err(IliError::numerical_issue(
                "chain growth rates must be finite",
            ));
        }
        if let Some(years) = years_to_80pct {
            if !years.is_finite() || years < 0.0 {
                return Err(IliError::invalid_input(format!(
                    "years to 80% must be finite and >= 0, got {years}"
                )));
            }
        }

        let acceleration = late_growth_rate - early_growth_rate;
        Ok(Self {
            chain_id,
            first_anomaly_id: first_anomaly_id.into(),
            middle_anomaly_id: middle_anomaly_id.into(),
            last_anomaly_id: last_anomaly_id.into(),
            match_confidence_early,
            match_confidence_late,
            depth_first,
            depth_middle,
            depth_last,
            early_growth_rate,
            late_growth_rate,
            acceleration,
            is_accelerating: acceleration > ACCELERATION_THRESHOLD,
            risk_score,
            years_to_80pct,
        })
    }
}
