// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::IliError;

/// Per-pair growth rates for one surviving match.
///
/// Rates are signed: a negative value is apparent shrinkage from repair or
/// measurement noise, not an error. `anomaly_id` is the newer-run anomaly,
/// carried explicitly so consumers never have to parse the match id.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GrowthMetrics {
    pub match_id: String,
    /// Newer-run anomaly the metrics describe.
    pub anomaly_id: String,
    pub time_interval_years: f64,
    /// Percentage points of wall thickness per year.
    pub depth_growth_rate: f64,
    /// Inches per year.
    pub length_growth_rate: f64,
    /// Inches per year.
    pub width_growth_rate: f64,
    pub is_rapid_growth: bool,
    /// Filled by the risk scorer after construction.
    pub risk_score: f64,
}

impl GrowthMetrics {
    /// Constructs validated growth metrics for a matched pair.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        match_id: impl Into<String>,
        anomaly_id: impl Into<String>,
        time_interval_years: f64,
        depth_growth_rate: f64,
        length_growth_rate: f64,
        width_growth_rate: f64,
        is_rapid_growth: bool,
    ) -> Result<Self, IliError> {
        let match_id = match_id.into();
        let anomaly_id = anomaly_id.into();
        if match_id.is_empty() || anomaly_id.is_empty() {
            return Err(IliError::invalid_input(
                "growth metrics ids must be non-empty",
            ));
        }
        if !time_interval_years.is_finite() || time_interval_years <= 0.0 {
            return Err(IliError::invalid_input(format!(
                "time interval must be > 0 years, got {time_interval_years}"
            )));
        }
        for (name, rate) in [
            ("depth growth rate", depth_growth_rate),
            ("length growth rate", length_growth_rate),
            ("width growth rate", width_growth_rate),
        ] {
            if !rate.is_finite() {
                return Err(IliError::numerical_issue(format!(
                    "{name} must be finite, got {rate}"
                )));
            }
        }
        Ok(Self {
            match_id,
            anomaly_id,
            time_interval_years,
            depth_growth_rate,
            length_growth_rate,
            width_growth_rate,
            is_rapid_growth,
            risk_score: 0.0,
        })
    }

    /// Returns a copy carrying the composite risk score.
    pub fn with_risk_score(&self, risk_score: f64) -> Result<Self, IliError> {
        if !risk_score.is_finite() || !(0.0..=1.0).contains(&risk_score) {
            return Err(IliError::invalid_input(format!(
                "risk score must be within 0-1, got {risk_score}"
            )));
        }
        let mut updated = self.clone();
        updated.risk_score = risk_score;
        Ok(updated)
    }
}
