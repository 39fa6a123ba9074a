// SPDX-License-Identifier: MIT OR Apache-2.0

use ili_core::{AnomalyRecord, GrowthMetrics, IliError, ReferencePoint};
use std::collections::HashMap;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Component weights for the composite risk score.
///
/// `depth + growth + location` must sum to 1.0; `cluster_boost` sits
/// outside the blend as an additive bump for anomalies inside an
/// interaction zone.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskWeights {
    pub depth: f64,
    pub growth: f64,
    pub location: f64,
    pub cluster_boost: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            depth: 0.6,
            growth: 0.3,
            location: 0.1,
            cluster_boost: 0.1,
        }
    }
}

impl RiskWeights {
    fn validate(&self) -> Result<(), IliError> {
        let sum = self.depth + self.growth + self.location;
        if !sum.is_finite() || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(IliError::invalid_input(format!(
                "risk weights must sum to 1.0, got {sum}"
            )));
        }
        if !self.cluster_boost.is_finite() || self.cluster_boost < 0.0 {
            return Err(IliError::invalid_input(format!(
                "cluster_boost must be finite and >= 0, got {}",
                self.cluster_boost
            )));
        }
        Ok(())
    }
}

/// Risk score plus its per-component contributions, for audit.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RiskBreakdown {
    pub anomaly_id: String,
    pub risk_score: f64,
    pub depth_pct: f64,
    pub growth_rate: f64,
    pub location_factor: f64,
    pub depth_contribution: f64,
    pub growth_contribution: f64,
    pub location_contribution: f64,
    pub cluster_contribution: f64,
    pub is_clustered: bool,
}

/// Composite risk scorer: depth severity now, growth severity next, and
/// location context, blended per [`RiskWeights`].
#[derive(Clone, Debug)]
pub struct RiskScorer {
    weights: RiskWeights,
}

impl RiskScorer {
    pub fn new(weights: RiskWeights) -> Result<Self, IliError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &RiskWeights {
        &self.weights
    }

    /// Proximity heuristic: welds and fittings concentrate stress, so
    /// risk is highest within 3 ft of a reference point, decays linearly
    /// to the 0.5 baseline by 10 ft, and defaults to the baseline when no
    /// reference points are supplied.
    pub fn location_factor(
        &self,
        anomaly: &AnomalyRecord,
        reference_points: &[ReferencePoint],
    ) -> f64 {
        if reference_points.is_empty() {
            return 0.5;
        }
        let min_distance = reference_points
            .iter()
            .map(|rp| (anomaly.distance - rp.distance).abs())
            .fold(f64::INFINITY, f64::min);

        if min_distance < 3.0 {
            1.0
        } else if min_distance < 10.0 {
            1.0 - (min_distance - 3.0) / 7.0 * 0.5
        } else {
            0.5
        }
    }

    /// Scores one anomaly; growth defaults to zero when no metrics exist
    /// for it. The result is always within [0, 1].
    pub fn score(
        &self,
        anomaly: &AnomalyRecord,
        growth: Option<&GrowthMetrics>,
        reference_points: &[ReferencePoint],
    ) -> RiskBreakdown {
        let growth_rate = growth.map_or(0.0, |g| g.depth_growth_rate);
        let location_factor = self.location_factor(anomaly, reference_points);

        let depth_contribution = (anomaly.depth_pct / 100.0).clamp(0.0, 1.0) * self.weights.depth;
        let growth_contribution = (growth_rate / 10.0).clamp(0.0, 1.0) * self.weights.growth;
        let location_contribution = location_factor * self.weights.location;

        let base = depth_contribution + growth_contribution + location_contribution;
        let (cluster_contribution, risk_score) = if anomaly.is_clustered() {
            (
                self.weights.cluster_boost,
                (base + self.weights.cluster_boost).min(1.0),
            )
        } else {
            (0.0, base)
        };

        RiskBreakdown {
            anomaly_id: anomaly.id.clone(),
            risk_score,
            depth_pct: anomaly.depth_pct,
            growth_rate,
            location_factor,
            depth_contribution,
            growth_contribution,
            location_contribution,
            cluster_contribution,
            is_clustered: anomaly.is_clustered(),
        }
    }

    /// Scores a batch, pairing each anomaly with its growth metrics by
    /// the newer-run anomaly id.
    pub fn score_all(
        &self,
        anomalies: &[AnomalyRecord],
        growth_metrics: &[GrowthMetrics],
        reference_points: &[ReferencePoint],
    ) -> Vec<RiskBreakdown> {
        let growth_by_id: HashMap<&str, &GrowthMetrics> = growth_metrics
            .iter()
            .map(|g| (g.anomaly_id.as_str(), g))
            .collect();

        anomalies
            .iter()
            .map(|a| {
                self.score(
                    a,
                    growth_by_id.get(a.id.as_str()).copied(),
                    reference_points,
                )
            })
            .collect()
    }

    /// Scores and sorts descending by risk, optionally truncated to the
    /// top `n`.
    pub fn rank_by_risk(
        &self,
        anomalies: &[AnomalyRecord],
        growth_metrics: &[GrowthMetrics],
        reference_points: &[ReferencePoint],
        top_n: Option<usize>,
    ) -> Vec<RiskBreakdown> {
        let mut scores = self.score_all(anomalies, growth_metrics, reference_points);
        scores.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        if let Some(n) = top_n {
            scores.truncate(n);
        }
        scores
    }

    /// Scores and keeps entries at or above `threshold`, sorted
    /// descending.
    pub fn high_risk(
        &self,
        anomalies: &[AnomalyRecord],
        growth_metrics: &[GrowthMetrics],
        reference_points: &[ReferencePoint],
        threshold: f64,
    ) -> Vec<RiskBreakdown> {
        let mut scores: Vec<RiskBreakdown> = self
            .score_all(anomalies, growth_metrics, reference_points)
            .into_iter()
            .filter(|s| s.risk_score >= threshold)
            .collect();
        scores.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        scores
    }
}
