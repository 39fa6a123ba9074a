// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeMap;
use std::collections::HashMap;

use ili_core::{AnomalyRecord, FeatureType, GrowthMetrics, IliError, Match};

/// Configuration for [`GrowthAnalyzer`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthConfig {
    /// Depth growth above which a match is flagged rapid, pp/yr.
    pub rapid_growth_threshold: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            rapid_growth_threshold: 5.0,
        }
    }
}

impl GrowthConfig {
    fn validate(&self) -> Result<(), IliError> {
        if !self.rapid_growth_threshold.is_finite() || self.rapid_growth_threshold <= 0.0 {
            return Err(IliError::invalid_input(format!(
                "rapid_growth_threshold must be finite and > 0, got {}",
                self.rapid_growth_threshold
            )));
        }
        Ok(())
    }
}

/// Summary statistics for one growth dimension.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DimensionStats {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; zero for fewer than two rates.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl DimensionStats {
    fn from_rates(rates: &[f64]) -> Self {
        if rates.is_empty() {
            return Self::default();
        }
        let n = rates.len() as f64;
        let mean = rates.iter().sum::<f64>() / n;

        let mut sorted = rates.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        let std_dev = if rates.len() > 1 {
            let var = rates.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / (n - 1.0);
            var.sqrt()
        } else {
            0.0
        };

        Self {
            mean,
            median,
            std_dev,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }
}

/// Aggregate growth statistics over one matching pass.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GrowthStatistics {
    pub total_matches: usize,
    pub rapid_growth_count: usize,
    pub rapid_growth_percentage: f64,
    pub depth_growth: DimensionStats,
    pub length_growth: DimensionStats,
    pub width_growth: DimensionStats,
}

impl GrowthStatistics {
    fn from_metrics(metrics: &[GrowthMetrics]) -> Self {
        if metrics.is_empty() {
            return Self::default();
        }
        let depth: Vec<f64> = metrics.iter().map(|m| m.depth_growth_rate).collect();
        let length: Vec<f64> = metrics.iter().map(|m| m.length_growth_rate).collect();
        let width: Vec<f64> = metrics.iter().map(|m| m.width_growth_rate).collect();
        let rapid = metrics.iter().filter(|m| m.is_rapid_growth).count();

        Self {
            total_matches: metrics.len(),
            rapid_growth_count: rapid,
            rapid_growth_percentage: rapid as f64 / metrics.len() as f64 * 100.0,
            depth_growth: DimensionStats::from_rates(&depth),
            length_growth: DimensionStats::from_rates(&length),
            width_growth: DimensionStats::from_rates(&width),
        }
    }
}

/// Operator-facing flag for a match growing faster than the threshold.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RapidGrowthAlert {
    /// Newer-run anomaly id.
    pub anomaly_id: String,
    pub depth_growth_rate: f64,
    pub current_depth_pct: f64,
    pub distance: f64,
    pub clock_position: f64,
}

/// Full result of one growth-analysis pass.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GrowthReport {
    pub metrics: Vec<GrowthMetrics>,
    pub statistics: GrowthStatistics,
    pub rapid_growth: Vec<RapidGrowthAlert>,
}

/// Computes signed per-dimension growth rates for matched anomaly pairs.
#[derive(Clone, Debug)]
pub struct GrowthAnalyzer {
    config: GrowthConfig,
}

impl GrowthAnalyzer {
    pub fn new(config: GrowthConfig) -> Result<Self, IliError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    /// Signed absolute change per year; negative is apparent shrinkage.
    pub fn growth_rate(
        &self,
        initial_value: f64,
        final_value: f64,
        time_interval_years: f64,
    ) -> Result<f64, IliError> {
        if !time_interval_years.is_finite() || time_interval_years <= 0.0 {
            return Err(IliError::invalid_input(format!(
                "time interval must be > 0 years, got {time_interval_years}"
            )));
        }
        Ok((final_value - initial_value) / time_interval_years)
    }

    /// Growth metrics for a single matched pair.
    pub fn pair_metrics(
        &self,
        matched: &Match,
        older: &AnomalyRecord,
        newer: &AnomalyRecord,
        time_interval_years: f64,
    ) -> Result<GrowthMetrics, IliError> {
        let depth_rate = self.growth_rate(older.depth_pct, newer.depth_pct, time_interval_years)?;
        let length_rate = self.growth_rate(older.length, newer.length, time_interval_years)?;
        let width_rate = self.growth_rate(older.width, newer.width, time_interval_years)?;

        GrowthMetrics::new(
            matched.id.clone(),
            newer.id.clone(),
            time_interval_years,
            depth_rate,
            length_rate,
            width_rate,
            depth_rate > self.config.rapid_growth_threshold,
        )
    }

    /// Analyzes growth for all matches between two runs.
    ///
    /// Matches whose anomalies are missing from the supplied lists are
    /// skipped rather than treated as errors; a non-positive time interval
    /// is a hard error.
    pub fn analyze(
        &self,
        matches: &[Match],
        run1: &[AnomalyRecord],
        run2: &[AnomalyRecord],
        time_interval_years: f64,
    ) -> Result<GrowthReport, IliError> {
        if !time_interval_years.is_finite() || time_interval_years <= 0.0 {
            return Err(IliError::invalid_input(format!(
                "time interval must be > 0 years, got {time_interval_years}"
            )));
        }

        let run1_by_id: HashMap<&str, &AnomalyRecord> =
            run1.iter().map(|a| (a.id.as_str(), a)).collect();
        let run2_by_id: HashMap<&str, &AnomalyRecord> =
            run2.iter().map(|a| (a.id.as_str(), a)).collect();

        let mut metrics = Vec::with_capacity(matches.len());
        let mut rapid_growth = Vec::new();
        for matched in matches {
            let (Some(older), Some(newer)) = (
                run1_by_id.get(matched.anomaly1_id.as_str()),
                run2_by_id.get(matched.anomaly2_id.as_str()),
            ) else {
                continue;
            };

            let pair = self.pair_metrics(matched, older, newer, time_interval_years)?;
            if pair.is_rapid_growth {
                rapid_growth.push(RapidGrowthAlert {
                    anomaly_id: newer.id.clone(),
                    depth_growth_rate: pair.depth_growth_rate,
                    current_depth_pct: newer.depth_pct,
                    distance: newer.distance,
                    clock_position: newer.clock_position,
                });
            }
            metrics.push(pair);
        }

        let statistics = GrowthStatistics::from_metrics(&metrics);
        Ok(GrowthReport {
            metrics,
            statistics,
            rapid_growth,
        })
    }

    /// Groups growth statistics by the newer-run feature type. Metrics
    /// whose anomaly is absent from `run2` are ignored.
    pub fn growth_by_feature_type(
        &self,
        metrics: &[GrowthMetrics],
        run2: &[AnomalyRecord],
    ) -> BTreeMap<FeatureType, GrowthStatistics> {
        let type_by_id: HashMap<&str, FeatureType> = run2
            .iter()
            .map(|a| (a.id.as_str(), a.feature_type))
            .collect();

        let mut grouped: BTreeMap<FeatureType, Vec<GrowthMetrics>> = BTreeMap::new();
        for metric in metrics {
            if let Some(&feature_type) = type_by_id.get(metric.anomaly_id.as_str()) {
                grouped.entry(feature_type).or_default().push(metric.clone());
            }
        }

        grouped
            .into_iter()
            .map(|(feature_type, group)| (feature_type, GrowthStatistics::from_metrics(&group)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{DimensionStats, GrowthAnalyzer, GrowthConfig};
    use chrono::NaiveDate;
    use ili_core::{AnomalyRecord, FeatureType, Match};

    fn analyzer() -> GrowthAnalyzer {
        GrowthAnalyzer::new(GrowthConfig::default()).expect("default config is valid")
    }

    fn anomaly(
        id: &str,
        run_id: &str,
        depth: f64,
        length: f64,
        width: f64,
        feature_type: FeatureType,
    ) -> AnomalyRecord {
        AnomalyRecord::new(
            id,
            run_id,
            100.0,
            6.0,
            depth,
            length,
            width,
            feature_type,
            NaiveDate::from_ymd_opt(2015, 6, 1).expect("valid date"),
        )
        .expect("valid anomaly")
    }

    fn perfect_match(id1: &str, id2: &str) -> Match {
        Match::new(id1, id2, 0.95, 1.0, 1.0, 1.0, 0.9, 0.9, 0.9).expect("valid match")
    }

    #[test]
    fn boundary_depth_growth_is_not_rapid() {
        // 40% -> 50% over 2 years: exactly 5.0 pp/yr, threshold is strict.
        let run1 = vec![anomaly("A", "RUN_2013", 40.0, 2.0, 1.0, FeatureType::ExternalCorrosion)];
        let run2 = vec![anomaly("B", "RUN_2015", 50.0, 2.0, 1.0, FeatureType::ExternalCorrosion)];
        let report = analyzer()
            .analyze(&[perfect_match("A", "B")], &run1, &run2, 2.0)
            .expect("analysis succeeds");
        assert_eq!(report.metrics.len(), 1);
        let m = &report.metrics[0];
        assert!((m.depth_growth_rate - 5.0).abs() < 1e-12);
        assert!(!m.is_rapid_growth);
        assert!(report.rapid_growth.is_empty());
    }

    #[test]
    fn rapid_growth_raises_an_alert() {
        let run1 = vec![anomaly("A", "RUN_2013", 20.0, 2.0, 1.0, FeatureType::ExternalCorrosion)];
        let run2 = vec![anomaly("B", "RUN_2015", 32.0, 2.4, 1.2, FeatureType::ExternalCorrosion)];
        let report = analyzer()
            .analyze(&[perfect_match("A", "B")], &run1, &run2, 2.0)
            .expect("analysis succeeds");
        let m = &report.metrics[0];
        assert!((m.depth_growth_rate - 6.0).abs() < 1e-12);
        assert!(m.is_rapid_growth);
        assert_eq!(report.rapid_growth.len(), 1);
        assert_eq!(report.rapid_growth[0].anomaly_id, "B");
        assert_eq!(report.rapid_growth[0].current_depth_pct, 32.0);
        assert_eq!(report.statistics.rapid_growth_count, 1);
        assert!((report.statistics.rapid_growth_percentage - 100.0).abs() < 1e-12);
    }

    #[test]
    fn negative_growth_is_signed_shrinkage() {
        let rate = analyzer().growth_rate(50.0, 42.0, 4.0).expect("valid interval");
        assert!((rate + 2.0).abs() < 1e-12);
    }

    #[test]
    fn growth_rate_is_odd_under_endpoint_swap() {
        let a = analyzer();
        let forward = a.growth_rate(30.0, 45.0, 5.0).expect("valid");
        let backward = a.growth_rate(45.0, 30.0, 5.0).expect("valid");
        assert!((forward + backward).abs() < 1e-12);
    }

    #[test]
    fn non_positive_interval_is_a_hard_error() {
        assert!(analyzer().growth_rate(10.0, 20.0, 0.0).is_err());
        let err = analyzer()
            .analyze(&[], &[], &[], -1.0)
            .expect_err("negative interval must fail");
        assert!(err.to_string().contains("time interval"));
    }

    #[test]
    fn matches_with_missing_anomalies_are_skipped() {
        let run2 = vec![anomaly("B", "RUN_2015", 50.0, 2.0, 1.0, FeatureType::Dent)];
        let report = analyzer()
            .analyze(&[perfect_match("MISSING", "B")], &[], &run2, 2.0)
            .expect("analysis succeeds");
        assert!(report.metrics.is_empty());
        assert_eq!(report.statistics.total_matches, 0);
    }

    #[test]
    fn dimension_stats_cover_spread() {
        let stats = DimensionStats::from_rates(&[1.0, 3.0, 2.0, 4.0]);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert!((stats.median - 2.5).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        // Sample stdev of 1..4.
        assert!((stats.std_dev - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);

        let single = DimensionStats::from_rates(&[2.0]);
        assert_eq!(single.std_dev, 0.0);
        assert_eq!(single.median, 2.0);
    }

    #[test]
    fn feature_type_grouping_uses_newer_run_types() {
        let run1 = vec![
            anomaly("A1", "RUN_2013", 20.0, 2.0, 1.0, FeatureType::ExternalCorrosion),
            anomaly("A2", "RUN_2013", 30.0, 2.0, 1.0, FeatureType::Dent),
        ];
        let run2 = vec![
            anomaly("B1", "RUN_2015", 26.0, 2.0, 1.0, FeatureType::ExternalCorrosion),
            anomaly("B2", "RUN_2015", 31.0, 2.0, 1.0, FeatureType::Dent),
        ];
        let a = analyzer();
        let report = a
            .analyze(
                &[perfect_match("A1", "B1"), perfect_match("A2", "B2")],
                &run1,
                &run2,
                2.0,
            )
            .expect("analysis succeeds");
        let grouped = a.growth_by_feature_type(&report.metrics, &run2);
        assert_eq!(grouped.len(), 2);
        let corrosion = &grouped[&FeatureType::ExternalCorrosion];
        assert_eq!(corrosion.total_matches, 1);
        assert!((corrosion.depth_growth.mean - 3.0).abs() < 1e-12);
        assert!((grouped[&FeatureType::Dent].depth_growth.mean - 0.5).abs() < 1e-12);
    }
}
