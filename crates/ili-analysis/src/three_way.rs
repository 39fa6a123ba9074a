// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use ili_align::{DistanceCorrection, DtwAligner, DtwConfig};
use ili_cluster::{ClusterConfig, ClusterDetector};
use ili_core::chain::ACCELERATION_THRESHOLD;
use ili_core::{
    AnomalyChain, AnomalyRecord, IliError, InteractionZone, ReferencePoint, ReferencePointType,
};
use ili_growth::{GrowthAnalyzer, GrowthConfig, GrowthReport};
use ili_match::{
    AnomalyMatcher, MatchStatistics, MatcherConfig, SimilarityCalculator, SimilarityConfig,
};

/// Wall-thickness depth treated as critical, percent.
pub const CRITICAL_DEPTH_PCT: f64 = 80.0;

/// Chain risk at or above which a chain counts as high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Depth at which a chain needs immediate action regardless of projection.
const IMMEDIATE_DEPTH_PCT: f64 = 70.0;

/// Projected years to critical at or below which action is immediate.
const IMMEDIATE_YEARS: f64 = 3.0;

/// Girth welds are preferred for alignment; fall back to all reference
/// point types below this count per side.
const MIN_GIRTH_WELDS: usize = 3;

const MIN_ALIGNMENT_POINTS: usize = 2;

const DAYS_PER_YEAR: f64 = 365.25;

/// One complete inspection run handed to the orchestrator.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct InspectionRun {
    pub run_id: String,
    pub inspection_date: NaiveDate,
    pub anomalies: Vec<AnomalyRecord>,
    pub reference_points: Vec<ReferencePoint>,
}

impl InspectionRun {
    pub fn new(
        run_id: impl Into<String>,
        inspection_date: NaiveDate,
        anomalies: Vec<AnomalyRecord>,
        reference_points: Vec<ReferencePoint>,
    ) -> Result<Self, IliError> {
        let run_id = run_id.into();
        if run_id.is_empty() {
            return Err(IliError::invalid_input("run id must be non-empty"));
        }
        Ok(Self {
            run_id,
            inspection_date,
            anomalies,
            reference_points,
        })
    }
}

/// Configuration bundle for [`ThreeWayAnalyzer`]; each section is
/// validated by its owning component.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThreeWayConfig {
    pub dtw: DtwConfig,
    pub similarity: SimilarityConfig,
    pub matcher: MatcherConfig,
    pub cluster: ClusterConfig,
    pub growth: GrowthConfig,
}

/// Quality diagnostics for one applied distance correction.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlignmentQuality {
    pub match_rate: f64,
    pub rmse: f64,
    pub matched_pairs: usize,
    pub max_correction_ft: f64,
    pub mean_correction_ft: f64,
}

/// Everything produced for one run-to-run interval.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct IntervalReport {
    pub source_run_id: String,
    pub target_run_id: String,
    pub time_interval_years: f64,
    /// False when matching ran on raw odometer distances.
    pub correction_applied: bool,
    /// Why the correction was skipped, for audit.
    pub fallback_reason: Option<String>,
    pub alignment: Option<AlignmentQuality>,
    pub statistics: MatchStatistics,
    pub growth: GrowthReport,
}

/// Full three-run analysis output, chains sorted by risk descending.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ThreeWayResult {
    pub zones: Vec<InteractionZone>,
    pub early_interval: IntervalReport,
    pub late_interval: IntervalReport,
    pub chains: Vec<AnomalyChain>,
    pub accelerating_count: usize,
    pub decelerating_count: usize,
    pub stable_count: usize,
    pub high_risk_count: usize,
    pub immediate_action_count: usize,
}

/// Projects years until the critical depth threshold.
///
/// Linear projection from the latest growth rate; positive acceleration
/// conservatively raises the effective rate as if it continued for five
/// more years. Returns 0 when already critical and `None` when the
/// defect is not growing.
pub fn years_to_critical(
    current_depth_pct: f64,
    growth_rate: f64,
    acceleration: f64,
) -> Option<f64> {
    if current_depth_pct >= CRITICAL_DEPTH_PCT {
        return Some(0.0);
    }
    let mut effective_rate = growth_rate;
    if acceleration > 0.0 {
        effective_rate += acceleration * 2.5;
    }
    if effective_rate <= 0.0 {
        return None;
    }
    Some((CRITICAL_DEPTH_PCT - current_depth_pct) / effective_rate)
}

struct CorrectionOutcome {
    anomalies: Vec<AnomalyRecord>,
    applied: bool,
    fallback_reason: Option<String>,
    quality: Option<AlignmentQuality>,
}

/// Orchestrates the full three-run pipeline: cluster each run, align and
/// drift-correct each interval, match each interval, link matches into
/// chains, then compute growth, acceleration, and risk per chain.
///
/// Alignment failures degrade, never abort: an interval whose correction
/// cannot be built falls back to raw odometer distances with a recorded
/// reason, and the rest of the pipeline proceeds.
pub struct ThreeWayAnalyzer {
    aligner: DtwAligner,
    matcher: AnomalyMatcher,
    cluster_detector: ClusterDetector,
    growth_analyzer: GrowthAnalyzer,
}

impl ThreeWayAnalyzer {
    pub fn new(config: ThreeWayConfig) -> Result<Self, IliError> {
        Ok(Self {
            aligner: DtwAligner::new(config.dtw)?,
            matcher: AnomalyMatcher::new(
                SimilarityCalculator::new(config.similarity)?,
                config.matcher,
            )?,
            cluster_detector: ClusterDetector::new(config.cluster)?,
            growth_analyzer: GrowthAnalyzer::new(config.growth)?,
        })
    }

    /// Runs the complete analysis over three chronologically ordered runs.
    pub fn analyze(
        &self,
        early: &InspectionRun,
        middle: &InspectionRun,
        late: &InspectionRun,
    ) -> Result<ThreeWayResult, IliError> {
        let early_years = years_between(early.inspection_date, middle.inspection_date);
        let late_years = years_between(middle.inspection_date, late.inspection_date);
        if early_years <= 0.0 || late_years <= 0.0 {
            return Err(IliError::invalid_input(format!(
                "inspection dates must be strictly increasing: {} -> {} -> {}",
                early.inspection_date, middle.inspection_date, late.inspection_date
            )));
        }

        // Interaction zones per run; members come back stamped.
        let (early_anomalies, early_zones) = self
            .cluster_detector
            .detect(&early.anomalies, &early.run_id)?;
        let (middle_anomalies, middle_zones) = self
            .cluster_detector
            .detect(&middle.anomalies, &middle.run_id)?;
        let (late_anomalies, late_zones) = self
            .cluster_detector
            .detect(&late.anomalies, &late.run_id)?;
        let mut zones = early_zones;
        zones.extend(middle_zones);
        zones.extend(late_zones);
        debug!(
            zones = zones.len(),
            "interaction zone detection complete"
        );

        // Drift-correct each source run into its target's frame.
        let early_correction = self.align_and_correct(
            &early_anomalies,
            &early.reference_points,
            &middle.reference_points,
            &early.run_id,
            &middle.run_id,
        )?;
        let middle_correction = self.align_and_correct(
            &middle_anomalies,
            &middle.reference_points,
            &late.reference_points,
            &middle.run_id,
            &late.run_id,
        )?;

        // Match each interval; targets stay in their native frame.
        let early_outcome = self
            .matcher
            .match_runs(&early_correction.anomalies, &middle_anomalies)?;
        let late_outcome = self
            .matcher
            .match_runs(&middle_correction.anomalies, &late_anomalies)?;
        debug!(
            early_matches = early_outcome.statistics.matched,
            late_matches = late_outcome.statistics.matched,
            "interval matching complete"
        );

        let early_growth = self.growth_analyzer.analyze(
            &early_outcome.matches,
            &early_correction.anomalies,
            &middle_anomalies,
            early_years,
        )?;
        let late_growth = self.growth_analyzer.analyze(
            &late_outcome.matches,
            &middle_correction.anomalies,
            &late_anomalies,
            late_years,
        )?;

        let mut chains = self.build_chains(
            &early_correction.anomalies,
            &middle_anomalies,
            &late_anomalies,
            &early_outcome.matches,
            &late_outcome.matches,
            early_years,
            late_years,
        )?;
        chains.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));

        let accelerating_count = chains.iter().filter(|c| c.is_accelerating).count();
        let decelerating_count = chains
            .iter()
            .filter(|c| c.acceleration < -ACCELERATION_THRESHOLD)
            .count();
        let stable_count = chains.len() - accelerating_count - decelerating_count;
        let high_risk_count = chains
            .iter()
            .filter(|c| c.risk_score >= HIGH_RISK_THRESHOLD)
            .count();
        let immediate_action_count = chains
            .iter()
            .filter(|c| {
                c.depth_last >= IMMEDIATE_DEPTH_PCT
                    || c.years_to_80pct.is_some_and(|y| y <= IMMEDIATE_YEARS)
            })
            .count();
        debug!(
            chains = chains.len(),
            accelerating = accelerating_count,
            high_risk = high_risk_count,
            "chain analysis complete"
        );

        Ok(ThreeWayResult {
            zones,
            early_interval: IntervalReport {
                source_run_id: early.run_id.clone(),
                target_run_id: middle.run_id.clone(),
                time_interval_years: early_years,
                correction_applied: early_correction.applied,
                fallback_reason: early_correction.fallback_reason,
                alignment: early_correction.quality,
                statistics: early_outcome.statistics,
                growth: early_growth,
            },
            late_interval: IntervalReport {
                source_run_id: middle.run_id.clone(),
                target_run_id: late.run_id.clone(),
                time_interval_years: late_years,
                correction_applied: middle_correction.applied,
                fallback_reason: middle_correction.fallback_reason,
                alignment: middle_correction.quality,
                statistics: late_outcome.statistics,
                growth: late_growth,
            },
            chains,
            accelerating_count,
            decelerating_count,
            stable_count,
            high_risk_count,
            immediate_action_count,
        })
    }

    /// Aligns source to target reference points and maps every source
    /// anomaly into the target's odometer frame.
    ///
    /// Girth welds are the most reliable physical features, so alignment
    /// prefers them and only widens to all types when either side has
    /// fewer than three. Too few points or a failed quality gate
    /// downgrades to uncorrected distances with a recorded reason.
    fn align_and_correct(
        &self,
        source_anomalies: &[AnomalyRecord],
        source_refs: &[ReferencePoint],
        target_refs: &[ReferencePoint],
        source_run_id: &str,
        target_run_id: &str,
    ) -> Result<CorrectionOutcome, IliError> {
        let mut source_points = girth_welds(source_refs);
        let mut target_points = girth_welds(target_refs);
        if source_points.len() < MIN_GIRTH_WELDS || target_points.len() < MIN_GIRTH_WELDS {
            source_points = source_refs.to_vec();
            target_points = target_refs.to_vec();
        }
        source_points.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        target_points.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        if source_points.len() < MIN_ALIGNMENT_POINTS
            || target_points.len() < MIN_ALIGNMENT_POINTS
        {
            let reason = format!(
                "insufficient reference points: {} in {source_run_id}, {} in {target_run_id} (minimum {MIN_ALIGNMENT_POINTS} each)",
                source_points.len(),
                target_points.len()
            );
            warn!(
                source = source_run_id,
                target = target_run_id,
                reason = reason.as_str(),
                "skipping distance correction"
            );
            return Ok(CorrectionOutcome {
                anomalies: source_anomalies.to_vec(),
                applied: false,
                fallback_reason: Some(reason),
                quality: None,
            });
        }

        let alignment = match self.aligner.align(&source_points, &target_points) {
            Ok(alignment) => alignment,
            Err(err @ (IliError::QualityThreshold(_) | IliError::InvalidInput(_))) => {
                let reason = format!("alignment failed: {err}");
                warn!(
                    source = source_run_id,
                    target = target_run_id,
                    reason = reason.as_str(),
                    "falling back to raw odometer distances"
                );
                return Ok(CorrectionOutcome {
                    anomalies: source_anomalies.to_vec(),
                    applied: false,
                    fallback_reason: Some(reason),
                    quality: None,
                });
            }
            Err(err) => return Err(err),
        };

        let correction = DistanceCorrection::from_alignment(&alignment)?;
        let summary = correction.summary();
        let mut corrected = Vec::with_capacity(source_anomalies.len());
        for anomaly in source_anomalies {
            corrected.push(anomaly.with_distance(correction.correct(anomaly.distance))?);
        }
        debug!(
            source = source_run_id,
            target = target_run_id,
            match_rate = alignment.match_rate,
            rmse = alignment.rmse,
            max_correction_ft = summary.max_correction_ft,
            "distance correction applied"
        );

        Ok(CorrectionOutcome {
            anomalies: corrected,
            applied: true,
            fallback_reason: None,
            quality: Some(AlignmentQuality {
                match_rate: alignment.match_rate,
                rmse: alignment.rmse,
                matched_pairs: alignment.matched_pair_count(),
                max_correction_ft: summary.max_correction_ft,
                mean_correction_ft: summary.mean_correction_ft,
            }),
        })
    }

    /// Links the two intervals' matches into chains wherever both agree
    /// on the same middle-run anomaly.
    #[allow(clippy::too_many_arguments)]
    fn build_chains(
        &self,
        early_anomalies: &[AnomalyRecord],
        middle_anomalies: &[AnomalyRecord],
        late_anomalies: &[AnomalyRecord],
        early_matches: &[ili_core::Match],
        late_matches: &[ili_core::Match],
        early_years: f64,
        late_years: f64,
    ) -> Result<Vec<AnomalyChain>, IliError> {
        let early_by_id: HashMap<&str, &AnomalyRecord> =
            early_anomalies.iter().map(|a| (a.id.as_str(), a)).collect();
        let middle_by_id: HashMap<&str, &AnomalyRecord> =
            middle_anomalies.iter().map(|a| (a.id.as_str(), a)).collect();
        let late_by_id: HashMap<&str, &AnomalyRecord> =
            late_anomalies.iter().map(|a| (a.id.as_str(), a)).collect();
        let late_by_middle_id: HashMap<&str, &ili_core::Match> = late_matches
            .iter()
            .map(|m| (m.anomaly1_id.as_str(), m))
            .collect();

        let mut chains = Vec::new();
        for early_match in early_matches {
            let Some(late_match) = late_by_middle_id.get(early_match.anomaly2_id.as_str()) else {
                continue;
            };
            let (Some(first), Some(middle), Some(last)) = (
                early_by_id.get(early_match.anomaly1_id.as_str()),
                middle_by_id.get(early_match.anomaly2_id.as_str()),
                late_by_id.get(late_match.anomaly2_id.as_str()),
            ) else {
                continue;
            };

            let early_rate =
                self.growth_analyzer
                    .growth_rate(first.depth_pct, middle.depth_pct, early_years)?;
            let late_rate =
                self.growth_analyzer
                    .growth_rate(middle.depth_pct, last.depth_pct, late_years)?;
            let acceleration = late_rate - early_rate;

            let depth_risk = (last.depth_pct / 100.0).min(1.0) * 0.5;
            let growth_risk = (late_rate.max(0.0) / 10.0).min(1.0) * 0.3;
            let accel_risk = (acceleration.max(0.0) / 5.0).min(1.0) * 0.2;

            chains.push(AnomalyChain::new(
                format!("CHAIN_{:04}", chains.len()),
                first.id.clone(),
                middle.id.clone(),
                last.id.clone(),
                early_match.similarity_score,
                late_match.similarity_score,
                (first.depth_pct, middle.depth_pct, last.depth_pct),
                early_rate,
                late_rate,
                depth_risk + growth_risk + accel_risk,
                years_to_critical(last.depth_pct, late_rate, acceleration),
            )?);
        }
        Ok(chains)
    }
}

fn girth_welds(refs: &[ReferencePoint]) -> Vec<ReferencePoint> {
    refs.iter()
        .filter(|rp| rp.point_type == ReferencePointType::GirthWeld)
        .cloned()
        .collect()
}

fn years_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / DAYS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::{years_between, years_to_critical};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn years_between_uses_exact_day_counts() {
        let eight = years_between(date(2007, 1, 1), date(2015, 1, 1));
        assert!((eight - 8.0).abs() < 0.01);
        assert!(years_between(date(2015, 1, 1), date(2007, 1, 1)) < 0.0);
    }

    #[test]
    fn projection_is_zero_at_or_above_critical() {
        assert_eq!(years_to_critical(80.0, 2.0, 0.0), Some(0.0));
        assert_eq!(years_to_critical(92.5, -1.0, 0.0), Some(0.0));
    }

    #[test]
    fn projection_is_none_when_not_growing() {
        assert_eq!(years_to_critical(40.0, 0.0, 0.0), None);
        assert_eq!(years_to_critical(40.0, -2.0, 0.0), None);
        // Negative acceleration never raises the effective rate.
        assert_eq!(years_to_critical(40.0, -0.5, -1.0), None);
    }

    #[test]
    fn projection_divides_remaining_depth_by_rate() {
        let years = years_to_critical(60.0, 2.0, 0.0).expect("growing defect");
        assert!((years - 10.0).abs() < 1e-12);
    }

    #[test]
    fn positive_acceleration_shortens_the_projection() {
        // Effective rate 2 + 0.8 * 2.5 = 4 pp/yr over 20 remaining points.
        let years = years_to_critical(60.0, 2.0, 0.8).expect("growing defect");
        assert!((years - 5.0).abs() < 1e-12);
    }
}
