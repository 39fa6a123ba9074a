// SPDX-License-Identifier: MIT OR Apache-2.0

use ili_core::{AlignmentResult, IliError, ReferencePoint};

/// Configuration for [`DtwAligner`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DtwConfig {
    /// Maximum allowed odometer discrepancy between two candidate-matched
    /// points, as a fraction of the average of their distances.
    pub drift_constraint: f64,
}

impl Default for DtwConfig {
    fn default() -> Self {
        Self {
            drift_constraint: 0.10,
        }
    }
}

impl DtwConfig {
    fn validate(&self) -> Result<(), IliError> {
        if !self.drift_constraint.is_finite() || self.drift_constraint <= 0.0 {
            return Err(IliError::invalid_input(format!(
                "drift_constraint must be finite and > 0, got {}",
                self.drift_constraint
            )));
        }
        Ok(())
    }
}

/// Dynamic-time-warping aligner for reference-point sequences.
///
/// Tolerates odometer drift between runs by admitting a pair (i, j) only
/// when |d1 - d2| stays within `drift_constraint` of the average of the two
/// distances. The window is magnitude-relative, so longer pipelines tolerate
/// larger absolute drift while short ones reject implausible far-apart
/// pairs.
#[derive(Clone, Debug)]
pub struct DtwAligner {
    config: DtwConfig,
}

impl DtwAligner {
    pub fn new(config: DtwConfig) -> Result<Self, IliError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DtwConfig {
        &self.config
    }

    /// Aligns two odometer-sorted reference-point sequences.
    ///
    /// Fails with `InvalidInput` on empty or unsorted input, and with
    /// `QualityThreshold` when no admissible warping path exists or the
    /// resulting alignment misses the match-rate / RMSE gates enforced by
    /// [`AlignmentResult::new`].
    pub fn align(
        &self,
        run1_points: &[ReferencePoint],
        run2_points: &[ReferencePoint],
    ) -> Result<AlignmentResult, IliError> {
        if run1_points.is_empty() || run2_points.is_empty() {
            return Err(IliError::invalid_input(
                "cannot align empty reference point sequences",
            ));
        }
        let seq1: Vec<f64> = run1_points.iter().map(|p| p.distance).collect();
        let seq2: Vec<f64> = run2_points.iter().map(|p| p.distance).collect();
        for (run, seq) in [(&run1_points[0].run_id, &seq1), (&run2_points[0].run_id, &seq2)] {
            if seq.windows(2).any(|w| w[0] > w[1]) {
                return Err(IliError::invalid_input(format!(
                    "reference points for {run} must be sorted by distance"
                )));
            }
        }

        let dist = self.pair_costs(&seq1, &seq2);
        let path = self.optimal_path(&dist, seq1.len(), seq2.len())?;

        let mut matched_points = Vec::with_capacity(path.len());
        let mut source_distances = Vec::with_capacity(path.len());
        let mut target_distances = Vec::with_capacity(path.len());
        let mut squared_errors = Vec::with_capacity(path.len());
        for &(i, j) in &path {
            let p1 = &run1_points[i];
            let p2 = &run2_points[j];
            matched_points.push((p1.id.clone(), p2.id.clone()));
            source_distances.push(p1.distance);
            target_distances.push(p2.distance);
            let diff = p1.distance - p2.distance;
            squared_errors.push(diff * diff);
        }

        let match_rate = match_rate(path.len(), seq1.len(), seq2.len());
        let rmse = rmse(&squared_errors);

        AlignmentResult::new(
            run1_points[0].run_id.clone(),
            run2_points[0].run_id.clone(),
            matched_points,
            match_rate,
            rmse,
            source_distances,
            target_distances,
        )
    }

    /// Pairwise |d1 - d2| costs, infinite outside the drift window.
    fn pair_costs(&self, seq1: &[f64], seq2: &[f64]) -> Vec<f64> {
        let (n, m) = (seq1.len(), seq2.len());
        let mut dist = vec![f64::INFINITY; n * m];
        for (i, &d1) in seq1.iter().enumerate() {
            for (j, &d2) in seq2.iter().enumerate() {
                let diff = (d1 - d2).abs();
                let max_allowed = (d1 + d2) / 2.0 * self.config.drift_constraint;
                if diff <= max_allowed {
                    dist[i * m + j] = diff;
                }
            }
        }
        dist
    }

    /// Classic DTW dynamic program plus backtracking.
    ///
    /// Ties during backtracking break in the order diagonal > vertical >
    /// horizontal, preferring a true match over a skip; the order is part
    /// of the contract for reproducibility.
    fn optimal_path(
        &self,
        dist: &[f64],
        n: usize,
        m: usize,
    ) -> Result<Vec<(usize, usize)>, IliError> {
        let width = m + 1;
        let mut cost = vec![f64::INFINITY; (n + 1) * width];
        cost[0] = 0.0;

        for i in 1..=n {
            for j in 1..=m {
                let d = dist[(i - 1) * m + (j - 1)];
                if d.is_finite() {
                    let best = cost[(i - 1) * width + j]
                        .min(cost[i * width + (j - 1)])
                        .min(cost[(i - 1) * width + (j - 1)]);
                    if best.is_finite() {
                        cost[i * width + j] = d + best;
                    }
                }
            }
        }

        if !cost[n * width + m].is_finite() {
            return Err(IliError::quality_threshold(format!(
                "no warping path within drift constraint {:.0}% for {n}x{m} sequences",
                self.config.drift_constraint * 100.0
            )));
        }

        let mut path = Vec::new();
        let (mut i, mut j) = (n, m);
        while i > 0 && j > 0 {
            path.push((i - 1, j - 1));
            let diagonal = cost[(i - 1) * width + (j - 1)];
            let vertical = cost[(i - 1) * width + j];
            let horizontal = cost[i * width + (j - 1)];
            if diagonal <= vertical && diagonal <= horizontal {
                i -= 1;
                j -= 1;
            } else if vertical <= horizontal {
                i -= 1;
            } else {
                j -= 1;
            }
        }
        path.reverse();
        Ok(path)
    }
}

fn match_rate(matched: usize, len1: usize, len2: usize) -> f64 {
    let longest = len1.max(len2);
    if longest == 0 {
        return 0.0;
    }
    (matched as f64 / longest as f64 * 100.0).min(100.0)
}

fn rmse(squared_errors: &[f64]) -> f64 {
    if squared_errors.is_empty() {
        return 0.0;
    }
    let mean = squared_errors.iter().sum::<f64>() / squared_errors.len() as f64;
    mean.sqrt()
}

#[cfg(test)]
mod tests {
    use super::{DtwAligner, DtwConfig};
    use ili_core::{IliError, ReferencePoint, ReferencePointType};

    fn points(run_id: &str, distances: &[f64]) -> Vec<ReferencePoint> {
        distances
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                ReferencePoint::new(
                    format!("{run_id}_GW_{i:03}"),
                    run_id,
                    d,
                    ReferencePointType::GirthWeld,
                )
                .expect("valid reference point")
            })
            .collect()
    }

    fn aligner() -> DtwAligner {
        DtwAligner::new(DtwConfig::default()).expect("default config is valid")
    }

    #[test]
    fn identical_sequences_align_perfectly() {
        let distances = [0.0, 250.0, 500.0, 750.0, 1000.0];
        let result = aligner()
            .align(&points("RUN_A", &distances), &points("RUN_B", &distances))
            .expect("identical sequences must align");
        assert_eq!(result.match_rate, 100.0);
        assert_eq!(result.rmse, 0.0);
        assert_eq!(result.matched_pair_count(), distances.len());
    }

    #[test]
    fn drifted_three_point_scenario_pairs_every_point() {
        // 20 ft of drift at 500 ft sits inside the 10% window, so the
        // warping path pairs all three points diagonally.
        let a = aligner();
        let seq1 = [0.0, 500.0, 1000.0];
        let seq2 = [0.0, 520.0, 980.0];
        let dist = a.pair_costs(&seq1, &seq2);
        let path = a
            .optimal_path(&dist, 3, 3)
            .expect("admissible path exists");
        assert_eq!(path, vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(super::match_rate(path.len(), 3, 3), 100.0);
        // Per-pair diffs 0, 20, 20: sqrt(800/3) = 16.33 ft, which then
        // trips the 10 ft gate at result construction.
        let squared = [0.0, 400.0, 400.0];
        assert!((super::rmse(&squared) - (800.0_f64 / 3.0).sqrt()).abs() < 1e-9);
        let err = a
            .align(
                &points("RUN_2007", &seq1),
                &points("RUN_2015", &seq2),
            )
            .expect_err("16 ft RMSE exceeds the gate");
        assert!(err.is_quality_threshold());
    }

    #[test]
    fn mild_drift_passes_both_quality_gates() {
        let result = aligner()
            .align(
                &points("RUN_2007", &[0.0, 500.0, 1000.0]),
                &points("RUN_2015", &[0.0, 508.0, 1009.0]),
            )
            .expect("sub-10 ft drift aligns cleanly");
        assert_eq!(result.matched_pair_count(), 3);
        assert_eq!(result.match_rate, 100.0);
        assert!(result.rmse < 10.0);
        assert_eq!(result.source_distances, vec![0.0, 500.0, 1000.0]);
        assert_eq!(result.target_distances, vec![0.0, 508.0, 1009.0]);
    }

    #[test]
    fn empty_input_is_invalid() {
        let err = aligner()
            .align(&[], &points("RUN_B", &[0.0, 10.0]))
            .expect_err("empty run1 must fail");
        assert!(matches!(err, IliError::InvalidInput(_)));
    }

    #[test]
    fn unsorted_input_is_invalid() {
        let err = aligner()
            .align(
                &points("RUN_A", &[100.0, 50.0]),
                &points("RUN_B", &[50.0, 100.0]),
            )
            .expect_err("unsorted sequence must fail");
        assert!(err.to_string().contains("sorted"));
    }

    #[test]
    fn incompatible_sequences_fail_the_quality_gate() {
        // 5000 ft apart with a 10% window: no admissible pair anywhere.
        let err = aligner()
            .align(
                &points("RUN_A", &[100.0, 200.0]),
                &points("RUN_B", &[5000.0, 6000.0]),
            )
            .expect_err("no admissible path must fail");
        assert!(err.is_quality_threshold());
    }

    #[test]
    fn large_residual_drift_fails_the_rmse_gate() {
        // Diffs 0, 40, 40 stay inside the 10% window but leave an RMSE of
        // ~32.7 ft, well past the 10 ft ceiling.
        let err = aligner()
            .align(
                &points("RUN_A", &[0.0, 500.0, 1000.0]),
                &points("RUN_B", &[0.0, 540.0, 1040.0]),
            )
            .expect_err("32 ft RMSE must fail");
        assert!(err.is_quality_threshold());
    }

    #[test]
    fn rejects_non_positive_drift_constraint() {
        let err = DtwAligner::new(DtwConfig {
            drift_constraint: 0.0,
        })
        .expect_err("zero drift must fail");
        assert!(err.to_string().contains("drift_constraint"));
    }

    #[test]
    fn zero_distance_points_still_pair() {
        // At d1 = d2 = 0 the window is zero-width but the diff is zero too.
        let result = aligner()
            .align(
                &points("RUN_A", &[0.0, 100.0]),
                &points("RUN_B", &[0.0, 101.0]),
            )
            .expect("origin points pair exactly");
        assert_eq!(result.matched_pair_count(), 2);
    }
}
