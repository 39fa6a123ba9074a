// SPDX-License-Identifier: MIT OR Apache-2.0

use ili_core::{AlignmentResult, IliError};

/// Piecewise-linear odometer correction built from matched reference
/// points.
///
/// Maps a distance on the source run's odometer onto the target run's
/// odometer. Between control points the mapping interpolates linearly;
/// beyond the first or last control point it extrapolates along the
/// nearest segment.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceCorrection {
    source: Vec<f64>,
    target: Vec<f64>,
}

/// Aggregate view of a correction function, for reporting.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrectionSummary {
    pub control_points: usize,
    pub source_range: (f64, f64),
    pub target_range: (f64, f64),
    /// Largest |target - source| over the control points, feet.
    pub max_correction_ft: f64,
    pub mean_correction_ft: f64,
    pub std_correction_ft: f64,
}

impl DistanceCorrection {
    /// Builds a correction from parallel source/target distance arrays.
    ///
    /// A warping path may pair one source point with several targets;
    /// duplicate source abscissae are collapsed by averaging their
    /// targets so the interpolant stays a function. At least two
    /// distinct source abscissae must remain.
    pub fn new(source: &[f64], target: &[f64]) -> Result<Self, IliError> {
        if source.len() != target.len() {
            return Err(IliError::invalid_input(format!(
                "source and target lengths differ: {} vs {}",
                source.len(),
                target.len()
            )));
        }
        if source
            .iter()
            .chain(target.iter())
            .any(|d| !d.is_finite())
        {
            return Err(IliError::numerical_issue(
                "correction control points must be finite",
            ));
        }

        let mut pairs: Vec<(f64, f64)> = source
            .iter()
            .copied()
            .zip(target.iter().copied())
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut merged_source = Vec::with_capacity(pairs.len());
        let mut merged_target = Vec::with_capacity(pairs.len());
        let mut idx = 0;
        while idx < pairs.len() {
            let abscissa = pairs[idx].0;
            let mut sum = 0.0;
            let mut count = 0usize;
            while idx < pairs.len() && pairs[idx].0 == abscissa {
                sum += pairs[idx].1;
                count += 1;
                idx += 1;
            }
            merged_source.push(abscissa);
            merged_target.push(sum / count as f64);
        }

        if merged_source.len() < 2 {
            return Err(IliError::invalid_input(format!(
                "need at least 2 distinct control points, got {}",
                merged_source.len()
            )));
        }

        Ok(Self {
            source: merged_source,
            target: merged_target,
        })
    }

    /// Builds a correction from an alignment's matched distances.
    pub fn from_alignment(alignment: &AlignmentResult) -> Result<Self, IliError> {
        Self::new(&alignment.source_distances, &alignment.target_distances)
    }

    /// Maps one source-odometer distance onto the target odometer.
    pub fn correct(&self, distance: f64) -> f64 {
        let n = self.source.len();
        // Segment selection: clamp to the end segments for extrapolation.
        let seg = match self
            .source
            .binary_search_by(|probe| probe.total_cmp(&distance))
        {
            Ok(i) => return self.target[i],
            Err(0) => 0,
            Err(i) if i >= n => n - 2,
            Err(i) => i - 1,
        };

        let (x0, x1) = (self.source[seg], self.source[seg + 1]);
        let (y0, y1) = (self.target[seg], self.target[seg + 1]);
        let slope = (y1 - y0) / (x1 - x0);
        y0 + slope * (distance - x0)
    }

    /// Maps a batch of source distances.
    pub fn correct_all(&self, distances: &[f64]) -> Vec<f64> {
        distances.iter().map(|&d| self.correct(d)).collect()
    }

    /// True when `distance` falls outside the calibrated source range,
    /// so the mapping is an extrapolation rather than an interpolation.
    pub fn is_extrapolating(&self, distance: f64) -> bool {
        distance < self.source[0] || distance > self.source[self.source.len() - 1]
    }

    pub fn control_point_count(&self) -> usize {
        self.source.len()
    }

    pub fn summary(&self) -> CorrectionSummary {
        let corrections: Vec<f64> = self
            .source
            .iter()
            .zip(self.target.iter())
            .map(|(&s, &t)| (t - s).abs())
            .collect();
        let n = corrections.len() as f64;
        let mean = corrections.iter().sum::<f64>() / n;
        let var = corrections.iter().map(|c| (c - mean) * (c - mean)).sum::<f64>() / n;
        let max = corrections.iter().copied().fold(0.0_f64, f64::max);

        CorrectionSummary {
            control_points: self.source.len(),
            source_range: (self.source[0], self.source[self.source.len() - 1]),
            target_range: (self.target[0], self.target[self.target.len() - 1]),
            max_correction_ft: max,
            mean_correction_ft: mean,
            std_correction_ft: var.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DistanceCorrection;
    use ili_core::{AlignmentResult, IliError};

    fn drifted() -> DistanceCorrection {
        DistanceCorrection::new(&[0.0, 500.0, 1000.0], &[0.0, 520.0, 980.0])
            .expect("three distinct control points")
    }

    #[test]
    fn interpolates_between_control_points() {
        let correction = drifted();
        // First segment slope is 520/500 = 1.04.
        assert!((correction.correct(250.0) - 260.0).abs() < 1e-9);
        // Second segment slope is (980-520)/500 = 0.92.
        assert!((correction.correct(750.0) - 750.0).abs() < 1e-9);
    }

    #[test]
    fn control_points_map_exactly() {
        let correction = drifted();
        assert_eq!(correction.correct(0.0), 0.0);
        assert_eq!(correction.correct(500.0), 520.0);
        assert_eq!(correction.correct(1000.0), 980.0);
    }

    #[test]
    fn extrapolates_along_end_segments() {
        let correction = drifted();
        assert!(correction.is_extrapolating(1500.0));
        assert!(correction.is_extrapolating(-10.0));
        assert!(!correction.is_extrapolating(999.0));
        // 1500 ft extends the last segment: 980 + 0.92 * 500 = 1440.
        assert!((correction.correct(1500.0) - 1440.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_source_points_average_their_targets() {
        let correction = DistanceCorrection::new(
            &[0.0, 500.0, 500.0, 1000.0],
            &[0.0, 510.0, 530.0, 980.0],
        )
        .expect("duplicates collapse");
        assert_eq!(correction.control_point_count(), 3);
        assert!((correction.correct(500.0) - 520.0).abs() < 1e-9);
    }

    #[test]
    fn fewer_than_two_distinct_points_is_invalid() {
        let err = DistanceCorrection::new(&[100.0, 100.0], &[98.0, 102.0])
            .expect_err("one distinct abscissa must fail");
        assert!(matches!(err, IliError::InvalidInput(_)));
    }

    #[test]
    fn mismatched_lengths_are_invalid() {
        let err = DistanceCorrection::new(&[0.0, 1.0], &[0.0])
            .expect_err("length mismatch must fail");
        assert!(err.to_string().contains("lengths differ"));
    }

    #[test]
    fn unsorted_input_is_sorted_internally() {
        let correction = DistanceCorrection::new(&[1000.0, 0.0, 500.0], &[980.0, 0.0, 520.0])
            .expect("pairs sort by source");
        assert!((correction.correct(250.0) - 260.0).abs() < 1e-9);
    }

    #[test]
    fn summary_reports_correction_magnitudes() {
        let summary = drifted().summary();
        assert_eq!(summary.control_points, 3);
        assert_eq!(summary.source_range, (0.0, 1000.0));
        assert_eq!(summary.target_range, (0.0, 980.0));
        assert!((summary.max_correction_ft - 20.0).abs() < 1e-9);
        // Corrections 0, 20, 20: mean 13.33.
        assert!((summary.mean_correction_ft - 40.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn builds_from_alignment_result() {
        let alignment = AlignmentResult::new(
            "RUN_2007",
            "RUN_2015",
            vec![
                ("A".into(), "X".into()),
                ("B".into(), "Y".into()),
                ("C".into(), "Z".into()),
            ],
            100.0,
            9.0,
            vec![0.0, 500.0, 1000.0],
            vec![0.0, 510.0, 1005.0],
        )
        .expect("passing alignment");
        let correction =
            DistanceCorrection::from_alignment(&alignment).expect("alignment has 3 pairs");
        assert!((correction.correct(500.0) - 510.0).abs() < 1e-9);
    }
}
