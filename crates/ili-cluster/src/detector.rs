// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeMap;
use std::f64::consts::PI;

use ili_core::{AnomalyRecord, IliError, InteractionZone};

use crate::dbscan::{dbscan, NOISE};

/// Configuration for [`ClusterDetector`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterConfig {
    /// Maximum axial separation for two anomalies to be neighbors, feet.
    pub axial_threshold_ft: f64,
    /// Maximum circumferential separation for neighbors, clock hours.
    pub clock_threshold: f64,
    /// Minimum member count for a cluster.
    pub min_cluster_size: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            axial_threshold_ft: 1.0,
            clock_threshold: 1.5,
            min_cluster_size: 2,
        }
    }
}

impl ClusterConfig {
    fn validate(&self) -> Result<(), IliError> {
        if !self.axial_threshold_ft.is_finite() || self.axial_threshold_ft <= 0.0 {
            return Err(IliError::invalid_input(format!(
                "axial_threshold_ft must be finite and > 0, got {}",
                self.axial_threshold_ft
            )));
        }
        if !self.clock_threshold.is_finite() || self.clock_threshold <= 0.0 {
            return Err(IliError::invalid_input(format!(
                "clock_threshold must be finite and > 0, got {}",
                self.clock_threshold
            )));
        }
        if self.min_cluster_size < 2 {
            return Err(IliError::invalid_input(format!(
                "min_cluster_size must be >= 2, got {}",
                self.min_cluster_size
            )));
        }
        Ok(())
    }
}

/// Detects ASME B31G interaction zones within a single inspection run.
///
/// Embeds each anomaly as (scaled axial distance, scaled clock chord x/y)
/// so a unit-eps DBSCAN honors both proximity thresholds at once. The
/// clock hours map onto a circle, which keeps 12 o'clock adjacent to 1.
#[derive(Clone, Debug)]
pub struct ClusterDetector {
    config: ClusterConfig,
}

impl ClusterDetector {
    pub fn new(config: ClusterConfig) -> Result<Self, IliError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Clusters one run's anomalies into interaction zones.
    ///
    /// Returns the anomalies, zone members stamped with their
    /// `cluster_id`, alongside the detected zones. Fewer anomalies than
    /// `min_cluster_size` is a valid degenerate case: input passes
    /// through unchanged with zero zones.
    pub fn detect(
        &self,
        anomalies: &[AnomalyRecord],
        run_id: &str,
    ) -> Result<(Vec<AnomalyRecord>, Vec<InteractionZone>), IliError> {
        if run_id.is_empty() {
            return Err(IliError::invalid_input("run id must be non-empty"));
        }
        if anomalies.len() < self.config.min_cluster_size {
            return Ok((anomalies.to_vec(), Vec::new()));
        }

        let points = self.embed(anomalies);
        let labels = dbscan(&points, 1.0, self.config.min_cluster_size);

        let mut members_by_label: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (idx, &label) in labels.iter().enumerate() {
            if label != NOISE {
                members_by_label.entry(label).or_default().push(idx);
            }
        }

        let mut zones = Vec::with_capacity(members_by_label.len());
        let mut zone_of = vec![None::<usize>; anomalies.len()];
        for (label, indices) in &members_by_label {
            let members: Vec<&AnomalyRecord> = indices.iter().map(|&i| &anomalies[i]).collect();
            let distances: Vec<f64> = members.iter().map(|m| m.distance).collect();
            let clocks: Vec<f64> = members.iter().map(|m| m.clock_position).collect();

            let min_dist = distances.iter().copied().fold(f64::INFINITY, f64::min);
            let max_dist = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let centroid_distance = distances.iter().sum::<f64>() / distances.len() as f64;
            let centroid_clock = (circular_mean_clock(&clocks) * 100.0).round() / 100.0;
            let max_depth = members
                .iter()
                .map(|m| m.depth_pct)
                .fold(f64::NEG_INFINITY, f64::max);
            let combined_length = members.iter().map(|m| m.length).sum::<f64>();

            let zone = InteractionZone::new(
                format!("ZONE_{run_id}_{label:04}"),
                run_id,
                members.iter().map(|m| m.id.clone()).collect(),
                centroid_distance,
                centroid_clock,
                max_dist - min_dist,
                circular_span_clock(&clocks),
                max_depth,
                combined_length,
            )?;
            for &i in indices {
                zone_of[i] = Some(zones.len());
            }
            zones.push(zone);
        }

        let updated = anomalies
            .iter()
            .enumerate()
            .map(|(i, a)| match zone_of[i] {
                Some(z) => a.with_zone(zones[z].zone_id.clone()),
                None => a.clone(),
            })
            .collect();

        Ok((updated, zones))
    }

    /// (distance / axial_threshold, clock chord x, y / threshold chord).
    fn embed(&self, anomalies: &[AnomalyRecord]) -> Vec<[f64; 3]> {
        let thresh_angle = self.config.clock_threshold / 11.0 * PI;
        let chord_at_thresh = if thresh_angle < PI {
            (2.0 * thresh_angle.sin()).max(1e-9)
        } else {
            2.0
        };

        anomalies
            .iter()
            .map(|a| {
                let angle = clock_to_angle(a.clock_position);
                [
                    a.distance / self.config.axial_threshold_ft,
                    angle.cos() / chord_at_thresh,
                    angle.sin() / chord_at_thresh,
                ]
            })
            .collect()
    }
}

fn clock_to_angle(clock: f64) -> f64 {
    (clock - 1.0) / 11.0 * 2.0 * PI
}

/// Circular mean of clock positions on the 1-12 scale.
fn circular_mean_clock(clocks: &[f64]) -> f64 {
    let n = clocks.len() as f64;
    let (sin_sum, cos_sum) = clocks.iter().fold((0.0, 0.0), |(s, c), &clock| {
        let angle = clock_to_angle(clock);
        (s + angle.sin(), c + angle.cos())
    });
    let mut mean_angle = (sin_sum / n).atan2(cos_sum / n);
    if mean_angle < 0.0 {
        mean_angle += 2.0 * PI;
    }
    mean_angle / (2.0 * PI) * 11.0 + 1.0
}

/// Smallest arc containing all clock positions, in hours.
fn circular_span_clock(clocks: &[f64]) -> f64 {
    if clocks.len() <= 1 {
        return 0.0;
    }
    let mut sorted = clocks.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut max_gap = (12.0 - sorted[sorted.len() - 1]) + (sorted[0] - 1.0) + 1.0;
    for pair in sorted.windows(2) {
        max_gap = max_gap.max(pair[1] - pair[0]);
    }
    (11.0 - max_gap).max(0.0)
}
