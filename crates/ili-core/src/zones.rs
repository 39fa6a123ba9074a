// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::IliError;

/// Cluster of spatially proximate anomalies treated as one defect per
/// ASME B31G interaction rules.
///
/// Owned by a single run. Member anomalies hold a weak `cluster_id`
/// back-reference to the zone; the zone only lists member ids.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionZone {
    pub zone_id: String,
    pub run_id: String,
    pub anomaly_ids: Vec<String>,
    pub anomaly_count: usize,
    /// Arithmetic mean of member odometer distances, feet.
    pub centroid_distance: f64,
    /// Circular mean of member clock positions, 1-12 hours.
    pub centroid_clock: f64,
    /// Axial extent of the zone, feet.
    pub span_distance_ft: f64,
    /// Smallest arc containing all members, clock hours.
    pub span_clock: f64,
    pub max_depth_pct: f64,
    pub combined_length_in: f64,
}

impl InteractionZone {
    /// Constructs a validated interaction zone.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        zone_id: impl Into<String>,
        run_id: impl Into<String>,
        anomaly_ids: Vec<String>,
        centroid_distance: f64,
        centroid_clock: f64,
        span_distance_ft: f64,
        span_clock: f64,
        max_depth_pct: f64,
        combined_length_in: f64,
    ) -> Result<Self, IliError> {
        let zone_id = zone_id.into();
        let run_id = run_id.into();
        if zone_id.is_empty() || run_id.is_empty() {
            return Err(IliError::invalid_input("zone and run ids must be non-empty"));
        }
        if anomaly_ids.len() < 2 {
            return Err(IliError::invalid_input(format!(
                "a zone needs at least 2 member anomalies, got {}",
                anomaly_ids.len()
            )));
        }
        for (name, value) in [
            ("centroid distance", centroid_distance),
            ("centroid clock", centroid_clock),
            ("axial span", span_distance_ft),
            ("clock span", span_clock),
            ("max depth", max_depth_pct),
            ("combined length", combined_length_in),
        ] {
            if !value.is_finite() {
                return Err(IliError::numerical_issue(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if span_distance_ft < 0.0 || span_clock < 0.0 {
            return Err(IliError::invalid_input(
                "zone spans must be non-negative",
            ));
        }

        let anomaly_count = anomaly_ids.len();
        Ok(Self {
            zone_id,
            run_id,
            anomaly_ids,
            anomaly_count,
            centroid_distance,
            centroid_clock,
            span_distance_ft,
            span_clock,
            max_depth_pct,
            combined_length_in,
        })
    }
}
