// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::IliError;
use chrono::NaiveDate;
use std::fmt;

/// Anomaly feature classification reported by the inspection tool.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureType {
    ExternalCorrosion,
    InternalCorrosion,
    Dent,
    Crack,
    Other,
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ExternalCorrosion => "external_corrosion",
            Self::InternalCorrosion => "internal_corrosion",
            Self::Dent => "dent",
            Self::Crack => "crack",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Physical reference feature used for run-to-run alignment.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferencePointType {
    GirthWeld,
    Valve,
    Tee,
    Other,
}

/// Single anomaly from one inspection run.
///
/// Immutable once constructed; distance correction and zone stamping return
/// updated copies so pre/post states stay comparable.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AnomalyRecord {
    pub id: String,
    pub run_id: String,
    /// Odometer reading in feet.
    pub distance: f64,
    /// Circumferential position, 1-12 clock hours (circular).
    pub clock_position: f64,
    /// Depth as percentage of wall thickness.
    pub depth_pct: f64,
    /// Axial length in inches.
    pub length: f64,
    /// Circumferential width in inches.
    pub width: f64,
    pub feature_type: FeatureType,
    pub inspection_date: NaiveDate,
    /// Weak back-reference to an interaction zone, set after clustering.
    pub cluster_id: Option<String>,
}

impl AnomalyRecord {
    /// Constructs a validated anomaly record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        run_id: impl Into<String>,
        distance: f64,
        clock_position: f64,
        depth_pct: f64,
        length: f64,
        width: f64,
        feature_type: FeatureType,
        inspection_date: NaiveDate,
    ) -> Result<Self, IliError> {
        let id = id.into();
        let run_id = run_id.into();
        if id.is_empty() {
            return Err(IliError::invalid_input("anomaly id must be non-empty"));
        }
        if run_id.is_empty() {
            return Err(IliError::invalid_input("run id must be non-empty"));
        }
        if !distance.is_finite() || distance < 0.0 {
            return Err(IliError::invalid_input(format!(
                "distance must be finite and >= 0 ft, got {distance}"
            )));
        }
        if !clock_position.is_finite() || !(1.0..=12.0).contains(&clock_position) {
            return Err(IliError::invalid_input(format!(
                "clock position must be within 1-12, got {clock_position}"
            )));
        }
        if !depth_pct.is_finite() || !(0.0..=100.0).contains(&depth_pct) {
            return Err(IliError::invalid_input(format!(
                "depth must be within 0-100%, got {depth_pct}"
            )));
        }
        if !length.is_finite() || length <= 0.0 {
            return Err(IliError::invalid_input(format!(
                "length must be finite and > 0 in, got {length}"
            )));
        }
        if !width.is_finite() || width <= 0.0 {
            return Err(IliError::invalid_input(format!(
                "width must be finite and > 0 in, got {width}"
            )));
        }

        Ok(Self {
            id,
            run_id,
            distance,
            clock_position,
            depth_pct,
            length,
            width,
            feature_type,
            inspection_date,
            cluster_id: None,
        })
    }

    /// Returns a copy with a drift-corrected distance.
    ///
    /// Extrapolated corrections near the pipeline start can map a small
    /// odometer reading slightly negative, so only finiteness is enforced.
    pub fn with_distance(&self, distance: f64) -> Result<Self, IliError> {
        if !distance.is_finite() {
            return Err(IliError::numerical_issue(format!(
                "corrected distance must be finite, got {distance} for anomaly {}",
                self.id
            )));
        }
        let mut updated = self.clone();
        updated.distance = distance;
        Ok(updated)
    }

    /// Returns a copy stamped with the id of its interaction zone.
    pub fn with_zone(&self, zone_id: impl Into<String>) -> Self {
        let mut updated = self.clone();
        updated.cluster_id = Some(zone_id.into());
        updated
    }

    /// Returns true when the record belongs to an interaction zone.
    pub fn is_clustered(&self) -> bool {
        self.cluster_id.is_some()
    }
}

/// Reference point for alignment; never matched directly to anomalies.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ReferencePoint {
    pub id: String,
    pub run_id: String,
    /// Odometer reading in feet.
    pub distance: f64,
    pub point_type: ReferencePointType,
}

impl ReferencePoint {
    /// Constructs a validated reference point.
    pub fn new(
        id: impl Into<String>,
        run_id: impl Into<String>,
        distance: f64,
        point_type: ReferencePointType,
    ) -> Result<Self, IliError> {
        let id = id.into();
        let run_id = run_id.into();
        if id.is_empty() {
            return Err(IliError::invalid_input("reference point id must be non-empty"));
        }
        if run_id.is_empty() {
            return Err(IliError::invalid_input("run id must be non-empty"));
        }
        if !distance.is_finite() || distance < 0.0 {
            return Err(IliError::invalid_input(format!(
                "reference point distance must be finite and >= 0 ft, got {distance}"
            )));
        }
        Ok(Self {
            id,
            run_id,
            distance,
            point_type,
        })
    }
}
