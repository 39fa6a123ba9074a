// SPDX-License-Identifier: MIT OR Apache-2.0

use ili_core::{AnomalyRecord, IliError};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-criterion weights for the overall similarity score.
///
/// Distance dominates because axial position is the most reliable signal
/// across runs; dimensions carry the least weight because sizing accuracy
/// varies between tool vendors.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityWeights {
    pub distance: f64,
    pub clock: f64,
    pub feature_type: f64,
    pub depth: f64,
    pub length: f64,
    pub width: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            distance: 0.35,
            clock: 0.20,
            feature_type: 0.15,
            depth: 0.15,
            length: 0.075,
            width: 0.075,
        }
    }
}

impl SimilarityWeights {
    pub fn sum(&self) -> f64 {
        self.distance + self.clock + self.feature_type + self.depth + self.length + self.width
    }
}

/// Configuration for [`SimilarityCalculator`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityConfig {
    /// Gaussian decay scale for axial distance, feet.
    pub distance_sigma: f64,
    /// Gaussian decay scale for circular clock distance, hours.
    pub clock_sigma: f64,
    /// Absolute decay scale for dimensions; `None` switches to a
    /// scale-invariant relative difference.
    pub dimension_sigma: Option<f64>,
    pub weights: SimilarityWeights,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            distance_sigma: 5.0,
            clock_sigma: 1.0,
            dimension_sigma: None,
            weights: SimilarityWeights::default(),
        }
    }
}

impl SimilarityConfig {
    fn validate(&self) -> Result<(), IliError> {
        for (name, sigma) in [
            ("distance_sigma", self.distance_sigma),
            ("clock_sigma", self.clock_sigma),
        ] {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(IliError::invalid_input(format!(
                    "{name} must be finite and > 0, got {sigma}"
                )));
            }
        }
        if let Some(sigma) = self.dimension_sigma {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(IliError::invalid_input(format!(
                    "dimension_sigma must be finite and > 0, got {sigma}"
                )));
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(IliError::invalid_input(format!(
                "similarity weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Overall similarity plus the six per-criterion components.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityScore {
    pub overall: f64,
    pub distance: f64,
    pub clock: f64,
    pub feature_type: f64,
    pub depth: f64,
    pub length: f64,
    pub width: f64,
}

/// Multi-criteria anomaly similarity with Gaussian decay on continuous
/// features and exact matching on the categorical feature type.
#[derive(Clone, Debug)]
pub struct SimilarityCalculator {
    config: SimilarityConfig,
}

impl SimilarityCalculator {
    pub fn new(config: SimilarityConfig) -> Result<Self, IliError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// exp(-(|d1 - d2| / sigma)^2), 1.0 at identical location.
    pub fn distance_similarity(&self, dist1: f64, dist2: f64) -> f64 {
        let diff = (dist1 - dist2).abs();
        let scaled = diff / self.config.distance_sigma;
        (-(scaled * scaled)).exp()
    }

    /// Gaussian decay on circular clock distance; 12 -> 1 is one hour,
    /// not eleven.
    pub fn clock_similarity(&self, clock1: f64, clock2: f64) -> f64 {
        let direct = (clock1 - clock2).abs();
        let circular = direct.min(12.0 - direct);
        let scaled = circular / self.config.clock_sigma;
        (-(scaled * scaled)).exp()
    }

    /// Gaussian decay on a dimension pair. With no configured sigma the
    /// difference is normalized by the pair's magnitude, so a 0.1 in
    /// disagreement matters on a 0.5 in pit but not on a 10 in patch.
    pub fn dimension_similarity(&self, dim1: f64, dim2: f64) -> f64 {
        let scaled = match self.config.dimension_sigma {
            Some(sigma) => (dim1 - dim2).abs() / sigma,
            None => (dim1 - dim2).abs() / (dim1 + dim2 + 1e-6),
        };
        (-(scaled * scaled)).exp()
    }

    /// Full weighted score between two anomaly records.
    pub fn score(&self, a: &AnomalyRecord, b: &AnomalyRecord) -> SimilarityScore {
        let distance = self.distance_similarity(a.distance, b.distance);
        let clock = self.clock_similarity(a.clock_position, b.clock_position);
        let feature_type = if a.feature_type == b.feature_type {
            1.0
        } else {
            0.0
        };
        let depth = self.dimension_similarity(a.depth_pct, b.depth_pct);
        let length = self.dimension_similarity(a.length, b.length);
        let width = self.dimension_similarity(a.width, b.width);

        let w = &self.config.weights;
        let overall = w.distance * distance
            + w.clock * clock
            + w.feature_type * feature_type
            + w.depth * depth
            + w.length * length
            + w.width * width;

        SimilarityScore {
            overall,
            distance,
            clock,
            feature_type,
            depth,
            length,
            width,
        }
    }
}
