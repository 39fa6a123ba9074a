// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::IliError;

/// Confidence tier derived from the overall similarity score.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchConfidence {
    High,
    Medium,
    Low,
}

impl MatchConfidence {
    /// Pure derivation from the similarity score: HIGH >= 0.8, MEDIUM >= 0.6.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::High
        } else if score >= 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One-to-one anomaly pairing produced by the optimal matcher.
///
/// Carries the overall similarity and all six sub-scores so downstream
/// consumers can explain why a pair was accepted.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub id: String,
    pub anomaly1_id: String,
    pub anomaly2_id: String,
    pub similarity_score: f64,
    pub confidence: MatchConfidence,
    pub distance_similarity: f64,
    pub clock_similarity: f64,
    pub type_similarity: f64,
    pub depth_similarity: f64,
    pub length_similarity: f64,
    pub width_similarity: f64,
}

impl Match {
    /// Constructs a validated match; confidence derives from the score.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        anomaly1_id: impl Into<String>,
        anomaly2_id: impl Into<String>,
        similarity_score: f64,
        distance_similarity: f64,
        clock_similarity: f64,
        type_similarity: f64,
        depth_similarity: f64,
        length_similarity: f64,
        width_similarity: f64,
    ) -> Result<Self, IliError> {
        let anomaly1_id = anomaly1_id.into();
        let anomaly2_id = anomaly2_id.into();
        if anomaly1_id.is_empty() || anomaly2_id.is_empty() {
            return Err(IliError::invalid_input("match anomaly ids must be non-empty"));
        }
        for (name, value) in [
            ("similarity_score", similarity_score),
            ("distance_similarity", distance_similarity),
            ("clock_similarity", clock_similarity),
            ("type_similarity", type_similarity),
            ("depth_similarity", depth_similarity),
            ("length_similarity", length_similarity),
            ("width_similarity", width_similarity),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(IliError::invalid_input(format!(
                    "{name} must be within 0-1, got {value}"
                )));
            }
        }

        let id = format!("{anomaly1_id}_{anomaly2_id}");
        Ok(Self {
            id,
            anomaly1_id,
            anomaly2_id,
            similarity_score,
            confidence: MatchConfidence::from_score(similarity_score),
            distance_similarity,
            clock_similarity,
            type_similarity,
            depth_similarity,
            length_similarity,
            width_similarity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Match, MatchConfidence};

    #[test]
    fn confidence_tiers_follow_thresholds() {
        assert_eq!(MatchConfidence::from_score(0.95), MatchConfidence::High);
        assert_eq!(MatchConfidence::from_score(0.8), MatchConfidence::High);
        assert_eq!(MatchConfidence::from_score(0.79), MatchConfidence::Medium);
        assert_eq!(MatchConfidence::from_score(0.6), MatchConfidence::Medium);
        assert_eq!(MatchConfidence::from_score(0.59), MatchConfidence::Low);
        assert_eq!(MatchConfidence::from_score(0.0), MatchConfidence::Low);
    }

    #[test]
    fn match_id_and_confidence_are_derived() {
        let matched = Match::new("A_1", "B_7", 0.85, 0.9, 1.0, 1.0, 0.8, 0.7, 0.6)
            .expect("valid match");
        assert_eq!(matched.id, "A_1_B_7");
        assert_eq!(matched.confidence, MatchConfidence::High);
    }

    #[test]
    fn rejects_out_of_range_scores() {
        let err = Match::new("A", "B", 1.2, 0.9, 1.0, 1.0, 0.8, 0.7, 0.6)
            .expect_err("score above 1 must fail");
        assert!(err.to_string().contains("similarity_score"));

        let err = Match::new("A", "B", 0.9, 0.9, -0.1, 1.0, 0.8, 0.7, 0.6)
            .expect_err("negative sub-score must fail");
        assert!(err.to_string().contains("clock_similarity"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn match_serde_roundtrip() {
        let matched = Match::new("A_1", "B_7", 0.72, 0.9, 1.0, 0.0, 0.8, 0.7, 0.6)
            .expect("valid match");
        let encoded = serde_json::to_string(&matched).expect("serialize");
        assert!(encoded.contains("\"MEDIUM\""));
        let decoded: Match = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, matched);
    }
}
