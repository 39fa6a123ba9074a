// SPDX-License-Identifier: MIT OR Apache-2.0

use ili_core::{AnomalyRecord, IliError, Match, MatchConfidence};
use rayon::prelude::*;

use crate::hungarian::minimum_cost_assignment;
use crate::similarity::{SimilarityCalculator, SimilarityScore};

/// Configuration for [`AnomalyMatcher`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatcherConfig {
    /// Minimum overall similarity for an assignment to survive as a match.
    pub confidence_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
        }
    }
}

impl MatcherConfig {
    fn validate(&self) -> Result<(), IliError> {
        if !self.confidence_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.confidence_threshold)
        {
            return Err(IliError::invalid_input(format!(
                "confidence_threshold must be within 0-1, got {}",
                self.confidence_threshold
            )));
        }
        Ok(())
    }
}

/// Aggregate counters for one matching pass.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MatchStatistics {
    pub total_run1: usize,
    pub total_run2: usize,
    pub matched: usize,
    pub unmatched_run1: usize,
    pub unmatched_run2: usize,
    /// Matched fraction of the smaller run, 0-1.
    pub match_rate: f64,
    pub high_confidence: usize,
    pub medium_confidence: usize,
    pub low_confidence: usize,
}

/// Matches plus the unmatched remainder of both runs.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutcome {
    pub matches: Vec<Match>,
    /// Run-2 anomalies with no run-1 counterpart.
    pub new_anomalies: Vec<AnomalyRecord>,
    /// Run-1 anomalies with no run-2 counterpart.
    pub repaired_or_removed: Vec<AnomalyRecord>,
    pub statistics: MatchStatistics,
}

/// Optimal one-to-one anomaly matcher.
///
/// Scores every cross-run pair, solves the assignment that maximizes total
/// similarity (minimizes `1 - similarity`), then drops assignments below
/// the confidence threshold. Leftovers on the newer run are new anomalies;
/// leftovers on the older run were repaired or removed.
#[derive(Clone, Debug)]
pub struct AnomalyMatcher {
    calculator: SimilarityCalculator,
    config: MatcherConfig,
}

impl AnomalyMatcher {
    pub fn new(calculator: SimilarityCalculator, config: MatcherConfig) -> Result<Self, IliError> {
        config.validate()?;
        Ok(Self { calculator, config })
    }

    /// Matches anomalies of an older run against a newer run.
    ///
    /// Empty input on either side is a valid degenerate case and returns
    /// an outcome with zero matches rather than an error.
    pub fn match_runs(
        &self,
        run1: &[AnomalyRecord],
        run2: &[AnomalyRecord],
    ) -> Result<MatchOutcome, IliError> {
        let (n1, n2) = (run1.len(), run2.len());
        if n1 == 0 || n2 == 0 {
            return Ok(MatchOutcome {
                matches: Vec::new(),
                new_anomalies: run2.to_vec(),
                repaired_or_removed: run1.to_vec(),
                statistics: MatchStatistics {
                    total_run1: n1,
                    total_run2: n2,
                    unmatched_run1: n1,
                    unmatched_run2: n2,
                    ..MatchStatistics::default()
                },
            });
        }

        // Score rows in parallel; the similarity kernel dominates runtime
        // on dense runs.
        let scores: Vec<Vec<SimilarityScore>> = run1
            .par_iter()
            .map(|a| run2.iter().map(|b| self.calculator.score(a, b)).collect())
            .collect();

        let mut costs = vec![0.0; n1 * n2];
        for (i, row) in scores.iter().enumerate() {
            for (j, score) in row.iter().enumerate() {
                costs[i * n2 + j] = 1.0 - score.overall;
            }
        }

        let assignments = minimum_cost_assignment(&costs, n1, n2)?;

        let mut matches = Vec::new();
        let mut matched1 = vec![false; n1];
        let mut matched2 = vec![false; n2];
        let mut high = 0usize;
        let mut medium = 0usize;
        let mut low = 0usize;

        for (i, j) in assignments {
            let score = &scores[i][j];
            if score.overall < self.config.confidence_threshold {
                continue;
            }
            let matched = Match::new(
                run1[i].id.clone(),
                run2[j].id.clone(),
                score.overall.min(1.0),
                score.distance,
                score.clock,
                score.feature_type,
                score.depth,
                score.length,
                score.width,
            )?;
            match matched.confidence {
                MatchConfidence::High => high += 1,
                MatchConfidence::Medium => medium += 1,
                MatchConfidence::Low => low += 1,
            }
            matches.push(matched);
            matched1[i] = true;
            matched2[j] = true;
        }

        let repaired_or_removed: Vec<AnomalyRecord> = run1
            .iter()
            .zip(matched1.iter())
            .filter(|(_, &hit)| !hit)
            .map(|(a, _)| a.clone())
            .collect();
        let new_anomalies: Vec<AnomalyRecord> = run2
            .iter()
            .zip(matched2.iter())
            .filter(|(_, &hit)| !hit)
            .map(|(a, _)| a.clone())
            .collect();

        let smaller = n1.min(n2);
        let statistics = MatchStatistics {
            total_run1: n1,
            total_run2: n2,
            matched: matches.len(),
            unmatched_run1: repaired_or_removed.len(),
            unmatched_run2: new_anomalies.len(),
            match_rate: matches.len() as f64 / smaller as f64,
            high_confidence: high,
            medium_confidence: medium,
            low_confidence: low,
        };

        Ok(MatchOutcome {
            matches,
            new_anomalies,
            repaired_or_removed,
            statistics,
        })
    }
}
