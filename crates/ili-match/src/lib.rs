// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod hungarian;
pub mod matcher;
pub mod similarity;

pub use hungarian::minimum_cost_assignment;
pub use matcher::{AnomalyMatcher, MatchOutcome, MatchStatistics, MatcherConfig};
pub use similarity::{SimilarityCalculator, SimilarityConfig, SimilarityScore, SimilarityWeights};

/// Matching namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = ili_core::crate_name();
    "ili-match"
}
