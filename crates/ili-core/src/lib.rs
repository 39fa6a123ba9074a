// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod alignment;
pub mod chain;
pub mod error;
pub mod growth;
pub mod matching;
pub mod records;
pub mod zones;

pub use alignment::{AlignmentResult, MAX_RMSE_FT, MIN_MATCH_RATE_PCT};
pub use chain::AnomalyChain;
pub use error::IliError;
pub use growth::GrowthMetrics;
pub use matching::{Match, MatchConfidence};
pub use records::{AnomalyRecord, FeatureType, ReferencePoint, ReferencePointType};
pub use zones::InteractionZone;

/// Core shared types for the ILI alignment engine.
pub fn crate_name() -> &'static str {
    "ili-core"
}
