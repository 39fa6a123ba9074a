// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod analyzer;
pub mod risk;

pub use analyzer::{
    DimensionStats, GrowthAnalyzer, GrowthConfig, GrowthReport, GrowthStatistics,
    RapidGrowthAlert,
};
pub use risk::{RiskBreakdown, RiskScorer, RiskWeights};

/// Growth namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = ili_core::crate_name();
    "ili-growth"
}
