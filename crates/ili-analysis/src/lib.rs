// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod three_way;

pub use three_way::{
    years_to_critical, AlignmentQuality, InspectionRun, IntervalReport, ThreeWayAnalyzer,
    ThreeWayConfig, ThreeWayResult, CRITICAL_DEPTH_PCT, HIGH_RISK_THRESHOLD,
};

/// Analysis namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = ili_core::crate_name();
    "ili-analysis"
}
