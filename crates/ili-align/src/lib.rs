// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod correction;
pub mod dtw;

pub use correction::{CorrectionSummary, DistanceCorrection};
pub use dtw::{DtwAligner, DtwConfig};

/// Alignment namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = ili_core::crate_name();
    "ili-align"
}
