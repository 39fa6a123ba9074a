// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod dbscan;
pub mod detector;

pub use detector::{ClusterConfig, ClusterDetector};

/// Clustering namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = ili_core::crate_name();
    "ili-cluster"
}
