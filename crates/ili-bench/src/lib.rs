// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seeded synthetic inspection data shared by the benchmarks.

#![forbid(unsafe_code)]

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ili_core::{AnomalyRecord, FeatureType, ReferencePoint, ReferencePointType};

/// Girth welds roughly every 100 ft, sorted by odometer distance.
pub fn weld_sequence(run_id: &str, count: usize, seed: u64) -> Vec<ReferencePoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut distance = 0.0;
    (0..count)
        .map(|i| {
            distance += rng.gen_range(80.0..120.0);
            ReferencePoint::new(
                format!("{run_id}_GW_{i:05}"),
                run_id,
                distance,
                ReferencePointType::GirthWeld,
            )
            .expect("benchmark weld should be valid")
        })
        .collect()
}

/// The same welds re-surveyed with a constant odometer offset and
/// per-weld jitter, kept well inside the alignment quality gates.
pub fn drifted_welds(
    welds: &[ReferencePoint],
    run_id: &str,
    offset_ft: f64,
    seed: u64,
) -> Vec<ReferencePoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    welds
        .iter()
        .enumerate()
        .map(|(i, weld)| {
            let jitter = rng.gen_range(-1.5..1.5);
            ReferencePoint::new(
                format!("{run_id}_GW_{i:05}"),
                run_id,
                weld.distance + offset_ft + jitter,
                ReferencePointType::GirthWeld,
            )
            .expect("benchmark weld should be valid")
        })
        .collect()
}

/// A run of external-corrosion anomalies spread over `length_ft` of pipe.
pub fn anomaly_run(run_id: &str, count: usize, length_ft: f64, seed: u64) -> Vec<AnomalyRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let date = NaiveDate::from_ymd_opt(2015, 6, 1).expect("valid date");
    (0..count)
        .map(|i| {
            AnomalyRecord::new(
                format!("{run_id}_A_{i:05}"),
                run_id,
                rng.gen_range(0.0..length_ft),
                rng.gen_range(1.0..=12.0),
                rng.gen_range(5.0..70.0),
                rng.gen_range(0.5..6.0),
                rng.gen_range(0.5..4.0),
                FeatureType::ExternalCorrosion,
                date,
            )
            .expect("benchmark anomaly should be valid")
        })
        .collect()
}

/// A second survey of `run`: every anomaly re-observed with small
/// position noise and grown depth, so most pairs match.
pub fn resurveyed_run(run: &[AnomalyRecord], run_id: &str, seed: u64) -> Vec<AnomalyRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let date = NaiveDate::from_ymd_opt(2022, 6, 1).expect("valid date");
    run.iter()
        .enumerate()
        .map(|(i, a)| {
            AnomalyRecord::new(
                format!("{run_id}_A_{i:05}"),
                run_id,
                a.distance + rng.gen_range(-0.5..0.5),
                a.clock_position,
                (a.depth_pct + rng.gen_range(0.0..10.0)).min(95.0),
                a.length,
                a.width,
                a.feature_type,
                date,
            )
            .expect("benchmark anomaly should be valid")
        })
        .collect()
}
