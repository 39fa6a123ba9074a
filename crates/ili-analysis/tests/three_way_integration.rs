// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use chrono::NaiveDate;
use ili_analysis::{InspectionRun, ThreeWayAnalyzer, ThreeWayConfig};
use ili_core::{AnomalyRecord, FeatureType, ReferencePoint, ReferencePointType};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn welds(run_id: &str, distances: &[f64]) -> Vec<ReferencePoint> {
    distances
        .iter()
        .enumerate()
        .map(|(i, &dist)| {
            ReferencePoint::new(
                format!("{run_id}_GW_{i:03}"),
                run_id,
                dist,
                ReferencePointType::GirthWeld,
            )
            .expect("valid reference point")
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn anomaly(
    id: &str,
    run_id: &str,
    distance: f64,
    clock: f64,
    depth: f64,
    date_: NaiveDate,
) -> AnomalyRecord {
    AnomalyRecord::new(
        id,
        run_id,
        distance,
        clock,
        depth,
        2.0,
        1.0,
        FeatureType::ExternalCorrosion,
        date_,
    )
    .expect("valid anomaly")
}

/// Three runs of the same pipeline with ~1% cumulative odometer drift per
/// run and one defect growing faster in the second interval.
fn drifted_dataset() -> (InspectionRun, InspectionRun, InspectionRun) {
    let d07 = date(2007, 1, 1);
    let d15 = date(2015, 1, 1);
    let d22 = date(2022, 1, 1);

    let early = InspectionRun::new(
        "RUN_2007",
        d07,
        vec![anomaly("E1", "RUN_2007", 250.0, 6.0, 20.0, d07)],
        welds("RUN_2007", &[0.0, 500.0, 1000.0, 1500.0]),
    )
    .expect("valid run");

    let middle = InspectionRun::new(
        "RUN_2015",
        d15,
        vec![anomaly("M1", "RUN_2015", 252.5, 6.0, 32.0, d15)],
        welds("RUN_2015", &[0.0, 505.0, 1010.0, 1515.0]),
    )
    .expect("valid run");

    let late = InspectionRun::new(
        "RUN_2022",
        d22,
        vec![
            anomaly("L1", "RUN_2022", 255.0, 6.0, 46.0, d22),
            anomaly("L2", "RUN_2022", 800.0, 3.0, 25.0, d22),
            anomaly("L3", "RUN_2022", 800.5, 3.0, 30.0, d22),
        ],
        welds("RUN_2022", &[0.0, 510.0, 1020.0, 1530.0]),
    )
    .expect("valid run");

    (early, middle, late)
}

#[test]
fn full_pipeline_builds_an_accelerating_chain() {
    let (early, middle, late) = drifted_dataset();
    let analyzer = ThreeWayAnalyzer::new(ThreeWayConfig::default()).expect("default config");
    let result = analyzer
        .analyze(&early, &middle, &late)
        .expect("analysis succeeds");

    // Both intervals pass the quality gates and run drift-corrected.
    for interval in [&result.early_interval, &result.late_interval] {
        assert!(interval.correction_applied, "correction must apply");
        assert!(interval.fallback_reason.is_none());
        let quality = interval.alignment.expect("alignment diagnostics present");
        assert_eq!(quality.match_rate, 100.0);
        assert!(quality.rmse < 10.0);
        assert_eq!(quality.matched_pairs, 4);
        assert_eq!(interval.statistics.matched, 1);
    }
    assert!((result.early_interval.time_interval_years - 8.0).abs() < 0.01);
    assert!((result.late_interval.time_interval_years - 7.0).abs() < 0.01);

    // The lone late-run pair 0.5 ft apart forms the only interaction zone.
    assert_eq!(result.zones.len(), 1);
    assert_eq!(result.zones[0].zone_id, "ZONE_RUN_2022_0000");
    assert_eq!(result.zones[0].anomaly_count, 2);

    // One complete chain: E1 -> M1 -> L1.
    assert_eq!(result.chains.len(), 1);
    let chain = &result.chains[0];
    assert_eq!(chain.chain_id, "CHAIN_0000");
    assert_eq!(chain.first_anomaly_id, "E1");
    assert_eq!(chain.middle_anomaly_id, "M1");
    assert_eq!(chain.last_anomaly_id, "L1");

    // 20 -> 32 over ~8 yr, 32 -> 46 over ~7 yr: accelerating growth.
    assert!((chain.early_growth_rate - 1.5).abs() < 1e-2);
    assert!((chain.late_growth_rate - 2.0).abs() < 1e-2);
    assert!((chain.acceleration - 0.5).abs() < 1e-2);
    assert!(chain.is_accelerating);
    assert_eq!(result.accelerating_count, 1);
    assert_eq!(result.decelerating_count, 0);
    assert_eq!(result.stable_count, 0);

    // Risk 0.5 * 0.46 + 0.3 * 0.2 + 0.2 * 0.1 = 0.31, below high-risk.
    assert!((chain.risk_score - 0.31).abs() < 1e-2);
    assert_eq!(result.high_risk_count, 0);
    assert_eq!(result.immediate_action_count, 0);

    // Effective rate 2.0 + 0.5 * 2.5 = 3.25 pp/yr over 34 remaining points.
    let years = chain.years_to_80pct.expect("growing defect projects");
    assert!((years - 34.0 / 3.25).abs() < 0.1);

    // Interval growth reports cover the same matches.
    assert_eq!(result.early_interval.growth.statistics.total_matches, 1);
    assert_eq!(result.late_interval.growth.statistics.total_matches, 1);
    assert!(
        (result.early_interval.growth.statistics.depth_growth.mean - 1.5).abs() < 1e-2
    );
}

#[test]
fn too_few_reference_points_fall_back_to_raw_distances() {
    let (early, mut middle, late) = drifted_dataset();
    middle.reference_points.truncate(1);

    let analyzer = ThreeWayAnalyzer::new(ThreeWayConfig::default()).expect("default config");
    let result = analyzer
        .analyze(&early, &middle, &late)
        .expect("fallback must not abort the pipeline");

    // Both intervals touch the middle run's reference points.
    for interval in [&result.early_interval, &result.late_interval] {
        assert!(!interval.correction_applied);
        let reason = interval
            .fallback_reason
            .as_deref()
            .expect("fallback reason recorded");
        assert!(reason.contains("insufficient reference points"), "{reason}");
        assert!(interval.alignment.is_none());
    }

    // Raw distances are close enough here that matching still works.
    assert_eq!(result.early_interval.statistics.matched, 1);
    assert_eq!(result.chains.len(), 1);
}

#[test]
fn failed_quality_gate_falls_back_with_reason() {
    let (early, mut middle, late) = drifted_dataset();
    // 40 ft of consistent drift stays inside the 10% window but leaves an
    // RMSE far beyond the 10 ft gate.
    middle.reference_points = welds("RUN_2015", &[0.0, 540.0, 1040.0, 1540.0]);

    let analyzer = ThreeWayAnalyzer::new(ThreeWayConfig::default()).expect("default config");
    let result = analyzer
        .analyze(&early, &middle, &late)
        .expect("fallback must not abort the pipeline");

    assert!(!result.early_interval.correction_applied);
    let reason = result
        .early_interval
        .fallback_reason
        .as_deref()
        .expect("fallback reason recorded");
    assert!(reason.contains("alignment failed"), "{reason}");
}

#[test]
fn non_increasing_dates_are_a_hard_error() {
    let (early, mut middle, late) = drifted_dataset();
    middle.inspection_date = date(2006, 1, 1);

    let analyzer = ThreeWayAnalyzer::new(ThreeWayConfig::default()).expect("default config");
    let err = analyzer
        .analyze(&early, &middle, &late)
        .expect_err("out-of-order dates must fail");
    assert!(err.to_string().contains("strictly increasing"));
}

#[test]
fn empty_runs_yield_an_empty_but_valid_result() {
    let empty = |run_id: &str, d: NaiveDate| {
        InspectionRun::new(run_id, d, Vec::new(), welds(run_id, &[0.0, 500.0, 1000.0]))
            .expect("valid run")
    };
    let analyzer = ThreeWayAnalyzer::new(ThreeWayConfig::default()).expect("default config");
    let result = analyzer
        .analyze(
            &empty("RUN_2007", date(2007, 1, 1)),
            &empty("RUN_2015", date(2015, 1, 1)),
            &empty("RUN_2022", date(2022, 1, 1)),
        )
        .expect("empty runs are a valid degenerate case");

    assert!(result.zones.is_empty());
    assert!(result.chains.is_empty());
    assert_eq!(result.early_interval.statistics.matched, 0);
    assert_eq!(result.high_risk_count, 0);
}
