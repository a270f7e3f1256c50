//! Percentile and window properties

use concord_metrics::{percentile_ms, MetricsCollector, MetricsConfig, Operation};
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #[test]
    fn percentiles_are_ordered(mut samples in proptest::collection::vec(0u64..10_000, 1..200)) {
        samples.sort_unstable();
        let sorted: Vec<Duration> = samples.iter().map(|ms| Duration::from_millis(*ms)).collect();
        let p50 = percentile_ms(&sorted, 50.0);
        let p95 = percentile_ms(&sorted, 95.0);
        let p99 = percentile_ms(&sorted, 99.0);
        prop_assert!(p50 <= p95 && p95 <= p99);
        prop_assert!(p99 <= percentile_ms(&sorted, 100.0));
    }

    #[test]
    fn window_never_exceeds_capacity(cap in 1usize..50, n in 0usize..200) {
        let metrics = MetricsCollector::new(MetricsConfig { validation_window: cap, report_window: cap });
        for _ in 0..n {
            metrics.record_operation(Operation::ValidateSchemas, Duration::from_millis(1), true);
        }
        let snap = metrics.snapshot();
        prop_assert_eq!(snap.validation_latency.count, n.min(cap));
        prop_assert_eq!(snap.validations.total, n as u64);
    }
}

#[test]
fn snapshot_serializes() {
    let metrics = MetricsCollector::default();
    metrics.record_operation(Operation::Report, Duration::from_millis(2), true);
    let json = serde_json::to_value(metrics.snapshot()).unwrap();
    assert_eq!(json["operations"]["report"]["total"], 1);
    assert_eq!(json["report_latency"]["count"], 1);
}
