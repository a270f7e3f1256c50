//! Prometheus text exposition
//!
//! Each render builds a fresh [`Registry`] from a snapshot, so the
//! collector itself stays free of prometheus types.

use crate::collector::{LatencySummary, MetricsSnapshot, Tally};
use crate::error::Result;
use crate::slo::SloTargets;
use prometheus::{Encoder, Gauge, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};

const NAMESPACE: &str = "concord";

fn counter_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    let metric = IntCounterVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(metric.clone()))?;
    Ok(metric)
}

fn gauge_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> Result<GaugeVec> {
    let metric = GaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(metric.clone()))?;
    Ok(metric)
}

fn set_outcomes(metric: &IntCounterVec, label: &str, tally: Tally) {
    metric.with_label_values(&[label, "ok"]).inc_by(tally.ok);
    metric.with_label_values(&[label, "error"]).inc_by(tally.failed());
}

fn set_quantiles(metric: &GaugeVec, window: &str, summary: &LatencySummary) {
    for (quantile, value) in [
        ("0.5", summary.p50_ms),
        ("0.95", summary.p95_ms),
        ("0.99", summary.p99_ms),
    ] {
        metric.with_label_values(&[window, quantile]).set(value);
    }
}

/// Render a snapshot in the Prometheus text format
///
/// # Errors
/// [`MetricsError`](crate::MetricsError) if a metric cannot be built or
/// encoded.
pub fn render_prometheus(snapshot: &MetricsSnapshot, targets: &SloTargets) -> Result<String> {
    let registry = Registry::new();

    let operations = counter_vec(
        &registry,
        "operations_total",
        "Instrumented operations by outcome",
        &["operation", "outcome"],
    )?;
    for (operation, tally) in &snapshot.operations {
        set_outcomes(&operations, operation.as_str(), *tally);
    }

    let checks = counter_vec(
        &registry,
        "checks_total",
        "Verdict confirmations and schema parses by outcome",
        &["check", "outcome"],
    )?;
    set_outcomes(&checks, "verdict", snapshot.verdicts);
    set_outcomes(&checks, "schema_parse", snapshot.schema_parses);

    let synthesis = counter_vec(
        &registry,
        "synthesis_total",
        "Synthesis outcomes by rule",
        &["rule"],
    )?;
    for (rule, count) in &snapshot.synthesis_rules {
        synthesis.with_label_values(&[rule.as_str()]).inc_by(*count);
    }

    let latency = gauge_vec(
        &registry,
        "latency_ms",
        "Latency percentiles over the sample window",
        &["window", "quantile"],
    )?;
    set_quantiles(&latency, "validation", &snapshot.validation_latency);
    set_quantiles(&latency, "report", &snapshot.report_latency);

    let compliance = Gauge::with_opts(
        Opts::new("slo_compliance_ratio", "Fraction of SLO objectives met").namespace(NAMESPACE),
    )?;
    registry.register(Box::new(compliance.clone()))?;
    compliance.set(targets.evaluate(snapshot).compliance());

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{MetricsCollector, Operation};
    use std::time::Duration;

    #[test]
    fn exposition_carries_labels() {
        let metrics = MetricsCollector::default();
        metrics.record_operation(Operation::Compare, Duration::from_millis(12), true);
        metrics.record_operation(Operation::ValidateFile, Duration::from_millis(3), false);
        metrics.record_synthesis("domain_expertise");
        metrics.record_schema_parse(true);

        let text = render_prometheus(&metrics.snapshot(), &SloTargets::default()).unwrap();
        assert!(text.contains(r#"concord_operations_total{operation="compare",outcome="ok"} 1"#));
        assert!(text.contains(r#"concord_operations_total{operation="validate_file",outcome="error"} 1"#));
        assert!(text.contains(r#"concord_synthesis_total{rule="domain_expertise"} 1"#));
        assert!(text.contains(r#"concord_latency_ms{quantile="0.95",window="validation"} 12"#));
        assert!(text.contains("concord_slo_compliance_ratio 0.75"));
    }

    #[test]
    fn empty_snapshot_renders() {
        let text = render_prometheus(&MetricsSnapshot::default(), &SloTargets::default()).unwrap();
        assert!(text.contains("concord_slo_compliance_ratio 1"));
    }
}
