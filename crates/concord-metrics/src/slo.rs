//! SLO targets and health
//!
//! Four objectives, each met or not; overall compliance is the fraction met.

use crate::collector::MetricsSnapshot;
use serde::{Deserialize, Serialize};

/// Validation success rate below which the health check fails
pub const HEALTHY_SUCCESS_RATE: f64 = 0.90;

/// Fixed objectives
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SloTargets {
    /// Validation p95 ceiling, milliseconds
    pub validation_p95_ms: f64,
    /// Availability floor
    pub availability: f64,
    /// Accuracy floor
    pub accuracy: f64,
    /// Schema-parse success floor
    pub schema_parse_success: f64,
}

impl Default for SloTargets {
    fn default() -> Self {
        Self {
            validation_p95_ms: 5_000.0,
            availability: 0.999,
            accuracy: 0.99,
            schema_parse_success: 0.95,
        }
    }
}

/// One objective's outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SloCheck {
    /// Objective name
    pub name: &'static str,
    /// Target value
    pub target: f64,
    /// Observed value
    pub actual: f64,
    /// Whether the target is met
    pub met: bool,
}

/// Outcome of every objective
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SloReport {
    /// Per-objective checks, in fixed order
    pub checks: Vec<SloCheck>,
}

impl SloReport {
    /// Fraction of objectives met
    #[must_use]
    pub fn compliance(&self) -> f64 {
        if self.checks.is_empty() {
            return 1.0;
        }
        let met = self.checks.iter().filter(|c| c.met).count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = met as f64 / self.checks.len() as f64;
        ratio
    }

    /// Every objective met
    #[inline]
    #[must_use]
    pub fn is_compliant(&self) -> bool {
        self.checks.iter().all(|c| c.met)
    }

    /// Check by name
    #[must_use]
    pub fn check(&self, name: &str) -> Option<&SloCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}

impl SloTargets {
    /// Evaluate a snapshot
    #[must_use]
    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> SloReport {
        let ceiling = |name, target: f64, actual: f64| SloCheck {
            name,
            target,
            actual,
            met: actual <= target,
        };
        let floor = |name, target: f64, actual: f64| SloCheck {
            name,
            target,
            actual,
            met: actual >= target,
        };
        let report = SloReport {
            checks: vec![
                ceiling(
                    "validation_p95_ms",
                    self.validation_p95_ms,
                    snapshot.validation_latency.p95_ms,
                ),
                floor("availability", self.availability, snapshot.availability()),
                floor("accuracy", self.accuracy, snapshot.accuracy()),
                floor(
                    "schema_parse_success",
                    self.schema_parse_success,
                    snapshot.schema_parse_success_rate(),
                ),
            ],
        };
        for check in report.checks.iter().filter(|c| !c.met) {
            tracing::warn!(slo = check.name, target = check.target, actual = check.actual, "slo missed");
        }
        report
    }
}

/// Health verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall verdict
    pub healthy: bool,
    /// Why the check failed; empty when healthy
    pub reasons: Vec<String>,
}

impl HealthStatus {
    /// Fails with no validations recorded, or a validation success rate
    /// under [`HEALTHY_SUCCESS_RATE`]
    #[must_use]
    pub fn of(snapshot: &MetricsSnapshot) -> Self {
        let mut reasons = Vec::new();
        if snapshot.validations.total == 0 {
            reasons.push("no validations recorded".to_string());
        } else if snapshot.validation_success_rate() < HEALTHY_SUCCESS_RATE {
            reasons.push(format!(
                "validation success rate {:.1}% below {:.0}%",
                snapshot.validation_success_rate() * 100.0,
                HEALTHY_SUCCESS_RATE * 100.0
            ));
        }
        Self {
            healthy: reasons.is_empty(),
            reasons,
        }
    }
}
