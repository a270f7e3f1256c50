//! Thread-safe operation metrics
//!
//! One [`parking_lot::RwLock`] guards every counter and latency window.
//! Recording takes the write lock; snapshots take the read lock and sort a
//! copy of each window.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::Duration;

/// Externally callable operations that are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Route / call extraction
    Analyze,
    /// Model-to-schema inference
    InferSchema,
    /// Markdown requirements parsing
    ParseRequirements,
    /// Contract generation
    Generate,
    /// Contract enhancement with inferred schemas
    Enhance,
    /// Proposal arbitration
    Synthesize,
    /// Endpoint diff between two contracts
    Compare,
    /// Request-schema checks
    ValidateSchemas,
    /// Contract file loading
    LoadContract,
    /// Contract file loading and structure checks
    ValidateFile,
    /// Markdown report rendering
    Report,
}

impl Operation {
    /// All operations
    pub const ALL: [Self; 11] = [
        Self::Analyze,
        Self::InferSchema,
        Self::ParseRequirements,
        Self::Generate,
        Self::Enhance,
        Self::Synthesize,
        Self::Compare,
        Self::ValidateSchemas,
        Self::LoadContract,
        Self::ValidateFile,
        Self::Report,
    ];

    /// Label value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Analyze => "analyze",
            Self::InferSchema => "infer_schema",
            Self::ParseRequirements => "parse_requirements",
            Self::Generate => "generate",
            Self::Enhance => "enhance",
            Self::Synthesize => "synthesize",
            Self::Compare => "compare",
            Self::ValidateSchemas => "validate_schemas",
            Self::LoadContract => "load_contract",
            Self::ValidateFile => "validate_file",
            Self::Report => "report",
        }
    }

    /// Counts toward the validation window and success rate
    #[inline]
    #[must_use]
    pub const fn is_validation(self) -> bool {
        matches!(self, Self::Compare | Self::ValidateSchemas | Self::ValidateFile)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window sizes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Latency samples kept for validation operations
    pub validation_window: usize,
    /// Latency samples kept for report generation
    pub report_window: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            validation_window: 1000,
            report_window: 100,
        }
    }
}

/// Bounded FIFO of latency samples
#[derive(Debug)]
struct LatencyWindow {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl LatencyWindow {
    fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    fn push(&mut self, sample: Duration) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    fn summary(&self) -> LatencySummary {
        let mut sorted: Vec<Duration> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        LatencySummary {
            count: sorted.len(),
            p50_ms: percentile_ms(&sorted, 50.0),
            p95_ms: percentile_ms(&sorted, 95.0),
            p99_ms: percentile_ms(&sorted, 99.0),
            max_ms: sorted.last().map_or(0.0, |d| d.as_secs_f64() * 1000.0),
        }
    }
}

/// Nearest-rank percentile over sorted samples, in milliseconds; 0 when empty
#[must_use]
pub fn percentile_ms(sorted: &[Duration], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rank = ((pct / 100.0) * n as f64).ceil() as usize;
    let idx = rank.clamp(1, n) - 1;
    sorted[idx].as_secs_f64() * 1000.0
}

/// Percentiles of one latency window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Samples in the window
    pub count: usize,
    /// Median
    pub p50_ms: f64,
    /// 95th percentile
    pub p95_ms: f64,
    /// 99th percentile
    pub p99_ms: f64,
    /// Slowest sample
    pub max_ms: f64,
}

/// Success / failure tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Attempts
    pub total: u64,
    /// Attempts that succeeded
    pub ok: u64,
}

impl Tally {
    fn record(&mut self, ok: bool) {
        self.total += 1;
        if ok {
            self.ok += 1;
        }
    }

    /// Failed attempts
    #[inline]
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.total - self.ok
    }

    /// `ok / total`, or 1.0 with no samples
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.ok as f64 / self.total as f64;
        ratio
    }
}

#[derive(Debug)]
struct State {
    operations: BTreeMap<Operation, Tally>,
    validations: Tally,
    verdicts: Tally,
    schema_parses: Tally,
    synthesis_rules: BTreeMap<String, u64>,
    validation_latency: LatencyWindow,
    report_latency: LatencyWindow,
}

impl State {
    fn new(config: &MetricsConfig) -> Self {
        Self {
            operations: BTreeMap::new(),
            validations: Tally::default(),
            verdicts: Tally::default(),
            schema_parses: Tally::default(),
            synthesis_rules: BTreeMap::new(),
            validation_latency: LatencyWindow::new(config.validation_window),
            report_latency: LatencyWindow::new(config.report_window),
        }
    }
}

/// Point-in-time copy of every metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Outcomes per operation
    pub operations: BTreeMap<Operation, Tally>,
    /// Validation operations (compare, schema checks, file checks)
    pub validations: Tally,
    /// Validator verdicts confirmed correct or not
    pub verdicts: Tally,
    /// Structured-data parses
    pub schema_parses: Tally,
    /// Synthesis outcomes per rule
    pub synthesis_rules: BTreeMap<String, u64>,
    /// Validation latency percentiles
    pub validation_latency: LatencySummary,
    /// Report latency percentiles
    pub report_latency: LatencySummary,
}

impl MetricsSnapshot {
    /// All instrumented operations
    #[must_use]
    pub fn operations_total(&self) -> Tally {
        self.operations.values().fold(Tally::default(), |acc, t| Tally {
            total: acc.total + t.total,
            ok: acc.ok + t.ok,
        })
    }

    /// Operations that returned `Ok` over all operations
    #[inline]
    #[must_use]
    pub fn availability(&self) -> f64 {
        self.operations_total().ratio()
    }

    /// Confirmed-correct verdicts over all verdicts
    #[inline]
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.verdicts.ratio()
    }

    /// Successful parses over all parses
    #[inline]
    #[must_use]
    pub fn schema_parse_success_rate(&self) -> f64 {
        self.schema_parses.ratio()
    }

    /// Successful validations over all validations
    #[inline]
    #[must_use]
    pub fn validation_success_rate(&self) -> f64 {
        self.validations.ratio()
    }
}

/// Shared metrics sink
#[derive(Debug)]
pub struct MetricsCollector {
    config: MetricsConfig,
    state: RwLock<State>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

impl MetricsCollector {
    /// Create collector
    #[must_use]
    pub fn new(config: MetricsConfig) -> Self {
        let state = RwLock::new(State::new(&config));
        Self { config, state }
    }

    /// Active window sizes
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Record one finished operation
    pub fn record_operation(&self, operation: Operation, elapsed: Duration, ok: bool) {
        let mut state = self.state.write();
        state.operations.entry(operation).or_default().record(ok);
        if operation.is_validation() {
            state.validations.record(ok);
            state.validation_latency.push(elapsed);
        } else if operation == Operation::Report {
            state.report_latency.push(elapsed);
        }
        tracing::trace!(%operation, ?elapsed, ok, "operation recorded");
    }

    /// Record whether a validator verdict was confirmed correct
    pub fn record_verdict(&self, correct: bool) {
        self.state.write().verdicts.record(correct);
    }

    /// Record one structured-data parse
    pub fn record_schema_parse(&self, ok: bool) {
        self.state.write().schema_parses.record(ok);
    }

    /// Count a synthesis outcome under its rule name
    pub fn record_synthesis(&self, rule: &str) {
        *self
            .state
            .write()
            .synthesis_rules
            .entry(rule.to_string())
            .or_insert(0) += 1;
    }

    /// Copy current state and compute percentiles
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.read();
        MetricsSnapshot {
            operations: state.operations.clone(),
            validations: state.validations,
            verdicts: state.verdicts,
            schema_parses: state.schema_parses,
            synthesis_rules: state.synthesis_rules.clone(),
            validation_latency: state.validation_latency.summary(),
            report_latency: state.report_latency.summary(),
        }
    }

    /// Drop every counter and sample
    pub fn reset(&self) {
        *self.state.write() = State::new(&self.config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn nearest_rank_percentiles() {
        let sorted: Vec<Duration> = (1..=100).map(ms).collect();
        assert!((percentile_ms(&sorted, 50.0) - 50.0).abs() < 1e-9);
        assert!((percentile_ms(&sorted, 95.0) - 95.0).abs() < 1e-9);
        assert!((percentile_ms(&sorted, 99.0) - 99.0).abs() < 1e-9);
        assert!((percentile_ms(&[ms(7)], 99.0) - 7.0).abs() < 1e-9);
        assert_eq!(percentile_ms(&[], 95.0), 0.0);
    }

    #[test]
    fn windows_are_bounded_fifo() {
        let metrics = MetricsCollector::new(MetricsConfig {
            validation_window: 3,
            report_window: 2,
        });
        for n in 1..=5 {
            metrics.record_operation(Operation::Compare, ms(n * 10), true);
            metrics.record_operation(Operation::Report, ms(n), true);
        }
        let snap = metrics.snapshot();
        assert_eq!(snap.validation_latency.count, 3);
        assert!((snap.validation_latency.p50_ms - 40.0).abs() < 1e-9);
        assert_eq!(snap.report_latency.count, 2);
        assert!((snap.report_latency.max_ms - 5.0).abs() < 1e-9);
        assert_eq!(snap.validations.total, 5);
    }

    #[test]
    fn ratios_default_to_one() {
        let snap = MetricsCollector::default().snapshot();
        assert_eq!(snap.availability(), 1.0);
        assert_eq!(snap.accuracy(), 1.0);
        assert_eq!(snap.schema_parse_success_rate(), 1.0);
    }

    #[test]
    fn availability_spans_all_operations() {
        let metrics = MetricsCollector::default();
        metrics.record_operation(Operation::Analyze, ms(1), true);
        metrics.record_operation(Operation::Generate, ms(1), true);
        metrics.record_operation(Operation::ValidateFile, ms(1), false);
        metrics.record_operation(Operation::Synthesize, ms(1), true);
        let snap = metrics.snapshot();
        assert!((snap.availability() - 0.75).abs() < 1e-9);
        assert_eq!(snap.validations.failed(), 1);
        assert_eq!(snap.operations[&Operation::Analyze].total, 1);
    }

    #[test]
    fn synthesis_counted_per_rule() {
        let metrics = MetricsCollector::default();
        metrics.record_synthesis("unanimous");
        metrics.record_synthesis("unanimous");
        metrics.record_synthesis("escalate");
        let snap = metrics.snapshot();
        assert_eq!(snap.synthesis_rules["unanimous"], 2);
        assert_eq!(snap.synthesis_rules["escalate"], 1);
    }

    #[test]
    fn reset_clears_state() {
        let metrics = MetricsCollector::default();
        metrics.record_verdict(false);
        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn concurrent_recording() {
        let metrics = Arc::new(MetricsCollector::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        metrics.record_operation(Operation::Compare, ms(1), true);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snap = metrics.snapshot();
        assert_eq!(snap.validations.total, 1000);
        assert_eq!(snap.validation_latency.count, 1000);
    }
}
