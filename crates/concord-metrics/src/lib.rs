//! Concord metrics
//!
//! Operation counters, bounded latency windows and SLO compliance for the
//! contract pipeline.
//!
//! - [`MetricsCollector`]: thread-safe recording and snapshots
//! - [`SloTargets`]: fixed objectives evaluated against a snapshot
//! - [`HealthStatus`]: pass/fail health check
//! - [`render_prometheus`]: text exposition
//!
//! # Example
//!
//! ```rust
//! use concord_metrics::{HealthStatus, MetricsCollector, Operation, SloTargets};
//! use std::time::Duration;
//!
//! let metrics = MetricsCollector::default();
//! metrics.record_operation(Operation::Compare, Duration::from_millis(40), true);
//!
//! let snapshot = metrics.snapshot();
//! assert!(SloTargets::default().evaluate(&snapshot).is_compliant());
//! assert!(HealthStatus::of(&snapshot).healthy);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod collector;
pub mod error;
pub mod exposition;
pub mod slo;

pub use collector::{
    percentile_ms, LatencySummary, MetricsCollector, MetricsConfig, MetricsSnapshot, Operation,
    Tally,
};
pub use error::{MetricsError, Result};
pub use exposition::render_prometheus;
pub use slo::{HealthStatus, SloCheck, SloReport, SloTargets, HEALTHY_SUCCESS_RATE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
