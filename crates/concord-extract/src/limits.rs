//! Resource limits for extraction

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Size caps and self-test settings shared by every extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractLimits {
    /// Longest source line processed; longer lines are skipped
    pub max_line_len: usize,
    /// Source cap as a multiple of `max_line_len`
    pub source_multiplier: usize,
    /// Wall-clock budget for one pattern self-test, in milliseconds
    pub self_test_timeout_ms: u64,
    /// Length of the pathological self-test input
    pub self_test_len: usize,
    /// Requirements document cap in bytes
    pub max_requirements_bytes: usize,
    /// Fields allowed in one schema
    pub max_fields: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_line_len: 10_000,
            source_multiplier: 10,
            self_test_timeout_ms: 5_000,
            self_test_len: 2_048,
            max_requirements_bytes: 100_000,
            max_fields: 100,
        }
    }
}

impl ExtractLimits {
    /// Largest source text accepted
    #[inline]
    #[must_use]
    pub fn max_source_bytes(&self) -> usize {
        self.max_line_len.saturating_mul(self.source_multiplier)
    }

    /// Self-test deadline
    #[inline]
    #[must_use]
    pub fn self_test_timeout(&self) -> Duration {
        Duration::from_millis(self.self_test_timeout_ms)
    }
}
