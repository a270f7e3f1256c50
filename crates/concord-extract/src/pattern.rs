//! Self-tested extraction patterns
//!
//! A [`GuardedPattern`] is only handed out after it has been matched against
//! pathological input under a wall-clock deadline. A pattern that fails to
//! compile or loses the race is rejected and the owning extractor refuses to
//! construct.

use crate::error::{ExtractError, Result};
use crate::limits::ExtractLimits;
use concord_contract::{run_with_deadline, GuardError};
use regex::Regex;

/// Compiled regex that passed its self-test
#[derive(Debug, Clone)]
pub struct GuardedPattern {
    name: &'static str,
    regex: Regex,
}

impl GuardedPattern {
    /// Compile `pattern` and self-test it
    ///
    /// # Errors
    /// [`ExtractError::PatternRejected`] on compile failure or timeout.
    pub fn compile(name: &'static str, pattern: &str, limits: &ExtractLimits) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| ExtractError::PatternRejected {
            name,
            reason: e.to_string(),
        })?;
        self_test(name, &regex, limits)?;
        tracing::debug!(pattern = name, "pattern passed self-test");
        Ok(Self { name, regex })
    }

    /// Pattern name used in logs and errors
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Underlying regex
    #[inline]
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Inputs shaped to trip backtracking engines: long runs of near-matches
/// that fail at the very end.
fn pathological_inputs(len: usize) -> Vec<String> {
    let len = len.max(1_000);
    vec![
        format!("{}!", "a".repeat(len)),
        format!("{}\"", " ".repeat(len)),
        format!("{}x", "a.(\"/".repeat(len / 5 + 1)),
        format!("{}{}", "{".repeat(len / 2), "}".repeat(len / 2 - 1)),
        format!("@param {}", "{a} ".repeat(len / 4)),
    ]
}

fn self_test(name: &'static str, regex: &Regex, limits: &ExtractLimits) -> Result<()> {
    let regex = regex.clone();
    let inputs = pathological_inputs(limits.self_test_len);
    let outcome = run_with_deadline(name, limits.self_test_timeout(), move || {
        inputs
            .iter()
            .map(|input| regex.find_iter(input).count())
            .sum::<usize>()
    });
    match outcome {
        Ok(_) => Ok(()),
        Err(GuardError::DeadlineExceeded(deadline)) => {
            tracing::warn!(pattern = name, ?deadline, "pattern self-test timed out");
            Err(ExtractError::PatternRejected {
                name,
                reason: format!("self-test exceeded {deadline:?}"),
            })
        }
        Err(err) => Err(ExtractError::PatternRejected {
            name,
            reason: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_pattern_passes() {
        let p = GuardedPattern::compile("word", r"\w+", &ExtractLimits::default()).unwrap();
        assert_eq!(p.name(), "word");
        assert!(p.regex().is_match("hello"));
    }

    #[test]
    fn invalid_pattern_rejected() {
        let err = GuardedPattern::compile("broken", r"(unclosed", &ExtractLimits::default())
            .unwrap_err();
        assert!(err.is_defense_triggered());
    }

    #[test]
    fn zero_budget_fails_closed() {
        let limits = ExtractLimits {
            self_test_timeout_ms: 0,
            self_test_len: 200_000,
            ..ExtractLimits::default()
        };
        let err = GuardedPattern::compile("slow", r"(\w+\s*)+\(", &limits).unwrap_err();
        assert!(matches!(err, ExtractError::PatternRejected { name: "slow", .. }));
    }

    #[test]
    fn pathological_inputs_are_long() {
        assert!(pathological_inputs(10).iter().all(|p| p.len() >= 1_000));
    }
}
