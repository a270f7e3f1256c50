//! Pluggable quality and merge strategies
//!
//! The rule chain itself is fixed; only the bodies of the quality and merge
//! steps vary. Any `Fn(&S) -> f64` closure is a [`QualityScorer`].

use crate::error::MergeConflict;

/// Scores a candidate solution; higher is better
pub trait QualityScorer<S>: Send + Sync {
    /// Score one solution
    fn score(&self, solution: &S) -> f64;

    /// Name used in rationales
    fn name(&self) -> &str {
        "custom"
    }
}

impl<S, F> QualityScorer<S> for F
where
    F: Fn(&S) -> f64 + Send + Sync,
{
    fn score(&self, solution: &S) -> f64 {
        self(solution)
    }
}

/// Builds a composite from structurally compatible candidates
pub trait Merger<S>: Send + Sync {
    /// Merge every candidate into one solution
    ///
    /// # Errors
    /// [`MergeConflict`] when the candidates are incompatible.
    fn merge(&self, candidates: &[&S]) -> Result<S, MergeConflict>;

    /// Name used in rationales
    fn name(&self) -> &str {
        "custom"
    }
}

/// One step of the arbitration chain
///
/// Steps run in declaration order; the first that resolves wins and a
/// chain that runs out escalates.
pub enum RuleStep<'a, S> {
    /// Every solution equal
    Unanimous,
    /// Unique confidence leader by margin or majority corroboration
    DomainExpertise,
    /// Unique best score
    Quality(&'a dyn QualityScorer<S>),
    /// Composite of all candidates
    Merge(&'a dyn Merger<S>),
}

impl<S> std::fmt::Debug for RuleStep<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unanimous => f.write_str("Unanimous"),
            Self::DomainExpertise => f.write_str("DomainExpertise"),
            Self::Quality(scorer) => write!(f, "Quality({})", scorer.name()),
            Self::Merge(merger) => write!(f, "Merge({})", merger.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_scorers() {
        let by_len = |s: &String| s.len() as f64;
        assert!((QualityScorer::score(&by_len, &"abc".to_string()) - 3.0).abs() < f64::EPSILON);
        assert_eq!(QualityScorer::<String>::name(&by_len), "custom");
    }

    #[test]
    fn step_debug_names_strategy() {
        let by_len = |s: &String| s.len() as f64;
        let step: RuleStep<'_, String> = RuleStep::Quality(&by_len);
        assert_eq!(format!("{step:?}"), "Quality(custom)");
    }
}
