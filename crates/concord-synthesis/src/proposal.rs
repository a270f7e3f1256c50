//! Proposals in, one result out

use crate::error::{Result, SynthesisError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One agent's candidate solution
///
/// Immutable once built; [`Proposal::new`] rejects an empty agent id and
/// any confidence outside `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Proposal<S> {
    agent_id: String,
    solution: S,
    confidence: f64,
    rationale: String,
}

impl<S> Proposal<S> {
    /// Create a validated proposal
    ///
    /// # Errors
    /// [`SynthesisError::InvalidProposal`] for a blank agent id or a
    /// non-finite / out-of-range confidence.
    pub fn new(
        agent_id: impl Into<String>,
        solution: S,
        confidence: f64,
        rationale: impl Into<String>,
    ) -> Result<Self> {
        let agent_id = agent_id.into();
        if agent_id.trim().is_empty() {
            return Err(SynthesisError::invalid_proposal(agent_id, "agent id is empty"));
        }
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(SynthesisError::invalid_proposal(
                agent_id,
                format!("confidence {confidence} outside [0, 1]"),
            ));
        }
        Ok(Self {
            agent_id,
            solution,
            confidence,
            rationale: rationale.into(),
        })
    }

    /// Proposing agent
    #[inline]
    #[must_use]
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Candidate solution
    #[inline]
    #[must_use]
    pub fn solution(&self) -> &S {
        &self.solution
    }

    /// Confidence in `[0, 1]`
    #[inline]
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Agent's stated reasoning
    #[inline]
    #[must_use]
    pub fn rationale(&self) -> &str {
        &self.rationale
    }
}

/// Rule that decided a synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisRule {
    /// Every proposal agreed
    Unanimous,
    /// A clear confidence leader, or one corroborated by the majority
    DomainExpertise,
    /// Unique best quality score
    Quality,
    /// Composite built from compatible candidates
    Merge,
    /// Unresolved; needs a human decision
    Escalate,
}

impl SynthesisRule {
    /// Every rule, in evaluation order
    pub const ALL: [SynthesisRule; 5] = [
        Self::Unanimous,
        Self::DomainExpertise,
        Self::Quality,
        Self::Merge,
        Self::Escalate,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unanimous => "unanimous",
            Self::DomainExpertise => "domain_expertise",
            Self::Quality => "quality",
            Self::Merge => "merge",
            Self::Escalate => "escalate",
        }
    }
}

impl fmt::Display for SynthesisRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one arbitration call
///
/// Built only through the per-rule constructors, so a solution is present
/// for every rule except [`SynthesisRule::Escalate`] and a winning agent
/// only for the rules that pick one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisResult<S> {
    solution: Option<S>,
    rule: SynthesisRule,
    winning_agent: Option<String>,
    rationale: String,
}

impl<S> SynthesisResult<S> {
    /// All proposals agreed
    #[must_use]
    pub fn unanimous(solution: S, rationale: impl Into<String>) -> Self {
        Self::decided(solution, SynthesisRule::Unanimous, None, rationale)
    }

    /// Confidence leader adopted
    #[must_use]
    pub fn domain_expertise(
        solution: S,
        agent: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self::decided(
            solution,
            SynthesisRule::DomainExpertise,
            Some(agent.into()),
            rationale,
        )
    }

    /// Best-scoring proposal adopted
    #[must_use]
    pub fn quality(solution: S, agent: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self::decided(solution, SynthesisRule::Quality, Some(agent.into()), rationale)
    }

    /// Composite adopted
    #[must_use]
    pub fn merged(solution: S, rationale: impl Into<String>) -> Self {
        Self::decided(solution, SynthesisRule::Merge, None, rationale)
    }

    /// Nothing adopted
    #[must_use]
    pub fn escalate(rationale: impl Into<String>) -> Self {
        Self {
            solution: None,
            rule: SynthesisRule::Escalate,
            winning_agent: None,
            rationale: rationale.into(),
        }
    }

    fn decided(
        solution: S,
        rule: SynthesisRule,
        winning_agent: Option<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            solution: Some(solution),
            rule,
            winning_agent,
            rationale: rationale.into(),
        }
    }

    /// Adopted solution; `None` only when escalated
    #[inline]
    #[must_use]
    pub fn solution(&self) -> Option<&S> {
        self.solution.as_ref()
    }

    /// Take the adopted solution
    #[inline]
    #[must_use]
    pub fn into_solution(self) -> Option<S> {
        self.solution
    }

    /// Deciding rule
    #[inline]
    #[must_use]
    pub fn rule(&self) -> SynthesisRule {
        self.rule
    }

    /// Agent whose proposal won, for rules that pick one
    #[inline]
    #[must_use]
    pub fn winning_agent(&self) -> Option<&str> {
        self.winning_agent.as_deref()
    }

    /// Why this outcome
    #[inline]
    #[must_use]
    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    /// Needs a human decision
    #[inline]
    #[must_use]
    pub fn is_escalated(&self) -> bool {
        self.rule == SynthesisRule::Escalate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_validation() {
        assert!(Proposal::new("backend", 1, 0.5, "").is_ok());
        assert!(Proposal::new("edge", 1, 0.0, "").is_ok());
        assert!(Proposal::new("edge", 1, 1.0, "").is_ok());

        let err = Proposal::new("  ", 1, 0.5, "").unwrap_err();
        assert!(err.is_input_rejected());
        assert!(Proposal::new("a", 1, 1.01, "").is_err());
        assert!(Proposal::new("a", 1, -0.1, "").is_err());
        assert!(Proposal::new("a", 1, f64::NAN, "").is_err());
    }

    #[test]
    fn escalate_has_no_solution() {
        let result: SynthesisResult<u8> = SynthesisResult::escalate("split");
        assert!(result.is_escalated());
        assert!(result.solution().is_none());
        assert!(result.winning_agent().is_none());
    }

    #[test]
    fn rule_wire_names() {
        let names: Vec<_> = SynthesisRule::ALL.iter().map(|r| r.as_str()).collect();
        assert_eq!(
            names,
            vec!["unanimous", "domain_expertise", "quality", "merge", "escalate"]
        );
        assert_eq!(
            serde_json::to_string(&SynthesisRule::DomainExpertise).unwrap(),
            "\"domain_expertise\""
        );
    }
}
