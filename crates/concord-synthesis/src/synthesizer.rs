//! Rule-chain arbitration
//!
//! ```text
//! proposals ─→ Unanimous ─→ DomainExpertise ─→ Quality? ─→ Merge? ─→ Escalate
//!                  │               │               │          │
//!                  └───────────────┴──── first rule that resolves wins
//! ```
//!
//! The synthesizer holds configuration and strategies only; every call is
//! independent of the previous one.

use crate::error::{Result, SynthesisError};
use crate::proposal::{Proposal, SynthesisResult};
use crate::strategy::{Merger, QualityScorer, RuleStep};
use serde::{Deserialize, Serialize};

/// Scores closer than this are treated as tied
const TIE_EPSILON: f64 = 1e-9;

/// Arbitration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Proposals accepted per call
    pub max_proposals: usize,
    /// Confidence lead over the runner-up that settles on expertise alone
    pub expertise_margin: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_proposals: 3,
            expertise_margin: 0.2,
        }
    }
}

impl SynthesisConfig {
    /// Set proposal cap
    #[inline]
    #[must_use]
    pub fn with_max_proposals(mut self, max: usize) -> Self {
        self.max_proposals = max;
        self
    }

    /// Set expertise margin
    #[inline]
    #[must_use]
    pub fn with_expertise_margin(mut self, margin: f64) -> Self {
        self.expertise_margin = margin;
        self
    }
}

/// Turns a proposal set into one [`SynthesisResult`]
pub struct ProposalSynthesizer<S> {
    config: SynthesisConfig,
    scorer: Option<Box<dyn QualityScorer<S>>>,
    merger: Option<Box<dyn Merger<S>>>,
}

impl<S> std::fmt::Debug for ProposalSynthesizer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProposalSynthesizer")
            .field("config", &self.config)
            .field("scorer", &self.scorer.as_ref().map(|s| s.name().to_string()))
            .field("merger", &self.merger.as_ref().map(|m| m.name().to_string()))
            .finish()
    }
}

impl<S> Default for ProposalSynthesizer<S>
where
    S: Clone + PartialEq,
{
    fn default() -> Self {
        Self::new(SynthesisConfig::default())
    }
}

impl<S> ProposalSynthesizer<S>
where
    S: Clone + PartialEq,
{
    /// Synthesizer with only the unanimous and expertise rules
    #[must_use]
    pub fn new(config: SynthesisConfig) -> Self {
        Self {
            config,
            scorer: None,
            merger: None,
        }
    }

    /// Enable the quality rule
    #[must_use]
    pub fn with_scorer(mut self, scorer: impl QualityScorer<S> + 'static) -> Self {
        self.scorer = Some(Box::new(scorer));
        self
    }

    /// Enable the merge rule
    #[must_use]
    pub fn with_merger(mut self, merger: impl Merger<S> + 'static) -> Self {
        self.merger = Some(Box::new(merger));
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Steps evaluated for each call, in order
    #[must_use]
    pub fn chain(&self) -> Vec<RuleStep<'_, S>> {
        let mut steps = vec![RuleStep::Unanimous, RuleStep::DomainExpertise];
        if let Some(scorer) = self.scorer.as_deref() {
            steps.push(RuleStep::Quality(scorer));
        }
        if let Some(merger) = self.merger.as_deref() {
            steps.push(RuleStep::Merge(merger));
        }
        steps
    }

    /// Arbitrate one proposal set
    ///
    /// Escalation is returned as `Ok` with [`SynthesisResult::is_escalated`].
    ///
    /// # Errors
    /// [`SynthesisError::NoProposals`] for an empty set and
    /// [`SynthesisError::TooManyProposals`] above the cap.
    pub fn synthesize(&self, proposals: &[Proposal<S>]) -> Result<SynthesisResult<S>> {
        if proposals.is_empty() {
            return Err(SynthesisError::NoProposals);
        }
        if proposals.len() > self.config.max_proposals {
            return Err(SynthesisError::TooManyProposals {
                count: proposals.len(),
                max: self.config.max_proposals,
            });
        }

        for step in self.chain() {
            let outcome = match step {
                RuleStep::Unanimous => unanimous(proposals),
                RuleStep::DomainExpertise => {
                    domain_expertise(proposals, self.config.expertise_margin)
                }
                RuleStep::Quality(scorer) => quality(proposals, scorer),
                RuleStep::Merge(merger) => merge(proposals, merger),
            };
            if let Some(result) = outcome {
                tracing::debug!(
                    rule = %result.rule(),
                    winner = result.winning_agent().unwrap_or("-"),
                    proposals = proposals.len(),
                    "synthesis resolved"
                );
                return Ok(result);
            }
        }

        let rationale = disagreement(proposals);
        tracing::debug!(proposals = proposals.len(), %rationale, "synthesis escalated");
        Ok(SynthesisResult::escalate(rationale))
    }
}

fn unanimous<S: Clone + PartialEq>(proposals: &[Proposal<S>]) -> Option<SynthesisResult<S>> {
    let (first, rest) = proposals.split_first()?;
    rest.iter()
        .all(|p| p.solution() == first.solution())
        .then(|| {
            SynthesisResult::unanimous(
                first.solution().clone(),
                format!("all {} proposals agree", proposals.len()),
            )
        })
}

fn domain_expertise<S: Clone + PartialEq>(
    proposals: &[Proposal<S>],
    margin: f64,
) -> Option<SynthesisResult<S>> {
    let mut ranked: Vec<&Proposal<S>> = proposals.iter().collect();
    ranked.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));
    let (leader, others) = ranked.split_first()?;
    let runner_up = others.first()?;

    let lead = leader.confidence() - runner_up.confidence();
    if lead <= TIE_EPSILON {
        return None;
    }
    if lead + TIE_EPSILON >= margin {
        return Some(SynthesisResult::domain_expertise(
            leader.solution().clone(),
            leader.agent_id(),
            format!(
                "{} leads with confidence {:.2}, {:.2} ahead of {}",
                leader.agent_id(),
                leader.confidence(),
                lead,
                runner_up.agent_id()
            ),
        ));
    }

    // the leader counts toward its own majority
    let backing = 1 + others
        .iter()
        .filter(|p| p.solution() == leader.solution())
        .count();
    (2 * backing > proposals.len()).then(|| {
        SynthesisResult::domain_expertise(
            leader.solution().clone(),
            leader.agent_id(),
            format!(
                "{} leads with confidence {:.2}, backed by {backing} of {} proposals",
                leader.agent_id(),
                leader.confidence(),
                proposals.len()
            ),
        )
    })
}

fn quality<S: Clone>(
    proposals: &[Proposal<S>],
    scorer: &dyn QualityScorer<S>,
) -> Option<SynthesisResult<S>> {
    let scores: Vec<f64> = proposals
        .iter()
        .map(|p| {
            let score = scorer.score(p.solution());
            if score.is_nan() {
                f64::NEG_INFINITY
            } else {
                score
            }
        })
        .collect();
    let (best_idx, best) = scores
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))?;
    let tied = scores
        .iter()
        .enumerate()
        .any(|(idx, &s)| idx != best_idx && (best - s).abs() <= TIE_EPSILON);
    if tied || !best.is_finite() {
        tracing::debug!(scorer = scorer.name(), best, "quality scores tied");
        return None;
    }
    let winner = &proposals[best_idx];
    Some(SynthesisResult::quality(
        winner.solution().clone(),
        winner.agent_id(),
        format!(
            "{} scored {best:.2} under {}, the unique best",
            winner.agent_id(),
            scorer.name()
        ),
    ))
}

fn merge<S>(proposals: &[Proposal<S>], merger: &dyn Merger<S>) -> Option<SynthesisResult<S>> {
    let candidates: Vec<&S> = proposals.iter().map(Proposal::solution).collect();
    match merger.merge(&candidates) {
        Ok(merged) => Some(SynthesisResult::merged(
            merged,
            format!("merged {} proposals with {}", proposals.len(), merger.name()),
        )),
        Err(conflict) => {
            tracing::debug!(merger = merger.name(), %conflict, "merge not possible");
            None
        }
    }
}

fn disagreement<S>(proposals: &[Proposal<S>]) -> String {
    let positions: Vec<String> = proposals
        .iter()
        .map(|p| format!("{} ({:.2})", p.agent_id(), p.confidence()))
        .collect();
    format!(
        "no rule resolved {} proposals: {}",
        proposals.len(),
        positions.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MergeConflict;
    use crate::proposal::SynthesisRule;

    fn p(agent: &str, solution: &str, confidence: f64) -> Proposal<String> {
        Proposal::new(agent, solution.to_string(), confidence, "").unwrap()
    }

    struct Concat;

    impl Merger<String> for Concat {
        fn merge(&self, candidates: &[&String]) -> std::result::Result<String, MergeConflict> {
            if candidates.iter().any(|c| c.contains('!')) {
                return Err(MergeConflict::new("shouting"));
            }
            Ok(candidates.iter().map(|c| c.as_str()).collect::<Vec<_>>().join("+"))
        }

        fn name(&self) -> &str {
            "concat"
        }
    }

    #[test]
    fn unanimous_wins_first() {
        let result = ProposalSynthesizer::default()
            .synthesize(&[p("a", "x", 0.9), p("b", "x", 0.1)])
            .unwrap();
        assert_eq!(result.rule(), SynthesisRule::Unanimous);
        assert_eq!(result.solution().map(String::as_str), Some("x"));
        assert!(result.winning_agent().is_none());
    }

    #[test]
    fn single_proposal_is_unanimous() {
        let result = ProposalSynthesizer::default()
            .synthesize(&[p("solo", "x", 0.3)])
            .unwrap();
        assert_eq!(result.rule(), SynthesisRule::Unanimous);
    }

    #[test]
    fn expertise_by_margin() {
        let result = ProposalSynthesizer::default()
            .synthesize(&[p("a", "x", 0.5), p("b", "y", 0.7), p("c", "z", 0.4)])
            .unwrap();
        assert_eq!(result.rule(), SynthesisRule::DomainExpertise);
        assert_eq!(result.winning_agent(), Some("b"));
        assert_eq!(result.solution().map(String::as_str), Some("y"));
    }

    #[test]
    fn expertise_by_corroboration() {
        let result = ProposalSynthesizer::default()
            .synthesize(&[p("a", "x", 0.8), p("b", "x", 0.75), p("c", "y", 0.7)])
            .unwrap();
        // lead is 0.05, but a and b together hold 2 of 3
        assert_eq!(result.rule(), SynthesisRule::DomainExpertise);
        assert_eq!(result.winning_agent(), Some("a"));
        assert!(result.rationale().contains("backed by 2 of 3"));

        // runner-up outvotes the leader's camp
        let result = ProposalSynthesizer::default()
            .synthesize(&[p("a", "x", 0.8), p("b", "y", 0.75), p("c", "y", 0.7)])
            .unwrap();
        assert!(result.is_escalated());

        let result = ProposalSynthesizer::default()
            .synthesize(&[p("a", "x", 0.8), p("b", "x", 0.75)])
            .unwrap();
        assert_eq!(result.rule(), SynthesisRule::Unanimous);

        let synth = ProposalSynthesizer::new(SynthesisConfig::default().with_max_proposals(4));
        let result = synth
            .synthesize(&[
                p("a", "x", 0.8),
                p("b", "x", 0.75),
                p("c", "x", 0.7),
                p("d", "y", 0.6),
            ])
            .unwrap();
        assert_eq!(result.rule(), SynthesisRule::DomainExpertise);
        assert_eq!(result.winning_agent(), Some("a"));

        // half is not a majority
        let result = synth
            .synthesize(&[
                p("a", "x", 0.8),
                p("b", "x", 0.75),
                p("c", "y", 0.7),
                p("d", "y", 0.6),
            ])
            .unwrap();
        assert!(result.is_escalated());
    }

    #[test]
    fn tied_leaders_fall_through() {
        let result = ProposalSynthesizer::default()
            .synthesize(&[p("a", "x", 0.8), p("b", "y", 0.8)])
            .unwrap();
        assert!(result.is_escalated());
        assert!(result.rationale().contains("a (0.80)"));
        assert!(result.rationale().contains("b (0.80)"));
    }

    #[test]
    fn quality_then_merge_then_escalate() {
        let synth = ProposalSynthesizer::default()
            .with_scorer(|s: &String| s.len() as f64)
            .with_merger(Concat);

        let result = synth
            .synthesize(&[p("a", "short", 0.6), p("b", "longer", 0.55)])
            .unwrap();
        assert_eq!(result.rule(), SynthesisRule::Quality);
        assert_eq!(result.winning_agent(), Some("b"));

        let result = synth
            .synthesize(&[p("a", "abc", 0.6), p("b", "xyz", 0.55)])
            .unwrap();
        assert_eq!(result.rule(), SynthesisRule::Merge);
        assert_eq!(result.solution().map(String::as_str), Some("abc+xyz"));

        let result = synth
            .synthesize(&[p("a", "ab!", 0.6), p("b", "xy!", 0.55)])
            .unwrap();
        assert!(result.is_escalated());
    }

    #[test]
    fn set_size_limits() {
        let synth = ProposalSynthesizer::<String>::default();
        assert_eq!(synth.synthesize(&[]).unwrap_err(), SynthesisError::NoProposals);
        let four: Vec<_> = (0..4).map(|i| p(&format!("a{i}"), "x", 0.5)).collect();
        assert!(matches!(
            synth.synthesize(&four).unwrap_err(),
            SynthesisError::TooManyProposals { count: 4, max: 3 }
        ));
    }

    #[test]
    fn chain_order() {
        let synth = ProposalSynthesizer::default()
            .with_merger(Concat)
            .with_scorer(|s: &String| s.len() as f64);
        let steps: Vec<_> = synth.chain().iter().map(|s| format!("{s:?}")).collect();
        assert_eq!(
            steps,
            vec!["Unanimous", "DomainExpertise", "Quality(custom)", "Merge(concat)"]
        );
    }
}
