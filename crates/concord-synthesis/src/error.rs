//! Synthesis errors
//!
//! An escalated result is not an error; these cover calls that could not
//! be arbitrated at all.

/// Result alias for synthesis
pub type Result<T> = std::result::Result<T, SynthesisError>;

/// Errors raised before arbitration starts
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    /// Empty proposal set
    #[error("no proposals to synthesize")]
    NoProposals,

    /// More proposals than the configured cap; callers pre-filter
    #[error("too many proposals: {count} (max: {max})")]
    TooManyProposals {
        /// Proposals supplied
        count: usize,
        /// Configured cap
        max: usize,
    },

    /// Proposal rejected at construction
    #[error("invalid proposal from '{agent}': {reason}")]
    InvalidProposal {
        /// Agent id as given
        agent: String,
        /// What was wrong
        reason: String,
    },
}

impl SynthesisError {
    /// Create invalid-proposal error
    pub fn invalid_proposal(agent: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProposal {
            agent: agent.into(),
            reason: reason.into(),
        }
    }

    /// The caller's input was rejected
    #[inline]
    #[must_use]
    pub fn is_input_rejected(&self) -> bool {
        matches!(self, Self::InvalidProposal { .. } | Self::TooManyProposals { .. })
    }
}

/// Candidates could not be merged; arbitration falls through to escalate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("merge conflict: {0}")]
pub struct MergeConflict(pub String);

impl MergeConflict {
    /// Create with message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
