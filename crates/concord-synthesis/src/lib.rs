//! Concord synthesis
//!
//! Arbitration over competing agent proposals. A fixed rule chain turns N
//! confidence-scored proposals into one decision plus the rule that made
//! it.
//!
//! # Core Concepts
//!
//! - [`Proposal`]: one agent's candidate, confidence and rationale
//! - [`ProposalSynthesizer`]: runs the rule chain
//! - [`QualityScorer`] / [`Merger`]: pluggable bodies of the quality and
//!   merge rules
//! - [`SynthesisResult`]: the outcome; escalation is a result, not an error
//!
//! # Example
//!
//! ```rust
//! use concord_synthesis::{Proposal, ProposalSynthesizer, SynthesisRule};
//!
//! # fn main() -> Result<(), concord_synthesis::SynthesisError> {
//! let synthesizer = ProposalSynthesizer::default();
//! let result = synthesizer.synthesize(&[
//!     Proposal::new("backend", "POST /users", 0.9, "owns the route")?,
//!     Proposal::new("frontend", "PUT /users", 0.4, "guessing")?,
//! ])?;
//! assert_eq!(result.rule(), SynthesisRule::DomainExpertise);
//! assert_eq!(result.winning_agent(), Some("backend"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod contract;
mod error;
mod proposal;
mod strategy;
mod synthesizer;

pub use contract::{ContractCompletenessScorer, ContractUnionMerger};
pub use error::{MergeConflict, Result, SynthesisError};
pub use proposal::{Proposal, SynthesisResult, SynthesisRule};
pub use strategy::{Merger, QualityScorer, RuleStep};
pub use synthesizer::{ProposalSynthesizer, SynthesisConfig};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
