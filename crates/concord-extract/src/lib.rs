//! Concord extraction layer
//!
//! The boundary between untrusted text (source files, requirements
//! markdown) and the typed contract model.
//!
//! # Core Operations
//!
//! - **Analyze**: scan Go / TypeScript / Python source for routes, client
//!   calls and SDK methods ([`SourceAnalyzer`])
//! - **Infer**: read a type declaration into a [`SchemaSpec`](concord_contract::SchemaSpec)
//!   ([`SchemaInferrer`])
//! - **Parse**: read endpoint requirements from markdown ([`RequirementsParser`])
//! - **Generate**: build and enrich contracts ([`ContractGenerator`])
//!
//! ```text
//! source text ─→ SourceAnalyzer ─→ routes ─→ ContractGenerator ─→ Contract
//!                SchemaInferrer ─→ SchemaSpec ──┘ enhance_contract
//! markdown ────→ RequirementsParser ─→ RequirementsDocument ─┘
//! ```
//!
//! Every extraction pattern is compiled through [`GuardedPattern`], which
//! self-tests it against pathological input under a deadline and fails
//! closed.
//!
//! # Example
//!
//! ```rust
//! use concord_contract::{HttpMethod, Sanitizer};
//! use concord_extract::{ContractGenerator, ExtractLimits, SourceAnalyzer, SourceLanguage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let analyzer = SourceAnalyzer::new(ExtractLimits::default(), Sanitizer::default())?;
//! let analysis = analyzer.analyze_source(
//!     SourceLanguage::Go,
//!     "main.go",
//!     "r.GET(\"/users/:id\", getUser)\n",
//! )?;
//! let contract = ContractGenerator::default().generate_from_backend(&analysis.routes);
//! assert!(contract.operation("/users/{id}", HttpMethod::Get).is_some());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod analyzer;
pub mod error;
pub mod generator;
pub mod inferrer;
pub mod limits;
pub mod pattern;
pub mod requirements;

pub use analyzer::{
    endpoint_keys, normalize_call_url, normalize_route_params, Analysis, Collector,
    LanguageExtractor, RejectedMatch, SourceAnalyzer, SourceLanguage, SourceLine,
};
pub use error::{ExtractError, Result};
pub use generator::{ContractGenerator, SlotKey, DEFAULT_STATUS};
pub use inferrer::SchemaInferrer;
pub use limits::ExtractLimits;
pub use pattern::GuardedPattern;
pub use requirements::{EndpointRequirement, RequirementsDocument, RequirementsParser};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
