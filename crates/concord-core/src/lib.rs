//! Concord Core
//!
//! Facade over the Concord crates: one configuration document, one error
//! type, and an engine that instruments every contract operation with
//! tracing spans and metrics.
//!
//! # Pipeline
//!
//! 1. requirements markdown or backend source becomes a contract
//! 2. model types are inferred and fill the contract's bodies
//! 3. competing contract proposals are arbitrated into one
//! 4. frontend and SDK contracts are validated against it
//! 5. mismatches are rendered as a markdown report
//!
//! # Example
//!
//! ```rust
//! use concord_core::{ConcordConfig, ContractEngine};
//!
//! # fn main() -> Result<(), concord_core::ConcordError> {
//! let engine = ContractEngine::new(ConcordConfig::default())?;
//! let backend = engine.analyze_source("go", "main.go", r#"r.POST("/users", create)"#)?;
//! let frontend = engine.analyze_source("ts", "api.ts", "fetch('/users')")?;
//!
//! let mismatches = engine.validate_frontend_backend(
//!     &engine.generate_from_calls(&frontend),
//!     &engine.generate_from_routes(&backend),
//! );
//! let report = engine.generate_report(&mismatches, false);
//! assert!(report.contains("## ERROR (1)"));
//! assert!(engine.health().healthy);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod engine;
pub mod error;

pub use config::{ConcordConfig, GeneratorConfig};
pub use engine::ContractEngine;
pub use error::{ConcordError, ConfigError, Result};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
