//! Concord validation
//!
//! Checks that independently analyzed components agree with a contract.
//!
//! - [`ContractValidator`]: endpoint diff and request-schema checks
//! - [`ReportGenerator`]: severity-graded markdown, optionally redacted
//! - [`ContractLoader`]: size- and time-bounded contract file loading
//!
//! # Example
//!
//! ```rust
//! use concord_contract::{Contract, HttpMethod, Operation};
//! use concord_validate::{Component, ContractValidator, ReportGenerator, Severity};
//!
//! let mut required = Contract::new("api", "1.0.0");
//! required.insert_operation("/users", HttpMethod::Post, Operation::new());
//! let implemented = Contract::new("api", "1.0.0");
//!
//! let mismatches = ContractValidator::new().compare_contracts(
//!     Component::new("frontend", &required),
//!     Component::new("backend", &implemented),
//! );
//! assert_eq!(mismatches[0].severity, Severity::Error);
//!
//! let report = ReportGenerator::default().generate_report(&mismatches, false);
//! assert!(report.contains("## ERROR (1)"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod compare;
pub mod loader;
pub mod mismatch;
pub mod report;

pub use compare::{Component, ContractValidator, SchemaSite, NOT_FOUND};
pub use loader::{
    run_blocking_with_deadline, write_contract_file, write_report, ContractFormat, ContractLoader,
    LoadError, LoaderLimits,
};
pub use mismatch::{ContractMismatch, MismatchKind, Severity, SeverityCounts};
pub use report::{RedactionPolicy, ReportGenerator, ALL_IN_SYNC};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
