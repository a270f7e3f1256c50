//! Concord Contract Model
//!
//! Shared vocabulary for every other Concord crate.
//!
//! # Core Concepts
//!
//! - [`Contract`]: OpenAPI 3 subset, path -> method -> [`Operation`]
//! - [`SchemaSpec`] / [`FieldSpec`]: ordered field lists produced by extraction
//! - [`ExtractedRoute`], [`ExtractedCall`], [`ExtractedMethod`]: analysis records with provenance
//! - [`Sanitizer`]: the single enforcement point for untrusted text
//! - [`run_with_deadline`]: wall-clock guard for work on untrusted input
//!
//! # Example
//!
//! ```rust
//! use concord_contract::{Contract, HttpMethod, Operation, Sanitizer, Schema};
//!
//! let sanitizer = Sanitizer::default();
//! let path = sanitizer.validate_endpoint_path("/users/").unwrap();
//! let method = sanitizer.validate_http_method("get").unwrap();
//!
//! let mut contract = Contract::new("Users", "1.0.0");
//! contract.insert_operation(path, method, Operation::new().with_response("200", Schema::object()));
//! assert!(contract.operation("/users", HttpMethod::Get).is_some());
//! ```

#![warn(unreachable_pub)]

mod contract;
mod extracted;
mod guard;
mod method;
mod sanitize;
mod schema;

pub use contract::{
    Contract, ContractError, Info, MediaType, Operation, PathItem, RequestBody, Response,
    JSON_MEDIA_TYPE, OPENAPI_VERSION,
};
pub use extracted::{Endpoint, ExtractedCall, ExtractedMethod, ExtractedRoute};
pub use guard::{run_with_deadline, GuardError};
pub use method::{HttpMethod, UnknownMethod};
pub use sanitize::{SanitizeConfig, SanitizeError, Sanitizer};
pub use schema::{FieldSpec, FieldType, Schema, SchemaSpec};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
