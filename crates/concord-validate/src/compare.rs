//! Structural contract comparison
//!
//! Side A is the required side, side B the implementing side. Endpoints
//! missing from B are errors; extra endpoints in B are warnings. Callers
//! wanting a symmetric picture run both directions.

use crate::mismatch::{ContractMismatch, MismatchKind, Severity};
use concord_contract::{Contract, HttpMethod, Schema};

/// NOT FOUND marker used in `actual` / `expected`
pub const NOT_FOUND: &str = "NOT FOUND";

/// A contract with the component name used in reports
#[derive(Debug, Clone, Copy)]
pub struct Component<'a> {
    /// Component name (`frontend`, `backend`, a file path)
    pub name: &'a str,
    /// Its contract
    pub contract: &'a Contract,
}

impl<'a> Component<'a> {
    /// Label a contract
    #[inline]
    #[must_use]
    pub fn new(name: &'a str, contract: &'a Contract) -> Self {
        Self { name, contract }
    }
}

/// Where a schema comparison applies
#[derive(Debug, Clone, Copy)]
pub struct SchemaSite<'a> {
    /// Side whose required list is checked
    pub component_a: &'a str,
    /// Side that must declare the fields
    pub component_b: &'a str,
    /// Endpoint path
    pub path: &'a str,
    /// Endpoint method
    pub method: Option<HttpMethod>,
}

/// Stateless contract validator
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractValidator;

impl ContractValidator {
    /// Create validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Endpoint-level diff of `a` against `b`
    #[must_use]
    pub fn compare_contracts(&self, a: Component<'_>, b: Component<'_>) -> Vec<ContractMismatch> {
        let mut mismatches = Vec::new();

        for (path, method, _) in a.contract.operations() {
            let endpoint = format!("{method} {path}");
            if !b.contract.has_path(path) {
                mismatches.push(
                    ContractMismatch::new(
                        Severity::Error,
                        MismatchKind::EndpointMismatch,
                        a.name,
                        b.name,
                    )
                    .at(path, Some(method))
                    .described(
                        endpoint.as_str(),
                        NOT_FOUND,
                        format!("Implement {endpoint} in {}", b.name),
                    ),
                );
            } else if b.contract.operation(path, method).is_none() {
                let present: Vec<String> = b
                    .contract
                    .methods_at(path)
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                mismatches.push(
                    ContractMismatch::new(
                        Severity::Error,
                        MismatchKind::EndpointMismatch,
                        a.name,
                        b.name,
                    )
                    .at(path, Some(method))
                    .described(
                        endpoint.as_str(),
                        format!("{path} supports {}", present.join(", ")),
                        format!("Add a {method} handler for {path} in {}", b.name),
                    ),
                );
            }
        }

        for (path, method, _) in b.contract.operations() {
            if a.contract.operation(path, method).is_none() {
                let endpoint = format!("{method} {path}");
                mismatches.push(
                    ContractMismatch::new(
                        Severity::Warning,
                        MismatchKind::EndpointMismatch,
                        a.name,
                        b.name,
                    )
                    .at(path, Some(method))
                    .described(
                        NOT_FOUND,
                        endpoint.as_str(),
                        format!(
                            "Declare {endpoint} in {} or remove it from {}",
                            a.name, b.name
                        ),
                    ),
                );
            }
        }

        tracing::debug!(
            a = a.name,
            b = b.name,
            mismatches = mismatches.len(),
            "contracts compared"
        );
        mismatches
    }

    /// First required field of `a` that `b` does not declare
    ///
    /// Stops at the first missing field; an empty required list never
    /// produces a mismatch.
    #[must_use]
    pub fn validate_schemas(
        &self,
        a: &Schema,
        b: &Schema,
        site: SchemaSite<'_>,
    ) -> Option<ContractMismatch> {
        let missing = a.required.iter().find(|name| !b.declares(name))?;
        Some(
            ContractMismatch::new(
                Severity::Warning,
                MismatchKind::SchemaIncompatibility,
                site.component_a,
                site.component_b,
            )
            .at(site.path, site.method)
            .described(
                format!("required field '{missing}'"),
                format!("'{missing}' not declared by {}", site.component_b),
                format!("Add '{missing}' to the {} request schema", site.component_b),
            ),
        )
    }

    /// Frontend calls against backend routes
    #[must_use]
    pub fn validate_frontend_backend(
        &self,
        frontend: &Contract,
        backend: &Contract,
    ) -> Vec<ContractMismatch> {
        self.validate_consumer(Component::new("frontend", frontend), backend)
    }

    /// SDK methods against backend routes
    #[must_use]
    pub fn validate_sdk_backend(&self, sdk: &Contract, backend: &Contract) -> Vec<ContractMismatch> {
        self.validate_consumer(Component::new("sdk", sdk), backend)
    }

    /// Endpoint diff plus request-schema checks on shared endpoints
    ///
    /// The backend request schema defines what is required, so it is side A
    /// of each schema check. Response schemas are not compared.
    fn validate_consumer(&self, consumer: Component<'_>, backend: &Contract) -> Vec<ContractMismatch> {
        let backend = Component::new("backend", backend);
        let mut mismatches = self.compare_contracts(consumer, backend);
        let empty = Schema::object();

        for (path, method, op) in consumer.contract.operations() {
            let Some(required) = backend
                .contract
                .operation(path, method)
                .and_then(|b| b.request_schema())
            else {
                continue;
            };
            let offered = op.request_schema().unwrap_or(&empty);
            let site = SchemaSite {
                component_a: backend.name,
                component_b: consumer.name,
                path,
                method: Some(method),
            };
            mismatches.extend(self.validate_schemas(required, offered, site));
        }
        mismatches
    }
}
