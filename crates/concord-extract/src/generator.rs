//! Contract generation from extracted routes and parsed requirements

use crate::requirements::RequirementsDocument;
use concord_contract::{
    Contract, Endpoint, HttpMethod, MediaType, Operation, Schema, SchemaSpec, JSON_MEDIA_TYPE,
};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

/// Status code every generated operation answers with
pub const DEFAULT_STATUS: &str = "200";

/// Address of one request or response body inside a contract
///
/// Renders as `path:METHOD:request` or `path:METHOD:response:STATUS`, the
/// keys accepted by [`ContractGenerator::enhance_contract`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotKey {
    /// Request body of an operation
    Request {
        /// Contract path
        path: String,
        /// Operation method
        method: HttpMethod,
    },
    /// Response body for one status
    Response {
        /// Contract path
        path: String,
        /// Operation method
        method: HttpMethod,
        /// Status code key
        status: String,
    },
}

impl SlotKey {
    /// Request slot
    #[must_use]
    pub fn request(path: impl Into<String>, method: HttpMethod) -> Self {
        Self::Request {
            path: path.into(),
            method,
        }
    }

    /// Response slot
    #[must_use]
    pub fn response(path: impl Into<String>, method: HttpMethod, status: impl Into<String>) -> Self {
        Self::Response {
            path: path.into(),
            method,
            status: status.into(),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { path, method } => write!(f, "{path}:{method}:request"),
            Self::Response {
                path,
                method,
                status,
            } => write!(f, "{path}:{method}:response:{status}"),
        }
    }
}

/// Builds contracts; holds only the metadata stamped on each one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractGenerator {
    title: String,
    version: String,
}

impl Default for ContractGenerator {
    fn default() -> Self {
        Self::new("Generated API", "1.0.0")
    }
}

impl ContractGenerator {
    /// Generator stamping `title` / `version` into `info`
    #[must_use]
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
        }
    }

    /// Minimal contract: one `200` per route, empty object bodies
    ///
    /// POST, PUT and PATCH also get a required request body.
    #[must_use]
    pub fn generate_from_backend<E: Endpoint>(&self, routes: &[E]) -> Contract {
        let mut contract = Contract::new(&self.title, &self.version);
        for route in routes {
            let mut op = Operation::new().with_response(DEFAULT_STATUS, Schema::object());
            if route.method().has_request_body() {
                op = op.with_request(Schema::object());
            }
            contract.insert_operation(route.path(), route.method(), op);
        }
        tracing::debug!(endpoints = contract.endpoint_count(), "contract generated from routes");
        contract
    }

    /// Contract whose bodies carry the parsed field lists
    #[must_use]
    pub fn generate_from_requirements(&self, doc: &RequirementsDocument) -> Contract {
        let mut contract = Contract::new(&self.title, &self.version);
        for endpoint in &doc.endpoints {
            let mut op = Operation::new()
                .with_summary(format!("{} {}", endpoint.method, endpoint.path))
                .with_response(DEFAULT_STATUS, endpoint.response.to_schema());
            if endpoint.method.has_request_body() || !endpoint.request.is_empty() {
                op = op.with_request(endpoint.request.to_schema());
            }
            contract.insert_operation(endpoint.path.clone(), endpoint.method, op);
        }
        tracing::debug!(
            endpoints = contract.endpoint_count(),
            "contract generated from requirements"
        );
        contract
    }

    /// Copy of `contract` with bodies rebuilt from `schemas`
    ///
    /// Keys are rendered [`SlotKey`]s. Only slots that already exist are
    /// rebuilt; keys naming no slot are ignored.
    #[must_use]
    pub fn enhance_contract(
        &self,
        contract: &Contract,
        schemas: &HashMap<String, SchemaSpec>,
    ) -> Contract {
        let mut enhanced = contract.clone();
        let mut applied = 0usize;

        for (path, item) in &mut enhanced.paths {
            for (method, op) in item.iter_mut() {
                if let Some(body) = op.request_body.as_mut() {
                    let key = SlotKey::request(path.as_str(), *method).to_string();
                    if let Some(spec) = schemas.get(&key) {
                        set_json_schema(&mut body.content, spec.to_schema());
                        applied += 1;
                    }
                }
                for (status, response) in &mut op.responses {
                    let key = SlotKey::response(path.as_str(), *method, status.as_str()).to_string();
                    if let Some(spec) = schemas.get(&key) {
                        set_json_schema(&mut response.content, spec.to_schema());
                        applied += 1;
                    }
                }
            }
        }

        if applied < schemas.len() {
            tracing::debug!(
                ignored = schemas.len() - applied,
                "schema keys matched no contract slot"
            );
        }
        enhanced
    }
}

fn set_json_schema(content: &mut IndexMap<String, MediaType>, schema: Schema) {
    match content.get_mut(JSON_MEDIA_TYPE) {
        Some(media) => media.schema = schema,
        None => {
            content.insert(JSON_MEDIA_TYPE.to_string(), MediaType { schema });
        }
    }
}
