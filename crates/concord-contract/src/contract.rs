//! Contract document model
//!
//! A [`Contract`] is an OpenAPI 3 subset: a version tag, an info block and an
//! ordered map of path -> method -> [`Operation`]. Every struct rejects
//! unknown keys so that a contract file with unexpected structure fails to
//! load instead of being partially understood.

use crate::method::HttpMethod;
use crate::schema::Schema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Version tag written into generated contracts
pub const OPENAPI_VERSION: &str = "3.0.3";

/// The only media type contracts describe
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Operations available at one path
pub type PathItem = IndexMap<HttpMethod, Operation>;

/// Errors converting contracts to and from text
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// YAML (de)serialization failure
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// API contract document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contract {
    /// `openapi` version tag; empty when the source omitted it
    #[serde(rename = "openapi", default, skip_serializing_if = "String::is_empty")]
    pub version_tag: String,
    /// Title and version metadata
    #[serde(default)]
    pub info: Info,
    /// Path -> method -> operation
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
}

/// `info` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Info {
    /// API title
    #[serde(default)]
    pub title: String,
    /// API version
    #[serde(default)]
    pub version: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One method on one path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Operation {
    /// Short summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Unique operation id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Grouping tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Request body, if the operation takes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Status code -> response
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
}

/// `requestBody` object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestBody {
    /// Whether a body must be sent
    #[serde(default)]
    pub required: bool,
    /// Media type -> schema
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// Response object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Response {
    /// Human readable description
    #[serde(default)]
    pub description: String,
    /// Media type -> schema
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// Media type object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaType {
    /// Body schema
    #[serde(default)]
    pub schema: Schema,
}

fn json_content(schema: Schema) -> IndexMap<String, MediaType> {
    let mut content = IndexMap::new();
    content.insert(JSON_MEDIA_TYPE.to_string(), MediaType { schema });
    content
}

impl RequestBody {
    /// Required JSON body
    #[must_use]
    pub fn json(schema: Schema) -> Self {
        Self {
            required: true,
            content: json_content(schema),
        }
    }

    /// The JSON body schema, if declared
    #[inline]
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.content.get(JSON_MEDIA_TYPE).map(|m| &m.schema)
    }
}

impl Response {
    /// JSON response
    #[must_use]
    pub fn json(description: impl Into<String>, schema: Schema) -> Self {
        Self {
            description: description.into(),
            content: json_content(schema),
        }
    }

    /// The JSON body schema, if declared
    #[inline]
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.content.get(JSON_MEDIA_TYPE).map(|m| &m.schema)
    }
}

impl Operation {
    /// Operation with no body and no responses
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the summary
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Attach a required JSON request body
    #[must_use]
    pub fn with_request(mut self, schema: Schema) -> Self {
        self.request_body = Some(RequestBody::json(schema));
        self
    }

    /// Attach a JSON response for `status`
    #[must_use]
    pub fn with_response(mut self, status: impl Into<String>, schema: Schema) -> Self {
        let status = status.into();
        let description = if status.starts_with('2') {
            "Success"
        } else {
            "Response"
        };
        self.responses
            .insert(status, Response::json(description, schema));
        self
    }

    /// Request body schema, if any
    #[inline]
    #[must_use]
    pub fn request_schema(&self) -> Option<&Schema> {
        self.request_body.as_ref().and_then(RequestBody::schema)
    }

    /// Response schema for `status`, if any
    #[inline]
    #[must_use]
    pub fn response_schema(&self, status: &str) -> Option<&Schema> {
        self.responses.get(status).and_then(Response::schema)
    }
}

impl Contract {
    /// Empty contract with the current version tag
    #[must_use]
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            version_tag: OPENAPI_VERSION.to_string(),
            info: Info {
                title: title.into(),
                version: version.into(),
                description: None,
            },
            paths: IndexMap::new(),
        }
    }

    /// Insert or replace an operation, returning the replaced one
    pub fn insert_operation(
        &mut self,
        path: impl Into<String>,
        method: HttpMethod,
        operation: Operation,
    ) -> Option<Operation> {
        self.paths
            .entry(path.into())
            .or_default()
            .insert(method, operation)
    }

    /// Look up an operation
    #[must_use]
    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&Operation> {
        self.paths.get(path).and_then(|item| item.get(&method))
    }

    /// Mutable lookup
    pub fn operation_mut(&mut self, path: &str, method: HttpMethod) -> Option<&mut Operation> {
        self.paths.get_mut(path).and_then(|item| item.get_mut(&method))
    }

    /// Whether the path is declared at all
    #[inline]
    #[must_use]
    pub fn has_path(&self, path: &str) -> bool {
        self.paths.contains_key(path)
    }

    /// Methods declared at `path`, in document order
    #[must_use]
    pub fn methods_at(&self, path: &str) -> Vec<HttpMethod> {
        self.paths
            .get(path)
            .map(|item| item.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Iterate every (path, method, operation)
    pub fn operations(&self) -> impl Iterator<Item = (&str, HttpMethod, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.iter()
                .map(move |(method, op)| (path.as_str(), *method, op))
        })
    }

    /// Number of (path, method) pairs
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.paths.values().map(IndexMap::len).sum()
    }

    /// Parse YAML (JSON is accepted too, as a YAML subset)
    ///
    /// # Errors
    /// Syntax errors and unknown keys.
    pub fn from_yaml(text: &str) -> Result<Self, ContractError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Render as YAML
    ///
    /// # Errors
    /// Serialization failure.
    pub fn to_yaml(&self) -> Result<String, ContractError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Parse JSON
    ///
    /// # Errors
    /// Syntax errors and unknown keys.
    pub fn from_json(text: &str) -> Result<Self, ContractError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Render as pretty JSON
    ///
    /// # Errors
    /// Serialization failure.
    pub fn to_json_pretty(&self) -> Result<String, ContractError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, FieldType, SchemaSpec};
    use pretty_assertions::assert_eq;

    fn sample() -> Contract {
        let mut contract = Contract::new("Users", "1.0.0");
        let body = SchemaSpec::new(vec![FieldSpec::required("email", FieldType::String)]);
        contract.insert_operation(
            "/users",
            HttpMethod::Post,
            Operation::new()
                .with_request(body.to_schema())
                .with_response("201", Schema::object()),
        );
        contract.insert_operation(
            "/users/{id}",
            HttpMethod::Get,
            Operation::new().with_response("200", Schema::object()),
        );
        contract
    }

    #[test]
    fn lookup_and_count() {
        let contract = sample();
        assert_eq!(contract.endpoint_count(), 2);
        assert!(contract.operation("/users", HttpMethod::Post).is_some());
        assert!(contract.operation("/users", HttpMethod::Get).is_none());
        assert_eq!(contract.methods_at("/users/{id}"), vec![HttpMethod::Get]);
        assert!(contract.methods_at("/missing").is_empty());
    }

    #[test]
    fn insert_replaces() {
        let mut contract = sample();
        let old = contract.insert_operation(
            "/users",
            HttpMethod::Post,
            Operation::new().with_summary("create"),
        );
        assert!(old.is_some());
        assert_eq!(contract.endpoint_count(), 2);
    }

    #[test]
    fn yaml_uses_openapi_keys() {
        let yaml = sample().to_yaml().unwrap();
        assert!(yaml.contains("openapi: 3.0.3"));
        assert!(yaml.contains("requestBody:"));
        assert!(yaml.contains("application/json:"));
        assert!(yaml.contains("  post:"));
    }

    #[test]
    fn yaml_reload_is_equal() {
        let contract = sample();
        let reloaded = Contract::from_yaml(&contract.to_yaml().unwrap()).unwrap();
        assert_eq!(reloaded, contract);
    }

    #[test]
    fn unknown_top_level_key_rejected() {
        let yaml = "openapi: 3.0.3\ninfo: {title: t, version: '1'}\npaths: {}\nservers: []\n";
        assert!(Contract::from_yaml(yaml).is_err());
    }

    #[test]
    fn unknown_method_key_rejected() {
        let yaml = "openapi: 3.0.3\npaths:\n  /a:\n    trace:\n      responses: {}\n";
        assert!(Contract::from_yaml(yaml).is_err());
    }

    #[test]
    fn missing_version_tag_loads_empty() {
        let contract = Contract::from_yaml("paths: {}\n").unwrap();
        assert!(contract.version_tag.is_empty());
    }

    #[test]
    fn request_schema_lookup() {
        let contract = sample();
        let op = contract.operation("/users", HttpMethod::Post).unwrap();
        assert!(op.request_schema().unwrap().declares("email"));
        assert!(op.response_schema("201").is_some());
        assert!(op.response_schema("200").is_none());
    }
}
