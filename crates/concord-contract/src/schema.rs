//! Field lists and the OpenAPI schema subset
//!
//! Extraction produces ordered [`SchemaSpec`] field lists; contracts carry
//! [`Schema`] objects. The two convert losslessly for flat objects.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Primitive JSON type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// JSON string
    String,
    /// Whole number
    Integer,
    /// Floating point number
    Number,
    /// true / false
    Boolean,
    /// JSON array
    Array,
    /// JSON object
    Object,
}

impl FieldType {
    /// OpenAPI type name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named, typed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Wire name of the field
    pub name: String,
    /// JSON type
    #[serde(rename = "type")]
    pub kind: FieldType,
    /// Whether the field must be present
    pub required: bool,
}

impl FieldSpec {
    /// Required field
    #[inline]
    #[must_use]
    pub fn required(name: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    /// Optional field
    #[inline]
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// Ordered field list inferred from source or requirements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSpec {
    /// Fields in declaration order
    pub fields: Vec<FieldSpec>,
}

impl SchemaSpec {
    /// Wrap a field list
    #[inline]
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields were found
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Render as an object schema
    #[must_use]
    pub fn to_schema(&self) -> Schema {
        let mut schema = Schema::object();
        for field in &self.fields {
            schema
                .properties
                .insert(field.name.clone(), Schema::of(field.kind));
            if field.required {
                schema.required.push(field.name.clone());
            }
        }
        schema
    }

    /// Flatten an object schema back into a field list
    ///
    /// Untyped properties are reported as `object`.
    #[must_use]
    pub fn from_schema(schema: &Schema) -> Self {
        let fields = schema
            .properties
            .iter()
            .map(|(name, prop)| FieldSpec {
                name: name.clone(),
                kind: prop.kind.unwrap_or(FieldType::Object),
                required: schema.required.iter().any(|r| r == name),
            })
            .collect();
        Self { fields }
    }
}

/// OpenAPI schema object (subset)
///
/// Equality ignores property order and treats `required` as a set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    /// `type`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldType>,
    /// Object properties
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Names of required properties
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Element schema for arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Format hint (`date-time`, `int64`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Schema {
    /// Empty object schema
    #[inline]
    #[must_use]
    pub fn object() -> Self {
        Self::of(FieldType::Object)
    }

    /// Bare schema of one type
    #[inline]
    #[must_use]
    pub fn of(kind: FieldType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Whether `name` is declared as a property
    #[inline]
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Object schema with no properties
    #[must_use]
    pub fn is_empty_object(&self) -> bool {
        matches!(self.kind, Some(FieldType::Object) | None) && self.properties.is_empty()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.properties == other.properties
            && required_set(&self.required) == required_set(&other.required)
            && self.items == other.items
            && self.format == other.format
            && self.description == other.description
    }
}

fn required_set(names: &[String]) -> BTreeSet<&str> {
    names.iter().map(String::as_str).collect()
}
