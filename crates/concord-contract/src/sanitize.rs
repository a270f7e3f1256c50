//! Input sanitization
//!
//! Every piece of untrusted text that becomes part of a contract (feature
//! names, HTTP methods, endpoint paths, field names) passes through a
//! [`Sanitizer`]. The checks are pure: same config and input, same answer.

use crate::method::HttpMethod;
use serde::{Deserialize, Serialize};

/// Longest slice of rejected input echoed back in an error
const ECHO_LIMIT: usize = 64;

/// Sanitization failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanitizeError {
    /// Feature name outside `[a-z0-9_-]`
    #[error("invalid feature name: '{0}'")]
    InvalidFeatureName(String),

    /// Token is not an HTTP method
    #[error("invalid http method: '{0}'")]
    InvalidMethod(String),

    /// Method exists but is not in the allow-list
    #[error("http method not allowed: {0}")]
    MethodNotAllowed(HttpMethod),

    /// `..` or an encoded equivalent
    #[error("path traversal rejected: '{0}'")]
    PathTraversal(String),

    /// Malformed endpoint path
    #[error("invalid endpoint path '{input}': {reason}")]
    InvalidPath {
        /// Offending input (truncated)
        input: String,
        /// What was wrong
        reason: &'static str,
    },

    /// Input longer than the configured cap
    #[error("{what} too long: {len} > {max}")]
    LengthExceeded {
        /// Which kind of value
        what: &'static str,
        /// Actual length in characters
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// Field or type name with disallowed characters
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
}

fn echo(input: &str) -> String {
    input.chars().take(ECHO_LIMIT).collect()
}

/// Allow-lists and length caps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Methods a contract may use
    pub allowed_methods: Vec<HttpMethod>,
    /// Maximum endpoint path length
    pub max_path_len: usize,
    /// Maximum field / type name length
    pub max_identifier_len: usize,
    /// Maximum feature name length
    pub max_feature_name_len: usize,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            allowed_methods: HttpMethod::ALL.to_vec(),
            max_path_len: 500,
            max_identifier_len: 64,
            max_feature_name_len: 64,
        }
    }
}

/// Stateless validator built from a [`SanitizeConfig`]
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    config: SanitizeConfig,
}

impl Sanitizer {
    /// Create from config
    #[inline]
    #[must_use]
    pub fn new(config: SanitizeConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SanitizeConfig {
        &self.config
    }

    /// Validate a feature name
    ///
    /// # Errors
    /// Empty, too long, or characters outside `[a-z0-9_-]`.
    pub fn validate_feature_name(&self, input: &str) -> Result<String, SanitizeError> {
        let name = input.trim();
        let len = name.chars().count();
        if len > self.config.max_feature_name_len {
            return Err(SanitizeError::LengthExceeded {
                what: "feature name",
                len,
                max: self.config.max_feature_name_len,
            });
        }
        if !is_feature_name(name) {
            return Err(SanitizeError::InvalidFeatureName(echo(name)));
        }
        Ok(name.to_string())
    }

    /// Validate and upper-case an HTTP method
    ///
    /// # Errors
    /// Unknown token, or a method missing from the allow-list.
    pub fn validate_http_method(&self, input: &str) -> Result<HttpMethod, SanitizeError> {
        let token = input.trim().to_ascii_uppercase();
        let method: HttpMethod = token
            .parse()
            .map_err(|_| SanitizeError::InvalidMethod(echo(input.trim())))?;
        if !self.config.allowed_methods.contains(&method) {
            return Err(SanitizeError::MethodNotAllowed(method));
        }
        Ok(method)
    }

    /// Validate and normalize an endpoint path
    ///
    /// Repeated slashes collapse and a trailing slash is dropped (except on
    /// `/` itself).
    ///
    /// # Errors
    /// Empty, too long, relative, traversal, or disallowed characters.
    pub fn validate_endpoint_path(&self, input: &str) -> Result<String, SanitizeError> {
        let path = input.trim();
        if path.is_empty() {
            return Err(SanitizeError::InvalidPath {
                input: String::new(),
                reason: "empty",
            });
        }
        let len = path.chars().count();
        if len > self.config.max_path_len {
            return Err(SanitizeError::LengthExceeded {
                what: "endpoint path",
                len,
                max: self.config.max_path_len,
            });
        }
        if !path.starts_with('/') {
            return Err(SanitizeError::InvalidPath {
                input: echo(path),
                reason: "must start with '/'",
            });
        }
        let lower = path.to_ascii_lowercase();
        if path.contains("..")
            || path.contains('\\')
            || lower.contains("%2e%2e")
            || lower.contains(".%2e")
            || lower.contains("%2e.")
        {
            return Err(SanitizeError::PathTraversal(echo(path)));
        }
        if let Some(bad) = path.chars().find(|c| !is_path_char(*c)) {
            return Err(SanitizeError::InvalidPath {
                input: echo(path),
                reason: if bad.is_whitespace() {
                    "contains whitespace"
                } else {
                    "contains a disallowed character"
                },
            });
        }

        let mut normalized = String::with_capacity(path.len());
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            normalized.push('/');
            normalized.push_str(segment);
        }
        if normalized.is_empty() {
            normalized.push('/');
        }
        Ok(normalized)
    }

    /// Clean up and validate a field or type name
    ///
    /// Surrounding whitespace, backticks and quotes are stripped first.
    ///
    /// # Errors
    /// Empty, too long, or not an identifier.
    pub fn sanitize_field_name(&self, input: &str) -> Result<String, SanitizeError> {
        let name = input
            .trim()
            .trim_matches(|c| c == '`' || c == '"' || c == '\'')
            .trim();
        let len = name.chars().count();
        if len > self.config.max_identifier_len {
            return Err(SanitizeError::LengthExceeded {
                what: "identifier",
                len,
                max: self.config.max_identifier_len,
            });
        }
        if !is_identifier(name) {
            return Err(SanitizeError::InvalidIdentifier(echo(name)));
        }
        Ok(name.to_string())
    }
}

/// `^[a-z0-9][a-z0-9_-]*$`
fn is_feature_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// `^[A-Za-z_][A-Za-z0-9_-]*$`
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[inline]
fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '.' | '{' | '}' | ':' | '~')
}
