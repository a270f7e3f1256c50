//! Provenance-carrying extraction records
//!
//! Records produced by source analysis. Fields are private and read-only:
//! once extracted, a route or call always points at the line it came from.

use crate::method::HttpMethod;
use serde::{Deserialize, Serialize};

/// Anything that names one (path, method) endpoint
pub trait Endpoint {
    /// Normalized endpoint path
    fn path(&self) -> &str;

    /// HTTP method
    fn method(&self) -> HttpMethod;
}

/// Route registered by a server framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRoute {
    path: String,
    method: HttpMethod,
    file: String,
    line: usize,
    framework: String,
}

impl ExtractedRoute {
    /// Create a route record
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        method: HttpMethod,
        file: impl Into<String>,
        line: usize,
        framework: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            method,
            file: file.into(),
            line,
            framework: framework.into(),
        }
    }

    /// Source file
    #[inline]
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// 1-based line number
    #[inline]
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Router that registered it (`gin`, `echo`, `mux`)
    #[inline]
    #[must_use]
    pub fn framework(&self) -> &str {
        &self.framework
    }
}

impl Endpoint for ExtractedRoute {
    fn path(&self) -> &str {
        &self.path
    }

    fn method(&self) -> HttpMethod {
        self.method
    }
}

/// Outbound HTTP call made by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCall {
    path: String,
    method: HttpMethod,
    file: String,
    line: usize,
    client: String,
}

impl ExtractedCall {
    /// Create a call record
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        method: HttpMethod,
        file: impl Into<String>,
        line: usize,
        client: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            method,
            file: file.into(),
            line,
            client: client.into(),
        }
    }

    /// Source file
    #[inline]
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// 1-based line number
    #[inline]
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// HTTP client used (`fetch`, `axios`, `requests`, ...)
    #[inline]
    #[must_use]
    pub fn client(&self) -> &str {
        &self.client
    }
}

impl Endpoint for ExtractedCall {
    fn path(&self) -> &str {
        &self.path
    }

    fn method(&self) -> HttpMethod {
        self.method
    }
}

/// Public method on a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMethod {
    name: String,
    return_type: Option<String>,
    class: Option<String>,
    file: String,
    line: usize,
}

impl ExtractedMethod {
    /// Create a method record
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        return_type: Option<String>,
        class: Option<String>,
        file: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            name: name.into(),
            return_type,
            class,
            file: file.into(),
            line,
        }
    }

    /// Method name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Annotated return type, if any
    #[inline]
    #[must_use]
    pub fn return_type(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    /// Enclosing class
    #[inline]
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Source file
    #[inline]
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// 1-based line number
    #[inline]
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint_key<E: Endpoint>(e: &E) -> String {
        format!("{} {}", e.method(), e.path())
    }

    #[test]
    fn routes_and_calls_share_endpoint() {
        let route = ExtractedRoute::new("/users", HttpMethod::Get, "main.go", 12, "gin");
        let call = ExtractedCall::new("/users", HttpMethod::Get, "api.ts", 3, "fetch");
        assert_eq!(endpoint_key(&route), endpoint_key(&call));
        assert_eq!(route.framework(), "gin");
        assert_eq!(call.client(), "fetch");
        assert_eq!(route.line(), 12);
    }

    #[test]
    fn method_record_accessors() {
        let m = ExtractedMethod::new(
            "get_user",
            Some("User".into()),
            Some("Client".into()),
            "sdk.py",
            40,
        );
        assert_eq!(m.name(), "get_user");
        assert_eq!(m.return_type(), Some("User"));
        assert_eq!(m.class(), Some("Client"));
        assert_eq!(m.file(), "sdk.py");
    }
}
