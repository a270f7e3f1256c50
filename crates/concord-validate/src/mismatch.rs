//! Mismatch records

use concord_contract::HttpMethod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a mismatch is; ordered `Info < Warning < Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational
    Info,
    /// Likely problem
    Warning,
    /// Contract broken
    Error,
}

impl Severity {
    /// Upper-case label
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// Endpoint present on one side only
    EndpointMismatch,
    /// Required field not declared by the other side
    SchemaIncompatibility,
    /// Contract document unusable
    InvalidContract,
}

impl MismatchKind {
    /// Wire name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EndpointMismatch => "endpoint_mismatch",
            Self::SchemaIncompatibility => "schema_incompatibility",
            Self::InvalidContract => "invalid_contract",
        }
    }
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected discrepancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMismatch {
    /// Severity tier
    pub severity: Severity,
    /// Category
    #[serde(rename = "type")]
    pub kind: MismatchKind,
    /// Required side
    pub component_a: String,
    /// Implementing side
    pub component_b: String,
    /// Endpoint path, empty for document-level findings
    pub path: String,
    /// Endpoint method, if the finding is about one
    pub method: Option<HttpMethod>,
    /// What side A requires
    pub expected: String,
    /// What side B has
    pub actual: String,
    /// Suggested fix
    pub fix: String,
}

impl ContractMismatch {
    /// Create with empty location and text
    #[must_use]
    pub fn new(
        severity: Severity,
        kind: MismatchKind,
        component_a: impl Into<String>,
        component_b: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            component_a: component_a.into(),
            component_b: component_b.into(),
            path: String::new(),
            method: None,
            expected: String::new(),
            actual: String::new(),
            fix: String::new(),
        }
    }

    /// Set location
    #[must_use]
    pub fn at(mut self, path: impl Into<String>, method: Option<HttpMethod>) -> Self {
        self.path = path.into();
        self.method = method;
        self
    }

    /// Set expected / actual / fix text
    #[must_use]
    pub fn described(
        mut self,
        expected: impl Into<String>,
        actual: impl Into<String>,
        fix: impl Into<String>,
    ) -> Self {
        self.expected = expected.into();
        self.actual = actual.into();
        self.fix = fix.into();
        self
    }

    /// `METHOD /path`, or whichever half is known
    #[must_use]
    pub fn endpoint(&self) -> String {
        match self.method {
            Some(m) if !self.path.is_empty() => format!("{m} {}", self.path),
            Some(m) => m.to_string(),
            None => self.path.clone(),
        }
    }
}

/// Count per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    /// ERROR count
    pub errors: usize,
    /// WARNING count
    pub warnings: usize,
    /// INFO count
    pub info: usize,
}

impl SeverityCounts {
    /// Tally a mismatch list
    #[must_use]
    pub fn of(mismatches: &[ContractMismatch]) -> Self {
        mismatches.iter().fold(Self::default(), |mut acc, m| {
            match m.severity {
                Severity::Error => acc.errors += 1,
                Severity::Warning => acc.warnings += 1,
                Severity::Info => acc.info += 1,
            }
            acc
        })
    }

    /// Total mismatches
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.info
    }

    /// Count for one tier
    #[inline]
    #[must_use]
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Error => self.errors,
            Severity::Warning => self.warnings,
            Severity::Info => self.info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn wire_shape() {
        let m = ContractMismatch::new(
            Severity::Error,
            MismatchKind::EndpointMismatch,
            "frontend",
            "backend",
        )
        .at("/users", Some(HttpMethod::Post));
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"severity\":\"ERROR\""));
        assert!(json.contains("\"type\":\"endpoint_mismatch\""));
        assert!(json.contains("\"method\":\"post\""));
        assert_eq!(m.endpoint(), "POST /users");
    }

    #[test]
    fn counts() {
        let mk = |s| ContractMismatch::new(s, MismatchKind::InvalidContract, "a", "b");
        let counts = SeverityCounts::of(&[
            mk(Severity::Error),
            mk(Severity::Error),
            mk(Severity::Info),
        ]);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.get(Severity::Error), 2);
        assert_eq!(counts.warnings, 0);
    }
}
