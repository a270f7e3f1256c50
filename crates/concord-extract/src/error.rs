//! Error types for extraction
//!
//! Three families, told apart by the classifier methods:
//! - input rejected: unsupported language, invalid method or path, too many fields
//! - not found: the requested type is absent (callers skip the artifact)
//! - defense triggered: size caps and pattern self-test failures (fail closed)

use concord_contract::SanitizeError;
use std::path::PathBuf;

/// Result alias for extraction
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors during analysis, inference and requirements parsing
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Language tag not recognized
    #[error("unsupported language: '{0}'")]
    UnsupportedLanguage(String),

    /// Input over a configured byte cap
    #[error("{what} too large: {size} bytes (max: {max})")]
    TooLarge {
        /// Which input
        what: &'static str,
        /// Actual size
        size: u64,
        /// Configured cap
        max: u64,
    },

    /// Extraction pattern failed to compile or failed its self-test
    #[error("pattern '{name}' rejected: {reason}")]
    PatternRejected {
        /// Pattern name
        name: &'static str,
        /// Compile error or timeout
        reason: String,
    },

    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Named type absent from the source text
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// What was looked for (`struct`, `interface`, `doc comment`)
        kind: &'static str,
        /// Requested name
        name: String,
    },

    /// Declaration found but its body could not be parsed
    #[error("malformed declaration '{name}': {message}")]
    Malformed {
        /// Declaration name
        name: String,
        /// What went wrong
        message: String,
    },

    /// More fields than allowed in one schema
    #[error("too many fields: {count} (max: {max})")]
    TooManyFields {
        /// Fields seen
        count: usize,
        /// Configured cap
        max: usize,
    },

    /// Endpoint method token not an exact upper-case HTTP method
    #[error("invalid http method '{token}' at line {line}")]
    InvalidMethod {
        /// Offending token
        token: String,
        /// 1-based line
        line: usize,
    },

    /// Endpoint declaration rejected by the sanitizer
    #[error("invalid endpoint at line {line}: {source}")]
    InvalidEndpoint {
        /// 1-based line
        line: usize,
        /// Sanitizer failure
        #[source]
        source: SanitizeError,
    },

    /// Other sanitizer failure (type names)
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
}

impl ExtractError {
    /// Create IO error for path
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create not-found error
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create malformed-declaration error
    pub fn malformed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The requested type does not exist; skip, do not fail the batch
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// A resource guard fired (size cap, pattern self-test)
    #[inline]
    #[must_use]
    pub fn is_defense_triggered(&self) -> bool {
        matches!(self, Self::TooLarge { .. } | Self::PatternRejected { .. })
    }

    /// The input itself was rejected
    #[inline]
    #[must_use]
    pub fn is_input_rejected(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedLanguage(_)
                | Self::TooManyFields { .. }
                | Self::InvalidMethod { .. }
                | Self::InvalidEndpoint { .. }
                | Self::Sanitize(_)
                | Self::Malformed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_disjoint() {
        let errors = [
            ExtractError::not_found("struct", "User"),
            ExtractError::TooLarge {
                what: "source",
                size: 10,
                max: 1,
            },
            ExtractError::UnsupportedLanguage("cobol".into()),
        ];
        assert!(errors[0].is_not_found() && !errors[0].is_input_rejected());
        assert!(errors[1].is_defense_triggered() && !errors[1].is_not_found());
        assert!(errors[2].is_input_rejected() && !errors[2].is_defense_triggered());
    }

    #[test]
    fn messages_name_the_input() {
        let err = ExtractError::InvalidMethod {
            token: "Post".into(),
            line: 7,
        };
        assert_eq!(err.to_string(), "invalid http method 'Post' at line 7");
    }
}
