//! Error types for Concord Core
//!
//! [`ConcordError`] wraps every component error so callers can match one
//! type, and exposes the three classes callers act on:
//! - input rejected: fix the input, do not retry
//! - not found: skip and continue
//! - defense triggered: a size or time guard fired; fail closed

use concord_contract::SanitizeError;
use concord_extract::ExtractError;
use concord_metrics::MetricsError;
use concord_synthesis::SynthesisError;
use concord_validate::LoadError;
use std::path::PathBuf;

/// Result alias for the engine
pub type Result<T> = std::result::Result<T, ConcordError>;

/// Main Concord error type
#[derive(Debug, thiserror::Error)]
pub enum ConcordError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input failed sanitization
    #[error("sanitize error: {0}")]
    Sanitize(#[from] SanitizeError),

    /// Extraction, inference or requirements parsing failed
    #[error("extract error: {0}")]
    Extract(#[from] ExtractError),

    /// Arbitration could not start
    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Contract file could not be loaded or written
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Metrics exposition failed
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
}

impl ConcordError {
    /// The caller's input was rejected
    #[must_use]
    pub fn is_input_rejected(&self) -> bool {
        match self {
            Self::Sanitize(_) => true,
            Self::Extract(e) => e.is_input_rejected(),
            Self::Synthesis(e) => e.is_input_rejected(),
            _ => false,
        }
    }

    /// A named item was absent
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Extract(e) if e.is_not_found())
    }

    /// A size or time guard fired
    #[must_use]
    pub fn is_defense_triggered(&self) -> bool {
        match self {
            Self::Extract(e) => e.is_defense_triggered(),
            Self::Load(e) => e.is_defense_triggered(),
            _ => false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading
    #[error("io error reading {path}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML
    #[error("toml parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create read error
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn display_prefixes() {
        let err = ConcordError::from(ConfigError::Invalid("bad".into()));
        assert_eq!(err.to_string(), "configuration error: invalid configuration: bad");
    }

    #[test]
    fn classifiers() {
        let missing = ConcordError::from(ExtractError::not_found("struct", "User"));
        assert!(missing.is_not_found());
        assert!(!missing.is_input_rejected());

        let timeout = ConcordError::from(LoadError::Timeout(Duration::from_secs(30)));
        assert!(timeout.is_defense_triggered());
        assert!(!timeout.is_not_found());

        let bad = ConcordError::from(SynthesisError::invalid_proposal("", "blank agent"));
        assert!(bad.is_input_rejected());

        let unsupported = ConcordError::from(ExtractError::UnsupportedLanguage("cobol".into()));
        assert!(unsupported.is_input_rejected());
    }
}
