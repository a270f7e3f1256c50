//! Hardened contract loading
//!
//! Contract files are agent-written and untrusted. Loading is bounded
//! twice before any structural check runs:
//! - size: checked from metadata before a byte is read
//! - time: the parse runs on a blocking task raced against a deadline
//!
//! Unknown keys at any level are rejected by the contract model itself.

use crate::compare::NOT_FOUND;
use crate::mismatch::{ContractMismatch, MismatchKind, Severity};
use concord_contract::{Contract, ContractError, Sanitizer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest syntax message echoed into a mismatch
const MAX_ECHO: usize = 200;

/// Result alias for loading
pub type Result<T> = std::result::Result<T, LoadError>;

/// Loader bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderLimits {
    /// Largest contract file accepted, in bytes
    pub max_bytes: u64,
    /// Wall-clock parse budget, in milliseconds
    pub parse_timeout_ms: u64,
}

impl Default for LoaderLimits {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            parse_timeout_ms: 30_000,
        }
    }
}

impl LoaderLimits {
    /// Parse deadline
    #[inline]
    #[must_use]
    pub fn parse_timeout(&self) -> Duration {
        Duration::from_millis(self.parse_timeout_ms)
    }
}

/// Contract file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractFormat {
    /// YAML (default)
    Yaml,
    /// JSON
    Json,
}

impl ContractFormat {
    /// `.json` is JSON; everything else is read as YAML
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Errors loading or writing contract files
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// IO error reading
    #[error("io error reading {path}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// IO error writing
    #[error("io error writing {path}: {source}")]
    Write {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File over the size cap
    #[error("contract too large: {size} bytes (max: {max})")]
    TooLarge {
        /// Actual size
        size: u64,
        /// Configured cap
        max: u64,
    },

    /// Parse did not finish in time
    #[error("contract parse exceeded {0:?}")]
    Timeout(Duration),

    /// Malformed document or unrecognized field
    #[error("invalid contract document: {0}")]
    Syntax(#[source] ContractError),

    /// Contract could not be serialized
    #[error("contract serialization failed: {0}")]
    Serialize(#[source] ContractError),

    /// Parse task died
    #[error("parse task failed: {0}")]
    Task(String),
}

impl LoadError {
    /// Create read error
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create write error
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// A resource guard fired
    #[inline]
    #[must_use]
    pub fn is_defense_triggered(&self) -> bool {
        matches!(self, Self::TooLarge { .. } | Self::Timeout(_))
    }

    /// The document itself is malformed
    #[inline]
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax(_))
    }
}

/// Run `work` on a blocking task, failing with [`LoadError::Timeout`] when
/// `deadline` passes first
///
/// The blocking task is not cancelled; its result is discarded.
///
/// # Errors
/// [`LoadError::Timeout`] or [`LoadError::Task`] if the task panics.
pub async fn run_blocking_with_deadline<T, F>(deadline: Duration, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::time::timeout(deadline, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join)) => Err(LoadError::Task(join.to_string())),
        Err(_) => {
            tracing::warn!(?deadline, "blocking parse timed out");
            Err(LoadError::Timeout(deadline))
        }
    }
}

/// Size- and time-bounded contract loader
#[derive(Debug, Clone, Default)]
pub struct ContractLoader {
    limits: LoaderLimits,
    sanitizer: Sanitizer,
}

impl ContractLoader {
    /// Create loader
    #[inline]
    #[must_use]
    pub fn new(limits: LoaderLimits, sanitizer: Sanitizer) -> Self {
        Self { limits, sanitizer }
    }

    /// Active limits
    #[inline]
    #[must_use]
    pub fn limits(&self) -> &LoaderLimits {
        &self.limits
    }

    /// Load and parse a contract file
    ///
    /// # Errors
    /// [`LoadError::Read`], [`LoadError::TooLarge`] (from metadata, before
    /// reading), [`LoadError::Timeout`], [`LoadError::Syntax`].
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Contract> {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| LoadError::read_error(path, e))?;
        if meta.len() > self.limits.max_bytes {
            return Err(LoadError::TooLarge {
                size: meta.len(),
                max: self.limits.max_bytes,
            });
        }
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LoadError::read_error(path, e))?;
        self.parse_text(text, ContractFormat::from_path(path)).await
    }

    /// Parse contract text under the size and time bounds
    ///
    /// # Errors
    /// [`LoadError::TooLarge`], [`LoadError::Timeout`], [`LoadError::Syntax`].
    pub async fn parse_text(&self, text: String, format: ContractFormat) -> Result<Contract> {
        let size = text.len() as u64;
        if size > self.limits.max_bytes {
            return Err(LoadError::TooLarge {
                size,
                max: self.limits.max_bytes,
            });
        }
        let parsed = run_blocking_with_deadline(self.limits.parse_timeout(), move || match format {
            ContractFormat::Yaml => Contract::from_yaml(&text),
            ContractFormat::Json => Contract::from_json(&text),
        })
        .await?;
        parsed.map_err(LoadError::Syntax)
    }

    /// Load a contract file and check its structure
    ///
    /// A document that fails to parse yields a single ERROR
    /// `invalid_contract` and no structural checks.
    ///
    /// # Errors
    /// IO failures and triggered defenses ([`LoadError::is_defense_triggered`]).
    pub async fn validate_contract_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Vec<ContractMismatch>> {
        let path = path.as_ref();
        let component = path.display().to_string();
        match self.load(path).await {
            Ok(contract) => Ok(self.validate_contract(&contract, &component)),
            Err(LoadError::Syntax(err)) => {
                tracing::debug!(file = %component, error = %err, "contract failed to parse");
                Ok(vec![Self::syntax_mismatch(&component, &err)])
            }
            Err(err) => Err(err),
        }
    }

    /// The single ERROR `invalid_contract` reported for an unparseable file
    #[must_use]
    pub fn syntax_mismatch(component: &str, err: &ContractError) -> ContractMismatch {
        let message: String = err.to_string().chars().take(MAX_ECHO).collect();
        ContractMismatch::new(Severity::Error, MismatchKind::InvalidContract, component, "schema")
            .described(
                "a well-formed contract with only recognized fields",
                message,
                "Fix the syntax error or remove the unrecognized field",
            )
    }

    /// Structural checks on a parsed contract
    #[must_use]
    pub fn validate_contract(&self, contract: &Contract, component: &str) -> Vec<ContractMismatch> {
        let mut mismatches = Vec::new();
        let invalid = |severity| {
            ContractMismatch::new(severity, MismatchKind::InvalidContract, component, "schema")
        };

        if contract.version_tag.trim().is_empty() {
            mismatches.push(invalid(Severity::Error).described(
                "openapi version tag",
                NOT_FOUND,
                "Add a top-level 'openapi' field",
            ));
        }
        if contract.paths.is_empty() {
            mismatches.push(invalid(Severity::Warning).described(
                "at least one path",
                "no paths",
                "Declare the endpoints under 'paths'",
            ));
        }
        for path in contract.paths.keys() {
            if let Err(err) = self.sanitizer.validate_endpoint_path(path) {
                mismatches.push(invalid(Severity::Error).at(path.as_str(), None).described(
                    "a safe endpoint path",
                    err.to_string(),
                    "Rename the path",
                ));
            }
        }
        mismatches
    }
}

/// Write a contract; `.json` paths get JSON, anything else YAML
///
/// # Errors
/// [`LoadError::Serialize`] or [`LoadError::Write`].
pub async fn write_contract_file(contract: &Contract, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = match ContractFormat::from_path(path) {
        ContractFormat::Yaml => contract.to_yaml(),
        ContractFormat::Json => contract.to_json_pretty(),
    }
    .map_err(LoadError::Serialize)?;
    write_text(path, &text).await?;
    tracing::debug!(file = %path.display(), endpoints = contract.endpoint_count(), "contract written");
    Ok(())
}

/// Write a rendered report
///
/// # Errors
/// [`LoadError::Write`].
pub async fn write_report(report: &str, path: impl AsRef<Path>) -> Result<()> {
    write_text(path.as_ref(), report).await
}

async fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LoadError::write_error(parent, e))?;
    }
    tokio::fs::write(path, text)
        .await
        .map_err(|e| LoadError::write_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_helper_times_out() {
        let err = run_blocking_with_deadline(Duration::from_millis(20), || {
            std::thread::sleep(Duration::from_millis(500));
        })
        .await
        .unwrap_err();
        assert!(matches!(err, LoadError::Timeout(_)));
        assert!(err.is_defense_triggered());
    }

    #[tokio::test]
    async fn deadline_helper_passes_value() {
        let value = run_blocking_with_deadline(Duration::from_secs(5), || 41 + 1)
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn oversized_text_rejected_before_parse() {
        let loader = ContractLoader::new(
            LoaderLimits {
                max_bytes: 8,
                ..LoaderLimits::default()
            },
            Sanitizer::default(),
        );
        let err = loader
            .parse_text("openapi: 3.0.3\n".into(), ContractFormat::Yaml)
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::TooLarge { size: 15, max: 8 }));
    }

    #[tokio::test]
    async fn unknown_field_is_syntax() {
        let err = ContractLoader::default()
            .parse_text("openapi: 3.0.3\nx-extra: 1\npaths: {}\n".into(), ContractFormat::Yaml)
            .await
            .unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn structural_checks() {
        let loader = ContractLoader::default();
        let mut contract = Contract::default();
        contract.paths.insert("/ok".into(), Default::default());
        contract.paths.insert("/a/../b".into(), Default::default());
        let out = loader.validate_contract(&contract, "c.yaml");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].severity, Severity::Error);
        assert_eq!(out[0].actual, NOT_FOUND);
        assert_eq!(out[1].path, "/a/../b");
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ContractFormat::from_path(Path::new("a.JSON")), ContractFormat::Json);
        assert_eq!(ContractFormat::from_path(Path::new("a.yml")), ContractFormat::Yaml);
    }
}
