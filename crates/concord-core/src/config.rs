//! Engine configuration
//!
//! Every allow-list, cap and window size the components take at
//! construction, gathered in one serde document. Sources layer as
//! defaults, then TOML, then `CONCORD_*` environment variables.

use crate::error::ConfigError;
use concord_contract::SanitizeConfig;
use concord_extract::ExtractLimits;
use concord_metrics::MetricsConfig;
use concord_synthesis::SynthesisConfig;
use concord_validate::{LoaderLimits, RedactionPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Title and version stamped on generated contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// `info.title`
    pub title: String,
    /// `info.version`
    pub version: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            title: "Generated API".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcordConfig {
    /// Method allow-list and length caps
    pub sanitize: SanitizeConfig,
    /// Extractor size caps and regex self-test
    pub extract: ExtractLimits,
    /// Contract file bounds
    pub loader: LoaderLimits,
    /// Report redaction denylist
    pub redaction: RedactionPolicy,
    /// Arbitration settings
    pub synthesis: SynthesisConfig,
    /// Latency window sizes
    pub metrics: MetricsConfig,
    /// Generated contract metadata
    pub generator: GeneratorConfig,
}

impl ConcordConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing sections keep their defaults
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on malformed TOML, [`ConfigError::Invalid`]
    /// when a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Read`] plus everything [`Self::from_toml_str`] returns.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Apply `CONCORD_*` environment variables
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; unparseable values are logged
    /// and ignored
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = &lookup;
        override_from(lookup, "CONCORD_MAX_PROPOSALS", &mut self.synthesis.max_proposals);
        override_from(lookup, "CONCORD_EXPERTISE_MARGIN", &mut self.synthesis.expertise_margin);
        override_from(lookup, "CONCORD_MAX_CONTRACT_BYTES", &mut self.loader.max_bytes);
        override_from(lookup, "CONCORD_PARSE_TIMEOUT_MS", &mut self.loader.parse_timeout_ms);
        override_from(lookup, "CONCORD_MAX_LINE_LEN", &mut self.extract.max_line_len);
        override_from(lookup, "CONCORD_MAX_FIELDS", &mut self.extract.max_fields);
        override_from(lookup, "CONCORD_VALIDATION_WINDOW", &mut self.metrics.validation_window);
        override_from(lookup, "CONCORD_REPORT_WINDOW", &mut self.metrics.report_window);
        override_from(lookup, "CONCORD_CONTRACT_TITLE", &mut self.generator.title);
        override_from(lookup, "CONCORD_CONTRACT_VERSION", &mut self.generator.version);
        self
    }

    /// Set the proposal cap
    #[inline]
    #[must_use]
    pub fn with_max_proposals(mut self, max: usize) -> Self {
        self.synthesis.max_proposals = max;
        self
    }

    /// Set the contract size cap
    #[inline]
    #[must_use]
    pub fn with_max_contract_bytes(mut self, max: u64) -> Self {
        self.loader.max_bytes = max;
        self
    }

    /// Set the contract parse deadline
    #[inline]
    #[must_use]
    pub fn with_parse_timeout_ms(mut self, ms: u64) -> Self {
        self.loader.parse_timeout_ms = ms;
        self
    }

    /// Set the redaction policy
    #[inline]
    #[must_use]
    pub fn with_redaction(mut self, policy: RedactionPolicy) -> Self {
        self.redaction = policy;
        self
    }

    /// Set generated contract metadata
    #[inline]
    #[must_use]
    pub fn with_generator(mut self, title: impl Into<String>, version: impl Into<String>) -> Self {
        self.generator = GeneratorConfig {
            title: title.into(),
            version: version.into(),
        };
        self
    }

    /// Range checks
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.synthesis.max_proposals == 0 {
            return Err(ConfigError::Invalid("synthesis.max_proposals must be at least 1".into()));
        }
        let margin = self.synthesis.expertise_margin;
        if !margin.is_finite() || !(0.0..=1.0).contains(&margin) {
            return Err(ConfigError::Invalid(format!(
                "synthesis.expertise_margin must be within [0, 1], got {margin}"
            )));
        }
        if self.loader.max_bytes == 0 || self.loader.parse_timeout_ms == 0 {
            return Err(ConfigError::Invalid("loader limits must be positive".into()));
        }
        if self.extract.max_line_len == 0 || self.extract.max_fields == 0 {
            return Err(ConfigError::Invalid("extract limits must be positive".into()));
        }
        if self.sanitize.allowed_methods.is_empty() {
            return Err(ConfigError::Invalid("sanitize.allowed_methods is empty".into()));
        }
        Ok(())
    }
}

fn override_from<T: FromStr>(lookup: &dyn Fn(&str) -> Option<String>, key: &str, target: &mut T) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => tracing::warn!(key, value = %raw, "ignoring unparseable override"),
    }
}
