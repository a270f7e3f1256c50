//! Source code analyzer
//!
//! Extracts server routes, client calls and public SDK methods from source
//! text, one [`LanguageExtractor`] per language family:
//! - Go: gorilla/mux, net/http, gin and echo route registration
//! - TypeScript / JavaScript: `fetch` and `axios` calls
//! - Python: public class methods and `requests` / `self._request` SDK calls
//!
//! Every extracted path and method passes through the [`Sanitizer`]; matches
//! that fail are reported in [`Analysis::rejected`] rather than dropped.

use crate::error::{ExtractError, Result};
use crate::limits::ExtractLimits;
use concord_contract::{
    Endpoint, ExtractedCall, ExtractedMethod, ExtractedRoute, HttpMethod, Sanitizer,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;

mod go;
mod python;
mod typescript;

pub use go::GoExtractor;
pub use python::PythonExtractor;
pub use typescript::TypeScriptExtractor;

/// Supported source language families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    /// Go
    Go,
    /// TypeScript and JavaScript
    TypeScript,
    /// Python
    Python,
}

impl SourceLanguage {
    /// Guess from a file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "go" => Some(Self::Go),
            "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" => Some(Self::TypeScript),
            "py" => Some(Self::Python),
            _ => None,
        }
    }
}

impl Display for SourceLanguage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Go => "go",
            Self::TypeScript => "typescript",
            Self::Python => "python",
        })
    }
}

impl FromStr for SourceLanguage {
    type Err = ExtractError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "go" | "golang" => Ok(Self::Go),
            "typescript" | "ts" | "javascript" | "js" => Ok(Self::TypeScript),
            "python" | "py" => Ok(Self::Python),
            _ => Err(ExtractError::UnsupportedLanguage(
                tag.chars().take(32).collect(),
            )),
        }
    }
}

/// A pattern match that failed sanitization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedMatch {
    /// 1-based line
    pub line: usize,
    /// Sanitizer message
    pub reason: String,
}

/// Everything extracted from one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// Language the source was analyzed as
    pub language: SourceLanguage,
    /// File label used for provenance
    pub file: String,
    /// Server routes
    pub routes: Vec<ExtractedRoute>,
    /// Client calls
    pub calls: Vec<ExtractedCall>,
    /// Public SDK methods
    pub methods: Vec<ExtractedMethod>,
    /// Matches rejected by the sanitizer
    pub rejected: Vec<RejectedMatch>,
    /// Lines skipped for exceeding the per-line cap
    pub skipped_lines: Vec<usize>,
}

impl Analysis {
    fn empty(language: SourceLanguage, file: &str) -> Self {
        Self {
            language,
            file: file.to_string(),
            routes: Vec::new(),
            calls: Vec::new(),
            methods: Vec::new(),
            rejected: Vec::new(),
            skipped_lines: Vec::new(),
        }
    }

    /// True when nothing at all was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.calls.is_empty() && self.methods.is_empty()
    }
}

/// Sanitizing, deduplicating sink handed to extractors
pub struct Collector<'a> {
    sanitizer: &'a Sanitizer,
    analysis: Analysis,
    seen_routes: HashSet<(String, HttpMethod)>,
    seen_calls: HashSet<(String, HttpMethod)>,
    seen_methods: HashSet<(Option<String>, String)>,
}

impl<'a> Collector<'a> {
    fn new(sanitizer: &'a Sanitizer, language: SourceLanguage, file: &str) -> Self {
        Self {
            sanitizer,
            analysis: Analysis::empty(language, file),
            seen_routes: HashSet::new(),
            seen_calls: HashSet::new(),
            seen_methods: HashSet::new(),
        }
    }

    fn clean(&mut self, raw_path: &str, raw_method: &str, line: usize) -> Option<(String, HttpMethod)> {
        let sanitizer = self.sanitizer;
        let checked = sanitizer.validate_http_method(raw_method).and_then(|method| {
            sanitizer
                .validate_endpoint_path(raw_path)
                .map(|path| (path, method))
        });
        match checked {
            Ok(pair) => Some(pair),
            Err(err) => {
                tracing::warn!(file = %self.analysis.file, line, error = %err, "rejected extracted endpoint");
                self.analysis.rejected.push(RejectedMatch {
                    line,
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    /// Record a server route (first occurrence of a path+method wins)
    pub fn route(&mut self, raw_path: &str, raw_method: &str, line: usize, framework: &str) {
        let Some((path, method)) = self.clean(&normalize_route_params(raw_path), raw_method, line)
        else {
            return;
        };
        if self.seen_routes.insert((path.clone(), method)) {
            let route = ExtractedRoute::new(path, method, self.analysis.file.clone(), line, framework);
            self.analysis.routes.push(route);
        }
    }

    /// Record a client call (first occurrence of a path+method wins)
    pub fn call(&mut self, raw_url: &str, raw_method: &str, line: usize, client: &str) {
        let Some((path, method)) = self.clean(&normalize_call_url(raw_url), raw_method, line)
        else {
            return;
        };
        if self.seen_calls.insert((path.clone(), method)) {
            let call = ExtractedCall::new(path, method, self.analysis.file.clone(), line, client);
            self.analysis.calls.push(call);
        }
    }

    /// Record a public method (first occurrence of class+name wins)
    pub fn method(&mut self, name: &str, return_type: Option<&str>, class: Option<&str>, line: usize) {
        let key = (class.map(str::to_string), name.to_string());
        if self.seen_methods.insert(key) {
            self.analysis.methods.push(ExtractedMethod::new(
                name,
                return_type.map(str::to_string),
                class.map(str::to_string),
                self.analysis.file.clone(),
                line,
            ));
        }
    }
}

/// One source line: (1-based number, text)
pub type SourceLine<'s> = (usize, &'s str);

/// Per-language extraction
pub trait LanguageExtractor: Send + Sync {
    /// Language handled
    fn language(&self) -> SourceLanguage;

    /// Scan the lines that survived the per-line cap
    fn extract(&self, lines: &[SourceLine<'_>], out: &mut Collector<'_>);
}

/// Multi-language analyzer with pre-tested patterns
#[derive(Debug, Clone)]
pub struct SourceAnalyzer {
    limits: ExtractLimits,
    sanitizer: Sanitizer,
    go: GoExtractor,
    typescript: TypeScriptExtractor,
    python: PythonExtractor,
}

impl SourceAnalyzer {
    /// Build every extractor, self-testing its patterns
    ///
    /// # Errors
    /// [`ExtractError::PatternRejected`] if any pattern fails its self-test.
    pub fn new(limits: ExtractLimits, sanitizer: Sanitizer) -> Result<Self> {
        let go = GoExtractor::new(&limits)?;
        let typescript = TypeScriptExtractor::new(&limits)?;
        let python = PythonExtractor::new(&limits)?;
        Ok(Self {
            limits,
            sanitizer,
            go,
            typescript,
            python,
        })
    }

    /// Active limits
    #[inline]
    #[must_use]
    pub fn limits(&self) -> &ExtractLimits {
        &self.limits
    }

    fn extractor(&self, language: SourceLanguage) -> &dyn LanguageExtractor {
        match language {
            SourceLanguage::Go => &self.go,
            SourceLanguage::TypeScript => &self.typescript,
            SourceLanguage::Python => &self.python,
        }
    }

    /// Analyze in-memory source
    ///
    /// # Errors
    /// [`ExtractError::TooLarge`] when the source exceeds the cap.
    pub fn analyze_source(
        &self,
        language: SourceLanguage,
        file: &str,
        source: &str,
    ) -> Result<Analysis> {
        let max = self.limits.max_source_bytes();
        if source.len() > max {
            return Err(ExtractError::TooLarge {
                what: "source",
                size: source.len() as u64,
                max: max as u64,
            });
        }

        let mut out = Collector::new(&self.sanitizer, language, file);
        let mut lines = Vec::new();
        for (idx, text) in source.lines().enumerate() {
            let number = idx + 1;
            if text.len() > self.limits.max_line_len {
                tracing::warn!(file, line = number, len = text.len(), "skipping over-long line");
                out.analysis.skipped_lines.push(number);
                continue;
            }
            lines.push((number, text));
        }

        self.extractor(language).extract(&lines, &mut out);
        let analysis = out.analysis;
        tracing::debug!(
            file,
            %language,
            routes = analysis.routes.len(),
            calls = analysis.calls.len(),
            methods = analysis.methods.len(),
            rejected = analysis.rejected.len(),
            "source analyzed"
        );
        Ok(analysis)
    }

    /// Analyze in-memory source with a textual language tag
    ///
    /// # Errors
    /// [`ExtractError::UnsupportedLanguage`] for unknown tags, plus
    /// everything [`Self::analyze_source`] returns.
    pub fn analyze_tagged(&self, tag: &str, file: &str, source: &str) -> Result<Analysis> {
        self.analyze_source(tag.parse()?, file, source)
    }

    /// Read and analyze one file
    ///
    /// The size cap is checked from metadata before any bytes are read.
    ///
    /// # Errors
    /// [`ExtractError::Read`] if unreadable, [`ExtractError::TooLarge`] if
    /// over the cap.
    pub async fn analyze_file(
        &self,
        language: SourceLanguage,
        path: impl AsRef<Path>,
    ) -> Result<Analysis> {
        let path = path.as_ref();
        let max = self.limits.max_source_bytes() as u64;
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| ExtractError::read_error(path, e))?;
        if meta.len() > max {
            return Err(ExtractError::TooLarge {
                what: "source file",
                size: meta.len(),
                max,
            });
        }
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ExtractError::read_error(path, e))?;
        self.analyze_source(language, &path.display().to_string(), &source)
    }
}

/// Turn framework parameters (`:id`, `*rest`) into `{id}` / `{rest}`
#[must_use]
pub fn normalize_route_params(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix([':', '*']) {
            Some(name) if !name.is_empty() => format!("{{{name}}}"),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Reduce a client URL to its endpoint path
///
/// Strips scheme and host, a leading template base (`${API}`,
/// `{self.base_url}`), the query string and fragment, and rewrites `${id}`
/// as `{id}`.
#[must_use]
pub fn normalize_call_url(url: &str) -> String {
    let mut rest = url.trim();
    if let Some(idx) = rest.find("://") {
        let after = &rest[idx + 3..];
        rest = after.find('/').map_or("/", |slash| &after[slash..]);
    }
    if rest.starts_with("${") || rest.starts_with('{') {
        if let Some(close) = rest.find('}') {
            let tail = &rest[close + 1..];
            if tail.is_empty() || tail.starts_with('/') {
                rest = tail;
            }
        }
    }
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let path = rest[..end].replace("${", "{");
    if path.is_empty() {
        "/".to_string()
    } else {
        path
    }
}

/// Capture group `idx` as `&str`, empty when absent
fn group<'t>(caps: &regex::Captures<'t>, idx: usize) -> &'t str {
    caps.get(idx).map_or("", |m| m.as_str())
}

/// Extracted endpoints as (METHOD, path) strings, for logs and tests
#[must_use]
pub fn endpoint_keys<E: Endpoint>(items: &[E]) -> Vec<String> {
    items
        .iter()
        .map(|e| format!("{} {}", e.method(), e.path()))
        .collect()
}
