//! Markdown requirements parser
//!
//! Reads endpoint declarations and their field lists out of a requirements
//! document using pulldown-cmark block events.
//!
//! ```markdown
//! ### POST /users
//! Request: {email, password: string}
//!
//! #### Response
//! - id: integer
//! - nickname: string (optional)
//! ```
//!
//! Endpoint lines are strict: a method token that is not exactly upper-case
//! or a path the sanitizer rejects aborts the whole parse. Field names are
//! lenient: one that fails sanitization is dropped and parsing continues.

use crate::error::{ExtractError, Result};
use crate::limits::ExtractLimits;
use crate::pattern::GuardedPattern;
use concord_contract::{FieldSpec, FieldType, HttpMethod, Sanitizer, SchemaSpec};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser as MdParser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One endpoint declared in a requirements document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRequirement {
    /// Declared method
    pub method: HttpMethod,
    /// Sanitized path
    pub path: String,
    /// 1-based line of the declaration
    pub line: usize,
    /// Request body fields
    pub request: SchemaSpec,
    /// Response body fields
    pub response: SchemaSpec,
}

/// Parsed requirements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementsDocument {
    /// Endpoints in declaration order
    pub endpoints: Vec<EndpointRequirement>,
}

impl RequirementsDocument {
    /// Look up an endpoint
    #[must_use]
    pub fn endpoint(&self, method: HttpMethod, path: &str) -> Option<&EndpointRequirement> {
        self.endpoints
            .iter()
            .find(|e| e.method == method && e.path == path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Heading(HeadingLevel),
    Item,
    Paragraph,
}

#[derive(Debug)]
struct Block {
    kind: BlockKind,
    line: usize,
    text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Request,
    Response,
}

#[derive(Debug, Default)]
struct ParseState {
    endpoints: Vec<EndpointRequirement>,
    current: Option<usize>,
    section: Option<Slot>,
}

/// Requirements markdown parser
#[derive(Debug, Clone)]
pub struct RequirementsParser {
    limits: ExtractLimits,
    sanitizer: Sanitizer,
    inline_fields: GuardedPattern,
    section_header: GuardedPattern,
}

impl RequirementsParser {
    /// Compile and self-test patterns
    ///
    /// # Errors
    /// [`ExtractError::PatternRejected`] if a pattern fails its self-test.
    pub fn new(limits: ExtractLimits, sanitizer: Sanitizer) -> Result<Self> {
        let inline_fields = GuardedPattern::compile(
            "req.inline_fields",
            r"(?i)^(request|response)(?:\s+(?:body|fields|schema|payload))?\s*:\s*\{([^{}]*)\}\s*$",
            &limits,
        )?;
        let section_header = GuardedPattern::compile(
            "req.section_header",
            r"(?i)^(request|response)(?:\s+(?:body|fields|schema|payload))?\s*:?$",
            &limits,
        )?;
        Ok(Self {
            limits,
            sanitizer,
            inline_fields,
            section_header,
        })
    }

    /// Read and parse a requirements file
    ///
    /// # Errors
    /// [`ExtractError::Read`], [`ExtractError::TooLarge`] (checked from
    /// metadata before reading), plus everything [`Self::parse`] returns.
    pub async fn parse_file(&self, path: impl AsRef<Path>) -> Result<RequirementsDocument> {
        let path = path.as_ref();
        let max = self.limits.max_requirements_bytes as u64;
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| ExtractError::read_error(path, e))?;
        if meta.len() > max {
            return Err(ExtractError::TooLarge {
                what: "requirements file",
                size: meta.len(),
                max,
            });
        }
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ExtractError::read_error(path, e))?;
        self.parse(&text)
    }

    /// Parse requirements markdown
    ///
    /// # Errors
    /// - [`ExtractError::TooLarge`] over the byte cap
    /// - [`ExtractError::InvalidMethod`] for a method token that is not exact upper-case
    /// - [`ExtractError::InvalidEndpoint`] for a rejected path or disallowed method
    /// - [`ExtractError::TooManyFields`] past the per-body field cap
    pub fn parse(&self, text: &str) -> Result<RequirementsDocument> {
        if text.len() > self.limits.max_requirements_bytes {
            return Err(ExtractError::TooLarge {
                what: "requirements",
                size: text.len() as u64,
                max: self.limits.max_requirements_bytes as u64,
            });
        }

        let newlines: Vec<usize> = text.match_indices('\n').map(|(i, _)| i).collect();
        let line_of = |offset: usize| newlines.partition_point(|&p| p < offset) + 1;

        let mut state = ParseState::default();
        let mut current: Option<Block> = None;
        let mut in_code = false;

        for (event, range) in MdParser::new_ext(text, Options::empty()).into_offset_iter() {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    self.flush(current.take(), &mut state)?;
                    current = Some(Block {
                        kind: BlockKind::Heading(level),
                        line: line_of(range.start),
                        text: String::new(),
                    });
                }
                Event::Start(Tag::Item) => {
                    self.flush(current.take(), &mut state)?;
                    current = Some(Block {
                        kind: BlockKind::Item,
                        line: line_of(range.start),
                        text: String::new(),
                    });
                }
                Event::Start(Tag::Paragraph) => {
                    if current.is_none() {
                        current = Some(Block {
                            kind: BlockKind::Paragraph,
                            line: line_of(range.start),
                            text: String::new(),
                        });
                    }
                }
                Event::Start(Tag::CodeBlock(_)) => {
                    self.flush(current.take(), &mut state)?;
                    in_code = true;
                }
                Event::End(TagEnd::CodeBlock) => in_code = false,
                Event::End(TagEnd::Heading(_) | TagEnd::Item | TagEnd::Paragraph) => {
                    self.flush(current.take(), &mut state)?;
                }
                Event::Text(t) | Event::Code(t) if !in_code => {
                    if let Some(block) = current.as_mut() {
                        block.text.push_str(&t);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some(block) = current.as_mut() {
                        block.text.push('\n');
                    }
                }
                _ => {}
            }
        }
        self.flush(current.take(), &mut state)?;

        tracing::debug!(endpoints = state.endpoints.len(), "requirements parsed");
        Ok(RequirementsDocument {
            endpoints: state.endpoints,
        })
    }

    fn flush(&self, block: Option<Block>, state: &mut ParseState) -> Result<()> {
        let Some(block) = block else { return Ok(()) };
        for (k, line) in block.text.lines().enumerate() {
            // continuation lines of an item read as prose
            let kind = if k == 0 { block.kind } else { BlockKind::Paragraph };
            self.process_line(kind, line.trim(), block.line + k, state)?;
        }
        Ok(())
    }

    fn process_line(
        &self,
        kind: BlockKind,
        text: &str,
        line: usize,
        state: &mut ParseState,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        if let Some((method, path)) = self.endpoint_declaration(kind, text, line)? {
            open_endpoint(state, method, path, line);
            return Ok(());
        }

        if let Some(caps) = self.inline_fields.regex().captures(text) {
            let slot = slot_of(caps.get(1).map_or("", |m| m.as_str()));
            let items = caps.get(2).map_or("", |m| m.as_str());
            for item in items.split(',') {
                self.add_field(state, slot, item, line)?;
            }
            return Ok(());
        }

        if let Some(caps) = self.section_header.regex().captures(text) {
            state.section = Some(slot_of(caps.get(1).map_or("", |m| m.as_str())));
            return Ok(());
        }

        match (kind, state.section) {
            (BlockKind::Item, Some(slot)) => self.add_field(state, slot, text, line)?,
            (BlockKind::Heading(_), _) => state.section = None,
            _ => {}
        }
        Ok(())
    }

    /// `Some` when the line declares an endpoint; `Err` when it tries to and fails
    fn endpoint_declaration(
        &self,
        kind: BlockKind,
        text: &str,
        line: usize,
    ) -> Result<Option<(HttpMethod, String)>> {
        let mut parts = text.split_whitespace();
        let (Some(token), Some(raw_path)) = (parts.next(), parts.next()) else {
            return Ok(None);
        };
        if !raw_path.starts_with('/') {
            return Ok(None);
        }
        let declares = match kind {
            BlockKind::Heading(HeadingLevel::H3) => token.chars().all(|c| c.is_ascii_alphabetic()),
            BlockKind::Item => HttpMethod::ALL
                .iter()
                .any(|m| m.as_str().eq_ignore_ascii_case(token)),
            _ => false,
        };
        if !declares {
            return Ok(None);
        }

        let invalid = || ExtractError::InvalidMethod {
            token: token.chars().take(32).collect(),
            line,
        };
        if token != token.to_ascii_uppercase() {
            return Err(invalid());
        }
        token.parse::<HttpMethod>().map_err(|_| invalid())?;
        let method = self
            .sanitizer
            .validate_http_method(token)
            .map_err(|source| ExtractError::InvalidEndpoint { line, source })?;
        let path = self
            .sanitizer
            .validate_endpoint_path(raw_path)
            .map_err(|source| ExtractError::InvalidEndpoint { line, source })?;
        Ok(Some((method, path)))
    }

    fn add_field(&self, state: &mut ParseState, slot: Slot, decl: &str, line: usize) -> Result<()> {
        let Some(idx) = state.current else {
            tracing::debug!(line, "field outside any endpoint ignored");
            return Ok(());
        };
        let Some((raw_name, kind, required)) = parse_field_decl(decl) else {
            return Ok(());
        };
        let name = match self.sanitizer.sanitize_field_name(raw_name) {
            Ok(name) => name,
            Err(err) => {
                tracing::debug!(line, field = raw_name, error = %err, "dropping field");
                return Ok(());
            }
        };

        let endpoint = &mut state.endpoints[idx];
        let spec = match slot {
            Slot::Request => &mut endpoint.request,
            Slot::Response => &mut endpoint.response,
        };
        if spec.field(&name).is_some() {
            return Ok(());
        }
        spec.fields.push(FieldSpec {
            name,
            kind,
            required,
        });
        if spec.len() > self.limits.max_fields {
            return Err(ExtractError::TooManyFields {
                count: spec.len(),
                max: self.limits.max_fields,
            });
        }
        Ok(())
    }
}

fn open_endpoint(state: &mut ParseState, method: HttpMethod, path: String, line: usize) {
    state.section = None;
    if let Some(idx) = state
        .endpoints
        .iter()
        .position(|e| e.method == method && e.path == path)
    {
        state.current = Some(idx);
        return;
    }
    state.endpoints.push(EndpointRequirement {
        method,
        path,
        line,
        request: SchemaSpec::default(),
        response: SchemaSpec::default(),
    });
    state.current = Some(state.endpoints.len() - 1);
}

fn slot_of(word: &str) -> Slot {
    if word.eq_ignore_ascii_case("request") {
        Slot::Request
    } else {
        Slot::Response
    }
}

/// `name`, `name: type`, `name (type)`, `name?: type`, `... (optional)`
fn parse_field_decl(decl: &str) -> Option<(&str, FieldType, bool)> {
    let lower = decl.to_ascii_lowercase();
    let marked_optional = lower.contains("(optional)");
    let decl = match lower.find("(optional)") {
        Some(idx) => &decl[..idx],
        None => decl,
    };

    let (mut name, mut ty) = match decl.split_once(':') {
        Some((name, rest)) => (name.trim(), rest.split_whitespace().next()),
        None => (decl.trim(), None),
    };
    if let Some((head, paren)) = name.split_once('(') {
        ty = ty.or_else(|| paren.split(')').next());
        name = head.trim();
    }
    if name.is_empty() {
        return None;
    }
    let (name, optional_suffix) = match name.strip_suffix('?') {
        Some(n) => (n.trim_end(), true),
        None => (name, false),
    };
    let kind = ty.map_or(FieldType::String, requirement_type);
    Some((name, kind, !(marked_optional || optional_suffix)))
}

/// Type names used in requirements prose; unknown names read as string
fn requirement_type(token: &str) -> FieldType {
    let lower = token
        .trim()
        .trim_end_matches([',', ';', '.'])
        .to_ascii_lowercase();
    if lower.ends_with("[]") {
        return FieldType::Array;
    }
    let base = lower.split(['<', '[']).next().unwrap_or("");
    match base {
        "int" | "integer" | "long" | "int32" | "int64" => FieldType::Integer,
        "number" | "float" | "double" | "decimal" => FieldType::Number,
        "bool" | "boolean" => FieldType::Boolean,
        "array" | "list" => FieldType::Array,
        "object" | "map" | "dict" | "json" | "record" => FieldType::Object,
        _ => FieldType::String,
    }
}
