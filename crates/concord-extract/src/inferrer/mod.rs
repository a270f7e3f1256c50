//! Schema inference from type declarations
//!
//! Given a type name and the source text that declares it, produce an
//! ordered [`SchemaSpec`]. Three declaration styles are understood:
//! - Go `type Name struct { ... }` with `json` tags
//! - TypeScript `interface Name { ... }` / `type Name = { ... }`
//! - doc comments with `@param` tags (JSDoc blocks, Python docstrings)
//!
//! A type that is simply absent yields [`ExtractError::NotFound`] so callers
//! can skip it; a declaration whose body cannot be parsed is
//! [`ExtractError::Malformed`].

use crate::analyzer::SourceLanguage;
use crate::error::{ExtractError, Result};
use crate::limits::ExtractLimits;
use crate::pattern::GuardedPattern;
use concord_contract::{FieldSpec, FieldType, Sanitizer, SchemaSpec};

mod doc;
mod go;
mod typescript;

/// Field as read from source, before name sanitization
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawField {
    name: String,
    kind: FieldType,
    required: bool,
}

impl RawField {
    fn new(name: impl Into<String>, kind: FieldType, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
        }
    }
}

/// Type-declaration to field-list inferrer
#[derive(Debug, Clone)]
pub struct SchemaInferrer {
    limits: ExtractLimits,
    sanitizer: Sanitizer,
    go_struct: GuardedPattern,
    ts_declaration: GuardedPattern,
    jsdoc_block: GuardedPattern,
    py_declaration: GuardedPattern,
}

impl SchemaInferrer {
    /// Compile and self-test patterns
    ///
    /// # Errors
    /// [`ExtractError::PatternRejected`] if a pattern fails its self-test.
    pub fn new(limits: ExtractLimits, sanitizer: Sanitizer) -> Result<Self> {
        let go_struct = GuardedPattern::compile(
            "infer.go_struct",
            r"\btype\s+(\w+)\s+struct\s*\{",
            &limits,
        )?;
        let ts_declaration = GuardedPattern::compile(
            "infer.ts_declaration",
            r"\b(?:interface\s+(\w+)(?:\s*<[^>{]*>)?(?:\s+extends\s+[^{]+)?\s*\{|type\s+(\w+)(?:\s*<[^>{=]*>)?\s*=\s*\{)",
            &limits,
        )?;
        let jsdoc_block = GuardedPattern::compile(
            "infer.jsdoc_block",
            r"(?s)/\*\*(.*?)\*/\s*(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:async\s+)?(?:function\*?|class|const|let|var|interface|type)\s+(\w+)",
            &limits,
        )?;
        let py_declaration = GuardedPattern::compile(
            "infer.py_declaration",
            r"(?m)^[ \t]*(?:async[ \t]+)?(?:def|class)[ \t]+(\w+)\b",
            &limits,
        )?;
        Ok(Self {
            limits,
            sanitizer,
            go_struct,
            ts_declaration,
            jsdoc_block,
            py_declaration,
        })
    }

    /// Infer the field list of `type_name` declared in `source`
    ///
    /// TypeScript falls back to a JSDoc block when no interface or type
    /// alias matches; Python reads the docstring of a `def` or `class`.
    ///
    /// # Errors
    /// - [`ExtractError::Sanitize`] for an invalid type name
    /// - [`ExtractError::TooLarge`] for oversized source
    /// - [`ExtractError::NotFound`] when the type is absent
    /// - [`ExtractError::Malformed`] for an unbalanced body
    /// - [`ExtractError::TooManyFields`] past the field cap
    pub fn infer(
        &self,
        language: SourceLanguage,
        source: &str,
        type_name: &str,
    ) -> Result<SchemaSpec> {
        let name = self.sanitizer.sanitize_field_name(type_name)?;
        let max = self.limits.max_source_bytes();
        if source.len() > max {
            return Err(ExtractError::TooLarge {
                what: "source",
                size: source.len() as u64,
                max: max as u64,
            });
        }

        let raw = match language {
            SourceLanguage::Go => go::infer_struct(self.go_struct.regex(), source, &name)?,
            SourceLanguage::TypeScript => {
                match typescript::infer_declaration(self.ts_declaration.regex(), source, &name) {
                    Err(err) if err.is_not_found() => {
                        doc::infer_jsdoc(self.jsdoc_block.regex(), source, &name)?
                    }
                    other => other?,
                }
            }
            SourceLanguage::Python => {
                doc::infer_docstring(self.py_declaration.regex(), source, &name)?
            }
        };

        let spec = self.finish(&name, raw)?;
        tracing::debug!(type_name = %name, %language, fields = spec.len(), "schema inferred");
        Ok(spec)
    }

    /// Sanitize names, drop rejects, enforce the field cap
    fn finish(&self, type_name: &str, raw: Vec<RawField>) -> Result<SchemaSpec> {
        let mut fields = Vec::with_capacity(raw.len());
        for field in raw {
            match self.sanitizer.sanitize_field_name(&field.name) {
                Ok(name) => fields.push(FieldSpec {
                    name,
                    kind: field.kind,
                    required: field.required,
                }),
                Err(err) => {
                    tracing::debug!(type_name, field = %field.name, error = %err, "dropping field");
                }
            }
        }
        if fields.len() > self.limits.max_fields {
            return Err(ExtractError::TooManyFields {
                count: fields.len(),
                max: self.limits.max_fields,
            });
        }
        Ok(SchemaSpec::new(fields))
    }
}

/// Text between the `{` at `open` and its matching `}`
///
/// Braces inside string literals and comments are ignored. A `"` or `'`
/// literal never spans lines.
fn braced_body(source: &str, open: usize) -> Option<&str> {
    let bytes = source.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = source[i..].find('\n').map_or(bytes.len(), |n| i + n);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = source[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |n| i + 2 + n + 2);
                continue;
            }
            q @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while let Some(&c) = bytes.get(i) {
                    if c == q || (c == b'\n' && q != b'`') {
                        break;
                    }
                    if c == b'\\' && q != b'`' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[open + 1..i]);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split on any of `separators` outside brackets and quotes
fn split_top_level<'s>(text: &'s str, separators: &[char]) -> Vec<&'s str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut prev = '\0';
    for (idx, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q && prev != '\\' {
                quote = None;
            }
        } else {
            match c {
                '"' | '\'' | '`' => quote = Some(c),
                '{' | '(' | '[' | '<' => depth += 1,
                '>' if prev == '=' => {}
                '}' | ')' | ']' | '>' => depth = depth.saturating_sub(1),
                _ if depth == 0 && separators.contains(&c) => {
                    parts.push(&text[start..idx]);
                    start = idx + c.len_utf8();
                }
                _ => {}
            }
        }
        prev = c;
    }
    parts.push(&text[start..]);
    parts
}

/// First union member that is not `null` / `undefined` / `None`
fn primary_union_member(ty: &str) -> &str {
    split_top_level(ty, &['|'])
        .into_iter()
        .map(str::trim)
        .find(|t| !t.is_empty() && !matches!(*t, "null" | "undefined" | "None" | "none" | "void"))
        .unwrap_or("")
}
