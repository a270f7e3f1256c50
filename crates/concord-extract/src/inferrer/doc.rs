//! Doc-comment `@param` blocks: JSDoc and Python docstrings

use super::{primary_union_member, RawField};
use crate::error::{ExtractError, Result};
use concord_contract::FieldType;
use regex::Regex;

pub(super) fn infer_jsdoc(block: &Regex, source: &str, name: &str) -> Result<Vec<RawField>> {
    block
        .captures_iter(source)
        .find(|c| c.get(2).is_some_and(|m| m.as_str() == name))
        .and_then(|c| c.get(1))
        // a lazy match can swallow earlier blocks; keep only the last one
        .map(|m| parse_params(m.as_str().rsplit("/**").next().unwrap_or("")))
        .ok_or_else(|| ExtractError::not_found("doc comment", name))
}

pub(super) fn infer_docstring(decl: &Regex, source: &str, name: &str) -> Result<Vec<RawField>> {
    let whole = decl
        .captures_iter(source)
        .find(|c| c.get(1).is_some_and(|m| m.as_str() == name))
        .and_then(|c| c.get(0))
        .ok_or_else(|| ExtractError::not_found("def or class", name))?;
    let after = &source[whole.end()..];
    let docstring =
        docstring_after_header(after).ok_or_else(|| ExtractError::not_found("docstring", name))?;
    Ok(parse_params(docstring))
}

/// Docstring following a (possibly multi-line) `def ...:` header
fn docstring_after_header(after: &str) -> Option<&str> {
    let mut offset = 0;
    let mut header_done = false;
    for line in after.split_inclusive('\n') {
        offset += line.len();
        let code = line.split('#').next().unwrap_or("").trim_end();
        if code.ends_with(':') {
            header_done = true;
            break;
        }
    }
    if !header_done {
        return None;
    }
    let body = after[offset..].trim_start();
    let body = body.trim_start_matches(['r', 'R', 'u', 'U']);
    let delim = ["\"\"\"", "'''"].into_iter().find(|d| body.starts_with(d))?;
    let inner = &body[delim.len()..];
    inner.find(delim).map(|end| &inner[..end])
}

fn parse_params(block: &str) -> Vec<RawField> {
    block
        .lines()
        .filter_map(|line| {
            let line = line.trim().trim_start_matches('*').trim();
            ["@param", "@argument", "@arg"]
                .into_iter()
                .find_map(|tag| line.strip_prefix(tag))
                .filter(|rest| rest.starts_with(char::is_whitespace))
                .and_then(parse_param)
        })
        .collect()
}

/// `{type} name`, `name (type)`, `name: type` or bare `name`
fn parse_param(rest: &str) -> Option<RawField> {
    let rest = rest.trim();
    let (ty, after) = if let Some(inner) = rest.strip_prefix('{') {
        let close = matching_close(inner, '{', '}')?;
        (Some(&inner[..close]), inner[close + 1..].trim_start())
    } else {
        (None, rest)
    };

    let token_end = after
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or(after.len());
    let token = &after[..token_end];
    let tail = after[token_end..].trim_start();

    let (name, ty) = match ty {
        Some(ty) => (token, Some(ty)),
        None => {
            if let Some(name) = token.strip_suffix(':') {
                (name, tail.split_whitespace().next())
            } else if let Some(inner) = tail.strip_prefix('(') {
                let close = matching_close(inner, '(', ')')?;
                (token, Some(&inner[..close]))
            } else if let Some(t) = tail.strip_prefix(':') {
                (token, t.split_whitespace().next())
            } else {
                (token, None)
            }
        }
    };

    let name = optional_brackets(name);
    if name.is_empty() || name == "self" || name == "cls" {
        return None;
    }
    let kind = ty.map_or(FieldType::Object, doc_type);
    Some(RawField::new(name, kind, true))
}

/// `[name]` / `[name=default]` -> `name`
fn optional_brackets(name: &str) -> &str {
    let name = name.trim_end_matches([',', '-', ':']);
    match name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
        Some(inner) => inner.split('=').next().unwrap_or("").trim(),
        None => name,
    }
}

fn matching_close(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            if depth == 0 {
                return Some(idx);
            }
            depth -= 1;
        }
    }
    None
}

fn doc_type(ty: &str) -> FieldType {
    let member = primary_union_member(ty.trim().trim_matches(['?', '!', '=']));
    let lower = member.trim_end_matches(['?', '=', ',']).to_ascii_lowercase();
    if lower.ends_with("[]") {
        return FieldType::Array;
    }
    let base = lower
        .split(['[', '<', '.'])
        .next()
        .unwrap_or("")
        .trim();
    match base {
        "array" | "list" | "tuple" | "sequence" => FieldType::Array,
        "string" | "str" => FieldType::String,
        "int" | "integer" | "long" | "bigint" => FieldType::Integer,
        "number" | "float" | "double" | "decimal" => FieldType::Number,
        "bool" | "boolean" => FieldType::Boolean,
        _ => FieldType::Object,
    }
}
