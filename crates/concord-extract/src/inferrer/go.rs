//! Go struct declarations

use super::{braced_body, RawField};
use crate::error::{ExtractError, Result};
use concord_contract::FieldType;
use regex::Regex;

pub(super) fn infer_struct(decl: &Regex, source: &str, name: &str) -> Result<Vec<RawField>> {
    let caps = decl
        .captures_iter(source)
        .find(|c| c.get(1).is_some_and(|m| m.as_str() == name))
        .ok_or_else(|| ExtractError::not_found("struct", name))?;
    let Some(whole) = caps.get(0) else {
        return Err(ExtractError::not_found("struct", name));
    };
    let body = braced_body(source, whole.end() - 1)
        .ok_or_else(|| ExtractError::malformed(name, "unbalanced braces in struct body"))?;
    Ok(parse_body(body))
}

fn parse_body(body: &str) -> Vec<RawField> {
    let mut fields: Vec<RawField> = Vec::new();
    let mut depth = 0usize;
    // index of the field whose anonymous struct body we are inside
    let mut nested_owner: Option<Option<usize>> = None;

    for line in body.lines() {
        let (decl, tag) = split_tag(line);
        let opens = decl.matches('{').count();
        let closes = decl.matches('}').count();

        if depth == 0 {
            let before = fields.len();
            parse_line(decl, tag, &mut fields);
            if opens > closes {
                nested_owner = Some((fields.len() > before).then(|| fields.len() - 1));
            }
        }

        depth = (depth + opens).saturating_sub(closes);
        if depth == 0 {
            // `} `json:"address"`` closes an anonymous struct field
            if let (Some(owner), Some(tag)) = (nested_owner.take(), tag) {
                if let Some(idx) = owner {
                    match json_name(tag) {
                        Some(JsonName::Skip) => {
                            fields.remove(idx);
                        }
                        Some(JsonName::Rename(renamed)) => fields[idx].name = renamed,
                        None => {}
                    }
                }
            }
        }
    }
    fields
}

/// Split off a backtick struct tag and any trailing comment
fn split_tag(line: &str) -> (&str, Option<&str>) {
    if let Some(start) = line.find('`') {
        let rest = &line[start + 1..];
        let tag = rest.find('`').map(|end| &rest[..end]);
        return (&line[..start], tag);
    }
    let decl = line.find("//").map_or(line, |idx| &line[..idx]);
    (decl, None)
}

fn parse_line(decl: &str, tag: Option<&str>, fields: &mut Vec<RawField>) {
    let mut tokens = decl.split_whitespace();
    let mut names = Vec::new();
    for token in tokens.by_ref() {
        match token.strip_suffix(',') {
            Some(name) => names.push(name),
            None => {
                names.push(token);
                break;
            }
        }
    }
    let ty = tokens.collect::<Vec<_>>().join(" ");
    if ty.is_empty() || names.is_empty() {
        // embedded type or blank line
        return;
    }

    let json = tag.and_then(json_name);
    if matches!(json, Some(JsonName::Skip)) {
        return;
    }
    let kind = go_type(&ty);

    for name in names {
        if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
            continue;
        }
        let wire = match &json {
            // a json name only makes sense for a single-name declaration
            Some(JsonName::Rename(n)) if decl.matches(',').count() == 0 => n.clone(),
            _ => name.to_string(),
        };
        fields.push(RawField::new(wire, kind, true));
    }
}

enum JsonName {
    Skip,
    Rename(String),
}

fn json_name(tag: &str) -> Option<JsonName> {
    let start = tag.find("json:\"")? + "json:\"".len();
    let value = &tag[start..];
    let value = &value[..value.find('"')?];
    let mut parts = value.split(',');
    let name = parts.next().unwrap_or("");
    match name {
        "-" if parts.next().is_none() => Some(JsonName::Skip),
        "" => None,
        other => Some(JsonName::Rename(other.to_string())),
    }
}

fn go_type(ty: &str) -> FieldType {
    let ty = ty.trim().trim_start_matches('*');
    if ty == "[]byte" {
        return FieldType::String;
    }
    if ty.starts_with('[') {
        return FieldType::Array;
    }
    if ty.starts_with("map[") {
        return FieldType::Object;
    }
    match ty {
        "string" | "time.Time" => FieldType::String,
        "bool" => FieldType::Boolean,
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32"
        | "uint64" | "uintptr" | "byte" | "rune" => FieldType::Integer,
        "float32" | "float64" => FieldType::Number,
        _ => FieldType::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::inferrer;
    use crate::analyzer::SourceLanguage;
    use concord_contract::{FieldSpec, FieldType};
    use pretty_assertions::assert_eq;

    const MODELS: &str = r#"package models

import "time"

// User is an account.
type User struct {
	ID        int64             `json:"id"`
	Email     string            `json:"email,omitempty"`
	Nickname  *string           `json:"nickname"`
	Tags      []string          `json:"tags"`
	Avatar    []byte            `json:"avatar"`
	Meta      map[string]string `json:"meta"`
	Score     float64           // no tag
	Active    bool              `json:"active"`
	CreatedAt time.Time         `json:"created_at"`
	Password  string            `json:"-"`
	internal  string
	BaseModel
	Address struct {
		City string `json:"city"`
	} `json:"address"`
	Owner     Account `json:"owner"`
}

type Empty struct{}
"#;

    #[test]
    fn struct_fields_with_tags() {
        let spec = inferrer().infer(SourceLanguage::Go, MODELS, "User").unwrap();
        let expected = vec![
            FieldSpec::required("id", FieldType::Integer),
            FieldSpec::required("email", FieldType::String),
            FieldSpec::required("nickname", FieldType::String),
            FieldSpec::required("tags", FieldType::Array),
            FieldSpec::required("avatar", FieldType::String),
            FieldSpec::required("meta", FieldType::Object),
            FieldSpec::required("Score", FieldType::Number),
            FieldSpec::required("active", FieldType::Boolean),
            FieldSpec::required("created_at", FieldType::String),
            FieldSpec::required("address", FieldType::Object),
            FieldSpec::required("owner", FieldType::Object),
        ];
        assert_eq!(spec.fields, expected);
    }

    #[test]
    fn empty_struct() {
        let spec = inferrer().infer(SourceLanguage::Go, MODELS, "Empty").unwrap();
        assert!(spec.is_empty());
    }

    #[test]
    fn multi_name_declaration() {
        let src = "type Point struct {\n\tX, Y float64\n\tlabel string\n}\n";
        let spec = inferrer().infer(SourceLanguage::Go, src, "Point").unwrap();
        let names: Vec<_> = spec.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["X", "Y"]);
    }

    #[test]
    fn unbalanced_is_malformed() {
        let err = inferrer()
            .infer(SourceLanguage::Go, "type Broken struct {\n\tA int\n", "Broken")
            .unwrap_err();
        assert!(matches!(err, crate::ExtractError::Malformed { .. }));
    }
}
