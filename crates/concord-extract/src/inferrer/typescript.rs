//! TypeScript interfaces and object type aliases

use super::{braced_body, primary_union_member, split_top_level, RawField};
use crate::error::{ExtractError, Result};
use concord_contract::FieldType;
use regex::Regex;

pub(super) fn infer_declaration(
    decl: &Regex,
    source: &str,
    name: &str,
) -> Result<Vec<RawField>> {
    let caps = decl
        .captures_iter(source)
        .find(|c| {
            c.get(1)
                .or_else(|| c.get(2))
                .is_some_and(|m| m.as_str() == name)
        })
        .ok_or_else(|| ExtractError::not_found("interface", name))?;
    let Some(whole) = caps.get(0) else {
        return Err(ExtractError::not_found("interface", name));
    };
    let body = braced_body(source, whole.end() - 1)
        .ok_or_else(|| ExtractError::malformed(name, "unbalanced braces in type body"))?;
    Ok(parse_members(&strip_comments(body)))
}

/// Remove `//` and `/* */` comments outside string literals
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;
    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            ('"' | '\'' | '`', _) => {
                quote = Some(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

fn parse_members(body: &str) -> Vec<RawField> {
    split_top_level(body, &[';', ',', '\n'])
        .into_iter()
        .filter_map(parse_member)
        .collect()
}

fn parse_member(member: &str) -> Option<RawField> {
    let member = member.trim();
    let member = member.strip_prefix("readonly ").unwrap_or(member).trim_start();
    if member.is_empty() || member.starts_with('[') {
        // index signature
        return None;
    }
    let colon = member.find(':')?;
    let head = member[..colon].trim();
    if head.contains('(') || head.contains('<') {
        // method signature
        return None;
    }
    let (name, required) = match head.strip_suffix('?') {
        Some(name) => (name.trim_end(), false),
        None => (head, true),
    };
    let ty = member[colon + 1..].trim();
    Some(RawField::new(name, ts_type(ty), required))
}

fn ts_type(ty: &str) -> FieldType {
    let ty = primary_union_member(ty);
    if ty.ends_with("[]")
        || ty.starts_with("Array<")
        || ty.starts_with("ReadonlyArray<")
        || ty.starts_with('[')
    {
        return FieldType::Array;
    }
    if ty.starts_with('{') || ty.starts_with("Record<") || ty.starts_with("Map<") {
        return FieldType::Object;
    }
    if ty.starts_with(['"', '\'', '`']) {
        return FieldType::String;
    }
    match ty {
        "string" | "Date" => FieldType::String,
        "number" => FieldType::Number,
        "bigint" => FieldType::Integer,
        "boolean" | "true" | "false" => FieldType::Boolean,
        other if other.parse::<f64>().is_ok() => FieldType::Number,
        _ => FieldType::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::inferrer;
    use super::*;
    use crate::analyzer::SourceLanguage;
    use concord_contract::FieldSpec;
    use pretty_assertions::assert_eq;

    const TYPES: &str = r#"
export interface User extends Base {
  id: number;
  email: string; // the user's address
  nickname?: string | null;
  readonly roles: Role[];
  settings: { theme: string; compact: boolean };
  /* legacy */ status: 'active' | 'banned',
  big: bigint
  createdAt: Date;
  tags: Array<string>;
  attrs: Record<string, unknown>;
  flag: true;
  onChange(value: string): void;
  [key: string]: unknown;
  owner: Account;
}

export type NewUser = {
  email: string;
  age?: number;
};
"#;

    #[test]
    fn interface_members() {
        let spec = inferrer()
            .infer(SourceLanguage::TypeScript, TYPES, "User")
            .unwrap();
        let expected = vec![
            FieldSpec::required("id", FieldType::Number),
            FieldSpec::required("email", FieldType::String),
            FieldSpec::optional("nickname", FieldType::String),
            FieldSpec::required("roles", FieldType::Array),
            FieldSpec::required("settings", FieldType::Object),
            FieldSpec::required("status", FieldType::String),
            FieldSpec::required("big", FieldType::Integer),
            FieldSpec::required("createdAt", FieldType::String),
            FieldSpec::required("tags", FieldType::Array),
            FieldSpec::required("attrs", FieldType::Object),
            FieldSpec::required("flag", FieldType::Boolean),
            FieldSpec::required("owner", FieldType::Object),
        ];
        assert_eq!(spec.fields, expected);
    }

    #[test]
    fn type_alias_object() {
        let spec = inferrer()
            .infer(SourceLanguage::TypeScript, TYPES, "NewUser")
            .unwrap();
        assert_eq!(
            spec.fields,
            vec![
                FieldSpec::required("email", FieldType::String),
                FieldSpec::optional("age", FieldType::Number),
            ]
        );
    }

    #[test]
    fn comments_removed() {
        assert_eq!(strip_comments("a // x\nb /* y */c"), "a \nb c");
        assert_eq!(strip_comments("s: '//not'"), "s: '//not'");
    }

    #[test]
    fn literal_types() {
        assert_eq!(ts_type("42"), FieldType::Number);
        assert_eq!(ts_type("`tpl`"), FieldType::String);
        assert_eq!(ts_type("[string, number]"), FieldType::Array);
        assert_eq!(ts_type("undefined | boolean"), FieldType::Boolean);
        assert_eq!(ts_type("Partial<User>"), FieldType::Object);
    }
}
