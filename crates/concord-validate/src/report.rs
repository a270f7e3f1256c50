//! Markdown validation reports
//!
//! Mismatches are sorted by severity (highest first), then by type, and
//! rendered as one table per non-empty severity tier. In redaction mode,
//! mismatches on sensitive paths lose their expected / actual / fix text
//! and path-shaped component names are cut to their final segment.

use crate::mismatch::{ContractMismatch, Severity, SeverityCounts};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

/// Line rendered for an empty mismatch list
pub const ALL_IN_SYNC: &str = "✅ No contract mismatches found. All components are in sync.";

/// Which paths count as sensitive and what replaces their details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionPolicy {
    /// Path prefixes (matched case-insensitively)
    pub prefixes: Vec<String>,
    /// Substrings anywhere in the path (matched case-insensitively)
    pub substrings: Vec<String>,
    /// Replacement text
    pub marker: String,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect();
        Self {
            prefixes: owned(&["/admin", "/internal", "/private", "/config"]),
            substrings: owned(&[
                "admin",
                "internal",
                "private",
                "config",
                "secret",
                "auth",
                "login",
                "logout",
                "password",
                "token",
                "key",
                "credentials",
            ]),
            marker: "[REDACTED]".to_string(),
        }
    }
}

impl RedactionPolicy {
    /// Whether `path` matches the denylist
    #[must_use]
    pub fn is_sensitive(&self, path: &str) -> bool {
        let lower = path.to_ascii_lowercase();
        self.prefixes
            .iter()
            .any(|p| lower.starts_with(&p.to_ascii_lowercase()))
            || self
                .substrings
                .iter()
                .any(|s| lower.contains(&s.to_ascii_lowercase()))
    }

    /// Copy with details hidden when the path is sensitive
    #[must_use]
    pub fn redact(&self, mismatch: &ContractMismatch) -> ContractMismatch {
        let mut out = mismatch.clone();
        if self.is_sensitive(&mismatch.path) {
            out.expected.clone_from(&self.marker);
            out.actual.clone_from(&self.marker);
            out.fix.clone_from(&self.marker);
            out.component_a = mask_component(&mismatch.component_a);
            out.component_b = mask_component(&mismatch.component_b);
        }
        out
    }
}

/// `/srv/app/api/handlers.go` -> `handlers.go`; plain names unchanged
fn mask_component(name: &str) -> String {
    if !name.contains(['/', '\\']) {
        return name.to_string();
    }
    name.rsplit(['/', '\\'])
        .find(|seg| !seg.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Escape a table cell
fn cell(text: &str) -> String {
    if text.is_empty() {
        return "-".to_string();
    }
    text.replace('|', "\\|").replace("\r\n", "<br>").replace('\n', "<br>")
}

/// Renders mismatch lists as markdown
#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    policy: RedactionPolicy,
}

impl ReportGenerator {
    /// Generator with a custom redaction policy
    #[inline]
    #[must_use]
    pub fn new(policy: RedactionPolicy) -> Self {
        Self { policy }
    }

    /// Active policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RedactionPolicy {
        &self.policy
    }

    /// Render a report; `redact` applies the policy
    #[must_use]
    pub fn generate_report(&self, mismatches: &[ContractMismatch], redact: bool) -> String {
        let mut out = String::from("# Contract Validation Report\n\n");
        if mismatches.is_empty() {
            out.push_str(ALL_IN_SYNC);
            out.push('\n');
            return out;
        }

        let mut sorted: Vec<ContractMismatch> = if redact {
            mismatches.iter().map(|m| self.policy.redact(m)).collect()
        } else {
            mismatches.to_vec()
        };
        sorted.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
        });

        let hidden = redact.then(|| {
            mismatches
                .iter()
                .filter(|m| self.policy.is_sensitive(&m.path))
                .count()
        });
        // String writes are infallible
        let _ = write_body(&mut out, &sorted, hidden);
        out
    }
}

fn write_body(
    out: &mut String,
    sorted: &[ContractMismatch],
    hidden: Option<usize>,
) -> fmt::Result {
    let counts = SeverityCounts::of(sorted);
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- Total mismatches: {}", counts.total())?;
    writeln!(out, "- Errors: {}", counts.errors)?;
    writeln!(out, "- Warnings: {}", counts.warnings)?;
    writeln!(out, "- Info: {}", counts.info)?;
    if let Some(hidden) = hidden {
        writeln!(out, "- Redacted: {hidden}")?;
    }

    for severity in [Severity::Error, Severity::Warning, Severity::Info] {
        let tier: Vec<&ContractMismatch> =
            sorted.iter().filter(|m| m.severity == severity).collect();
        if tier.is_empty() {
            continue;
        }
        writeln!(out, "\n## {severity} ({})\n", tier.len())?;
        out.push_str("| Type | Endpoint | Components | Expected | Actual | Fix |\n");
        out.push_str("|------|----------|------------|----------|--------|-----|\n");
        for m in tier {
            writeln!(
                out,
                "| {} | {} | {} → {} | {} | {} | {} |",
                m.kind,
                cell(&m.endpoint()),
                cell(&m.component_a),
                cell(&m.component_b),
                cell(&m.expected),
                cell(&m.actual),
                cell(&m.fix),
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mismatch::MismatchKind;
    use concord_contract::HttpMethod;

    fn mismatch(severity: Severity, kind: MismatchKind, path: &str) -> ContractMismatch {
        ContractMismatch::new(severity, kind, "web/src/api/client.ts", "backend")
            .at(path, Some(HttpMethod::Post))
            .described("expected detail", "actual detail", "fix detail")
    }

    #[test]
    fn empty_report_is_success_line_only() {
        let report = ReportGenerator::default().generate_report(&[], false);
        assert!(report.contains(ALL_IN_SYNC));
        assert!(!report.contains("## ERROR"));
        assert!(!report.contains("## WARNING"));
        assert!(!report.contains("## INFO"));
    }

    #[test]
    fn tiers_sorted_and_counted() {
        let report = ReportGenerator::default().generate_report(
            &[
                mismatch(Severity::Warning, MismatchKind::SchemaIncompatibility, "/users"),
                mismatch(Severity::Error, MismatchKind::InvalidContract, "/b"),
                mismatch(Severity::Error, MismatchKind::EndpointMismatch, "/a"),
            ],
            false,
        );
        assert!(report.contains("- Total mismatches: 3"));
        assert!(report.contains("## ERROR (2)"));
        assert!(report.contains("## WARNING (1)"));
        assert!(!report.contains("## INFO"));
        assert!(!report.contains("- Redacted"));
        let error_at = report.find("## ERROR").unwrap();
        let warning_at = report.find("## WARNING").unwrap();
        assert!(error_at < warning_at);
        let endpoint_at = report.find("| endpoint_mismatch |").unwrap();
        let invalid_at = report.find("| invalid_contract |").unwrap();
        assert!(endpoint_at < invalid_at);
    }

    #[test]
    fn redaction_only_touches_sensitive_paths() {
        let report = ReportGenerator::default().generate_report(
            &[
                mismatch(Severity::Error, MismatchKind::EndpointMismatch, "/admin/users"),
                mismatch(Severity::Error, MismatchKind::EndpointMismatch, "/products"),
            ],
            true,
        );
        let admin_row = report.lines().find(|l| l.contains("/admin/users")).unwrap();
        assert!(admin_row.contains("[REDACTED]"));
        assert!(admin_row.contains("| client.ts → backend |"));
        assert!(!admin_row.contains("expected detail"));

        let product_row = report.lines().find(|l| l.contains("/products")).unwrap();
        assert!(product_row.contains("expected detail"));
        assert!(product_row.contains("web/src/api/client.ts"));
        assert!(report.contains("- Redacted: 1"));
    }

    #[test]
    fn sensitive_matching() {
        let policy = RedactionPolicy::default();
        assert!(policy.is_sensitive("/Config/flags"));
        assert!(policy.is_sensitive("/v1/auth/refresh"));
        assert!(policy.is_sensitive("/api/keys"));
        assert!(!policy.is_sensitive("/users/{id}"));
    }

    #[test]
    fn cells_are_escaped() {
        assert_eq!(cell("a|b\nc"), "a\\|b<br>c");
        assert_eq!(cell(""), "-");
        assert_eq!(mask_component("C:\\work\\api\\"), "api");
        assert_eq!(mask_component("backend"), "backend");
    }
}
