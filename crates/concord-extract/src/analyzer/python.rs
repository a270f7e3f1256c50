//! Python SDK surface: public class methods and HTTP calls

use super::{group, Collector, LanguageExtractor, SourceLanguage, SourceLine};
use crate::error::Result;
use crate::limits::ExtractLimits;
use crate::pattern::GuardedPattern;

/// Class method and SDK call extractor
#[derive(Debug, Clone)]
pub struct PythonExtractor {
    class_decl: GuardedPattern,
    def_decl: GuardedPattern,
    return_annotation: GuardedPattern,
    requests_call: GuardedPattern,
    request_helper: GuardedPattern,
}

impl PythonExtractor {
    /// Compile and self-test patterns
    ///
    /// # Errors
    /// Pattern self-test failure.
    pub fn new(limits: &ExtractLimits) -> Result<Self> {
        Ok(Self {
            class_decl: GuardedPattern::compile(
                "py.class_decl",
                r"^(\s*)class\s+(\w+)",
                limits,
            )?,
            def_decl: GuardedPattern::compile(
                "py.def_decl",
                r"^(\s*)(?:async\s+)?def\s+(\w+)\s*\(",
                limits,
            )?,
            return_annotation: GuardedPattern::compile(
                "py.return_annotation",
                r"\)\s*->\s*([^:]+?)\s*:\s*(?:#.*)?$",
                limits,
            )?,
            requests_call: GuardedPattern::compile(
                "py.requests_call",
                r#"\b(requests|httpx|session|client)\.(get|post|put|patch|delete|head|options)\(\s*f?['"]([^'"]+)['"]"#,
                limits,
            )?,
            request_helper: GuardedPattern::compile(
                "py.request_helper",
                r#"\bself\.(?:_request|request|_call)\(\s*['"](\w+)['"]\s*,\s*f?['"]([^'"]+)['"]"#,
                limits,
            )?,
        })
    }
}

/// Enclosing class while scanning
struct ClassScope {
    indent: usize,
    name: String,
    /// Indent of the first `def` in the body; deeper defs are nested helpers
    method_indent: Option<usize>,
}

fn indent_of(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

impl LanguageExtractor for PythonExtractor {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Python
    }

    fn extract(&self, lines: &[SourceLine<'_>], out: &mut Collector<'_>) {
        let mut class: Option<ClassScope> = None;

        for (number, text) in lines {
            let trimmed = text.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let indent = indent_of(text);
            if class.as_ref().is_some_and(|scope| indent <= scope.indent) {
                class = None;
            }

            if let Some(caps) = self.class_decl.regex().captures(text) {
                class = Some(ClassScope {
                    indent: group(&caps, 1).len(),
                    name: group(&caps, 2).to_string(),
                    method_indent: None,
                });
                continue;
            }

            if let Some(caps) = self.def_decl.regex().captures(text) {
                let name = group(&caps, 2);
                if let Some(scope) = class.as_mut() {
                    let method_indent = *scope.method_indent.get_or_insert(indent);
                    if indent == method_indent && !name.starts_with('_') {
                        let returns = self
                            .return_annotation
                            .regex()
                            .captures(text)
                            .map(|c| group(&c, 1).trim().to_string());
                        out.method(
                            name,
                            returns.as_deref(),
                            Some(scope.name.as_str()),
                            *number,
                        );
                    }
                }
            }

            for caps in self.requests_call.regex().captures_iter(text) {
                out.call(group(&caps, 3), group(&caps, 2), *number, group(&caps, 1));
            }
            for caps in self.request_helper.regex().captures_iter(text) {
                out.call(group(&caps, 2), group(&caps, 1), *number, "request");
            }
        }
    }
}
