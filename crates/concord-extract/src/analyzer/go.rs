//! Go route registration

use super::{group, Collector, LanguageExtractor, SourceLanguage, SourceLine};
use crate::error::Result;
use crate::limits::ExtractLimits;
use crate::pattern::GuardedPattern;

/// gin / echo / mux / net/http route extractor
#[derive(Debug, Clone)]
pub struct GoExtractor {
    verb_route: GuardedPattern,
    handle_route: GuardedPattern,
    methods_call: GuardedPattern,
    quoted_word: GuardedPattern,
}

impl GoExtractor {
    /// Compile and self-test patterns
    ///
    /// # Errors
    /// Pattern self-test failure.
    pub fn new(limits: &ExtractLimits) -> Result<Self> {
        Ok(Self {
            verb_route: GuardedPattern::compile(
                "go.verb_route",
                r#"\b\w+\.(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS)\(\s*"([^"]*)""#,
                limits,
            )?,
            handle_route: GuardedPattern::compile(
                "go.handle_route",
                r#"\.(?:HandleFunc|Handle)\(\s*"([^"]*)""#,
                limits,
            )?,
            methods_call: GuardedPattern::compile(
                "go.methods_call",
                r"\.?\bMethods\(([^)]*)\)",
                limits,
            )?,
            quoted_word: GuardedPattern::compile("go.quoted_word", r#""(\w+)""#, limits)?,
        })
    }

    fn method_list(&self, text: &str) -> Vec<String> {
        self.methods_call
            .regex()
            .captures(text)
            .map(|caps| {
                self.quoted_word
                    .regex()
                    .captures_iter(group(&caps, 1))
                    .map(|m| group(&m, 1).to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn detect_framework(lines: &[SourceLine<'_>]) -> (&'static str, &'static str) {
    let mut verb = "gin";
    let mut handle = "net/http";
    for (_, text) in lines {
        if text.contains("labstack/echo") {
            verb = "echo";
        } else if text.contains("gin-gonic/gin") {
            verb = "gin";
        } else if text.contains("gorilla/mux") {
            handle = "mux";
        }
    }
    (verb, handle)
}

impl LanguageExtractor for GoExtractor {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Go
    }

    fn extract(&self, lines: &[SourceLine<'_>], out: &mut Collector<'_>) {
        let (verb_framework, handle_framework) = detect_framework(lines);

        for (idx, (number, text)) in lines.iter().enumerate() {
            if text.trim_start().starts_with("//") {
                continue;
            }

            for caps in self.verb_route.regex().captures_iter(text) {
                out.route(group(&caps, 2), group(&caps, 1), *number, verb_framework);
            }

            for caps in self.handle_route.regex().captures_iter(text) {
                let pattern = group(&caps, 1);
                // Go 1.22 style: "GET /users/{id}"
                if let Some((method, path)) = pattern.split_once(' ') {
                    out.route(path.trim(), method, *number, handle_framework);
                    continue;
                }
                let mut methods = self.method_list(text);
                if methods.is_empty() {
                    if let Some((_, next)) = lines.get(idx + 1) {
                        if next.trim_start().starts_with(".Methods(")
                            || next.trim_start().starts_with("Methods(")
                        {
                            methods = self.method_list(next);
                        }
                    }
                }
                if methods.is_empty() {
                    out.route(pattern, "GET", *number, handle_framework);
                }
                for method in &methods {
                    out.route(pattern, method, *number, handle_framework);
                }
            }
        }
    }
}
