//! TypeScript / JavaScript HTTP client calls

use super::{group, Collector, LanguageExtractor, SourceLanguage, SourceLine};
use crate::error::Result;
use crate::limits::ExtractLimits;
use crate::pattern::GuardedPattern;

/// Lines after a `fetch(` searched for its `method:` option
const FETCH_LOOKAHEAD: usize = 5;

/// `fetch` / `axios` call extractor
#[derive(Debug, Clone)]
pub struct TypeScriptExtractor {
    fetch_call: GuardedPattern,
    method_option: GuardedPattern,
    axios_call: GuardedPattern,
}

impl TypeScriptExtractor {
    /// Compile and self-test patterns
    ///
    /// # Errors
    /// Pattern self-test failure.
    pub fn new(limits: &ExtractLimits) -> Result<Self> {
        Ok(Self {
            fetch_call: GuardedPattern::compile(
                "ts.fetch_call",
                r#"\bfetch\(\s*['"`]([^'"`]+)['"`]"#,
                limits,
            )?,
            method_option: GuardedPattern::compile(
                "ts.method_option",
                r#"\bmethod\s*:\s*['"`](\w+)['"`]"#,
                limits,
            )?,
            axios_call: GuardedPattern::compile(
                "ts.axios_call",
                r#"\baxios\.(get|post|put|patch|delete|head|options)\s*(?:<[^>()]*>)?\(\s*['"`]([^'"`]+)['"`]"#,
                limits,
            )?,
        })
    }

    /// `method:` for the fetch starting at `start`, searching at most
    /// [`FETCH_LOOKAHEAD`] following lines and stopping at the next fetch
    fn fetch_method<'s>(&self, lines: &[SourceLine<'s>], start: usize, tail: &'s str) -> &'s str {
        if let Some(caps) = self.method_option.regex().captures(tail) {
            return group(&caps, 1);
        }
        for &(_, text) in lines.iter().skip(start + 1).take(FETCH_LOOKAHEAD) {
            if self.fetch_call.regex().is_match(text) {
                break;
            }
            if let Some(caps) = self.method_option.regex().captures(text) {
                return group(&caps, 1);
            }
        }
        "GET"
    }
}

impl LanguageExtractor for TypeScriptExtractor {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::TypeScript
    }

    fn extract(&self, lines: &[SourceLine<'_>], out: &mut Collector<'_>) {
        for (idx, (number, text)) in lines.iter().enumerate() {
            let trimmed = text.trim_start();
            if trimmed.starts_with("//") || trimmed.starts_with('*') {
                continue;
            }

            for caps in self.fetch_call.regex().captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let method = self.fetch_method(lines, idx, &text[whole.end()..]);
                out.call(group(&caps, 1), method, *number, "fetch");
            }

            for caps in self.axios_call.regex().captures_iter(text) {
                out.call(group(&caps, 2), group(&caps, 1), *number, "axios");
            }
        }
    }
}
