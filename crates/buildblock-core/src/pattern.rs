//! Full-match name patterns that never fail.
//!
//! Operator-supplied patterns may be malformed. Compilation failures are
//! recorded on the [`CompiledPattern`] and the pattern then matches nothing.

use regex::{Regex, RegexBuilder};

/// Upper bound on the compiled program size of a single pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// A pattern line together with its compiled full-match form.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Option<Regex>,
}

impl CompiledPattern {
    /// Compile `source` as an anchored, case-sensitive full match.
    ///
    /// The raw pattern is validated on its own before being wrapped, so a
    /// line like `a)|(b` cannot escape the anchors.
    pub fn compile(source: &str) -> Self {
        let regex = build(source)
            .and_then(|_| build(&format!("^(?:{})$", source)))
            .ok();
        Self {
            source: source.to_string(),
            regex,
        }
    }

    /// The pattern text as configured.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether compilation failed.
    pub fn is_invalid(&self) -> bool {
        self.regex.is_none()
    }

    /// Whether the pattern matches all of `text`. Invalid patterns never match.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(text))
    }
}

fn build(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
}

/// One-shot full match of `pattern` against `text`; `false` if the pattern
/// does not compile.
pub fn try_match(pattern: &str, text: &str) -> bool {
    CompiledPattern::compile(pattern).matches(text)
}
