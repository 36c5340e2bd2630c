//! Matchers: the capability that turns a scan target into match results.
//!
//! Text-based and structural (parsed-source) matchers share one contract,
//! [`Matcher::find`], so regex rules and AST rules compose uniformly.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;

use crate::target::{FileMetadata, ScanTarget};
use crate::types::Severity;

/// A single match produced by a matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Line number (1-indexed, `0` for file-level matches).
    pub line: usize,
    /// Column number (1-indexed), when known.
    pub column: Option<usize>,
    /// Severity chosen at match time, overriding the rule's severity.
    pub severity: Option<Severity>,
    /// Message overriding the rule's template.
    pub message: Option<String>,
    /// Contextual data available to the message template as `{key}`.
    pub data: BTreeMap<String, String>,
}

impl MatchResult {
    /// Creates a match on the given line.
    #[must_use]
    pub fn new(line: usize) -> Self {
        Self {
            line,
            column: None,
            severity: None,
            message: None,
            data: BTreeMap::new(),
        }
    }

    /// Creates a match from a `syn` span.
    #[must_use]
    pub fn from_span(span: proc_macro2::Span) -> Self {
        let start = span.start();
        Self::new(start.line).with_column(start.column + 1)
    }

    /// Sets the column.
    #[must_use]
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    /// Overrides the severity for this match.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Overrides the rendered message for this match.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a template value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Returns a template value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

/// A matcher failed while evaluating a file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleExecutionError {
    /// The source could not be parsed for a structural matcher.
    #[error("failed to parse source: {message}")]
    Parse {
        /// Parser error message.
        message: String,
    },
    /// The matcher reported a failure.
    #[error("{0}")]
    Failed(String),
    /// The matcher panicked.
    #[error("matcher panicked: {0}")]
    Panicked(String),
}

impl RuleExecutionError {
    /// Creates a generic failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Per-file view handed to matchers.
///
/// Wraps the cached [`ScanTarget`] and lazily parses the Rust syntax tree the
/// first time a structural matcher asks for it, so every AST rule on the same
/// file shares one parse.
pub struct MatchContext<'a> {
    target: &'a ScanTarget,
    syntax: OnceCell<Result<syn::File, String>>,
}

impl<'a> MatchContext<'a> {
    /// Creates a context for one target.
    #[must_use]
    pub fn new(target: &'a ScanTarget) -> Self {
        Self {
            target,
            syntax: OnceCell::new(),
        }
    }

    /// The target being evaluated.
    #[must_use]
    pub fn target(&self) -> &'a ScanTarget {
        self.target
    }

    /// Cached file content.
    #[must_use]
    pub fn content(&self) -> &'a str {
        self.target.content()
    }

    /// Path relative to the scan root.
    #[must_use]
    pub fn path(&self) -> &'a Path {
        self.target.relative_path()
    }

    /// Derived file metadata.
    #[must_use]
    pub fn metadata(&self) -> &'a FileMetadata {
        self.target.metadata()
    }

    /// Parsed Rust syntax tree, parsed at most once per context.
    ///
    /// # Errors
    ///
    /// Returns [`RuleExecutionError::Parse`] if the content is not valid Rust.
    pub fn syntax(&self) -> Result<&syn::File, RuleExecutionError> {
        self.syntax
            .get_or_init(|| {
                syn::parse_file(self.target.content()).map_err(|e| {
                    let start = e.span().start();
                    format!("line {}: {e}", start.line)
                })
            })
            .as_ref()
            .map_err(|message| RuleExecutionError::Parse {
                message: message.clone(),
            })
    }
}

impl std::fmt::Debug for MatchContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchContext")
            .field("path", &self.target.relative_path())
            .field("parsed", &self.syntax.get().is_some())
            .finish()
    }
}

/// Capability interface shared by every matcher.
///
/// Implementations must be pure: identical input yields identical output.
pub trait Matcher: Send + Sync {
    /// Finds all matches in the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the matcher cannot evaluate the file. The
    /// evaluator turns it into a rule-failure finding.
    fn find(&self, cx: &MatchContext<'_>) -> Result<Vec<MatchResult>, RuleExecutionError>;

    /// Short label describing the matcher kind.
    fn kind(&self) -> &'static str {
        "custom"
    }
}

impl<F> Matcher for F
where
    F: Fn(&MatchContext<'_>) -> Result<Vec<MatchResult>, RuleExecutionError> + Send + Sync,
{
    fn find(&self, cx: &MatchContext<'_>) -> Result<Vec<MatchResult>, RuleExecutionError> {
        self(cx)
    }
}

#[derive(Debug, Clone)]
enum Needle {
    Literal(String),
    Regex(Regex),
}

/// Line-oriented text matcher.
///
/// Every occurrence produces a match with its line and column. The matched
/// text is available to templates as `{match}`; named regex captures are
/// available under their names.
#[derive(Debug, Clone)]
pub struct TextPattern {
    needle: Needle,
}

impl TextPattern {
    /// Creates a matcher from a regular expression.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            needle: Needle::Regex(Regex::new(pattern)?),
        })
    }

    /// Creates a matcher for a literal substring.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            needle: Needle::Literal(text.into()),
        }
    }

    /// Returns the pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match &self.needle {
            Needle::Literal(text) => text,
            Needle::Regex(regex) => regex.as_str(),
        }
    }

    fn find_in_line(&self, line_no: usize, line: &str, out: &mut Vec<MatchResult>) {
        let column_of = |byte: usize| line[..byte].chars().count() + 1;

        match &self.needle {
            Needle::Literal(text) if text.is_empty() => {}
            Needle::Literal(text) => {
                for (start, found) in line.match_indices(text.as_str()) {
                    out.push(
                        MatchResult::new(line_no)
                            .with_column(column_of(start))
                            .with("match", found),
                    );
                }
            }
            Needle::Regex(regex) => {
                for caps in regex.captures_iter(line) {
                    let Some(whole) = caps.get(0) else {
                        continue;
                    };
                    let mut m = MatchResult::new(line_no)
                        .with_column(column_of(whole.start()))
                        .with("match", whole.as_str());
                    for name in regex.capture_names().flatten() {
                        if let Some(value) = caps.name(name) {
                            m = m.with(name, value.as_str());
                        }
                    }
                    out.push(m);
                }
            }
        }
    }
}

impl Matcher for TextPattern {
    fn find(&self, cx: &MatchContext<'_>) -> Result<Vec<MatchResult>, RuleExecutionError> {
        let mut matches = Vec::new();
        for (i, line) in cx.content().lines().enumerate() {
            self.find_in_line(i + 1, line, &mut matches);
        }
        Ok(matches)
    }

    fn kind(&self) -> &'static str {
        "text"
    }
}

/// A structural check over a parsed Rust syntax tree.
///
/// Implementations typically drive a `syn::visit::Visit` visitor and convert
/// the spans they care about with [`MatchResult::from_span`].
pub trait AstCheck: Send + Sync {
    /// Inspects the syntax tree and returns matches.
    fn check(&self, file: &syn::File, cx: &MatchContext<'_>) -> Vec<MatchResult>;
}

/// Adapts an [`AstCheck`] to the [`Matcher`] contract.
#[derive(Debug, Clone)]
pub struct AstMatcher<C> {
    check: C,
}

impl<C: AstCheck> AstMatcher<C> {
    /// Wraps a structural check.
    #[must_use]
    pub fn new(check: C) -> Self {
        Self { check }
    }
}

impl<C: AstCheck> Matcher for AstMatcher<C> {
    fn find(&self, cx: &MatchContext<'_>) -> Result<Vec<MatchResult>, RuleExecutionError> {
        let file = cx.syntax()?;
        Ok(self.check.check(file, cx))
    }

    fn kind(&self) -> &'static str {
        "ast"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(content: &str) -> ScanTarget {
        ScanTarget::new("src/a.ts", content, Path::new(""))
    }

    #[test]
    fn literal_reports_every_occurrence_with_column() {
        let t = target("a();\n  console.log(1); console.log(2);\n");
        let cx = MatchContext::new(&t);
        let matches = TextPattern::literal("console.log(").find(&cx).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].line, 2);
        assert_eq!(matches[0].column, Some(3));
        assert_eq!(matches[1].column, Some(19));
        assert_eq!(matches[0].get("match"), Some("console.log("));
    }

    #[test]
    fn empty_literal_never_matches() {
        let t = target("anything");
        let cx = MatchContext::new(&t);
        assert!(TextPattern::literal("").find(&cx).unwrap().is_empty());
    }

    #[test]
    fn regex_exposes_named_captures() {
        let t = target("it.skip('renders', () => {});\ndescribe.skip('x')");
        let cx = MatchContext::new(&t);
        let pattern = TextPattern::regex(r"\b(?P<block>it|describe)\.skip\(").unwrap();
        let matches = pattern.find(&cx).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].get("block"), Some("it"));
        assert_eq!(matches[1].get("block"), Some("describe"));
        assert_eq!(matches[1].line, 2);
    }

    #[test]
    fn invalid_regex_is_rejected() {
        assert!(TextPattern::regex("(unclosed").is_err());
    }

    #[test]
    fn closures_are_matchers() {
        let matcher = |cx: &MatchContext<'_>| -> Result<Vec<MatchResult>, RuleExecutionError> {
            Ok(vec![MatchResult::new(1).with("len", cx.content().len().to_string())])
        };
        let t = target("abc");
        let matches = matcher.find(&MatchContext::new(&t)).unwrap();
        assert_eq!(matches[0].get("len"), Some("3"));
    }

    struct CountFns;

    impl AstCheck for CountFns {
        fn check(&self, file: &syn::File, _cx: &MatchContext<'_>) -> Vec<MatchResult> {
            file.items
                .iter()
                .filter_map(|item| match item {
                    syn::Item::Fn(f) => Some(MatchResult::from_span(f.sig.ident.span())),
                    _ => None,
                })
                .collect()
        }
    }

    #[test]
    fn ast_matcher_uses_span_locations() {
        let t = ScanTarget::new("src/lib.rs", "\nfn a() {}\nfn b() {}\n", Path::new(""));
        let matches = AstMatcher::new(CountFns).find(&MatchContext::new(&t)).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].line, 2);
        assert_eq!(matches[0].column, Some(4));
        assert_eq!(matches[1].line, 3);
    }

    #[test]
    fn ast_matcher_reports_parse_errors() {
        let t = ScanTarget::new("src/lib.rs", "fn broken( {", Path::new(""));
        let err = AstMatcher::new(CountFns)
            .find(&MatchContext::new(&t))
            .unwrap_err();
        assert!(matches!(err, RuleExecutionError::Parse { .. }));
    }
}
